//! Cohort-scoped rows shared by the pairing and halaqah workflows, plus the CSV seed importer.

pub mod domain;
mod import;

pub use domain::{
    latest_submissions, CohortId, GroupId, MemberId, PartnerPreference, ReEnrollmentSubmission,
    Registration, SubmissionStatus, UnknownVariant,
};
pub use import::{CohortCsvImporter, CohortImportError, CohortSeed};
