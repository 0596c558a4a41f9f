use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use super::domain::{
    CohortId, GroupId, MemberId, PartnerPreference, ReEnrollmentSubmission, Registration,
    SubmissionStatus, UnknownVariant,
};

#[derive(Debug)]
pub enum CohortImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidValue { line: usize, source: UnknownVariant },
}

impl std::fmt::Display for CohortImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CohortImportError::Io(err) => write!(f, "failed to read cohort export: {}", err),
            CohortImportError::Csv(err) => write!(f, "invalid cohort CSV data: {}", err),
            CohortImportError::InvalidValue { line, source } => {
                write!(f, "invalid value on row {}: {}", line, source)
            }
        }
    }
}

impl std::error::Error for CohortImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CohortImportError::Io(err) => Some(err),
            CohortImportError::Csv(err) => Some(err),
            CohortImportError::InvalidValue { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for CohortImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CohortImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Registrations and submissions parsed from one cohort export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CohortSeed {
    pub registrations: Vec<Registration>,
    pub submissions: Vec<ReEnrollmentSubmission>,
}

pub struct CohortCsvImporter;

impl CohortCsvImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        cohort_id: &CohortId,
        imported_at: DateTime<Utc>,
    ) -> Result<CohortSeed, CohortImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, cohort_id, imported_at)
    }

    /// Every row becomes one registration and one submission stamped with `imported_at`.
    pub fn from_reader<R: Read>(
        reader: R,
        cohort_id: &CohortId,
        imported_at: DateTime<Utc>,
    ) -> Result<CohortSeed, CohortImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut seed = CohortSeed::default();

        for (index, record) in csv_reader.deserialize::<CohortRow>().enumerate() {
            let row = record?;
            // header is line 1
            let line = index + 2;
            let status = match row.status.as_deref() {
                Some(raw) => SubmissionStatus::parse(raw)
                    .map_err(|source| CohortImportError::InvalidValue { line, source })?,
                None => SubmissionStatus::Submitted,
            };
            let partner_preference = match row.partner_preference.as_deref() {
                Some(raw) => PartnerPreference::parse(raw)
                    .map_err(|source| CohortImportError::InvalidValue { line, source })?,
                None => PartnerPreference::SystemMatch,
            };
            let member_id = MemberId::new(row.member_id);

            seed.registrations.push(Registration {
                cohort_id: cohort_id.clone(),
                member_id: member_id.clone(),
                full_name: row.full_name.unwrap_or_else(|| member_id.to_string()),
                timezone: row.timezone,
                account_timezone: row.account_timezone,
                chosen_unit: row.chosen_unit,
                main_time_slot: row.main_time_slot,
                backup_time_slot: row.backup_time_slot,
            });
            seed.submissions.push(ReEnrollmentSubmission {
                cohort_id: cohort_id.clone(),
                member_id,
                status,
                partner_preference,
                paired: false,
                exam_group_id: row.exam_group_id.map(GroupId::new),
                review_group_id: row.review_group_id.map(GroupId::new),
                general_review: row.general_review.as_deref().map_or(false, is_truthy),
                submitted_at: imported_at,
            });
        }

        Ok(seed)
    }
}

#[derive(Debug, Deserialize)]
struct CohortRow {
    member_id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    full_name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    timezone: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    account_timezone: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    chosen_unit: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    main_time_slot: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    backup_time_slot: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    partner_preference: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    exam_group_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    review_group_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    general_review: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "1" | "y"
    )
}
