use std::collections::{BTreeMap, BTreeSet};

use super::domain::{CandidateProfile, PairingRecord};
use crate::workflows::cohort::{
    latest_submissions, CohortId, MemberId, PartnerPreference, ReEnrollmentSubmission,
    Registration,
};
use crate::workflows::store::{CohortStore, StoreError};

/// Flat in-memory facts for one cohort, loaded once per allocation or lookup call.
#[derive(Debug, Clone)]
pub struct CohortSnapshot {
    registrations: BTreeMap<MemberId, Registration>,
    submissions: Vec<ReEnrollmentSubmission>,
    pairings: Vec<PairingRecord>,
}

impl CohortSnapshot {
    pub fn load<S: CohortStore + ?Sized>(
        store: &S,
        cohort_id: &CohortId,
    ) -> Result<Self, StoreError> {
        let registrations = store
            .registrations(cohort_id)?
            .into_iter()
            .map(|row| (row.member_id.clone(), row))
            .collect();

        Ok(Self {
            registrations,
            submissions: store.submissions(cohort_id)?,
            pairings: store.active_pairings(cohort_id)?,
        })
    }

    pub fn latest_submissions(&self) -> BTreeMap<MemberId, &ReEnrollmentSubmission> {
        latest_submissions(&self.submissions)
    }

    /// Members referenced by any active pairing record.
    pub fn paired_members(&self) -> BTreeSet<MemberId> {
        self.pairings
            .iter()
            .flat_map(|record| record.members().into_iter().cloned())
            .collect()
    }

    pub fn active_pairing_for(&self, member_id: &MemberId) -> Option<&PairingRecord> {
        self.pairings.iter().find(|record| record.contains(member_id))
    }

    /// Profile for a registered member with at least one submission, whatever its status.
    pub fn profile(
        &self,
        member_id: &MemberId,
        default_timezone: &str,
    ) -> Option<CandidateProfile> {
        let registration = self.registrations.get(member_id)?;
        let latest = self.latest_submissions();
        let submission = latest.get(member_id)?;

        Some(CandidateProfile::from_registration(
            registration,
            submission.status,
            default_timezone,
        ))
    }

    /// Eligible, currently unpaired members, in member-id order.
    ///
    /// `preference` narrows the pool to members who asked for that partnering route.
    pub fn unpaired_pool(
        &self,
        preference: Option<PartnerPreference>,
        default_timezone: &str,
    ) -> Vec<CandidateProfile> {
        let paired = self.paired_members();

        self.latest_submissions()
            .into_iter()
            .filter(|(member_id, submission)| {
                submission.status.is_committed()
                    && !submission.paired
                    && !paired.contains(member_id)
                    && preference.map_or(true, |wanted| submission.partner_preference == wanted)
            })
            .filter_map(|(member_id, submission)| {
                self.registrations.get(&member_id).map(|registration| {
                    CandidateProfile::from_registration(
                        registration,
                        submission.status,
                        default_timezone,
                    )
                })
            })
            .collect()
    }
}
