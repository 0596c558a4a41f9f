use std::sync::{Arc, Mutex, MutexGuard};

use super::{CohortStore, StoreError};
use crate::workflows::cohort::{
    CohortId, CohortSeed, MemberId, ReEnrollmentSubmission, Registration,
};
use crate::workflows::halaqah::{Halaqah, RosterEntry};
use crate::workflows::pairing::{PairingId, PairingRecord, PairingStatus};

#[derive(Debug, Default)]
struct Tables {
    registrations: Vec<Registration>,
    submissions: Vec<ReEnrollmentSubmission>,
    pairings: Vec<PairingRecord>,
    groups: Vec<Halaqah>,
    roster: Vec<RosterEntry>,
}

impl Tables {
    /// First member of `record` already held by another active record in the same cohort.
    fn conflicting_member(&self, record: &PairingRecord) -> Option<MemberId> {
        record
            .members()
            .into_iter()
            .find(|member| {
                self.pairings.iter().any(|existing| {
                    existing.id != record.id
                        && existing.cohort_id == record.cohort_id
                        && existing.is_active()
                        && existing.contains(member)
                })
            })
            .cloned()
    }
}

/// Mutex-guarded store used by the service binary, the CLI, and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCohortStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryCohortStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("cohort store mutex poisoned".to_string()))
    }

    pub fn seed_cohort(&self, seed: CohortSeed) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        tables.registrations.extend(seed.registrations);
        tables.submissions.extend(seed.submissions);
        Ok(())
    }

    pub fn insert_registration(&self, registration: Registration) -> Result<(), StoreError> {
        self.tables()?.registrations.push(registration);
        Ok(())
    }

    pub fn insert_submission(&self, submission: ReEnrollmentSubmission) -> Result<(), StoreError> {
        self.tables()?.submissions.push(submission);
        Ok(())
    }

    pub fn insert_group(&self, group: Halaqah) -> Result<(), StoreError> {
        self.tables()?.groups.push(group);
        Ok(())
    }

    pub fn insert_roster_entry(&self, entry: RosterEntry) -> Result<(), StoreError> {
        self.tables()?.roster.push(entry);
        Ok(())
    }

    /// Every stored pairing, dissolved ones included.
    pub fn all_pairings(&self) -> Result<Vec<PairingRecord>, StoreError> {
        Ok(self.tables()?.pairings.clone())
    }
}

impl CohortStore for InMemoryCohortStore {
    fn registrations(&self, cohort_id: &CohortId) -> Result<Vec<Registration>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .registrations
            .iter()
            .filter(|row| &row.cohort_id == cohort_id)
            .cloned()
            .collect())
    }

    fn submissions(
        &self,
        cohort_id: &CohortId,
    ) -> Result<Vec<ReEnrollmentSubmission>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .submissions
            .iter()
            .filter(|row| &row.cohort_id == cohort_id)
            .cloned()
            .collect())
    }

    fn set_paired(
        &self,
        cohort_id: &CohortId,
        member_id: &MemberId,
        paired: bool,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        tables
            .submissions
            .iter_mut()
            .filter(|row| &row.cohort_id == cohort_id && &row.member_id == member_id)
            .for_each(|row| row.paired = paired);
        Ok(())
    }

    fn active_pairings(&self, cohort_id: &CohortId) -> Result<Vec<PairingRecord>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .pairings
            .iter()
            .filter(|record| &record.cohort_id == cohort_id && record.is_active())
            .cloned()
            .collect())
    }

    fn fetch_pairing(
        &self,
        cohort_id: &CohortId,
        pairing_id: &PairingId,
    ) -> Result<Option<PairingRecord>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .pairings
            .iter()
            .find(|record| &record.cohort_id == cohort_id && &record.id == pairing_id)
            .cloned())
    }

    fn insert_pairing(&self, record: PairingRecord) -> Result<PairingRecord, StoreError> {
        let mut tables = self.tables()?;
        if let Some(member) = tables.conflicting_member(&record) {
            return Err(StoreError::Conflict(member));
        }
        if tables.pairings.iter().any(|existing| existing.id == record.id) {
            return Err(StoreError::Conflict(record.first_member.clone()));
        }
        tables.pairings.push(record.clone());
        Ok(record)
    }

    fn update_pairing(&self, record: PairingRecord) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        if let Some(member) = tables.conflicting_member(&record) {
            return Err(StoreError::Conflict(member));
        }
        let slot = tables
            .pairings
            .iter_mut()
            .find(|existing| existing.id == record.id && existing.cohort_id == record.cohort_id)
            .ok_or(StoreError::NotFound)?;
        *slot = record;
        Ok(())
    }

    fn delete_pairing(
        &self,
        cohort_id: &CohortId,
        pairing_id: &PairingId,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let record = tables
            .pairings
            .iter_mut()
            .find(|record| {
                &record.cohort_id == cohort_id && &record.id == pairing_id && record.is_active()
            })
            .ok_or(StoreError::NotFound)?;
        record.status = PairingStatus::Dissolved;
        Ok(())
    }

    fn groups(&self) -> Result<Vec<Halaqah>, StoreError> {
        Ok(self.tables()?.groups.clone())
    }

    fn roster(&self) -> Result<Vec<RosterEntry>, StoreError> {
        Ok(self.tables()?.roster.clone())
    }
}
