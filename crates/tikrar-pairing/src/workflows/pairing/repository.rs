use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use super::domain::{PairingId, PairingMechanism, PairingRecord};
use super::service::PairingError;
use crate::workflows::cohort::{CohortId, MemberId};
use crate::workflows::store::{CohortStore, StoreError};

static PAIRING_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_pairing_id() -> PairingId {
    let id = PAIRING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PairingId(format!("pair-{id:06}"))
}

/// Pairing writes plus the cascading pairing-status flag on each member's submissions.
pub struct PairingRepository<S> {
    store: Arc<S>,
}

impl<S> Clone for PairingRepository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> PairingRepository<S>
where
    S: CohortStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Inserts an active two-member record. The store re-checks member uniqueness on insert.
    ///
    /// If the flag cascade fails the record is dissolved again, so an `Err` never leaves an
    /// active pairing behind.
    pub fn create(
        &self,
        cohort_id: &CohortId,
        members: (MemberId, MemberId),
        mechanism: PairingMechanism,
        created_by: &MemberId,
    ) -> Result<PairingRecord, PairingError> {
        let (first, second) = members;
        if first == second {
            return Err(PairingError::Validation(format!(
                "member {first} cannot be paired with themselves"
            )));
        }

        let active = self.store.active_pairings(cohort_id)?;
        if let Some(taken) = [&first, &second]
            .into_iter()
            .find(|member| active.iter().any(|record| record.contains(member)))
        {
            return Err(PairingError::Conflict(taken.clone()));
        }

        let record = PairingRecord::pair(
            next_pairing_id(),
            cohort_id.clone(),
            (first, second),
            mechanism,
            created_by.clone(),
            Utc::now(),
        );
        let stored = self.store.insert_pairing(record)?;
        if let Err(error) = self.flag_members(&stored, true) {
            if let Err(rollback) = self.remove(&stored) {
                warn!(
                    cohort = %cohort_id,
                    pairing = %stored.id,
                    error = %rollback,
                    "failed to roll back pairing after flag update failure"
                );
            }
            return Err(error);
        }

        Ok(stored)
    }

    /// Grows an active pair into a triad.
    pub fn add_member(
        &self,
        cohort_id: &CohortId,
        pairing_id: &PairingId,
        member_id: &MemberId,
    ) -> Result<PairingRecord, PairingError> {
        let mut record = self
            .store
            .fetch_pairing(cohort_id, pairing_id)?
            .filter(PairingRecord::is_active)
            .ok_or_else(|| PairingError::UnknownPairing(pairing_id.clone()))?;

        if record.is_triad() {
            return Err(PairingError::Validation(format!(
                "pairing {pairing_id} already has three members"
            )));
        }
        if record.contains(member_id) {
            return Err(PairingError::Validation(format!(
                "member {member_id} is already in pairing {pairing_id}"
            )));
        }

        let elsewhere = self
            .store
            .active_pairings(cohort_id)?
            .into_iter()
            .any(|other| other.id != record.id && other.contains(member_id));
        if elsewhere {
            return Err(PairingError::Conflict(member_id.clone()));
        }

        let previous = record.clone();
        record.third_member = Some(member_id.clone());
        self.store.update_pairing(record.clone())?;
        if let Err(error) = self.store.set_paired(cohort_id, member_id, true) {
            let restored = self
                .store
                .update_pairing(previous)
                .and_then(|()| self.store.set_paired(cohort_id, member_id, false));
            if let Err(rollback) = restored {
                warn!(
                    cohort = %cohort_id,
                    pairing = %pairing_id,
                    member = %member_id,
                    error = %rollback,
                    "failed to restore pairing after flag update failure"
                );
            }
            return Err(error.into());
        }

        Ok(record)
    }

    /// Removes the active record referencing `member_id` and clears every referenced flag.
    pub fn delete_one(
        &self,
        cohort_id: &CohortId,
        member_id: &MemberId,
    ) -> Result<PairingRecord, PairingError> {
        let record = self
            .store
            .active_pairings(cohort_id)?
            .into_iter()
            .find(|record| record.contains(member_id))
            .ok_or_else(|| PairingError::PairingNotFound(member_id.clone()))?;

        if !self.remove(&record)? {
            return Err(PairingError::PairingNotFound(member_id.clone()));
        }
        Ok(record)
    }

    /// Removes every active record in the cohort. Returns how many this call removed; records
    /// a concurrent caller removed first are skipped.
    pub fn delete_all(&self, cohort_id: &CohortId) -> Result<usize, PairingError> {
        let mut removed = 0;
        for record in self.store.active_pairings(cohort_id)? {
            if self.remove(&record)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Dissolves `record` and clears its members' flags. `false` when it was already gone.
    fn remove(&self, record: &PairingRecord) -> Result<bool, PairingError> {
        let removed = match self.store.delete_pairing(&record.cohort_id, &record.id) {
            Ok(()) => true,
            Err(StoreError::NotFound) => false,
            Err(error) => return Err(error.into()),
        };
        self.flag_members(record, false)?;
        Ok(removed)
    }

    /// Writes every member's flag even when one write fails; the first failure is returned.
    fn flag_members(&self, record: &PairingRecord, paired: bool) -> Result<(), PairingError> {
        let mut first_failure = None;
        for member in record.members() {
            if let Err(error) = self.store.set_paired(&record.cohort_id, member, paired) {
                first_failure.get_or_insert(error);
            }
        }
        match first_failure {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}
