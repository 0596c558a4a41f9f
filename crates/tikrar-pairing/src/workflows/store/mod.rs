//! Persistence and cache-invalidation seams consumed by the pairing and halaqah workflows.

mod memory;

pub use memory::InMemoryCohortStore;

use serde::{Deserialize, Serialize};

use super::cohort::{CohortId, MemberId, ReEnrollmentSubmission, Registration};
use super::halaqah::{Halaqah, RosterEntry};
use super::pairing::{PairingId, PairingRecord};

/// Row-level access to the five logical tables backing a cohort.
pub trait CohortStore: Send + Sync {
    fn registrations(&self, cohort_id: &CohortId) -> Result<Vec<Registration>, StoreError>;
    fn submissions(&self, cohort_id: &CohortId)
        -> Result<Vec<ReEnrollmentSubmission>, StoreError>;
    /// Sets the pairing-status flag on every submission of the member in the cohort.
    fn set_paired(
        &self,
        cohort_id: &CohortId,
        member_id: &MemberId,
        paired: bool,
    ) -> Result<(), StoreError>;

    fn active_pairings(&self, cohort_id: &CohortId) -> Result<Vec<PairingRecord>, StoreError>;
    fn fetch_pairing(
        &self,
        cohort_id: &CohortId,
        pairing_id: &PairingId,
    ) -> Result<Option<PairingRecord>, StoreError>;
    /// Implementations must refuse a record whose members already sit in another active record of
    /// the same cohort, returning [`StoreError::Conflict`].
    fn insert_pairing(&self, record: PairingRecord) -> Result<PairingRecord, StoreError>;
    /// Same uniqueness rule as [`CohortStore::insert_pairing`].
    fn update_pairing(&self, record: PairingRecord) -> Result<(), StoreError>;
    /// Ends an active record. [`StoreError::NotFound`] when no active record has that id.
    fn delete_pairing(&self, cohort_id: &CohortId, pairing_id: &PairingId)
        -> Result<(), StoreError>;

    fn groups(&self) -> Result<Vec<Halaqah>, StoreError>;
    fn roster(&self) -> Result<Vec<RosterEntry>, StoreError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("member {0} already has an active pairing")]
    Conflict(MemberId),
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Cached page families that depend on pairing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachedView {
    Pairing,
    Dashboard,
}

impl CachedView {
    pub const AFTER_PAIRING_WRITE: [CachedView; 2] = [CachedView::Pairing, CachedView::Dashboard];
}

/// Signal sent after a successful pairing write so rendered views can be refreshed.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate(&self, cohort_id: &CohortId, views: &[CachedView])
        -> Result<(), InvalidationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum InvalidationError {
    #[error("cache transport unavailable: {0}")]
    Transport(String),
}
