use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::capacity::HalaqahCapacityAccountant;
use super::domain::HalaqahSeatState;
use crate::config::HalaqahConfig;
use crate::workflows::cohort::{CohortId, MemberId};
use crate::workflows::store::{CohortStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapacityReport {
    pub cohort_id: CohortId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_id: Option<MemberId>,
    pub groups: Vec<HalaqahSeatState>,
}

impl CapacityReport {
    pub fn group(&self, group_id: &str) -> Option<&HalaqahSeatState> {
        self.groups
            .iter()
            .find(|state| state.group_id.as_str() == group_id)
    }
}

/// Read-only capacity lookups, recomputed from source rows on every call.
pub struct HalaqahCapacityService<S> {
    store: Arc<S>,
    accountant: HalaqahCapacityAccountant,
}

impl<S> HalaqahCapacityService<S>
where
    S: CohortStore + 'static,
{
    pub fn new(store: Arc<S>, config: HalaqahConfig) -> Self {
        Self {
            store,
            accountant: HalaqahCapacityAccountant::new(config.default_max_seats),
        }
    }

    pub fn capacity(
        &self,
        cohort_id: &CohortId,
        viewer: Option<&MemberId>,
    ) -> Result<CapacityReport, HalaqahError> {
        let groups = self.store.groups()?;
        let submissions = self.store.submissions(cohort_id)?;
        let roster = self.store.roster()?;

        let states = self
            .accountant
            .seat_states(&groups, &submissions, &roster, viewer);
        for state in states.iter().filter(|state| state.over_capacity) {
            warn!(
                cohort = %cohort_id,
                group = %state.group_id,
                occupants = state.occupant_count,
                max_seats = state.max_seats,
                "halaqah over capacity"
            );
        }
        debug!(cohort = %cohort_id, groups = states.len(), "halaqah capacity computed");

        Ok(CapacityReport {
            cohort_id: cohort_id.clone(),
            viewer_id: viewer.cloned(),
            groups: states,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HalaqahError {
    #[error("persistence failure")]
    Persistence(#[from] StoreError),
}
