use std::sync::{Arc, Mutex};

use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::PairingConfig;
use crate::workflows::access::{HeaderAccessGuard, ACTOR_ID_HEADER, ACTOR_ROLES_HEADER};
use crate::workflows::cohort::{
    CohortId, GroupId, MemberId, PartnerPreference, ReEnrollmentSubmission, Registration,
    SubmissionStatus,
};
use crate::workflows::halaqah::{Halaqah, RosterEntry};
use crate::workflows::pairing::allocation::{PairShuffler, ScoredPair};
use crate::workflows::pairing::domain::{CandidateProfile, PairingId, PairingRecord};
use crate::workflows::pairing::scoring::TimeSlot;
use crate::workflows::pairing::{pairing_router, PairingService};
use crate::workflows::store::{
    CacheInvalidator, CachedView, CohortStore, InMemoryCohortStore, InvalidationError, StoreError,
};

pub(super) fn cohort() -> CohortId {
    CohortId::new("batch-2")
}

pub(super) fn staff() -> MemberId {
    MemberId::new("staff-1")
}

pub(super) fn at_minute(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 10, 8, minute, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn pairing_config() -> PairingConfig {
    PairingConfig {
        shuffle_seed: Some(7),
        default_timezone: "WIB".to_string(),
    }
}

/// Eligible profile; pass `""` for a missing unit or slot.
pub(super) fn profile(
    id: &str,
    timezone: &str,
    unit: &str,
    main: &str,
    backup: &str,
) -> CandidateProfile {
    CandidateProfile {
        member_id: MemberId::new(id),
        full_name: format!("Member {id}"),
        timezone: timezone.to_string(),
        unit: (!unit.is_empty()).then(|| unit.to_string()),
        main_slot: TimeSlot::parse(main),
        backup_slot: TimeSlot::parse(backup),
        status: SubmissionStatus::Submitted,
    }
}

pub(super) fn registration(
    id: &str,
    timezone: &str,
    unit: &str,
    main: &str,
    backup: &str,
) -> Registration {
    let optional = |value: &str| (!value.is_empty()).then(|| value.to_string());
    Registration {
        cohort_id: cohort(),
        member_id: MemberId::new(id),
        full_name: format!("Member {id}"),
        timezone: optional(timezone),
        account_timezone: None,
        chosen_unit: optional(unit),
        main_time_slot: optional(main),
        backup_time_slot: optional(backup),
    }
}

pub(super) fn submission(
    id: &str,
    preference: PartnerPreference,
    status: SubmissionStatus,
    minute: u32,
) -> ReEnrollmentSubmission {
    ReEnrollmentSubmission {
        cohort_id: cohort(),
        member_id: MemberId::new(id),
        status,
        partner_preference: preference,
        paired: false,
        exam_group_id: Some(GroupId::new("h-1")),
        review_group_id: None,
        general_review: false,
        submitted_at: at_minute(minute),
    }
}

/// Registers a submitted system-match member.
pub(super) fn enroll(
    store: &InMemoryCohortStore,
    id: &str,
    timezone: &str,
    unit: &str,
    main: &str,
    backup: &str,
) {
    store
        .insert_registration(registration(id, timezone, unit, main, backup))
        .expect("registration stored");
    store
        .insert_submission(submission(
            id,
            PartnerPreference::SystemMatch,
            SubmissionStatus::Submitted,
            0,
        ))
        .expect("submission stored");
}

pub(super) fn paired_flag(store: &InMemoryCohortStore, id: &str) -> bool {
    store
        .submissions(&cohort())
        .expect("submissions load")
        .iter()
        .filter(|row| row.member_id.as_str() == id)
        .all(|row| row.paired)
}

pub(super) fn build_service(
    store: Arc<InMemoryCohortStore>,
) -> (
    PairingService<InMemoryCohortStore, RecordingInvalidator>,
    Arc<RecordingInvalidator>,
) {
    let cache = Arc::new(RecordingInvalidator::default());
    let service = PairingService::new(store, cache.clone(), pairing_config());
    (service, cache)
}

#[derive(Default, Clone)]
pub(super) struct RecordingInvalidator {
    calls: Arc<Mutex<Vec<(CohortId, Vec<CachedView>)>>>,
}

impl RecordingInvalidator {
    pub(super) fn calls(&self) -> Vec<(CohortId, Vec<CachedView>)> {
        self.calls.lock().expect("invalidator mutex poisoned").clone()
    }
}

impl CacheInvalidator for RecordingInvalidator {
    fn invalidate(
        &self,
        cohort_id: &CohortId,
        views: &[CachedView],
    ) -> Result<(), InvalidationError> {
        self.calls
            .lock()
            .expect("invalidator mutex poisoned")
            .push((cohort_id.clone(), views.to_vec()));
        Ok(())
    }
}

pub(super) struct FailingInvalidator;

impl CacheInvalidator for FailingInvalidator {
    fn invalidate(
        &self,
        _cohort_id: &CohortId,
        _views: &[CachedView],
    ) -> Result<(), InvalidationError> {
        Err(InvalidationError::Transport("cache offline".to_string()))
    }
}

/// Reverses every bucket, so tests can tell shuffled order from enumeration order.
pub(super) struct ReverseShuffler;

impl PairShuffler for ReverseShuffler {
    fn shuffle(&mut self, bucket: &mut [ScoredPair]) {
        bucket.reverse();
    }
}

/// Delegates to memory with injected write faults.
pub(super) struct FlakyStore {
    pub(super) inner: InMemoryCohortStore,
    /// Inserting any pairing that contains this member fails.
    pub(super) rejected: Option<MemberId>,
    /// Flag writes for this member fail.
    pub(super) unflaggable: Option<MemberId>,
    /// Deleting this pairing finds it already dissolved by someone else.
    pub(super) vanishing: Option<PairingId>,
}

impl FlakyStore {
    pub(super) fn wrapping(inner: InMemoryCohortStore) -> Self {
        Self {
            inner,
            rejected: None,
            unflaggable: None,
            vanishing: None,
        }
    }
}

impl CohortStore for FlakyStore {
    fn registrations(&self, cohort_id: &CohortId) -> Result<Vec<Registration>, StoreError> {
        self.inner.registrations(cohort_id)
    }

    fn submissions(&self, cohort_id: &CohortId) -> Result<Vec<ReEnrollmentSubmission>, StoreError> {
        self.inner.submissions(cohort_id)
    }

    fn set_paired(
        &self,
        cohort_id: &CohortId,
        member_id: &MemberId,
        paired: bool,
    ) -> Result<(), StoreError> {
        if self.unflaggable.as_ref() == Some(member_id) {
            return Err(StoreError::Unavailable("flag write timed out".to_string()));
        }
        self.inner.set_paired(cohort_id, member_id, paired)
    }

    fn active_pairings(&self, cohort_id: &CohortId) -> Result<Vec<PairingRecord>, StoreError> {
        self.inner.active_pairings(cohort_id)
    }

    fn fetch_pairing(
        &self,
        cohort_id: &CohortId,
        pairing_id: &PairingId,
    ) -> Result<Option<PairingRecord>, StoreError> {
        self.inner.fetch_pairing(cohort_id, pairing_id)
    }

    fn insert_pairing(&self, record: PairingRecord) -> Result<PairingRecord, StoreError> {
        if self
            .rejected
            .as_ref()
            .is_some_and(|member| record.contains(member))
        {
            return Err(StoreError::Unavailable("write timed out".to_string()));
        }
        self.inner.insert_pairing(record)
    }

    fn update_pairing(&self, record: PairingRecord) -> Result<(), StoreError> {
        self.inner.update_pairing(record)
    }

    fn delete_pairing(
        &self,
        cohort_id: &CohortId,
        pairing_id: &PairingId,
    ) -> Result<(), StoreError> {
        if self.vanishing.as_ref() == Some(pairing_id) {
            self.inner.delete_pairing(cohort_id, pairing_id)?;
            return Err(StoreError::NotFound);
        }
        self.inner.delete_pairing(cohort_id, pairing_id)
    }

    fn groups(&self) -> Result<Vec<Halaqah>, StoreError> {
        self.inner.groups()
    }

    fn roster(&self) -> Result<Vec<RosterEntry>, StoreError> {
        self.inner.roster()
    }
}

pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("database offline".to_string()))
}

impl CohortStore for UnavailableStore {
    fn registrations(&self, _cohort_id: &CohortId) -> Result<Vec<Registration>, StoreError> {
        offline()
    }

    fn submissions(
        &self,
        _cohort_id: &CohortId,
    ) -> Result<Vec<ReEnrollmentSubmission>, StoreError> {
        offline()
    }

    fn set_paired(
        &self,
        _cohort_id: &CohortId,
        _member_id: &MemberId,
        _paired: bool,
    ) -> Result<(), StoreError> {
        offline()
    }

    fn active_pairings(&self, _cohort_id: &CohortId) -> Result<Vec<PairingRecord>, StoreError> {
        offline()
    }

    fn fetch_pairing(
        &self,
        _cohort_id: &CohortId,
        _pairing_id: &PairingId,
    ) -> Result<Option<PairingRecord>, StoreError> {
        offline()
    }

    fn insert_pairing(&self, _record: PairingRecord) -> Result<PairingRecord, StoreError> {
        offline()
    }

    fn update_pairing(&self, _record: PairingRecord) -> Result<(), StoreError> {
        offline()
    }

    fn delete_pairing(
        &self,
        _cohort_id: &CohortId,
        _pairing_id: &PairingId,
    ) -> Result<(), StoreError> {
        offline()
    }

    fn groups(&self) -> Result<Vec<Halaqah>, StoreError> {
        offline()
    }

    fn roster(&self) -> Result<Vec<RosterEntry>, StoreError> {
        offline()
    }
}

pub(super) fn admin_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACTOR_ID_HEADER, HeaderValue::from_static("staff-1"));
    headers.insert(ACTOR_ROLES_HEADER, HeaderValue::from_static("admin"));
    headers
}

pub(super) fn router_for<S, C>(service: PairingService<S, C>) -> axum::Router
where
    S: CohortStore + 'static,
    C: CacheInvalidator + 'static,
{
    pairing_router(Arc::new(service), Arc::new(HeaderAccessGuard))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
