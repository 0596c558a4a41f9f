use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::allocation::{plan_allocation, PairShuffler, RandomShuffler};
use super::domain::{
    CandidateProfile, PairingId, PairingMechanism, PairingRecord, PairingTarget,
};
use super::matching::{rank_matches, MatchReport};
use super::repository::PairingRepository;
use super::snapshot::CohortSnapshot;
use super::statistics::PairingStatistics;
use crate::config::PairingConfig;
use crate::workflows::cohort::{CohortId, MemberId, PartnerPreference};
use crate::workflows::store::{CacheInvalidator, CachedView, CohortStore, StoreError};

/// Analysis row for one pair selected by the allocator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairing_id: Option<PairingId>,
    pub first_member: MemberId,
    pub second_member: MemberId,
    pub first_name: String,
    pub second_name: String,
    pub tier: u8,
    pub match_type: &'static str,
    pub score: u16,
    pub same_zone: bool,
    pub same_unit: bool,
    pub main_overlap: bool,
    pub backup_overlap: bool,
    /// Commit failure detail; such pairs are not persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkAllocationReport {
    pub cohort_id: CohortId,
    /// Pairs persisted by this run.
    pub paired_count: usize,
    /// Members left without a partner, including members of pairs that failed to commit.
    pub unpaired_count: usize,
    pub pairings: Vec<PairingRecord>,
    pub analysis: Vec<PairAnalysis>,
    pub unpaired: Vec<MemberId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairingDetail {
    pub pairing: PairingRecord,
    pub members: Vec<CandidateProfile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeletionSummary {
    pub deleted_count: usize,
}

/// Facade over the snapshot loader, allocator, repository, and match finder.
pub struct PairingService<S, C> {
    store: Arc<S>,
    repository: PairingRepository<S>,
    cache: Arc<C>,
    config: PairingConfig,
}

impl<S, C> PairingService<S, C>
where
    S: CohortStore + 'static,
    C: CacheInvalidator + 'static,
{
    pub fn new(store: Arc<S>, cache: Arc<C>, config: PairingConfig) -> Self {
        let repository = PairingRepository::new(Arc::clone(&store));
        Self {
            store,
            repository,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &PairingConfig {
        &self.config
    }

    fn snapshot(&self, cohort_id: &CohortId) -> Result<CohortSnapshot, PairingError> {
        Ok(CohortSnapshot::load(self.store.as_ref(), cohort_id)?)
    }

    fn invalidate(&self, cohort_id: &CohortId) {
        if let Err(error) = self
            .cache
            .invalidate(cohort_id, &CachedView::AFTER_PAIRING_WRITE)
        {
            warn!(cohort = %cohort_id, %error, "pairing cache invalidation failed");
        }
    }

    /// Bulk allocation using the configured seed, or entropy when none is set.
    pub fn run_bulk_allocation(
        &self,
        cohort_id: &CohortId,
        actor: &MemberId,
    ) -> Result<BulkAllocationReport, PairingError> {
        match self.config.shuffle_seed {
            Some(seed) => {
                let mut shuffler = RandomShuffler::seeded(seed);
                self.run_bulk_allocation_with(cohort_id, actor, &mut shuffler)
            }
            None => {
                let mut shuffler = RandomShuffler::from_entropy();
                self.run_bulk_allocation_with(cohort_id, actor, &mut shuffler)
            }
        }
    }

    /// Plans over the unpaired system-match pool, then commits pair by pair.
    ///
    /// A failed commit does not undo earlier ones; its members are reported unpaired.
    pub fn run_bulk_allocation_with(
        &self,
        cohort_id: &CohortId,
        actor: &MemberId,
        shuffler: &mut dyn PairShuffler,
    ) -> Result<BulkAllocationReport, PairingError> {
        let snapshot = self.snapshot(cohort_id)?;
        let pool = snapshot.unpaired_pool(
            Some(PartnerPreference::SystemMatch),
            &self.config.default_timezone,
        );
        if pool.len() < 2 {
            return Err(PairingError::EmptyPool {
                available: pool.len(),
            });
        }

        let names: BTreeMap<&MemberId, &str> = pool
            .iter()
            .map(|profile| (&profile.member_id, profile.full_name.as_str()))
            .collect();
        let name_of = |member: &MemberId| {
            names
                .get(member)
                .map_or_else(|| member.to_string(), |name| name.to_string())
        };

        let plan = plan_allocation(&pool, shuffler);
        let mut pairings = Vec::with_capacity(plan.pairs.len());
        let mut analysis = Vec::with_capacity(plan.pairs.len());
        let mut unpaired = plan.unpaired;

        for pair in plan.pairs {
            let tier = pair.tier();
            let outcome = self.repository.create(
                cohort_id,
                (pair.first.clone(), pair.second.clone()),
                PairingMechanism::SystemAssigned,
                actor,
            );
            let (pairing_id, error) = match outcome {
                Ok(record) => {
                    debug!(
                        cohort = %cohort_id,
                        pairing = %record.id,
                        tier = tier.rank(),
                        "committed allocated pair"
                    );
                    let id = record.id.clone();
                    pairings.push(record);
                    (Some(id), None)
                }
                Err(error) => {
                    warn!(
                        cohort = %cohort_id,
                        first = %pair.first,
                        second = %pair.second,
                        %error,
                        "failed to commit allocated pair"
                    );
                    unpaired.push(pair.first.clone());
                    unpaired.push(pair.second.clone());
                    (None, Some(error.to_string()))
                }
            };

            let signals = pair.assessment.signals;
            analysis.push(PairAnalysis {
                pairing_id,
                first_name: name_of(&pair.first),
                second_name: name_of(&pair.second),
                first_member: pair.first,
                second_member: pair.second,
                tier: tier.rank(),
                match_type: tier.label(),
                score: pair.assessment.score,
                same_zone: signals.same_zone,
                same_unit: signals.same_unit,
                main_overlap: signals.main_overlap,
                backup_overlap: signals.backup_overlap,
                error,
            });
        }
        unpaired.sort();

        if !pairings.is_empty() {
            self.invalidate(cohort_id);
        }

        info!(
            cohort = %cohort_id,
            pool = pool.len(),
            paired = pairings.len(),
            unpaired = unpaired.len(),
            "bulk allocation finished"
        );

        Ok(BulkAllocationReport {
            cohort_id: cohort_id.clone(),
            paired_count: pairings.len(),
            unpaired_count: unpaired.len(),
            pairings,
            analysis,
            unpaired,
        })
    }

    /// Staff-chosen pair.
    pub fn create_pairing(
        &self,
        cohort_id: &CohortId,
        first: MemberId,
        second: MemberId,
        actor: &MemberId,
    ) -> Result<PairingRecord, PairingError> {
        if first.as_str().trim().is_empty() || second.as_str().trim().is_empty() {
            return Err(PairingError::Validation(
                "both member ids are required".to_string(),
            ));
        }

        let record = self.repository.create(
            cohort_id,
            (first, second),
            PairingMechanism::ManuallyChosen,
            actor,
        )?;
        info!(cohort = %cohort_id, pairing = %record.id, actor = %actor, "pairing created");
        self.invalidate(cohort_id);
        Ok(record)
    }

    pub fn add_member(
        &self,
        cohort_id: &CohortId,
        pairing_id: &PairingId,
        member_id: &MemberId,
        actor: &MemberId,
    ) -> Result<PairingRecord, PairingError> {
        if member_id.as_str().trim().is_empty() {
            return Err(PairingError::Validation("member id is required".to_string()));
        }

        let record = self.repository.add_member(cohort_id, pairing_id, member_id)?;
        info!(
            cohort = %cohort_id,
            pairing = %record.id,
            member = %member_id,
            actor = %actor,
            "member added to pairing"
        );
        self.invalidate(cohort_id);
        Ok(record)
    }

    pub fn delete_pairing(
        &self,
        cohort_id: &CohortId,
        target: &PairingTarget,
        actor: &MemberId,
    ) -> Result<DeletionSummary, PairingError> {
        let deleted_count = match target {
            PairingTarget::Member(member_id) => {
                let record = self.repository.delete_one(cohort_id, member_id)?;
                info!(cohort = %cohort_id, pairing = %record.id, actor = %actor, "pairing deleted");
                1
            }
            PairingTarget::All => {
                let count = self.repository.delete_all(cohort_id)?;
                info!(cohort = %cohort_id, count, actor = %actor, "all pairings deleted");
                count
            }
        };

        if deleted_count > 0 {
            self.invalidate(cohort_id);
        }
        Ok(DeletionSummary { deleted_count })
    }

    pub fn pairing_detail(
        &self,
        cohort_id: &CohortId,
        member_id: &MemberId,
    ) -> Result<PairingDetail, PairingError> {
        let snapshot = self.snapshot(cohort_id)?;
        let pairing = snapshot
            .active_pairing_for(member_id)
            .cloned()
            .ok_or_else(|| PairingError::PairingNotFound(member_id.clone()))?;
        let members = pairing
            .members()
            .into_iter()
            .filter_map(|member| snapshot.profile(member, &self.config.default_timezone))
            .collect();

        Ok(PairingDetail { pairing, members })
    }

    /// Read-only; nothing is written or invalidated.
    pub fn find_matches(
        &self,
        cohort_id: &CohortId,
        member_id: &MemberId,
    ) -> Result<MatchReport, PairingError> {
        let snapshot = self.snapshot(cohort_id)?;
        let tz = &self.config.default_timezone;
        let target = snapshot
            .profile(member_id, tz)
            .ok_or_else(|| PairingError::MemberNotFound(member_id.clone()))?;
        let candidates = snapshot.unpaired_pool(Some(PartnerPreference::SystemMatch), tz);

        Ok(rank_matches(target, &candidates))
    }

    pub fn statistics(&self, cohort_id: &CohortId) -> Result<PairingStatistics, PairingError> {
        let submissions = self.store.submissions(cohort_id)?;
        Ok(PairingStatistics::from_submissions(&submissions))
    }
}

/// Error raised by the pairing workflows.
#[derive(Debug, thiserror::Error)]
pub enum PairingError {
    #[error("{0}")]
    Validation(String),
    #[error("member {0} has no registration and submission in this cohort")]
    MemberNotFound(MemberId),
    #[error("member {0} has no active pairing")]
    PairingNotFound(MemberId),
    #[error("pairing {0} not found")]
    UnknownPairing(PairingId),
    #[error("member {0} already has an active pairing")]
    Conflict(MemberId),
    #[error("not enough unpaired members to allocate ({available} available)")]
    EmptyPool { available: usize },
    #[error("persistence failure")]
    Persistence(#[source] StoreError),
}

impl From<StoreError> for PairingError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict(member) => PairingError::Conflict(member),
            other => PairingError::Persistence(other),
        }
    }
}
