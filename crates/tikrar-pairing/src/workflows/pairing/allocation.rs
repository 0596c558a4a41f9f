use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::domain::{canonical_order, CandidateProfile};
use super::scoring::{score_pair, CompatibilityTier, TierAssessment};
use crate::workflows::cohort::MemberId;

/// One feasible, scored candidate pair. `first < second`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredPair {
    pub first: MemberId,
    pub second: MemberId,
    #[serde(flatten)]
    pub assessment: TierAssessment,
}

impl ScoredPair {
    pub fn tier(&self) -> CompatibilityTier {
        self.assessment.tier
    }
}

/// Reorders a tier bucket before greedy selection.
pub trait PairShuffler: Send {
    fn shuffle(&mut self, bucket: &mut [ScoredPair]);
}

/// Uniform shuffle over any `rand` generator.
pub struct RandomShuffler<R> {
    rng: R,
}

impl<R: Rng> RandomShuffler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomShuffler<StdRng> {
    /// Same seed and same pool always yield the same allocation.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng + Send> PairShuffler for RandomShuffler<R> {
    fn shuffle(&mut self, bucket: &mut [ScoredPair]) {
        bucket.shuffle(&mut self.rng);
    }
}

/// Leaves buckets in enumeration order.
#[derive(Debug, Default, Clone, Copy)]
pub struct PreserveOrder;

impl PairShuffler for PreserveOrder {
    fn shuffle(&mut self, _bucket: &mut [ScoredPair]) {}
}

/// Pure allocation result, before anything is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AllocationPlan {
    pub pairs: Vec<ScoredPair>,
    pub unpaired: Vec<MemberId>,
}

#[derive(Debug, Default)]
struct AllocationState {
    claimed: BTreeSet<MemberId>,
    selected: Vec<ScoredPair>,
}

impl AllocationState {
    fn consider(mut self, pair: ScoredPair) -> Self {
        if self.claimed.contains(&pair.first) || self.claimed.contains(&pair.second) {
            return self;
        }
        self.claimed.insert(pair.first.clone());
        self.claimed.insert(pair.second.clone());
        self.selected.push(pair);
        self
    }
}

/// Every feasible unordered pair grouped by tier. Enumeration follows member-id order.
pub fn tier_buckets(pool: &[CandidateProfile]) -> BTreeMap<CompatibilityTier, Vec<ScoredPair>> {
    let mut ordered: Vec<&CandidateProfile> = pool.iter().collect();
    ordered.sort_by(|a, b| a.member_id.cmp(&b.member_id));

    let mut buckets: BTreeMap<CompatibilityTier, Vec<ScoredPair>> = BTreeMap::new();
    for (index, left) in ordered.iter().enumerate() {
        for right in &ordered[index + 1..] {
            if left.member_id == right.member_id {
                continue;
            }
            if let Some(assessment) = score_pair(left, right) {
                let (first, second) =
                    canonical_order(left.member_id.clone(), right.member_id.clone());
                buckets.entry(assessment.tier).or_default().push(ScoredPair {
                    first,
                    second,
                    assessment,
                });
            }
        }
    }
    buckets
}

/// Greedy tier-priority allocation. Tier 1 is exhausted before tier 2 is looked at, and so on.
pub fn plan_allocation(
    pool: &[CandidateProfile],
    shuffler: &mut dyn PairShuffler,
) -> AllocationPlan {
    let state = tier_buckets(pool)
        .into_values()
        .fold(AllocationState::default(), |state, mut bucket| {
            shuffler.shuffle(&mut bucket);
            bucket.into_iter().fold(state, AllocationState::consider)
        });

    let unpaired: BTreeSet<MemberId> = pool
        .iter()
        .map(|profile| profile.member_id.clone())
        .filter(|member_id| !state.claimed.contains(member_id))
        .collect();

    AllocationPlan {
        pairs: state.selected,
        unpaired: unpaired.into_iter().collect(),
    }
}
