//! Study-partner pairing: compatibility scoring, tier-priority bulk allocation, the pairing
//! repository with its status-flag cascade, and the advisory match finder.

pub mod allocation;
pub mod domain;
pub mod matching;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub(crate) mod snapshot;
pub mod statistics;

#[cfg(test)]
mod tests;

pub use allocation::{
    plan_allocation, AllocationPlan, PairShuffler, PreserveOrder, RandomShuffler, ScoredPair,
};
pub use domain::{
    CandidateProfile, PairingId, PairingMechanism, PairingRecord, PairingStatus, PairingTarget,
};
pub use matching::{MatchBand, MatchBands, MatchCandidate, MatchReport};
pub use repository::PairingRepository;
pub use router::{pairing_router, PairingRouterState};
pub use scoring::{score_pair, CompatibilitySignals, CompatibilityTier, TierAssessment, TimeSlot};
pub use service::{
    BulkAllocationReport, DeletionSummary, PairAnalysis, PairingDetail, PairingError,
    PairingService,
};
pub use statistics::{PairingStatistics, StatusCounts};
