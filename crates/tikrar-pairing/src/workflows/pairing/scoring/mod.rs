mod ranking;
mod signals;
mod tiers;

pub use ranking::{rank_candidate, RankedScore};
pub use signals::{CompatibilitySignals, TimeSlot};
pub use tiers::CompatibilityTier;

use super::domain::CandidateProfile;
use serde::Serialize;

/// Tiered verdict for one unordered pair of candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierAssessment {
    pub tier: CompatibilityTier,
    pub score: u16,
    pub signals: CompatibilitySignals,
}

/// Tiered compatibility used by the bulk allocator. `None` means the pair shares no usable slot.
///
/// Symmetric: `score_pair(a, b) == score_pair(b, a)`.
pub fn score_pair(a: &CandidateProfile, b: &CandidateProfile) -> Option<TierAssessment> {
    let signals = CompatibilitySignals::between(a, b);
    let tier = CompatibilityTier::classify(&signals)?;

    Some(TierAssessment {
        tier,
        score: tier.score(),
        signals,
    })
}
