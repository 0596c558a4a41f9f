use serde::Serialize;

use super::super::domain::CandidateProfile;
use super::signals::CompatibilitySignals;

const SAME_ZONE_POINTS: u16 = 50;
const SAME_UNIT_POINTS: u16 = 50;
const SLOT_OVERLAP_POINTS: u16 = 10;

/// Additive score shown to staff when browsing candidates for one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedScore {
    pub score: u16,
    pub signals: CompatibilitySignals,
    pub reasons: Vec<String>,
}

/// Sorting score for manual review. Independent of the allocator tiers.
pub fn rank_candidate(target: &CandidateProfile, candidate: &CandidateProfile) -> RankedScore {
    let signals = CompatibilitySignals::between(target, candidate);
    let mut score = 0;
    let mut reasons = Vec::new();

    if signals.same_zone {
        score += SAME_ZONE_POINTS;
        reasons.push(format!("same timezone: {}", target.timezone));
    }

    if signals.same_unit {
        score += SAME_UNIT_POINTS;
        if let Some(unit) = &target.unit {
            reasons.push(format!("same unit: {unit}"));
        }
    }

    if signals.any_overlap() {
        score += SLOT_OVERLAP_POINTS;
    }

    if signals.main_overlap {
        reasons.push("main slot overlaps".to_string());
    } else if signals.backup_overlap {
        reasons.push("backup slot overlaps".to_string());
    }

    RankedScore {
        score,
        signals,
        reasons,
    }
}
