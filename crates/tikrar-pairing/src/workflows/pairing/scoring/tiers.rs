use serde::Serialize;

use super::signals::CompatibilitySignals;

/// Allocation priority. Declaration order is tier order, so `Ord` sorts tier 1 first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityTier {
    ZoneMainSameUnit,
    ZoneMainOtherUnit,
    ZoneBackupSameUnit,
    ZoneBackupOtherUnit,
    CrossZoneMainSameUnit,
    CrossZoneMainOtherUnit,
    CrossZoneBackupSameUnit,
    CrossZoneBackupOtherUnit,
}

impl CompatibilityTier {
    pub const ALL: [CompatibilityTier; 8] = [
        CompatibilityTier::ZoneMainSameUnit,
        CompatibilityTier::ZoneMainOtherUnit,
        CompatibilityTier::ZoneBackupSameUnit,
        CompatibilityTier::ZoneBackupOtherUnit,
        CompatibilityTier::CrossZoneMainSameUnit,
        CompatibilityTier::CrossZoneMainOtherUnit,
        CompatibilityTier::CrossZoneBackupSameUnit,
        CompatibilityTier::CrossZoneBackupOtherUnit,
    ];

    /// First matching row of the priority table wins; the order is policy.
    pub fn classify(signals: &CompatibilitySignals) -> Option<Self> {
        if !signals.any_overlap() {
            return None;
        }

        let tier = match (signals.same_zone, signals.main_overlap, signals.same_unit) {
            (true, true, true) => CompatibilityTier::ZoneMainSameUnit,
            (true, true, false) => CompatibilityTier::ZoneMainOtherUnit,
            (true, false, true) => CompatibilityTier::ZoneBackupSameUnit,
            (true, false, false) => CompatibilityTier::ZoneBackupOtherUnit,
            (false, true, true) => CompatibilityTier::CrossZoneMainSameUnit,
            (false, true, false) => CompatibilityTier::CrossZoneMainOtherUnit,
            (false, false, true) => CompatibilityTier::CrossZoneBackupSameUnit,
            (false, false, false) => CompatibilityTier::CrossZoneBackupOtherUnit,
        };

        Some(tier)
    }

    /// 1-based tier number.
    pub const fn rank(self) -> u8 {
        match self {
            CompatibilityTier::ZoneMainSameUnit => 1,
            CompatibilityTier::ZoneMainOtherUnit => 2,
            CompatibilityTier::ZoneBackupSameUnit => 3,
            CompatibilityTier::ZoneBackupOtherUnit => 4,
            CompatibilityTier::CrossZoneMainSameUnit => 5,
            CompatibilityTier::CrossZoneMainOtherUnit => 6,
            CompatibilityTier::CrossZoneBackupSameUnit => 7,
            CompatibilityTier::CrossZoneBackupOtherUnit => 8,
        }
    }

    pub const fn score(self) -> u16 {
        match self {
            CompatibilityTier::ZoneMainSameUnit => 150,
            CompatibilityTier::ZoneMainOtherUnit => 100,
            CompatibilityTier::ZoneBackupSameUnit => 85,
            CompatibilityTier::ZoneBackupOtherUnit => 70,
            CompatibilityTier::CrossZoneMainSameUnit => 60,
            CompatibilityTier::CrossZoneMainOtherUnit => 40,
            CompatibilityTier::CrossZoneBackupSameUnit => 30,
            CompatibilityTier::CrossZoneBackupOtherUnit => 20,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            CompatibilityTier::ZoneMainSameUnit => "Priority 1: same zone + main slot + same unit",
            CompatibilityTier::ZoneMainOtherUnit => {
                "Priority 2: same zone + main slot + different unit"
            }
            CompatibilityTier::ZoneBackupSameUnit => {
                "Priority 3: same zone + backup slot + same unit"
            }
            CompatibilityTier::ZoneBackupOtherUnit => {
                "Priority 4: same zone + backup slot + different unit"
            }
            CompatibilityTier::CrossZoneMainSameUnit => {
                "Priority 5: cross zone + main slot + same unit"
            }
            CompatibilityTier::CrossZoneMainOtherUnit => {
                "Priority 6: cross zone + main slot + different unit"
            }
            CompatibilityTier::CrossZoneBackupSameUnit => {
                "Priority 7: cross zone + backup slot + same unit"
            }
            CompatibilityTier::CrossZoneBackupOtherUnit => {
                "Priority 8: cross zone + backup slot + different unit"
            }
        }
    }
}
