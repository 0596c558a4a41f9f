use std::fmt;

use serde::{Serialize, Serializer};

use super::super::domain::CandidateProfile;

/// Whole-hour study window encoded as `HH-HH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSlot {
    start: u8,
    end: u8,
}

impl TimeSlot {
    /// Parses `HH-HH`. Blank, `N/A`, reversed, or out-of-range codes yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (start, end) = raw.trim().split_once('-')?;
        let start = start.trim().parse::<u8>().ok()?;
        let end = end.trim().parse::<u8>().ok()?;

        (start < end && end <= 24).then_some(Self { start, end })
    }

    pub fn start(&self) -> u8 {
        self.start
    }

    pub fn end(&self) -> u8 {
        self.end
    }

    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.start, self.end)
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn overlaps(a: Option<TimeSlot>, b: Option<TimeSlot>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.overlaps(&b),
        _ => false,
    }
}

/// The three compatibility predicates, with the time predicate split into main and backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CompatibilitySignals {
    pub same_zone: bool,
    pub same_unit: bool,
    pub main_overlap: bool,
    /// Any cross combination involving a backup slot. Primary vs primary is not part of it.
    pub backup_overlap: bool,
}

impl CompatibilitySignals {
    pub fn between(a: &CandidateProfile, b: &CandidateProfile) -> Self {
        let same_unit = matches!((&a.unit, &b.unit), (Some(left), Some(right)) if left == right);
        let backup_overlap = overlaps(a.main_slot, b.backup_slot)
            || overlaps(a.backup_slot, b.main_slot)
            || overlaps(a.backup_slot, b.backup_slot);

        Self {
            same_zone: a.timezone == b.timezone,
            same_unit,
            main_overlap: overlaps(a.main_slot, b.main_slot),
            backup_overlap,
        }
    }

    pub fn any_overlap(&self) -> bool {
        self.main_overlap || self.backup_overlap
    }
}
