use serde::{Deserialize, Serialize};

use crate::workflows::cohort::{GroupId, MemberId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    Active,
    Inactive,
}

/// Scheduled study group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Halaqah {
    pub id: GroupId,
    pub name: String,
    /// 1 = Monday.
    pub day_of_week: Option<u8>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Unset or zero falls back to the configured default.
    pub max_seats: Option<u32>,
    pub status: GroupStatus,
    pub preferred_unit: Option<String>,
}

impl Halaqah {
    pub fn is_active(&self) -> bool {
        self.status == GroupStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterStatus {
    Active,
    Waitlisted,
    Dropped,
}

/// Direct group assignment made by staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub group_id: GroupId,
    pub member_id: MemberId,
    pub status: RosterStatus,
}

impl RosterEntry {
    /// Only active rows hold a seat.
    pub fn occupies_seat(&self) -> bool {
        self.status == RosterStatus::Active
    }
}

/// Derived occupancy for one group. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HalaqahSeatState {
    pub group_id: GroupId,
    pub name: String,
    pub day_of_week: Option<u8>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub preferred_unit: Option<String>,
    pub max_seats: u32,
    pub occupant_count: u32,
    pub occupants: Vec<MemberId>,
    pub available_seats: u32,
    pub is_full: bool,
    pub over_capacity: bool,
}
