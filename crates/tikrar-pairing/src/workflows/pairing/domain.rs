use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::scoring::TimeSlot;
use crate::workflows::cohort::{CohortId, MemberId, Registration, SubmissionStatus};

/// Identifier wrapper for persisted pairing records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairingId(pub String);

impl fmt::Display for PairingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a pairing came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingMechanism {
    SystemAssigned,
    ManuallyChosen,
}

impl PairingMechanism {
    pub const fn label(self) -> &'static str {
        match self {
            PairingMechanism::SystemAssigned => "system_assigned",
            PairingMechanism::ManuallyChosen => "manually_chosen",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingStatus {
    Active,
    Dissolved,
}

/// Persisted study-partner record. `first_member < second_member` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingRecord {
    pub id: PairingId,
    pub cohort_id: CohortId,
    pub first_member: MemberId,
    pub second_member: MemberId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub third_member: Option<MemberId>,
    pub mechanism: PairingMechanism,
    pub status: PairingStatus,
    pub created_by: MemberId,
    pub created_at: DateTime<Utc>,
}

impl PairingRecord {
    /// Builds an active two-member record with canonical member ordering.
    pub fn pair(
        id: PairingId,
        cohort_id: CohortId,
        members: (MemberId, MemberId),
        mechanism: PairingMechanism,
        created_by: MemberId,
        created_at: DateTime<Utc>,
    ) -> Self {
        let (first_member, second_member) = canonical_order(members.0, members.1);
        Self {
            id,
            cohort_id,
            first_member,
            second_member,
            third_member: None,
            mechanism,
            status: PairingStatus::Active,
            created_by,
            created_at,
        }
    }

    pub fn members(&self) -> Vec<&MemberId> {
        let mut members = vec![&self.first_member, &self.second_member];
        members.extend(self.third_member.as_ref());
        members
    }

    pub fn contains(&self, member_id: &MemberId) -> bool {
        self.members().into_iter().any(|member| member == member_id)
    }

    pub fn is_active(&self) -> bool {
        self.status == PairingStatus::Active
    }

    pub fn is_triad(&self) -> bool {
        self.third_member.is_some()
    }
}

pub(crate) fn canonical_order(a: MemberId, b: MemberId) -> (MemberId, MemberId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Scoring view of one member, joined from registration and latest submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateProfile {
    pub member_id: MemberId,
    pub full_name: String,
    pub timezone: String,
    pub unit: Option<String>,
    pub main_slot: Option<TimeSlot>,
    pub backup_slot: Option<TimeSlot>,
    pub status: SubmissionStatus,
}

impl CandidateProfile {
    pub fn from_registration(
        registration: &Registration,
        status: SubmissionStatus,
        default_timezone: &str,
    ) -> Self {
        Self {
            member_id: registration.member_id.clone(),
            full_name: registration.full_name.clone(),
            timezone: registration.resolved_timezone(default_timezone),
            unit: registration
                .chosen_unit
                .as_deref()
                .map(str::trim)
                .filter(|unit| !unit.is_empty())
                .map(str::to_string),
            main_slot: registration
                .main_time_slot
                .as_deref()
                .and_then(TimeSlot::parse),
            backup_slot: registration
                .backup_time_slot
                .as_deref()
                .and_then(TimeSlot::parse),
            status,
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.status.is_committed()
    }
}

/// Which pairings a delete call targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingTarget {
    Member(MemberId),
    All,
}

impl PairingTarget {
    /// The literal `all` addresses every active pairing in the cohort.
    pub fn from_path(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Member(MemberId::new(raw.trim()))
        }
    }
}
