use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for one enrollment cycle ("batch").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CohortId(pub String);

/// Opaque participant identifier. Ordering is lexicographic, which pairing records rely on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(pub String);

/// Identifier of a scheduled halaqah.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub String);

macro_rules! display_id {
    ($($name:ident),*) => {
        $(
            impl $name {
                pub fn new(value: impl Into<String>) -> Self {
                    Self(value.into())
                }

                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )*
    };
}

display_id!(CohortId, MemberId, GroupId);

/// Raised when a stored label does not map onto a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Lifecycle of a re-enrollment submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionStatus::Draft => "draft",
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    /// Submitted and approved rows make a member eligible and occupy seats. Drafts never do.
    pub const fn is_committed(self) -> bool {
        matches!(self, SubmissionStatus::Submitted | SubmissionStatus::Approved)
    }

    pub fn parse(value: &str) -> Result<Self, UnknownVariant> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "submitted" => Ok(Self::Submitted),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(UnknownVariant {
                kind: "submission status",
                value: other.to_string(),
            }),
        }
    }
}

/// How a member asked to be partnered during re-enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerPreference {
    /// Member brought their own partner.
    SelfMatch,
    /// Member wants staff or the allocator to find a partner.
    SystemMatch,
    Tarteel,
    Family,
}

impl PartnerPreference {
    pub const ALL: [PartnerPreference; 4] = [
        PartnerPreference::SelfMatch,
        PartnerPreference::SystemMatch,
        PartnerPreference::Tarteel,
        PartnerPreference::Family,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            PartnerPreference::SelfMatch => "self_match",
            PartnerPreference::SystemMatch => "system_match",
            PartnerPreference::Tarteel => "tarteel",
            PartnerPreference::Family => "family",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownVariant> {
        match value.trim().to_ascii_lowercase().as_str() {
            "self_match" => Ok(Self::SelfMatch),
            "system_match" => Ok(Self::SystemMatch),
            "tarteel" => Ok(Self::Tarteel),
            "family" => Ok(Self::Family),
            other => Err(UnknownVariant {
                kind: "partner preference",
                value: other.to_string(),
            }),
        }
    }
}

/// Registration row joined with the account fields the scorer needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub cohort_id: CohortId,
    pub member_id: MemberId,
    pub full_name: String,
    /// Zone picked on the registration form.
    pub timezone: Option<String>,
    /// Zone stored on the member's account profile.
    pub account_timezone: Option<String>,
    pub chosen_unit: Option<String>,
    pub main_time_slot: Option<String>,
    pub backup_time_slot: Option<String>,
}

impl Registration {
    /// Registration zone, then account zone, then the configured default.
    pub fn resolved_timezone(&self, default_timezone: &str) -> String {
        [self.timezone.as_deref(), self.account_timezone.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|zone| !zone.is_empty())
            .unwrap_or(default_timezone)
            .to_string()
    }
}

/// Re-enrollment ("daftar ulang") submission for one member in one cohort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReEnrollmentSubmission {
    pub cohort_id: CohortId,
    pub member_id: MemberId,
    pub status: SubmissionStatus,
    pub partner_preference: PartnerPreference,
    /// Pairing-status flag maintained by the pairing repository.
    pub paired: bool,
    pub exam_group_id: Option<GroupId>,
    pub review_group_id: Option<GroupId>,
    /// General review track; the review group then does not hold a seat.
    pub general_review: bool,
    pub submitted_at: DateTime<Utc>,
}

impl ReEnrollmentSubmission {
    /// Groups this submission occupies a seat in. A group chosen for both slots appears once.
    pub fn referenced_groups(&self) -> BTreeSet<GroupId> {
        let review = if self.general_review {
            None
        } else {
            self.review_group_id.clone()
        };

        self.exam_group_id.clone().into_iter().chain(review).collect()
    }
}

/// Most recent submission per member. Later `submitted_at` wins; on a tie the later row wins.
pub fn latest_submissions(
    submissions: &[ReEnrollmentSubmission],
) -> BTreeMap<MemberId, &ReEnrollmentSubmission> {
    let mut latest: BTreeMap<MemberId, &ReEnrollmentSubmission> = BTreeMap::new();
    for submission in submissions {
        let newer = latest
            .get(&submission.member_id)
            .map_or(true, |current| current.submitted_at <= submission.submitted_at);
        if newer {
            latest.insert(submission.member_id.clone(), submission);
        }
    }
    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn submission(member: &str, status: SubmissionStatus, minute: u32) -> ReEnrollmentSubmission {
        ReEnrollmentSubmission {
            cohort_id: CohortId::new("batch-2"),
            member_id: MemberId::new(member),
            status,
            partner_preference: PartnerPreference::SystemMatch,
            paired: false,
            exam_group_id: Some(GroupId::new("h-1")),
            review_group_id: Some(GroupId::new("h-1")),
            general_review: false,
            submitted_at: Utc
                .with_ymd_and_hms(2025, 1, 10, 8, minute, 0)
                .single()
                .expect("valid timestamp"),
        }
    }

    #[test]
    fn referenced_groups_collapse_duplicate_slots() {
        let row = submission("m-1", SubmissionStatus::Submitted, 0);
        let groups = row.referenced_groups();
        assert_eq!(groups.len(), 1);
        assert!(groups.contains(&GroupId::new("h-1")));
    }

    #[test]
    fn general_review_does_not_reference_review_group() {
        let mut row = submission("m-1", SubmissionStatus::Submitted, 0);
        row.review_group_id = Some(GroupId::new("h-2"));
        row.general_review = true;
        let groups: Vec<_> = row.referenced_groups().into_iter().collect();
        assert_eq!(groups, vec![GroupId::new("h-1")]);
    }

    #[test]
    fn latest_submission_wins_per_member() {
        let rows = vec![
            submission("m-1", SubmissionStatus::Draft, 5),
            submission("m-1", SubmissionStatus::Approved, 1),
            submission("m-2", SubmissionStatus::Submitted, 2),
        ];
        let latest = latest_submissions(&rows);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[&MemberId::new("m-1")].status, SubmissionStatus::Draft);
    }

    #[test]
    fn timezone_falls_back_to_account_then_default() {
        let mut registration = Registration {
            cohort_id: CohortId::new("batch-2"),
            member_id: MemberId::new("m-1"),
            full_name: "Aisyah".to_string(),
            timezone: Some("  ".to_string()),
            account_timezone: Some("WITA".to_string()),
            chosen_unit: Some("30A".to_string()),
            main_time_slot: None,
            backup_time_slot: None,
        };
        assert_eq!(registration.resolved_timezone("WIB"), "WITA");
        registration.account_timezone = None;
        assert_eq!(registration.resolved_timezone("WIB"), "WIB");
        registration.timezone = Some("WIT".to_string());
        assert_eq!(registration.resolved_timezone("WIB"), "WIT");
    }

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!(
            SubmissionStatus::parse(" Approved ").expect("known"),
            SubmissionStatus::Approved
        );
        assert_eq!(
            PartnerPreference::parse("SYSTEM_MATCH").expect("known"),
            PartnerPreference::SystemMatch
        );
        let error = PartnerPreference::parse("cousin").expect_err("unknown");
        assert_eq!(error.to_string(), "unknown partner preference 'cousin'");
    }
}
