use std::collections::{BTreeMap, BTreeSet};

use super::domain::{Halaqah, HalaqahSeatState, RosterEntry};
use crate::workflows::cohort::{GroupId, MemberId, ReEnrollmentSubmission};

/// Unions submission and roster occupants per group, counting each member once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalaqahCapacityAccountant {
    default_max_seats: u32,
}

impl HalaqahCapacityAccountant {
    pub fn new(default_max_seats: u32) -> Self {
        Self { default_max_seats }
    }

    fn occupants(
        submissions: &[ReEnrollmentSubmission],
        roster: &[RosterEntry],
        viewer: Option<&MemberId>,
    ) -> BTreeMap<GroupId, BTreeSet<MemberId>> {
        let not_viewer = |member: &MemberId| viewer.map_or(true, |viewer| viewer != member);
        let mut occupants: BTreeMap<GroupId, BTreeSet<MemberId>> = BTreeMap::new();

        for submission in submissions
            .iter()
            .filter(|row| row.status.is_committed() && not_viewer(&row.member_id))
        {
            for group in submission.referenced_groups() {
                occupants
                    .entry(group)
                    .or_default()
                    .insert(submission.member_id.clone());
            }
        }

        for entry in roster
            .iter()
            .filter(|row| row.occupies_seat() && not_viewer(&row.member_id))
        {
            occupants
                .entry(entry.group_id.clone())
                .or_default()
                .insert(entry.member_id.clone());
        }

        occupants
    }

    /// Seat state for every active group, ordered by day of week then group id.
    ///
    /// `viewer` is left out of every count so members browsing groups do not see their own seat.
    pub fn seat_states(
        &self,
        groups: &[Halaqah],
        submissions: &[ReEnrollmentSubmission],
        roster: &[RosterEntry],
        viewer: Option<&MemberId>,
    ) -> Vec<HalaqahSeatState> {
        let mut occupants = Self::occupants(submissions, roster, viewer);
        let mut active: Vec<&Halaqah> = groups.iter().filter(|group| group.is_active()).collect();
        active.sort_by_key(|group| (group.day_of_week.unwrap_or(u8::MAX), group.id.clone()));

        active
            .into_iter()
            .map(|group| {
                let members = occupants.remove(&group.id).unwrap_or_default();
                let max_seats = group
                    .max_seats
                    .filter(|seats| *seats > 0)
                    .unwrap_or(self.default_max_seats);
                let occupant_count = u32::try_from(members.len()).unwrap_or(u32::MAX);

                HalaqahSeatState {
                    group_id: group.id.clone(),
                    name: group.name.clone(),
                    day_of_week: group.day_of_week,
                    start_time: group.start_time.clone(),
                    end_time: group.end_time.clone(),
                    preferred_unit: group.preferred_unit.clone(),
                    max_seats,
                    occupant_count,
                    occupants: members.into_iter().collect(),
                    available_seats: max_seats.saturating_sub(occupant_count),
                    is_full: occupant_count >= max_seats,
                    over_capacity: occupant_count > max_seats,
                }
            })
            .collect()
    }
}
