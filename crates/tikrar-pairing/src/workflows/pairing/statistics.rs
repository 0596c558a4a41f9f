use serde::Serialize;

use crate::workflows::cohort::{
    latest_submissions, PartnerPreference, ReEnrollmentSubmission, SubmissionStatus,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub submitted: usize,
    pub approved: usize,
}

/// Unique members per partner preference, judged by each member's latest submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PairingStatistics {
    pub self_match: StatusCounts,
    pub system_match: StatusCounts,
    pub tarteel: StatusCounts,
    pub family: StatusCounts,
}

impl PairingStatistics {
    pub fn from_submissions(submissions: &[ReEnrollmentSubmission]) -> Self {
        let mut statistics = Self::default();

        for submission in latest_submissions(submissions).into_values() {
            let counts = statistics.counts_mut(submission.partner_preference);
            match submission.status {
                SubmissionStatus::Submitted => counts.submitted += 1,
                SubmissionStatus::Approved => counts.approved += 1,
                SubmissionStatus::Draft | SubmissionStatus::Rejected => {}
            }
        }

        statistics
    }

    fn counts_mut(&mut self, preference: PartnerPreference) -> &mut StatusCounts {
        match preference {
            PartnerPreference::SelfMatch => &mut self.self_match,
            PartnerPreference::SystemMatch => &mut self.system_match,
            PartnerPreference::Tarteel => &mut self.tarteel,
            PartnerPreference::Family => &mut self.family,
        }
    }

    pub fn for_preference(&self, preference: PartnerPreference) -> StatusCounts {
        match preference {
            PartnerPreference::SelfMatch => self.self_match,
            PartnerPreference::SystemMatch => self.system_match,
            PartnerPreference::Tarteel => self.tarteel,
            PartnerPreference::Family => self.family,
        }
    }

    pub fn total(&self) -> usize {
        PartnerPreference::ALL
            .into_iter()
            .map(|preference| {
                let counts = self.for_preference(preference);
                counts.submitted + counts.approved
            })
            .sum()
    }
}
