use serde::Serialize;

use super::domain::CandidateProfile;
use super::scoring::{rank_candidate, CompatibilitySignals, TimeSlot};
use crate::workflows::cohort::MemberId;

/// Presentation band for an additive match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchBand {
    Perfect,
    SameZone,
    SameUnit,
    Cross,
}

impl MatchBand {
    pub const fn from_score(score: u16) -> Self {
        match score {
            100.. => MatchBand::Perfect,
            80..=99 => MatchBand::SameZone,
            60..=79 => MatchBand::SameUnit,
            _ => MatchBand::Cross,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchCandidate {
    pub member_id: MemberId,
    pub full_name: String,
    pub timezone: String,
    pub unit: Option<String>,
    pub main_slot: Option<TimeSlot>,
    pub backup_slot: Option<TimeSlot>,
    pub score: u16,
    pub signals: CompatibilitySignals,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchBands {
    pub perfect: Vec<MatchCandidate>,
    pub same_zone: Vec<MatchCandidate>,
    pub same_unit: Vec<MatchCandidate>,
    pub cross: Vec<MatchCandidate>,
}

impl MatchBands {
    fn bucket_mut(&mut self, band: MatchBand) -> &mut Vec<MatchCandidate> {
        match band {
            MatchBand::Perfect => &mut self.perfect,
            MatchBand::SameZone => &mut self.same_zone,
            MatchBand::SameUnit => &mut self.same_unit,
            MatchBand::Cross => &mut self.cross,
        }
    }

    pub fn len(&self) -> usize {
        self.perfect.len() + self.same_zone.len() + self.same_unit.len() + self.cross.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Advisory, read-only candidate list for one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchReport {
    pub target: CandidateProfile,
    pub bands: MatchBands,
    pub total_matches: usize,
}

/// Ranks every candidate against `target`; the target itself is skipped if present.
pub fn rank_matches(target: CandidateProfile, candidates: &[CandidateProfile]) -> MatchReport {
    let mut ranked: Vec<MatchCandidate> = candidates
        .iter()
        .filter(|candidate| candidate.member_id != target.member_id)
        .map(|candidate| {
            let ranked = rank_candidate(&target, candidate);
            MatchCandidate {
                member_id: candidate.member_id.clone(),
                full_name: candidate.full_name.clone(),
                timezone: candidate.timezone.clone(),
                unit: candidate.unit.clone(),
                main_slot: candidate.main_slot,
                backup_slot: candidate.backup_slot,
                score: ranked.score,
                signals: ranked.signals,
                reasons: ranked.reasons,
            }
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.member_id.cmp(&b.member_id))
    });

    let total_matches = ranked.len();
    let mut bands = MatchBands::default();
    for candidate in ranked {
        bands
            .bucket_mut(MatchBand::from_score(candidate.score))
            .push(candidate);
    }

    MatchReport {
        target,
        bands,
        total_matches,
    }
}
