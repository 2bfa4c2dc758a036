//! Foul penalty processing - occurrence tracking and penalty assessment.
//!
//! Assessment is split from commitment so the state machine can persist the
//! audit record before any counter moves: `assess` is pure, `commit` applies.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::foul::{penalty_for, FoulKind, PenaltyAction};
use crate::models::match_setup::PlayerId;

/// What the rulebook says this foul costs, before it is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenaltyAssessment {
    pub participant: PlayerId,
    pub kind: FoulKind,
    pub action: PenaltyAction,
    /// Occurrence number this foul will become once committed.
    pub occurrence: u8,
    /// AP the progression (or an explicit override) asks to deduct.
    pub requested_deduction: u32,
}

impl PenaltyAssessment {
    pub fn is_disqualification(&self) -> bool {
        self.action == PenaltyAction::Disqualification
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FoulPenaltyProcessor {
    counts: HashMap<PlayerId, HashMap<FoulKind, u8>>,
    disqualified: HashSet<PlayerId>,
}

impl FoulPenaltyProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Determine the penalty for the next occurrence of this foul.
    /// Does not mutate anything.
    pub fn assess(
        &self,
        participant: PlayerId,
        kind: FoulKind,
        override_deduction: Option<u32>,
    ) -> PenaltyAssessment {
        let occurrence = self.occurrence_count(participant, kind) + 1;
        let (action, deduction) = penalty_for(kind, occurrence);
        PenaltyAssessment {
            participant,
            kind,
            action,
            occurrence,
            requested_deduction: override_deduction.unwrap_or(deduction),
        }
    }

    /// Record a previously assessed foul as committed.
    pub fn commit(&mut self, assessment: &PenaltyAssessment) {
        *self
            .counts
            .entry(assessment.participant)
            .or_default()
            .entry(assessment.kind)
            .or_insert(0) = assessment.occurrence;
        if assessment.is_disqualification() {
            self.disqualified.insert(assessment.participant);
        }
    }

    pub fn occurrence_count(&self, participant: PlayerId, kind: FoulKind) -> u8 {
        self.counts
            .get(&participant)
            .and_then(|per_kind| per_kind.get(&kind))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_fouls(&self, participant: PlayerId) -> u32 {
        self.counts
            .get(&participant)
            .map(|per_kind| per_kind.values().map(|&c| c as u32).sum())
            .unwrap_or(0)
    }

    pub fn is_disqualified(&self, participant: PlayerId) -> bool {
        self.disqualified.contains(&participant)
    }

    pub fn reset(&mut self) {
        self.counts.clear();
        self.disqualified.clear();
    }
}
