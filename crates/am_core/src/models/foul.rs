//! Foul taxonomy and the rulebook's penalty progression.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::match_setup::PlayerId;

/// Fouls and violations defined in the rulebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoulKind {
    DelayOfGame,
    ExcessiveContact,
    IllegalFootThrust,
    Encroachment,
    IllegalSubstitution,
    ImproperPositioning,
    ReentryAfterElimination,
    UnsportsmanlikeConduct,
    IntentionalFoul,
    EquipmentTampering,
}

impl FoulKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            FoulKind::DelayOfGame => "Delay of Game",
            FoulKind::ExcessiveContact => "Excessive Contact",
            FoulKind::IllegalFootThrust => "Illegal Foot Thrust",
            FoulKind::Encroachment => "Encroachment",
            FoulKind::IllegalSubstitution => "Illegal Substitution",
            FoulKind::ImproperPositioning => "Improper Positioning",
            FoulKind::ReentryAfterElimination => "Reentry After Elimination",
            FoulKind::UnsportsmanlikeConduct => "Unsportsmanlike Conduct",
            FoulKind::IntentionalFoul => "Intentional Foul",
            FoulKind::EquipmentTampering => "Equipment Tampering",
        }
    }
}

/// What a foul costs. The engine only moves AP itself; bout/round loss and
/// disqualification are surfaced for the officials to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyAction {
    Warning,
    ApDeduction,
    BoutLoss,
    RoundLoss,
    Disqualification,
}

/// Penalty progression per foul kind, keyed by occurrence number.
/// The highest defined occurrence at or below the actual count applies.
static FOUL_PENALTIES: Lazy<HashMap<FoulKind, Vec<(u8, PenaltyAction, u32)>>> =
    Lazy::new(|| {
        use FoulKind::*;
        use PenaltyAction::*;
        HashMap::from([
            (DelayOfGame, vec![(1, Warning, 0), (2, ApDeduction, 1)]),
            (ExcessiveContact, vec![(1, Warning, 0), (2, ApDeduction, 3)]),
            (IllegalFootThrust, vec![(1, BoutLoss, 0)]),
            (Encroachment, vec![(1, BoutLoss, 0)]),
            (IllegalSubstitution, vec![(1, RoundLoss, 0)]),
            (ImproperPositioning, vec![(1, RoundLoss, 0)]),
            (
                ReentryAfterElimination,
                vec![(1, RoundLoss, 0), (2, ApDeduction, 3), (3, Disqualification, 0)],
            ),
            (
                UnsportsmanlikeConduct,
                vec![(1, Warning, 0), (2, ApDeduction, 3), (3, Disqualification, 0)],
            ),
            (IntentionalFoul, vec![(1, Disqualification, 0)]),
            (EquipmentTampering, vec![(1, Disqualification, 0)]),
        ])
    });

/// Look up the penalty for the nth occurrence of a foul.
pub fn penalty_for(kind: FoulKind, occurrence: u8) -> (PenaltyAction, u32) {
    let progression = &FOUL_PENALTIES[&kind];
    let mut applicable = (PenaltyAction::Warning, 0);
    for &(occ, action, deduction) in progression {
        if occ <= occurrence.max(1) {
            applicable = (action, deduction);
        }
    }
    applicable
}

/// Append-only audit record of one penalty.
///
/// `requested_deduction` is what the progression (or the master's override)
/// asked for; `deducted` is what actually came off after the zero clamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyRecord {
    pub participant: PlayerId,
    pub kind: FoulKind,
    pub action: PenaltyAction,
    pub occurrence: u8,
    pub requested_deduction: u32,
    pub deducted: u32,
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}
