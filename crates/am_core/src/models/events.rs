//! Engine events - the typed fan-out surface.
//!
//! Everything a subscriber (console panel, audience display, exporter) can
//! observe is one of these variants. Payloads are full records, never maps.

use serde::{Deserialize, Serialize};

use super::bout::CallType;
use super::foul::{FoulKind, PenaltyAction};
use super::match_setup::{PlayerId, TeamSide};
use super::snapshot::{
    DiscrepancyReport, FinalResult, RoundWinner, ScoreSnapshot, TimerReading,
};
use crate::engine::MatchPhase;

/// Bout details as broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoutDetail {
    pub round: u8,
    pub sequence: u32,
    pub call: CallType,
    pub winner: PlayerId,
    pub loser: PlayerId,
}

/// Foul details as broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoulDetail {
    pub participant: PlayerId,
    pub kind: FoulKind,
    pub action: PenaltyAction,
    pub occurrence: u8,
    pub ap_deducted: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    StateChanged { phase: MatchPhase },
    RoundStarted { round: u8 },
    RoundEnded { round: u8, winner: RoundWinner },
    BoutRecorded { detail: BoutDetail },
    BoutUndone { detail: BoutDetail },
    ScoreUpdated { snapshot: ScoreSnapshot },
    PlayerEliminated { participant: PlayerId, side: TeamSide, bonus: u32 },
    FoulApplied { detail: FoulDetail },
    SubstitutionMade { side: TeamSide, out: PlayerId, into: PlayerId },
    /// No bout activity for the inactivity limit. The officiator decides
    /// the consequence; the engine only reports.
    PauseViolation { side_hint: Option<TeamSide> },
    TimerTick { reading: TimerReading },
    /// Countdown crossed a warning threshold (seconds remaining).
    TimeWarning { seconds_left: u32 },
    /// Fixed-duration round ran out. Ending the round stays an explicit call.
    RoundExpired { round: u8 },
    DiscrepancyDetected { report: DiscrepancyReport },
    MatchCompleted { result: FinalResult },
}

impl EngineEvent {
    /// Short tag for logging and timeline entries.
    pub fn label(&self) -> &'static str {
        match self {
            EngineEvent::StateChanged { .. } => "state_changed",
            EngineEvent::RoundStarted { .. } => "round_started",
            EngineEvent::RoundEnded { .. } => "round_ended",
            EngineEvent::BoutRecorded { .. } => "bout_recorded",
            EngineEvent::BoutUndone { .. } => "bout_undone",
            EngineEvent::ScoreUpdated { .. } => "score_updated",
            EngineEvent::PlayerEliminated { .. } => "player_eliminated",
            EngineEvent::FoulApplied { .. } => "foul_applied",
            EngineEvent::SubstitutionMade { .. } => "substitution_made",
            EngineEvent::PauseViolation { .. } => "pause_violation",
            EngineEvent::TimerTick { .. } => "timer_tick",
            EngineEvent::TimeWarning { .. } => "time_warning",
            EngineEvent::RoundExpired { .. } => "round_expired",
            EngineEvent::DiscrepancyDetected { .. } => "discrepancy_detected",
            EngineEvent::MatchCompleted { .. } => "match_completed",
        }
    }
}
