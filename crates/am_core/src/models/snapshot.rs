//! Score and match snapshots - the typed payloads every subscriber sees.
//!
//! Snapshots are the SINK of the engine: each accepted command produces a
//! fresh `ScoreSnapshot`, and `MatchSnapshot` is what gets persisted and
//! handed to the export collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::foul::PenaltyRecord;
use super::match_setup::{GameMode, PlayerId, TeamSide};
use super::official::OfficialAssignment;
use crate::engine::MatchPhase;

/// Per-side counters. `round_ap` resets at each round start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SideScore {
    pub ap: u32,
    pub opa_wins: u32,
    pub oshi_wins: u32,
    pub round_ap: u32,
    pub round_opa: u32,
    pub round_oshi: u32,
}

/// One round's AP per side, as a recorder tallies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RoundTally {
    pub home_ap: u32,
    pub away_ap: u32,
}

/// What the timer reports, depending on the round-completion strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerReading {
    /// Head-to-head: wall-clock countdown.
    Countdown { remaining_ms: u64 },
    /// Team mode: bouts completed out of the active roster cycle.
    CycleProgress { completed: u32, target: u32 },
}

/// Round (or match) outcome. Equal AP is a declared tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundWinner {
    Home,
    Away,
    Tie,
}

impl RoundWinner {
    pub fn from_tally(tally: RoundTally) -> Self {
        if tally.home_ap > tally.away_ap {
            RoundWinner::Home
        } else if tally.away_ap > tally.home_ap {
            RoundWinner::Away
        } else {
            RoundWinner::Tie
        }
    }

    pub fn side(&self) -> Option<TeamSide> {
        match self {
            RoundWinner::Home => Some(TeamSide::Home),
            RoundWinner::Away => Some(TeamSide::Away),
            RoundWinner::Tie => None,
        }
    }
}

/// A player removed from the queue, with the bonus credited to the opponent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EliminationEntry {
    pub round: u8,
    pub participant: PlayerId,
    pub side: TeamSide,
    pub bonus_awarded: u32,
    /// Disqualifications remove a player without an elimination bonus.
    pub by_disqualification: bool,
}

/// Closed-round summary, one per finalized round. Feeds the scoresheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub number: u8,
    pub home: SideScore,
    pub away: SideScore,
    pub bout_count: u32,
    pub winner: RoundWinner,
}

/// Raised when the independent tallies cannot be reconciled automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscrepancyReport {
    pub round: u8,
    pub recorder_a: Option<RoundTally>,
    pub recorder_b: Option<RoundTally>,
    /// The master ledger's own per-round tally, for the review.
    pub ledger: RoundTally,
}

/// Final match outcome: cumulative AP first, rounds won as the tie-break,
/// otherwise a declared tie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    pub winner: RoundWinner,
    pub home_ap: u32,
    pub away_ap: u32,
    pub home_rounds_won: u8,
    pub away_rounds_won: u8,
    pub rounds_played: u8,
}

/// The live snapshot emitted after every scoring event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub match_id: Uuid,
    pub mode: GameMode,
    pub phase: MatchPhase,
    pub current_round: u8,
    pub total_rounds: u8,
    /// Bouts recorded in the current round.
    pub bout_count: u32,
    pub home_name: String,
    pub away_name: String,
    pub home: SideScore,
    pub away: SideScore,
    pub timer: TimerReading,
    /// Active roster sizes (team mode only).
    pub home_remaining: Option<u8>,
    pub away_remaining: Option<u8>,
    pub home_substitutions_used: u8,
    pub away_substitutions_used: u8,
}

/// The full persisted/exported view of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub match_id: Uuid,
    pub mode: GameMode,
    pub phase: MatchPhase,
    pub total_rounds: u8,
    pub officials: Vec<OfficialAssignment>,
    pub score: ScoreSnapshot,
    pub rounds: Vec<RoundSummary>,
    pub penalties: Vec<PenaltyRecord>,
    pub eliminations: Vec<EliminationEntry>,
    pub protest_reason: Option<String>,
    pub result: Option<FinalResult>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Sequence number of the last accepted command (crash-recovery cursor).
    pub command_seq: u64,
}
