//! Commands - the only way state enters the engine.
//!
//! Every mutation, including timer ticks, arrives as a logged command with
//! its timestamp carried on the envelope. The engine never samples the wall
//! clock itself, so replaying a log reproduces the match exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::bout::CallType;
use crate::models::foul::FoulKind;
use crate::models::match_setup::{MatchConfig, Participant, PlayerId, TeamSide};
use crate::models::official::RecorderSlot;
use crate::models::snapshot::RoundTally;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    SetupMatch { config: MatchConfig },
    StartMatch,
    StartRound,
    RecordBout { call: CallType, winner: PlayerId, loser: PlayerId },
    UndoBout,
    ApplyFoul {
        participant: PlayerId,
        kind: FoulKind,
        /// Officiator override of the progression's AP deduction.
        deduction: Option<u32>,
        note: Option<String>,
    },
    EliminatePlayer { participant: PlayerId },
    Substitute { side: TeamSide, out: PlayerId, replacement: Participant },
    SubmitRecorderTally { slot: RecorderSlot, tally: RoundTally },
    ResolveDiscrepancy { tally: RoundTally },
    Pause,
    Resume,
    EndRound,
    EndMatch,
    Protest { reason: String },
    TimerTick { elapsed_ms: u64 },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetupMatch { .. } => "setup_match",
            Command::StartMatch => "start_match",
            Command::StartRound => "start_round",
            Command::RecordBout { .. } => "record_bout",
            Command::UndoBout => "undo_bout",
            Command::ApplyFoul { .. } => "apply_foul",
            Command::EliminatePlayer { .. } => "eliminate_player",
            Command::Substitute { .. } => "substitute",
            Command::SubmitRecorderTally { .. } => "submit_recorder_tally",
            Command::ResolveDiscrepancy { .. } => "resolve_discrepancy",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::EndRound => "end_round",
            Command::EndMatch => "end_match",
            Command::Protest { .. } => "protest",
            Command::TimerTick { .. } => "timer_tick",
        }
    }
}

/// A command as it entered the engine: sequence number plus wall-clock time
/// captured at the console, not inside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub seq: u64,
    pub at: DateTime<Utc>,
    pub command: Command,
}

/// Append-only log of accepted commands. Rejected commands never land here,
/// so a replay of the log is a sequence of guaranteed-valid transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CommandLog {
    entries: Vec<CommandEnvelope>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, at: DateTime<Utc>, command: Command) -> u64 {
        let seq = self.entries.len() as u64 + 1;
        self.entries.push(CommandEnvelope { seq, at, command });
        seq
    }

    pub fn last_seq(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn entries(&self) -> &[CommandEnvelope] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_sequences_from_one() {
        let mut log = CommandLog::new();
        let now = Utc::now();
        assert_eq!(log.append(now, Command::StartMatch), 1);
        assert_eq!(log.append(now, Command::Pause), 2);
        assert_eq!(log.last_seq(), 2);
    }

    #[test]
    fn test_command_serde_tagging() {
        let cmd = Command::RecordBout { call: CallType::Opa, winner: 3, loser: 8 };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains(r#""op":"record_bout""#));
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }
}
