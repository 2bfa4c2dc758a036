//! Data model for AmpeSports officiating: setup, bouts, fouls, officials,
//! snapshots, and the typed event surface.

pub mod bout;
pub mod events;
pub mod foul;
pub mod match_setup;
pub mod official;
pub mod snapshot;

pub use bout::{Bout, CallType};
pub use events::{BoutDetail, EngineEvent, FoulDetail};
pub use foul::{penalty_for, FoulKind, PenaltyAction, PenaltyRecord};
pub use match_setup::{
    GameMode, MatchConfig, Participant, PlayerId, SideEntry, TeamSide,
    MAX_SUBSTITUTIONS, TEAM_MODE_ROUNDS, TEAM_SIZE, VALID_HEAD_TO_HEAD_ROUNDS,
};
pub use official::{full_crew, OfficialAssignment, OfficialRole, RecorderSlot};
pub use snapshot::{
    DiscrepancyReport, EliminationEntry, FinalResult, MatchSnapshot, RoundSummary,
    RoundTally, RoundWinner, ScoreSnapshot, SideScore, TimerReading,
};
