use thiserror::Error;

use crate::engine::MatchPhase;
use crate::models::match_setup::PlayerId;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("{command} is not allowed in state {state}")]
    InvalidState { command: &'static str, state: MatchPhase },

    #[error("substitution limit reached ({used}/{max})")]
    SubstitutionLimitExceeded { used: u8, max: u8 },

    #[error("recorder tallies for round {round} are unreconciled")]
    DiscrepancyDetected { round: u8 },

    #[error("unknown participant: {0}")]
    UnknownParticipant(PlayerId),

    #[error("persistence failure: {0}")]
    Persistence(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
