//! am_core - the AmpeSports match officiating engine.
//!
//! Ampe is scored by officials, not sensors: a caller announces each bout,
//! a master ampfre operates the console, and two recorders keep independent
//! tallies. This crate is the deterministic core behind that console. It
//! owns the match state machine, the scoring ledger, the foul penalty
//! progression, the team-mode player queue, round timing, persistence, and
//! tournament structure. Rendering, input, and networking live elsewhere;
//! they drive the engine through [`engine::command::Command`] and observe it
//! through the [`bus::EventBus`].
//!
//! Determinism is the load-bearing property: every mutation (timer ticks
//! included) enters as a timestamped command, and replaying the accepted
//! command log reproduces the match state exactly.

pub mod bracket;
pub mod bus;
pub mod engine;
pub mod error;
pub mod export;
pub mod models;
pub mod store;

pub use bus::EventBus;
pub use engine::command::{Command, CommandEnvelope, CommandLog};
pub use engine::{MatchEngine, MatchPhase};
pub use error::{EngineError, Result};
pub use export::Scoresheet;
pub use models::{
    Bout, CallType, EngineEvent, FoulKind, GameMode, MatchConfig, MatchSnapshot,
    Participant, PenaltyAction, PlayerId, RoundWinner, ScoreSnapshot, SideEntry,
    TeamSide,
};
pub use store::{BoutJournalLine, JsonFileStore, MatchStore, MemoryStore, StoreError};

/// Crate version, surfaced in exports and logs.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the persisted snapshot/journal layout.
pub const SCHEMA_VERSION: u32 = 1;
