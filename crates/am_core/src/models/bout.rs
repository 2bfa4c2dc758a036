//! Bouts - individual foot-thrust exchanges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::match_setup::PlayerId;

/// The caller's call for a bout. The two calls are mutually exclusive.
///
/// - `Opa` (Opare): the players thrust different feet.
/// - `Oshi` (Oshiwa): the players thrust the same foot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    Opa,
    Oshi,
}

/// A single scored exchange. Immutable once recorded; the only way to take
/// one back is the explicit undo command while the round is still open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bout {
    /// Round this bout belongs to (1-based).
    pub round: u8,
    /// Strictly increasing sequence within the round (1-based).
    pub sequence: u32,
    pub call: CallType,
    pub winner: PlayerId,
    pub loser: PlayerId,
    /// Countdown remaining when recorded (head-to-head only).
    pub time_remaining_ms: Option<u64>,
    /// Match clock at record time, for replay/video correlation.
    pub clock_ms: u64,
    pub at: DateTime<Utc>,
}

impl Bout {
    pub fn is_opa(&self) -> bool {
        self.call == CallType::Opa
    }

    pub fn is_oshi(&self) -> bool {
        self.call == CallType::Oshi
    }
}
