//! Scoring ledger - pure AP arithmetic, no lifecycle knowledge.
//!
//! The ledger keeps per-side totals and per-round tallies, plus per-player
//! bout-win counts for the scoresheet. Lifecycle legality is checked by the
//! caller (the state machine); the ledger never rejects on state grounds.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::bout::CallType;
use crate::models::match_setup::{PlayerId, TeamSide};
use crate::models::snapshot::{RoundTally, SideScore};

/// Per-player bout wins, split by call type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlayerTally {
    pub opa_wins: u32,
    pub oshi_wins: u32,
}

impl PlayerTally {
    pub fn total(&self) -> u32 {
        self.opa_wins + self.oshi_wins
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScoringLedger {
    home: SideScore,
    away: SideScore,
    player_wins: HashMap<PlayerId, PlayerTally>,
}

impl ScoringLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn side_mut(&mut self, side: TeamSide) -> &mut SideScore {
        match side {
            TeamSide::Home => &mut self.home,
            TeamSide::Away => &mut self.away,
        }
    }

    pub fn side(&self, side: TeamSide) -> SideScore {
        match side {
            TeamSide::Home => self.home,
            TeamSide::Away => self.away,
        }
    }

    /// Reset the per-round counters; totals carry over.
    pub fn begin_round(&mut self) {
        for side in [TeamSide::Home, TeamSide::Away] {
            let s = self.side_mut(side);
            s.round_ap = 0;
            s.round_opa = 0;
            s.round_oshi = 0;
        }
    }

    /// One won bout: +1 AP and +1 on the matching call-type counter.
    pub fn record_bout(&mut self, side: TeamSide, call: CallType, winner: PlayerId) {
        let s = self.side_mut(side);
        s.ap += 1;
        s.round_ap += 1;
        match call {
            CallType::Opa => {
                s.opa_wins += 1;
                s.round_opa += 1;
            }
            CallType::Oshi => {
                s.oshi_wins += 1;
                s.round_oshi += 1;
            }
        }
        let tally = self.player_wins.entry(winner).or_default();
        match call {
            CallType::Opa => tally.opa_wins += 1,
            CallType::Oshi => tally.oshi_wins += 1,
        }
    }

    /// Exact reverse of `record_bout`. Only the state machine calls this,
    /// and only for the most recent bout of an open round.
    pub fn undo_bout(&mut self, side: TeamSide, call: CallType, winner: PlayerId) {
        let s = self.side_mut(side);
        s.ap = s.ap.saturating_sub(1);
        s.round_ap = s.round_ap.saturating_sub(1);
        match call {
            CallType::Opa => {
                s.opa_wins = s.opa_wins.saturating_sub(1);
                s.round_opa = s.round_opa.saturating_sub(1);
            }
            CallType::Oshi => {
                s.oshi_wins = s.oshi_wins.saturating_sub(1);
                s.round_oshi = s.round_oshi.saturating_sub(1);
            }
        }
        if let Some(tally) = self.player_wins.get_mut(&winner) {
            match call {
                CallType::Opa => tally.opa_wins = tally.opa_wins.saturating_sub(1),
                CallType::Oshi => tally.oshi_wins = tally.oshi_wins.saturating_sub(1),
            }
        }
    }

    /// Elimination bonuses go to match totals only; the round that earned
    /// them is already closed when they are credited.
    pub fn credit_bonus(&mut self, side: TeamSide, bonus: u32) {
        self.side_mut(side).ap += bonus;
    }

    /// Deduct AP, clamped at zero. Returns the amount actually deducted so
    /// the audit record can hold both requested and applied values.
    pub fn apply_deduction(&mut self, side: TeamSide, requested: u32) -> u32 {
        let s = self.side_mut(side);
        let deducted = requested.min(s.ap);
        s.ap -= deducted;
        s.round_ap = s.round_ap.saturating_sub(requested.min(s.round_ap));
        deducted
    }

    /// The master ledger's tally for the current round.
    pub fn round_tally(&self) -> RoundTally {
        RoundTally {
            home_ap: self.home.round_ap,
            away_ap: self.away.round_ap,
        }
    }

    pub fn player_tally(&self, id: PlayerId) -> PlayerTally {
        self.player_wins.get(&id).copied().unwrap_or_default()
    }
}
