//! Team-mode player queue - the box/lane system for Shooter Mode.
//!
//! Fifteen boxes across five lanes; box 1 is the Red Zone where the bout is
//! decided. After each bout the box 1 player cycles to the back and everyone
//! shifts down one box. Eliminated players leave through the Exit Lane and
//! the gap closes.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::match_setup::{
    Participant, PlayerId, TeamSide, MAX_SUBSTITUTIONS, TEAM_SIZE,
};

/// The five lanes of the AmpsKourt (three boxes each), plus the exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Lane1,
    Lane2,
    Lane3,
    Lane4,
    Lane5,
    Exit,
}

impl Lane {
    /// Lane for a 1-based box number.
    pub fn for_box(box_number: u8) -> Self {
        match box_number {
            1..=3 => Lane::Lane1,
            4..=6 => Lane::Lane2,
            7..=9 => Lane::Lane3,
            10..=12 => Lane::Lane4,
            13..=15 => Lane::Lane5,
            _ => Lane::Exit,
        }
    }
}

/// Standard bonus for eliminating a player while more than three remain.
pub const TEAM_ROUND_WIN_BONUS: u32 = 3;

/// Bonus AP for an elimination, as a pure function of the roster size
/// immediately after removal. The tiered endgame bonuses fire on the
/// first, second, and third crossing into the three-or-fewer zone.
pub fn elimination_bonus(remaining: usize) -> u32 {
    if remaining > 3 {
        return TEAM_ROUND_WIN_BONUS;
    }
    match remaining {
        2 => 5,
        1 => 10,
        0 => 15,
        // Removal that leaves exactly three still pays the standard bonus.
        _ => TEAM_ROUND_WIN_BONUS,
    }
}

/// One team's active queue. Slots are kept sorted by box number, so index 0
/// is always the Red Zone occupant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerQueue {
    side: TeamSide,
    slots: Vec<Participant>,
    eliminated: Vec<PlayerId>,
    substitutions_used: u8,
}

impl PlayerQueue {
    pub fn from_roster(side: TeamSide, roster: Vec<Participant>) -> Result<Self, EngineError> {
        if roster.is_empty() {
            return Err(EngineError::Validation(format!(
                "{} roster must have at least 1 player",
                side.label()
            )));
        }
        if roster.len() > TEAM_SIZE {
            return Err(EngineError::Validation(format!(
                "{} roster cannot exceed {} players",
                side.label(),
                TEAM_SIZE
            )));
        }
        Ok(Self { side, slots: roster, eliminated: Vec::new(), substitutions_used: 0 })
    }

    pub fn side(&self) -> TeamSide {
        self.side
    }

    /// Player currently in the Red Zone (box 1).
    pub fn active_player(&self) -> Option<&Participant> {
        self.slots.first()
    }

    pub fn active_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_team_eliminated(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.slots.iter().any(|p| p.id == id)
    }

    pub fn was_eliminated(&self, id: PlayerId) -> bool {
        self.eliminated.contains(&id)
    }

    pub fn eliminated_players(&self) -> &[PlayerId] {
        &self.eliminated
    }

    pub fn substitutions_used(&self) -> u8 {
        self.substitutions_used
    }

    /// Box number (1-based) for a player still in the queue.
    pub fn box_of(&self, id: PlayerId) -> Option<u8> {
        self.slots.iter().position(|p| p.id == id).map(|i| i as u8 + 1)
    }

    /// Single-step rotation after a bout: box 1 moves to the back, everyone
    /// else shifts down one box.
    pub fn rotate(&mut self) {
        if self.slots.len() > 1 {
            self.slots.rotate_left(1);
        }
    }

    /// Exact inverse of `rotate`, used when a bout is undone.
    pub fn rotate_back(&mut self) {
        if self.slots.len() > 1 {
            self.slots.rotate_right(1);
        }
    }

    /// Remove a player and close the gap. Returns the roster size after
    /// removal, which drives the elimination bonus tier.
    pub fn eliminate(&mut self, id: PlayerId) -> Result<usize, EngineError> {
        let idx = self
            .slots
            .iter()
            .position(|p| p.id == id)
            .ok_or(EngineError::UnknownParticipant(id))?;
        self.slots.remove(idx);
        self.eliminated.push(id);
        Ok(self.slots.len())
    }

    /// Swap a queued player for a bench player, keeping the box position.
    /// Pre-round only (enforced by the state machine); the Red Zone player
    /// and the substitution cap are enforced here.
    pub fn substitute(
        &mut self,
        out: PlayerId,
        replacement: Participant,
    ) -> Result<(), EngineError> {
        if self.substitutions_used >= MAX_SUBSTITUTIONS {
            return Err(EngineError::SubstitutionLimitExceeded {
                used: self.substitutions_used,
                max: MAX_SUBSTITUTIONS,
            });
        }
        let idx = self
            .slots
            .iter()
            .position(|p| p.id == out)
            .ok_or(EngineError::UnknownParticipant(out))?;
        if idx == 0 {
            return Err(EngineError::Validation(
                "cannot substitute the Red Zone player".into(),
            ));
        }
        if self.contains(replacement.id) || self.was_eliminated(replacement.id) {
            return Err(EngineError::Validation(format!(
                "player {} already took part in this match",
                replacement.id
            )));
        }
        self.slots[idx] = replacement;
        self.substitutions_used += 1;
        Ok(())
    }

    /// Queue layout for displays: (player, box number, lane).
    pub fn layout(&self) -> Vec<(&Participant, u8, Lane)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, p)| (p, i as u8 + 1, Lane::for_box(i as u8 + 1)))
            .collect()
    }
}
