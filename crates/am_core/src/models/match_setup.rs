//! Match setup - mode, participants, and officiating roster.
//!
//! A `MatchConfig` is assembled by the officiating console before the match
//! and is read-only once play starts. Mid-match roster changes go through
//! the player queue (substitutions), never through the config.

use serde::{Deserialize, Serialize};

use super::official::{OfficialAssignment, OfficialRole};
use crate::error::EngineError;

/// Participant identifier. Head-to-head matches reference player ids;
/// team matches reference the players inside each roster.
pub type PlayerId = u32;

/// Maximum roster size per team (boxes 1-15 on the AmpsKourt).
pub const TEAM_SIZE: usize = 15;

/// Maximum substitutions per team per match.
pub const MAX_SUBSTITUTIONS: u8 = 5;

/// Round counts the rulebook allows for head-to-head play.
pub const VALID_HEAD_TO_HEAD_ROUNDS: [u8; 3] = [5, 10, 15];

/// Team elimination mode always plays 15 rounds per game.
pub const TEAM_MODE_ROUNDS: u8 = 15;

/// The three game modes defined in the AmpeSports rulebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    HeadToHead,
    TeamElimination,
    Tournament,
}

impl GameMode {
    /// Tournament matches follow team elimination rules on the court.
    pub fn uses_rosters(&self) -> bool {
        matches!(self, GameMode::TeamElimination | GameMode::Tournament)
    }
}

/// Side of the court. Head-to-head maps participant 1 to `Home`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TeamSide {
    #[default]
    Home,
    Away,
}

impl TeamSide {
    pub fn opponent(&self) -> Self {
        match self {
            TeamSide::Home => TeamSide::Away,
            TeamSide::Away => TeamSide::Home,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TeamSide::Home => "home",
            TeamSide::Away => "away",
        }
    }
}

/// A named participant (player).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: PlayerId,
    pub name: String,
}

impl Participant {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

/// One side of the match: a single player or an ordered roster.
///
/// Roster order matters: it is the initial queue order, box 1 first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEntry {
    Single(Participant),
    Roster { team_name: String, players: Vec<Participant> },
}

impl SideEntry {
    pub fn display_name(&self) -> &str {
        match self {
            SideEntry::Single(p) => &p.name,
            SideEntry::Roster { team_name, .. } => team_name,
        }
    }

    pub fn players(&self) -> Vec<&Participant> {
        match self {
            SideEntry::Single(p) => vec![p],
            SideEntry::Roster { players, .. } => players.iter().collect(),
        }
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players().iter().any(|p| p.id == id)
    }
}

/// Full match configuration as validated at setup time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub mode: GameMode,
    pub total_rounds: u8,
    pub home: SideEntry,
    pub away: SideEntry,
    pub officials: Vec<OfficialAssignment>,
}

impl MatchConfig {
    /// Validate mode-specific constraints before the engine accepts the config.
    pub fn validate(&self) -> Result<(), EngineError> {
        match self.mode {
            GameMode::HeadToHead => {
                if !VALID_HEAD_TO_HEAD_ROUNDS.contains(&self.total_rounds) {
                    return Err(EngineError::Validation(format!(
                        "head-to-head rounds must be one of {:?}, got {}",
                        VALID_HEAD_TO_HEAD_ROUNDS, self.total_rounds
                    )));
                }
                for (side, entry) in [("home", &self.home), ("away", &self.away)] {
                    if !matches!(entry, SideEntry::Single(_)) {
                        return Err(EngineError::Validation(format!(
                            "head-to-head requires a single participant on the {side} side"
                        )));
                    }
                }
            }
            GameMode::TeamElimination | GameMode::Tournament => {
                if self.total_rounds != TEAM_MODE_ROUNDS {
                    return Err(EngineError::Validation(format!(
                        "team mode plays {} rounds, got {}",
                        TEAM_MODE_ROUNDS, self.total_rounds
                    )));
                }
                for (side, entry) in [("home", &self.home), ("away", &self.away)] {
                    match entry {
                        SideEntry::Roster { players, .. } => {
                            if players.is_empty() {
                                return Err(EngineError::Validation(format!(
                                    "{side} roster must have at least 1 player"
                                )));
                            }
                            if players.len() > TEAM_SIZE {
                                return Err(EngineError::Validation(format!(
                                    "{side} roster cannot exceed {TEAM_SIZE} players"
                                )));
                            }
                        }
                        SideEntry::Single(_) => {
                            return Err(EngineError::Validation(format!(
                                "team mode requires a roster on the {side} side"
                            )));
                        }
                    }
                }
            }
        }

        let mut seen = std::collections::HashSet::new();
        for p in self.home.players().iter().chain(self.away.players().iter()) {
            if !seen.insert(p.id) {
                return Err(EngineError::Validation(format!(
                    "duplicate participant id {}",
                    p.id
                )));
            }
        }

        self.validate_officials()
    }

    /// The rulebook requires a master, a caller, and two independent recorders.
    fn validate_officials(&self) -> Result<(), EngineError> {
        let count = |role: OfficialRole| {
            self.officials.iter().filter(|o| o.role == role).count()
        };
        if count(OfficialRole::MasterAmpfre) != 1 {
            return Err(EngineError::Validation(
                "exactly one master ampfre is required".into(),
            ));
        }
        if count(OfficialRole::CallerAmpfre) != 1 {
            return Err(EngineError::Validation(
                "exactly one caller ampfre is required".into(),
            ));
        }
        if count(OfficialRole::RecorderAmpfre) != 2 {
            return Err(EngineError::Validation(
                "two recorder ampfres are required".into(),
            ));
        }
        Ok(())
    }

    /// Which side a participant belongs to, per the original rosters.
    /// Substitutes brought in mid-match are resolved by the engine's queues.
    pub fn side_of(&self, id: PlayerId) -> Option<TeamSide> {
        if self.home.contains(id) {
            Some(TeamSide::Home)
        } else if self.away.contains(id) {
            Some(TeamSide::Away)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::official::full_crew;

    fn h2h_config() -> MatchConfig {
        MatchConfig {
            mode: GameMode::HeadToHead,
            total_rounds: 5,
            home: SideEntry::Single(Participant::new(1, "Kofi")),
            away: SideEntry::Single(Participant::new(2, "Ama")),
            officials: full_crew(),
        }
    }

    #[test]
    fn test_valid_head_to_head() {
        assert!(h2h_config().validate().is_ok());
    }

    #[test]
    fn test_invalid_round_count() {
        let mut config = h2h_config();
        config.total_rounds = 7;
        assert!(matches!(config.validate(), Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_duplicate_participant_rejected() {
        let mut config = h2h_config();
        config.away = SideEntry::Single(Participant::new(1, "Ama"));
        assert!(matches!(config.validate(), Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_missing_recorder_rejected() {
        let mut config = h2h_config();
        config.officials.pop();
        assert!(matches!(config.validate(), Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_team_mode_roster_limits() {
        let roster = |start: u32, n: u32| SideEntry::Roster {
            team_name: format!("T{start}"),
            players: (start..start + n)
                .map(|i| Participant::new(i, format!("P{i}")))
                .collect(),
        };
        let mut config = MatchConfig {
            mode: GameMode::TeamElimination,
            total_rounds: TEAM_MODE_ROUNDS,
            home: roster(1, 15),
            away: roster(100, 15),
            officials: full_crew(),
        };
        assert!(config.validate().is_ok());

        config.home = roster(1, 16);
        assert!(matches!(config.validate(), Err(EngineError::Validation(_))));

        config.home = roster(1, 0);
        assert!(matches!(config.validate(), Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_side_of() {
        let config = h2h_config();
        assert_eq!(config.side_of(1), Some(TeamSide::Home));
        assert_eq!(config.side_of(2), Some(TeamSide::Away));
        assert_eq!(config.side_of(99), None);
    }
}
