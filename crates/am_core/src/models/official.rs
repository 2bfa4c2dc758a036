//! Officiating roster (ampfres) and the dual-recorder slots.

use serde::{Deserialize, Serialize};

/// Officiating roles defined by the rulebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfficialRole {
    /// Oversees the match, master recorder, announces scores.
    MasterAmpfre,
    /// Calls "Opa" or "Oshi" for each bout.
    CallerAmpfre,
    /// Independent score recorder; two per match.
    RecorderAmpfre,
    /// Calls START/STOP and manages round timing.
    Timer,
    /// Counts total bouts per round.
    Counter,
    /// Manages camera and replay technology.
    VideoAssistant,
}

impl OfficialRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            OfficialRole::MasterAmpfre => "Master Ampfre",
            OfficialRole::CallerAmpfre => "Caller Ampfre",
            OfficialRole::RecorderAmpfre => "Recorder Ampfre",
            OfficialRole::Timer => "Timer",
            OfficialRole::Counter => "Counter",
            OfficialRole::VideoAssistant => "Video Assistant Ampfre",
        }
    }
}

/// An official assigned to this match in a specific role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficialAssignment {
    pub official_id: u32,
    pub name: String,
    pub role: OfficialRole,
}

impl OfficialAssignment {
    pub fn new(official_id: u32, name: impl Into<String>, role: OfficialRole) -> Self {
        Self { official_id, name: name.into(), role }
    }
}

/// The two independent recorder positions. A submitted tally that disagrees
/// with the master ledger blocks the round until the master resolves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderSlot {
    A,
    B,
}

/// A complete officiating crew, handy for setup screens and tests.
pub fn full_crew() -> Vec<OfficialAssignment> {
    vec![
        OfficialAssignment::new(1, "Master", OfficialRole::MasterAmpfre),
        OfficialAssignment::new(2, "Caller", OfficialRole::CallerAmpfre),
        OfficialAssignment::new(3, "Recorder A", OfficialRole::RecorderAmpfre),
        OfficialAssignment::new(4, "Recorder B", OfficialRole::RecorderAmpfre),
        OfficialAssignment::new(5, "Timer", OfficialRole::Timer),
        OfficialAssignment::new(6, "Counter", OfficialRole::Counter),
    ]
}
