//! Scoresheet export - the official record built from a match snapshot.
//!
//! The scoresheet is a plain data structure plus a text rendering, so the
//! console can serialize it as JSON or print it for signature.

use serde::{Deserialize, Serialize};

use crate::models::foul::PenaltyRecord;
use crate::models::snapshot::{EliminationEntry, MatchSnapshot, RoundWinner};

/// One round's line on the sheet, split by call type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoresheetRow {
    pub round: u8,
    pub home_ap: u32,
    pub home_opa: u32,
    pub home_oshi: u32,
    pub away_ap: u32,
    pub away_opa: u32,
    pub away_oshi: u32,
    pub bout_count: u32,
    pub winner: RoundWinner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scoresheet {
    pub match_id: String,
    pub home_name: String,
    pub away_name: String,
    pub officials: Vec<String>,
    pub rounds: Vec<ScoresheetRow>,
    pub penalties: Vec<PenaltyRecord>,
    pub eliminations: Vec<EliminationEntry>,
    pub home_total_ap: u32,
    pub away_total_ap: u32,
    pub outcome: Option<RoundWinner>,
    pub protest_reason: Option<String>,
}

impl Scoresheet {
    pub fn from_snapshot(snapshot: &MatchSnapshot) -> Self {
        let rounds = snapshot
            .rounds
            .iter()
            .map(|r| ScoresheetRow {
                round: r.number,
                home_ap: r.home.round_ap,
                home_opa: r.home.round_opa,
                home_oshi: r.home.round_oshi,
                away_ap: r.away.round_ap,
                away_opa: r.away.round_opa,
                away_oshi: r.away.round_oshi,
                bout_count: r.bout_count,
                winner: r.winner,
            })
            .collect();
        Self {
            match_id: snapshot.match_id.to_string(),
            home_name: snapshot.score.home_name.clone(),
            away_name: snapshot.score.away_name.clone(),
            officials: snapshot
                .officials
                .iter()
                .map(|o| format!("{}: {}", o.role.display_name(), o.name))
                .collect(),
            rounds,
            penalties: snapshot.penalties.clone(),
            eliminations: snapshot.eliminations.clone(),
            home_total_ap: snapshot.score.home.ap,
            away_total_ap: snapshot.score.away.ap,
            outcome: snapshot.result.as_ref().map(|r| r.winner),
            protest_reason: snapshot.protest_reason.clone(),
        }
    }

    /// Plain-text sheet for printing and signatures.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("AMPE SCORESHEET  match {}\n", self.match_id));
        out.push_str(&format!("{} vs {}\n\n", self.home_name, self.away_name));

        out.push_str("Round  Home AP (opa/oshi)  Away AP (opa/oshi)  Bouts  Winner\n");
        for row in &self.rounds {
            let winner = match row.winner {
                RoundWinner::Home => &self.home_name,
                RoundWinner::Away => &self.away_name,
                RoundWinner::Tie => "tie",
            };
            out.push_str(&format!(
                "{:>5}  {:>7} ({}/{})        {:>7} ({}/{})       {:>5}  {}\n",
                row.round,
                row.home_ap,
                row.home_opa,
                row.home_oshi,
                row.away_ap,
                row.away_opa,
                row.away_oshi,
                row.bout_count,
                winner,
            ));
        }

        out.push_str(&format!(
            "\nTotals: {} {}  -  {} {}\n",
            self.home_name, self.home_total_ap, self.away_name, self.away_total_ap
        ));
        match self.outcome {
            Some(RoundWinner::Home) => out.push_str(&format!("Result: {} win\n", self.home_name)),
            Some(RoundWinner::Away) => out.push_str(&format!("Result: {} win\n", self.away_name)),
            Some(RoundWinner::Tie) => out.push_str("Result: declared tie\n"),
            None => out.push_str("Result: not finalized\n"),
        }

        if !self.eliminations.is_empty() {
            out.push_str("\nEliminations:\n");
            for e in &self.eliminations {
                let how = if e.by_disqualification { "disqualified" } else { "eliminated" };
                out.push_str(&format!(
                    "  R{}: player {} ({}) {}, +{} AP to opponent\n",
                    e.round,
                    e.participant,
                    e.side.label(),
                    how,
                    e.bonus_awarded
                ));
            }
        }

        if !self.penalties.is_empty() {
            out.push_str("\nPenalties:\n");
            for p in &self.penalties {
                out.push_str(&format!(
                    "  player {}: {} (#{}) -> {:?}, -{} AP\n",
                    p.participant,
                    p.kind.display_name(),
                    p.occurrence,
                    p.action,
                    p.deducted
                ));
            }
        }

        if let Some(reason) = &self.protest_reason {
            out.push_str(&format!("\nUNDER PROTEST: {reason}\n"));
        }

        out.push_str("\nOfficials:\n");
        for official in &self.officials {
            out.push_str(&format!("  {official}\n"));
        }
        out
    }
}
