//! Tournament structure - serpentine groups, round-robin, then knockout.
//!
//! The bracket schedules matches and ranks teams; each scheduled match is
//! played by its own [`MatchEngine`](crate::engine::MatchEngine) and only the
//! final AP totals come back here. Group play awards 3 points for a win and
//! 1 for a tie; standings break ties on AP difference, then AP scored, then
//! seed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Where the tournament currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStage {
    GroupStage,
    /// Knockout round with this many teams still in.
    Knockout { remaining: u8 },
    Complete,
}

pub type TeamId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamEntry {
    pub id: TeamId,
    pub name: String,
    /// 1 is the strongest seed.
    pub seed: u32,
}

/// One team's record within its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStanding {
    pub team: TeamId,
    pub played: u8,
    pub wins: u8,
    pub ties: u8,
    pub losses: u8,
    pub points: u8,
    pub ap_scored: u32,
    pub ap_conceded: u32,
}

impl GroupStanding {
    fn new(team: TeamId) -> Self {
        Self {
            team,
            played: 0,
            wins: 0,
            ties: 0,
            losses: 0,
            points: 0,
            ap_scored: 0,
            ap_conceded: 0,
        }
    }

    pub fn ap_diff(&self) -> i64 {
        self.ap_scored as i64 - self.ap_conceded as i64
    }
}

/// A scheduled pairing. `away` is `None` for a bye, which counts as an
/// immediate walkover for `home`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketMatch {
    pub id: String,
    pub stage: TournamentStage,
    pub home: TeamId,
    pub away: Option<TeamId>,
    /// `None` until played, and stays `None` for a group-stage tie.
    pub winner: Option<TeamId>,
    pub played: bool,
    pub home_ap: u32,
    pub away_ap: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentBracket {
    teams: Vec<TeamEntry>,
    groups: Vec<Vec<TeamId>>,
    standings: HashMap<TeamId, GroupStanding>,
    matches: Vec<BracketMatch>,
    stage: TournamentStage,
}

impl TournamentBracket {
    /// Seed teams into `group_count` groups serpentine-style: seeds run
    /// left-to-right across the groups, then right-to-left, and so on.
    pub fn new(mut teams: Vec<TeamEntry>, group_count: usize) -> Result<Self> {
        if group_count == 0 {
            return Err(EngineError::Validation("need at least one group".into()));
        }
        if teams.len() < group_count * 2 {
            return Err(EngineError::Validation(format!(
                "{} teams cannot fill {group_count} groups with 2 qualifiers each",
                teams.len()
            )));
        }
        teams.sort_by_key(|t| t.seed);

        let mut groups: Vec<Vec<TeamId>> = vec![Vec::new(); group_count];
        for (i, team) in teams.iter().enumerate() {
            let row = i / group_count;
            let col = i % group_count;
            let group = if row % 2 == 0 { col } else { group_count - 1 - col };
            groups[group].push(team.id);
        }

        let standings = teams
            .iter()
            .map(|t| (t.id, GroupStanding::new(t.id)))
            .collect();

        let mut bracket = Self {
            teams,
            groups,
            standings,
            matches: Vec::new(),
            stage: TournamentStage::GroupStage,
        };
        bracket.schedule_group_matches();
        Ok(bracket)
    }

    /// Single round-robin inside each group. Match ids read "GA_1", "GB_3".
    fn schedule_group_matches(&mut self) {
        for (g, members) in self.groups.iter().enumerate() {
            let letter = (b'A' + g as u8) as char;
            let mut n = 0;
            for i in 0..members.len() {
                for j in (i + 1)..members.len() {
                    n += 1;
                    self.matches.push(BracketMatch {
                        id: format!("G{letter}_{n}"),
                        stage: TournamentStage::GroupStage,
                        home: members[i],
                        away: Some(members[j]),
                        winner: None,
                        played: false,
                        home_ap: 0,
                        away_ap: 0,
                    });
                }
            }
        }
    }

    pub fn stage(&self) -> TournamentStage {
        self.stage
    }

    pub fn groups(&self) -> &[Vec<TeamId>] {
        &self.groups
    }

    pub fn matches(&self) -> &[BracketMatch] {
        &self.matches
    }

    pub fn team(&self, id: TeamId) -> Option<&TeamEntry> {
        self.teams.iter().find(|t| t.id == id)
    }

    fn seed_of(&self, id: TeamId) -> u32 {
        self.team(id).map(|t| t.seed).unwrap_or(u32::MAX)
    }

    /// Report a finished match by its schedule id. Knockout ties are not
    /// accepted: the officiating crew settles the winner on the court.
    pub fn record_result(&mut self, match_id: &str, home_ap: u32, away_ap: u32) -> Result<()> {
        let idx = self
            .matches
            .iter()
            .position(|m| m.id == match_id)
            .ok_or_else(|| {
                EngineError::Validation(format!("no scheduled match {match_id}"))
            })?;
        if self.matches[idx].played {
            return Err(EngineError::Validation(format!(
                "match {match_id} already has a result"
            )));
        }
        let away = match self.matches[idx].away {
            Some(away) => away,
            None => {
                return Err(EngineError::Validation(format!(
                    "match {match_id} is a bye"
                )))
            }
        };
        let home = self.matches[idx].home;
        let group_stage = self.matches[idx].stage == TournamentStage::GroupStage;
        if !group_stage && home_ap == away_ap {
            return Err(EngineError::Validation(
                "knockout matches cannot end tied".into(),
            ));
        }

        let winner = if home_ap >= away_ap { home } else { away };
        {
            let entry = &mut self.matches[idx];
            entry.home_ap = home_ap;
            entry.away_ap = away_ap;
            entry.played = true;
            entry.winner = if group_stage && home_ap == away_ap {
                None
            } else {
                Some(winner)
            };
        }

        if group_stage {
            self.apply_group_result(home, away, home_ap, away_ap);
            if self.group_stage_done() {
                self.advance_to_knockout();
            }
        } else {
            self.advance_knockout_if_round_done();
        }
        Ok(())
    }

    /// Declare a knockout winner directly, without AP detail - a walkover or
    /// a result relayed from an off-site court. Group matches must come in
    /// through [`record_result`](Self::record_result) because standings need
    /// the AP totals.
    pub fn advance_winner(&mut self, match_id: &str, winner: TeamId) -> Result<()> {
        let idx = self
            .matches
            .iter()
            .position(|m| m.id == match_id)
            .ok_or_else(|| {
                EngineError::Validation(format!("no scheduled match {match_id}"))
            })?;
        let entry = &self.matches[idx];
        if entry.stage == TournamentStage::GroupStage {
            return Err(EngineError::Validation(format!(
                "group match {match_id} must report AP totals"
            )));
        }
        if entry.played {
            return Err(EngineError::Validation(format!(
                "match {match_id} already has a result"
            )));
        }
        let away = entry.away.ok_or_else(|| {
            EngineError::Validation(format!("match {match_id} is a bye"))
        })?;
        if winner != entry.home && winner != away {
            return Err(EngineError::Validation(format!(
                "team {winner} is not playing in {match_id}"
            )));
        }
        {
            let entry = &mut self.matches[idx];
            entry.played = true;
            entry.winner = Some(winner);
        }
        self.advance_knockout_if_round_done();
        Ok(())
    }

    fn apply_group_result(&mut self, home: TeamId, away: TeamId, home_ap: u32, away_ap: u32) {
        for (team, scored, conceded) in [(home, home_ap, away_ap), (away, away_ap, home_ap)] {
            if let Some(s) = self.standings.get_mut(&team) {
                s.played += 1;
                s.ap_scored += scored;
                s.ap_conceded += conceded;
                if scored > conceded {
                    s.wins += 1;
                    s.points += 3;
                } else if scored == conceded {
                    s.ties += 1;
                    s.points += 1;
                } else {
                    s.losses += 1;
                }
            }
        }
    }

    fn group_stage_done(&self) -> bool {
        self.matches
            .iter()
            .filter(|m| m.stage == TournamentStage::GroupStage)
            .all(|m| m.played)
    }

    /// Group table, best first.
    pub fn standings(&self, group: usize) -> Vec<GroupStanding> {
        let mut table: Vec<GroupStanding> = self
            .groups
            .get(group)
            .map(|members| {
                members
                    .iter()
                    .filter_map(|id| self.standings.get(id).copied())
                    .collect()
            })
            .unwrap_or_default();
        table.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then(b.ap_diff().cmp(&a.ap_diff()))
                .then(b.ap_scored.cmp(&a.ap_scored))
                .then(self.seed_of(a.team).cmp(&self.seed_of(b.team)))
        });
        table
    }

    /// Pair group winners against the other groups' runners-up:
    /// A1-B2, B1-C2, ..., last group's winner against A2.
    fn advance_to_knockout(&mut self) {
        let group_count = self.groups.len();
        let mut pairs = Vec::with_capacity(group_count);
        for g in 0..group_count {
            let winners = self.standings(g);
            let next = self.standings((g + 1) % group_count);
            pairs.push((winners[0].team, next[1].team));
        }
        let remaining = (pairs.len() * 2) as u8;
        self.stage = TournamentStage::Knockout { remaining };
        let prefix = Self::round_prefix(remaining);
        for (n, (home, away)) in pairs.into_iter().enumerate() {
            self.matches.push(BracketMatch {
                id: format!("{prefix}_{}", n + 1),
                stage: self.stage,
                home,
                away: Some(away),
                winner: None,
                played: false,
                home_ap: 0,
                away_ap: 0,
            });
        }
        log::info!("group stage done, knockout of {remaining} scheduled");
    }

    fn round_prefix(remaining: u8) -> String {
        match remaining {
            2 => "F".to_string(),
            4 => "SF".to_string(),
            8 => "QF".to_string(),
            n => format!("R{n}"),
        }
    }

    fn advance_knockout_if_round_done(&mut self) {
        let stage = self.stage;
        let round: Vec<&BracketMatch> = self
            .matches
            .iter()
            .filter(|m| m.stage == stage)
            .collect();
        if !round.iter().all(|m| m.winner.is_some()) {
            return;
        }
        let mut winners: Vec<TeamId> =
            round.iter().filter_map(|m| m.winner).collect();
        if winners.len() == 1 {
            self.stage = TournamentStage::Complete;
            log::info!("tournament complete, champion {}", winners[0]);
            return;
        }

        // Odd survivor counts give the best remaining seed a walkover.
        let mut byes = Vec::new();
        if winners.len() % 2 == 1 {
            winners.sort_by_key(|&id| self.seed_of(id));
            byes.push(winners.remove(0));
        }
        let remaining = (winners.len() + byes.len()) as u8;
        self.stage = TournamentStage::Knockout { remaining };
        let prefix = Self::round_prefix(remaining);
        let mut n = 0;
        for bye in byes {
            n += 1;
            self.matches.push(BracketMatch {
                id: format!("{prefix}_{n}"),
                stage: self.stage,
                home: bye,
                away: None,
                winner: Some(bye),
                played: true,
                home_ap: 0,
                away_ap: 0,
            });
        }
        let mut rest = winners.into_iter();
        while let (Some(home), Some(away)) = (rest.next(), rest.next()) {
            n += 1;
            self.matches.push(BracketMatch {
                id: format!("{prefix}_{n}"),
                stage: self.stage,
                home,
                away: Some(away),
                winner: None,
                played: false,
                home_ap: 0,
                away_ap: 0,
            });
        }
    }

    pub fn champion(&self) -> Option<TeamId> {
        if self.stage != TournamentStage::Complete {
            return None;
        }
        self.matches.last().and_then(|m| m.winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teams(n: u32) -> Vec<TeamEntry> {
        (1..=n)
            .map(|i| TeamEntry { id: i, name: format!("Team {i}"), seed: i })
            .collect()
    }

    #[test]
    fn test_serpentine_seeding() {
        let bracket = TournamentBracket::new(teams(8), 2).unwrap();
        // Row 1 runs A,B; row 2 runs B,A; and so on.
        assert_eq!(bracket.groups()[0], vec![1, 4, 5, 8]);
        assert_eq!(bracket.groups()[1], vec![2, 3, 6, 7]);
    }

    #[test]
    fn test_round_robin_schedule() {
        let bracket = TournamentBracket::new(teams(8), 2).unwrap();
        let group_a: Vec<_> = bracket
            .matches()
            .iter()
            .filter(|m| m.id.starts_with("GA"))
            .collect();
        // 4 teams: C(4,2) = 6 pairings.
        assert_eq!(group_a.len(), 6);
        assert_eq!(group_a[0].id, "GA_1");
    }

    #[test]
    fn test_too_few_teams_rejected() {
        let err = TournamentBracket::new(teams(3), 2);
        assert!(matches!(err, Err(EngineError::Validation(_))));
    }

    fn play_group_stage(bracket: &mut TournamentBracket) {
        // Lower team id always wins, with AP spread by id gap.
        let scheduled: Vec<(String, TeamId, TeamId)> = bracket
            .matches()
            .iter()
            .filter(|m| m.stage == TournamentStage::GroupStage)
            .map(|m| (m.id.clone(), m.home, m.away.unwrap()))
            .collect();
        for (id, home, away) in scheduled {
            let (home_ap, away_ap) = if home < away {
                (5 + (away - home), 2)
            } else {
                (2, 5 + (home - away))
            };
            bracket.record_result(&id, home_ap, away_ap).unwrap();
        }
    }

    #[test]
    fn test_standings_and_knockout_advance() {
        let mut bracket = TournamentBracket::new(teams(8), 2).unwrap();
        play_group_stage(&mut bracket);

        let table = bracket.standings(0);
        // Group A is 1,4,5,8: team 1 sweeps, team 4 second.
        assert_eq!(table[0].team, 1);
        assert_eq!(table[0].points, 9);
        assert_eq!(table[1].team, 4);

        assert_eq!(bracket.stage(), TournamentStage::Knockout { remaining: 4 });
        let semis: Vec<_> = bracket
            .matches()
            .iter()
            .filter(|m| m.id.starts_with("SF"))
            .collect();
        assert_eq!(semis.len(), 2);
        // A1 vs B2, B1 vs A2.
        assert_eq!((semis[0].home, semis[0].away), (1, Some(3)));
        assert_eq!((semis[1].home, semis[1].away), (2, Some(4)));
    }

    #[test]
    fn test_knockout_to_champion() {
        let mut bracket = TournamentBracket::new(teams(8), 2).unwrap();
        play_group_stage(&mut bracket);

        bracket.record_result("SF_1", 9, 4).unwrap();
        bracket.record_result("SF_2", 3, 7).unwrap();
        assert_eq!(bracket.stage(), TournamentStage::Knockout { remaining: 2 });

        bracket.record_result("F_1", 6, 5).unwrap();
        assert_eq!(bracket.stage(), TournamentStage::Complete);
        assert_eq!(bracket.champion(), Some(1));
    }

    #[test]
    fn test_advance_winner_without_ap() {
        let mut bracket = TournamentBracket::new(teams(8), 2).unwrap();
        play_group_stage(&mut bracket);

        let err = bracket.advance_winner("GA_1", 1);
        assert!(matches!(err, Err(EngineError::Validation(_))));
        let err = bracket.advance_winner("SF_1", 7);
        assert!(matches!(err, Err(EngineError::Validation(_))));

        bracket.advance_winner("SF_1", 1).unwrap();
        bracket.advance_winner("SF_2", 2).unwrap();
        assert_eq!(bracket.stage(), TournamentStage::Knockout { remaining: 2 });
        bracket.advance_winner("F_1", 2).unwrap();
        assert_eq!(bracket.champion(), Some(2));
    }

    #[test]
    fn test_knockout_tie_rejected() {
        let mut bracket = TournamentBracket::new(teams(8), 2).unwrap();
        play_group_stage(&mut bracket);
        let err = bracket.record_result("SF_1", 5, 5);
        assert!(matches!(err, Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_group_tie_splits_points() {
        let mut bracket = TournamentBracket::new(teams(8), 2).unwrap();
        bracket.record_result("GA_1", 4, 4).unwrap();
        let table = bracket.standings(0);
        let tied: Vec<_> = table.iter().filter(|s| s.points == 1).collect();
        assert_eq!(tied.len(), 2);
    }

    #[test]
    fn test_duplicate_result_rejected() {
        let mut bracket = TournamentBracket::new(teams(8), 2).unwrap();
        bracket.record_result("GA_1", 4, 2).unwrap();
        let err = bracket.record_result("GA_1", 1, 2);
        assert!(matches!(err, Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_three_groups_produce_bye_round() {
        // 3 groups of 4: 6 qualifiers, first knockout has 3 matches, the
        // 3 winners then need a bye.
        let mut bracket = TournamentBracket::new(teams(12), 3).unwrap();
        play_group_stage(&mut bracket);
        assert_eq!(bracket.stage(), TournamentStage::Knockout { remaining: 6 });

        let round: Vec<String> = bracket
            .matches()
            .iter()
            .filter(|m| m.id.starts_with("R6"))
            .map(|m| m.id.clone())
            .collect();
        assert_eq!(round.len(), 3);
        for id in &round {
            let (home, away) = {
                let m = bracket
                    .matches()
                    .iter()
                    .find(|m| &m.id == id)
                    .unwrap();
                (m.home, m.away.unwrap())
            };
            let (home_ap, away_ap) = if home < away { (7, 2) } else { (2, 7) };
            bracket.record_result(id, home_ap, away_ap).unwrap();
        }

        assert_eq!(bracket.stage(), TournamentStage::Knockout { remaining: 3 });
        let byes: Vec<_> = bracket
            .matches()
            .iter()
            .filter(|m| m.stage == TournamentStage::Knockout { remaining: 3 } && m.away.is_none())
            .collect();
        assert_eq!(byes.len(), 1);
        assert_eq!(byes[0].winner, Some(byes[0].home));
        // The best surviving seed took the walkover.
        assert_eq!(byes[0].home, 1);
    }
}
