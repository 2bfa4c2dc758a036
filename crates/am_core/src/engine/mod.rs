//! The match engine - a deterministic state machine over logged commands.
//!
//! Every mutation enters as a [`Command`] with a console-captured timestamp.
//! The engine validates against the current phase, persists the resulting
//! record through the [`MatchStore`] BEFORE committing it in memory, then
//! appends the command to the log and publishes events. A rejected command
//! leaves state untouched; a store failure rejects the command. Replaying
//! the accepted-command log reproduces the exact same state.

pub mod command;
pub mod ledger;
pub mod penalty;
pub mod queue;
pub mod timer;

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bus::EventBus;
use crate::error::{EngineError, Result};
use crate::models::bout::{Bout, CallType};
use crate::models::events::{BoutDetail, EngineEvent, FoulDetail};
use crate::models::foul::{FoulKind, PenaltyAction, PenaltyRecord};
use crate::models::match_setup::{MatchConfig, Participant, PlayerId, SideEntry, TeamSide};
use crate::models::official::RecorderSlot;
use crate::models::snapshot::{
    DiscrepancyReport, EliminationEntry, FinalResult, MatchSnapshot, RoundSummary,
    RoundTally, RoundWinner, ScoreSnapshot, TimerReading,
};
use crate::store::MatchStore;

use self::command::{Command, CommandEnvelope, CommandLog};
use self::ledger::ScoringLedger;
use self::penalty::FoulPenaltyProcessor;
use self::queue::{elimination_bonus, PlayerQueue};
use self::timer::{RoundTimer, TimerSignal, ROUND_DURATION_MS};

/// Match lifecycle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    Idle,
    Setup,
    MatchActive,
    RoundActive,
    RoundComplete,
    /// Recorder tallies disagree; only the master's resolution may proceed.
    Discrepancy,
    Paused,
    Completed,
    Protested,
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchPhase::Idle => "idle",
            MatchPhase::Setup => "setup",
            MatchPhase::MatchActive => "match_active",
            MatchPhase::RoundActive => "round_active",
            MatchPhase::RoundComplete => "round_complete",
            MatchPhase::Discrepancy => "discrepancy",
            MatchPhase::Paused => "paused",
            MatchPhase::Completed => "completed",
            MatchPhase::Protested => "protested",
        };
        f.write_str(name)
    }
}

pub struct MatchEngine {
    match_id: Uuid,
    config: Option<MatchConfig>,
    phase: MatchPhase,
    phase_before_pause: MatchPhase,
    current_round: u8,
    /// Match clock, accumulated from tick commands while a round runs.
    clock_ms: u64,
    ledger: ScoringLedger,
    penalties: FoulPenaltyProcessor,
    penalty_records: Vec<PenaltyRecord>,
    queues: Option<(PlayerQueue, PlayerQueue)>,
    timer: Option<RoundTimer>,
    round_bouts: Vec<Bout>,
    rounds: Vec<RoundSummary>,
    eliminations: Vec<EliminationEntry>,
    recorder_tallies: HashMap<RecorderSlot, RoundTally>,
    rounds_won: (u8, u8),
    result: Option<FinalResult>,
    protest_reason: Option<String>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    log: CommandLog,
    store: Box<dyn MatchStore>,
    bus: EventBus,
}

/// Everything `apply` may need to roll back when the post-command snapshot
/// write fails. The store and the bus carry no engine state.
struct StateBackup {
    config: Option<MatchConfig>,
    phase: MatchPhase,
    phase_before_pause: MatchPhase,
    current_round: u8,
    clock_ms: u64,
    ledger: ScoringLedger,
    penalties: FoulPenaltyProcessor,
    penalty_records: Vec<PenaltyRecord>,
    queues: Option<(PlayerQueue, PlayerQueue)>,
    timer: Option<RoundTimer>,
    round_bouts: Vec<Bout>,
    rounds: Vec<RoundSummary>,
    eliminations: Vec<EliminationEntry>,
    recorder_tallies: HashMap<RecorderSlot, RoundTally>,
    rounds_won: (u8, u8),
    result: Option<FinalResult>,
    protest_reason: Option<String>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    log: CommandLog,
}

impl MatchEngine {
    pub fn new(store: Box<dyn MatchStore>, bus: EventBus) -> Self {
        Self::with_id(Uuid::new_v4(), store, bus)
    }

    pub fn with_id(match_id: Uuid, store: Box<dyn MatchStore>, bus: EventBus) -> Self {
        Self {
            match_id,
            config: None,
            phase: MatchPhase::Idle,
            phase_before_pause: MatchPhase::Idle,
            current_round: 0,
            clock_ms: 0,
            ledger: ScoringLedger::new(),
            penalties: FoulPenaltyProcessor::new(),
            penalty_records: Vec::new(),
            queues: None,
            timer: None,
            round_bouts: Vec::new(),
            rounds: Vec::new(),
            eliminations: Vec::new(),
            recorder_tallies: HashMap::new(),
            rounds_won: (0, 0),
            result: None,
            protest_reason: None,
            started_at: None,
            completed_at: None,
            log: CommandLog::new(),
            store,
            bus,
        }
    }

    /// Rebuild an engine by replaying an accepted-command log. The log only
    /// ever holds commands that were valid when accepted, so every step must
    /// apply cleanly.
    pub fn replay(
        match_id: Uuid,
        entries: &[CommandEnvelope],
        store: Box<dyn MatchStore>,
        bus: EventBus,
    ) -> Result<Self> {
        let mut engine = Self::with_id(match_id, store, bus);
        for entry in entries {
            engine.apply(entry.at, entry.command.clone())?;
        }
        log::info!("replayed {} commands for match {match_id}", entries.len());
        Ok(engine)
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn current_round(&self) -> u8 {
        self.current_round
    }

    pub fn result(&self) -> Option<&FinalResult> {
        self.result.as_ref()
    }

    pub fn command_log(&self) -> &CommandLog {
        &self.log
    }

    /// Apply one command. On success the command is logged, events are
    /// published, and the returned list mirrors what subscribers saw.
    pub fn apply(&mut self, at: DateTime<Utc>, command: Command) -> Result<Vec<EngineEvent>> {
        // A blocked match admits nothing but the master's resolution.
        if self.phase == MatchPhase::Discrepancy
            && !matches!(command, Command::ResolveDiscrepancy { .. })
        {
            return Err(EngineError::DiscrepancyDetected { round: self.current_round });
        }

        // Timer ticks mutate no scores and skip the snapshot write, so they
        // need no rollback point either.
        let backup = if matches!(command, Command::TimerTick { .. }) {
            None
        } else {
            Some(self.backup())
        };

        let events = match command.clone() {
            Command::SetupMatch { config } => self.setup_match(config)?,
            Command::StartMatch => self.start_match(at)?,
            Command::StartRound => self.start_round()?,
            Command::RecordBout { call, winner, loser } => {
                self.record_bout(at, call, winner, loser)?
            }
            Command::UndoBout => self.undo_bout(at)?,
            Command::ApplyFoul { participant, kind, deduction, note } => {
                self.apply_foul(at, participant, kind, deduction, note)?
            }
            Command::EliminatePlayer { participant } => {
                self.eliminate_player(participant)?
            }
            Command::Substitute { side, out, replacement } => {
                self.substitute(side, out, replacement)?
            }
            Command::SubmitRecorderTally { slot, tally } => {
                self.submit_recorder_tally(slot, tally)?
            }
            Command::ResolveDiscrepancy { tally } => self.resolve_discrepancy(tally)?,
            Command::Pause => self.pause()?,
            Command::Resume => self.resume()?,
            Command::EndRound => self.end_round()?,
            Command::EndMatch => self.end_match(at)?,
            Command::Protest { reason } => self.protest(reason)?,
            Command::TimerTick { elapsed_ms } => self.timer_tick(elapsed_ms)?,
        };

        let seq = self.log.append(at, command.clone());

        // The snapshot write is part of the commit: if it fails, the
        // handler's mutation and the log entry are rolled back and the
        // command is rejected with state as it was before the call.
        if let Some(backup) = backup {
            if let Some(snapshot) = self.snapshot() {
                if let Err(e) = self.store.save_snapshot(&snapshot) {
                    self.restore(backup);
                    return Err(EngineError::Persistence(e.to_string()));
                }
            }
        }
        log::debug!("applied #{seq} {} in {}", command.name(), self.phase);

        for event in &events {
            self.bus.publish(event.clone());
        }
        Ok(events)
    }

    fn invalid(&self, command: &'static str) -> EngineError {
        EngineError::InvalidState { command, state: self.phase }
    }

    fn backup(&self) -> StateBackup {
        StateBackup {
            config: self.config.clone(),
            phase: self.phase,
            phase_before_pause: self.phase_before_pause,
            current_round: self.current_round,
            clock_ms: self.clock_ms,
            ledger: self.ledger.clone(),
            penalties: self.penalties.clone(),
            penalty_records: self.penalty_records.clone(),
            queues: self.queues.clone(),
            timer: self.timer.clone(),
            round_bouts: self.round_bouts.clone(),
            rounds: self.rounds.clone(),
            eliminations: self.eliminations.clone(),
            recorder_tallies: self.recorder_tallies.clone(),
            rounds_won: self.rounds_won,
            result: self.result.clone(),
            protest_reason: self.protest_reason.clone(),
            started_at: self.started_at,
            completed_at: self.completed_at,
            log: self.log.clone(),
        }
    }

    fn restore(&mut self, backup: StateBackup) {
        self.config = backup.config;
        self.phase = backup.phase;
        self.phase_before_pause = backup.phase_before_pause;
        self.current_round = backup.current_round;
        self.clock_ms = backup.clock_ms;
        self.ledger = backup.ledger;
        self.penalties = backup.penalties;
        self.penalty_records = backup.penalty_records;
        self.queues = backup.queues;
        self.timer = backup.timer;
        self.round_bouts = backup.round_bouts;
        self.rounds = backup.rounds;
        self.eliminations = backup.eliminations;
        self.recorder_tallies = backup.recorder_tallies;
        self.rounds_won = backup.rounds_won;
        self.result = backup.result;
        self.protest_reason = backup.protest_reason;
        self.started_at = backup.started_at;
        self.completed_at = backup.completed_at;
        self.log = backup.log;
    }

    // ---- command handlers -------------------------------------------------

    fn setup_match(&mut self, config: MatchConfig) -> Result<Vec<EngineEvent>> {
        if !matches!(self.phase, MatchPhase::Idle | MatchPhase::Setup) {
            return Err(self.invalid("setup_match"));
        }
        config.validate()?;
        if config.mode.uses_rosters() {
            let home = self.roster_queue(&config, TeamSide::Home)?;
            let away = self.roster_queue(&config, TeamSide::Away)?;
            self.queues = Some((home, away));
        } else {
            self.queues = None;
        }
        self.config = Some(config);
        self.phase = MatchPhase::Setup;
        Ok(vec![
            EngineEvent::StateChanged { phase: MatchPhase::Setup },
            self.score_event(),
        ])
    }

    fn roster_queue(&self, config: &MatchConfig, side: TeamSide) -> Result<PlayerQueue> {
        let entry = match side {
            TeamSide::Home => &config.home,
            TeamSide::Away => &config.away,
        };
        match entry {
            SideEntry::Roster { players, .. } => {
                PlayerQueue::from_roster(side, players.clone())
            }
            SideEntry::Single(_) => Err(EngineError::Validation(format!(
                "{} side has no roster",
                side.label()
            ))),
        }
    }

    fn start_match(&mut self, at: DateTime<Utc>) -> Result<Vec<EngineEvent>> {
        if self.phase != MatchPhase::Setup {
            return Err(self.invalid("start_match"));
        }
        self.started_at = Some(at);
        self.phase = MatchPhase::MatchActive;
        let mut events = vec![EngineEvent::StateChanged { phase: MatchPhase::MatchActive }];
        events.extend(self.open_round()?);
        Ok(events)
    }

    fn start_round(&mut self) -> Result<Vec<EngineEvent>> {
        if self.phase != MatchPhase::RoundComplete {
            return Err(self.invalid("start_round"));
        }
        let total = self.config_ref()?.total_rounds;
        if self.current_round >= total {
            return Err(EngineError::Validation(format!(
                "all {total} rounds have been played"
            )));
        }
        self.open_round()
    }

    fn open_round(&mut self) -> Result<Vec<EngineEvent>> {
        let config = self.config_ref()?;
        let timer = if config.mode.uses_rosters() {
            let target = self
                .queues
                .as_ref()
                .map(|(h, a)| h.active_count().max(a.active_count()) as u32)
                .unwrap_or(1);
            RoundTimer::queue_cycle(target)
        } else {
            RoundTimer::fixed()
        };
        self.timer = Some(timer);
        self.current_round += 1;
        self.round_bouts.clear();
        self.recorder_tallies.clear();
        self.ledger.begin_round();
        self.phase = MatchPhase::RoundActive;
        Ok(vec![
            EngineEvent::RoundStarted { round: self.current_round },
            EngineEvent::StateChanged { phase: MatchPhase::RoundActive },
            self.score_event(),
        ])
    }

    fn record_bout(
        &mut self,
        at: DateTime<Utc>,
        call: CallType,
        winner: PlayerId,
        loser: PlayerId,
    ) -> Result<Vec<EngineEvent>> {
        if self.phase != MatchPhase::RoundActive {
            return Err(self.invalid("record_bout"));
        }
        if winner == loser {
            return Err(EngineError::Validation(
                "a bout needs two distinct participants".into(),
            ));
        }
        let winner_side = self.expected_bout_side(winner)?;
        let loser_side = self.expected_bout_side(loser)?;
        if winner_side == loser_side {
            return Err(EngineError::Validation(
                "bout participants must be on opposite sides".into(),
            ));
        }

        let time_remaining_ms = match self.timer.as_ref().map(|t| t.reading()) {
            Some(TimerReading::Countdown { remaining_ms }) => Some(remaining_ms),
            _ => None,
        };
        let bout = Bout {
            round: self.current_round,
            sequence: self.round_bouts.len() as u32 + 1,
            call,
            winner,
            loser,
            time_remaining_ms,
            clock_ms: self.clock_ms,
            at,
        };
        self.store
            .save_bout(&bout)
            .map_err(|e| EngineError::Persistence(e.to_string()))?;

        self.ledger.record_bout(winner_side, call, winner);
        if let Some(timer) = self.timer.as_mut() {
            timer.note_bout();
        }
        if let Some((home, away)) = self.queues.as_mut() {
            home.rotate();
            away.rotate();
        }
        let detail = BoutDetail {
            round: bout.round,
            sequence: bout.sequence,
            call,
            winner,
            loser,
        };
        self.round_bouts.push(bout);

        let mut events = vec![EngineEvent::BoutRecorded { detail }, self.score_event()];
        if self.timer.as_ref().map(|t| t.is_expired()).unwrap_or(false) {
            events.push(EngineEvent::RoundExpired { round: self.current_round });
        }
        Ok(events)
    }

    fn undo_bout(&mut self, at: DateTime<Utc>) -> Result<Vec<EngineEvent>> {
        if self.phase != MatchPhase::RoundActive {
            return Err(self.invalid("undo_bout"));
        }
        let bout = self
            .round_bouts
            .pop()
            .ok_or_else(|| EngineError::Validation("no bout to undo in this round".into()))?;
        let winner_side = match self.side_of_participant(bout.winner) {
            Some(side) => side,
            None => {
                self.round_bouts.push(bout);
                return Err(EngineError::Validation("bout winner no longer known".into()));
            }
        };
        // The undo is its own journal record; the recorded bout is never
        // erased from the store.
        if let Err(e) = self.store.save_bout_undo(bout.round, bout.sequence, at) {
            self.round_bouts.push(bout);
            return Err(EngineError::Persistence(e.to_string()));
        }
        self.ledger.undo_bout(winner_side, bout.call, bout.winner);
        if let Some(timer) = self.timer.as_mut() {
            timer.unnote_bout();
        }
        if let Some((home, away)) = self.queues.as_mut() {
            home.rotate_back();
            away.rotate_back();
        }
        let detail = BoutDetail {
            round: bout.round,
            sequence: bout.sequence,
            call: bout.call,
            winner: bout.winner,
            loser: bout.loser,
        };
        Ok(vec![EngineEvent::BoutUndone { detail }, self.score_event()])
    }

    fn apply_foul(
        &mut self,
        at: DateTime<Utc>,
        participant: PlayerId,
        kind: FoulKind,
        deduction: Option<u32>,
        note: Option<String>,
    ) -> Result<Vec<EngineEvent>> {
        if !matches!(self.phase, MatchPhase::RoundActive | MatchPhase::RoundComplete) {
            return Err(self.invalid("apply_foul"));
        }
        let side = self
            .side_of_participant(participant)
            .ok_or(EngineError::UnknownParticipant(participant))?;

        let assessment = self.penalties.assess(participant, kind, deduction);
        // Clamp against the current total so the audit record can be written
        // before anything moves.
        let deducted = assessment.requested_deduction.min(self.ledger.side(side).ap);
        let record = PenaltyRecord {
            participant,
            kind,
            action: assessment.action,
            occurrence: assessment.occurrence,
            requested_deduction: assessment.requested_deduction,
            deducted,
            note,
            at,
        };
        self.store
            .save_penalty(&record)
            .map_err(|e| EngineError::Persistence(e.to_string()))?;

        self.penalties.commit(&assessment);
        if assessment.action == PenaltyAction::ApDeduction || deduction.is_some() {
            self.ledger.apply_deduction(side, assessment.requested_deduction);
        }
        self.penalty_records.push(record);

        let mut events = vec![EngineEvent::FoulApplied {
            detail: FoulDetail {
                participant,
                kind,
                action: assessment.action,
                occurrence: assessment.occurrence,
                ap_deducted: deducted,
            },
        }];
        // In team play a disqualified player also leaves the queue, even
        // mid-round. In head-to-head there is no queue; the officials
        // settle the match.
        if assessment.is_disqualification() && self.queues.is_some() {
            events.extend(self.remove_from_queue(participant, true)?);
        }
        events.push(self.score_event());
        Ok(events)
    }

    /// Eliminations are an end-of-round bookkeeping step: the command is
    /// accepted once the round is closed, never while bouts are running.
    fn eliminate_player(&mut self, participant: PlayerId) -> Result<Vec<EngineEvent>> {
        if self.phase != MatchPhase::RoundComplete {
            return Err(self.invalid("eliminate_player"));
        }
        self.remove_from_queue(participant, false)
    }

    /// Remove a player from their queue. Eliminations pay the opponent the
    /// tiered bonus; disqualifications pay nothing.
    fn remove_from_queue(
        &mut self,
        participant: PlayerId,
        by_disqualification: bool,
    ) -> Result<Vec<EngineEvent>> {
        let (home, away) = self
            .queues
            .as_mut()
            .ok_or_else(|| EngineError::Validation("no rosters in this mode".into()))?;
        let (queue, side) = if home.contains(participant) {
            (home, TeamSide::Home)
        } else if away.contains(participant) {
            (away, TeamSide::Away)
        } else {
            return Err(EngineError::UnknownParticipant(participant));
        };
        let remaining = queue.eliminate(participant)?;

        let bonus = if by_disqualification { 0 } else { elimination_bonus(remaining) };
        if bonus > 0 {
            self.ledger.credit_bonus(side.opponent(), bonus);
        }
        self.eliminations.push(EliminationEntry {
            round: self.current_round,
            participant,
            side,
            bonus_awarded: bonus,
            by_disqualification,
        });
        log::info!(
            "player {participant} out ({} remain on {}), bonus {bonus} to {}",
            remaining,
            side.label(),
            side.opponent().label()
        );
        Ok(vec![
            EngineEvent::PlayerEliminated { participant, side, bonus },
            self.score_event(),
        ])
    }

    fn substitute(
        &mut self,
        side: TeamSide,
        out: PlayerId,
        replacement: Participant,
    ) -> Result<Vec<EngineEvent>> {
        // Substitutions happen between rounds only.
        if self.phase != MatchPhase::RoundComplete {
            return Err(self.invalid("substitute"));
        }
        let (home, away) = self
            .queues
            .as_mut()
            .ok_or_else(|| EngineError::Validation("no rosters in this mode".into()))?;
        let queue = match side {
            TeamSide::Home => home,
            TeamSide::Away => away,
        };
        let into = replacement.id;
        queue.substitute(out, replacement)?;
        Ok(vec![
            EngineEvent::SubstitutionMade { side, out, into },
            self.score_event(),
        ])
    }

    fn submit_recorder_tally(
        &mut self,
        slot: RecorderSlot,
        tally: RoundTally,
    ) -> Result<Vec<EngineEvent>> {
        if self.phase != MatchPhase::RoundActive {
            return Err(self.invalid("submit_recorder_tally"));
        }
        self.recorder_tallies.insert(slot, tally);
        Ok(vec![])
    }

    fn end_round(&mut self) -> Result<Vec<EngineEvent>> {
        if self.phase != MatchPhase::RoundActive {
            return Err(self.invalid("end_round"));
        }
        let ledger_tally = self.ledger.round_tally();
        let a = self.recorder_tallies.get(&RecorderSlot::A).copied();
        let b = self.recorder_tallies.get(&RecorderSlot::B).copied();

        // Any submitted tally that disagrees with the master ledger blocks
        // the round until the master resolves it.
        let mismatch = [a, b]
            .into_iter()
            .flatten()
            .any(|tally| tally != ledger_tally);
        if mismatch {
            let report = DiscrepancyReport {
                round: self.current_round,
                recorder_a: a,
                recorder_b: b,
                ledger: ledger_tally,
            };
            self.phase = MatchPhase::Discrepancy;
            log::warn!("round {} tallies disagree, blocking", self.current_round);
            return Ok(vec![
                EngineEvent::DiscrepancyDetected { report },
                EngineEvent::StateChanged { phase: MatchPhase::Discrepancy },
            ]);
        }
        Ok(self.finalize_round(ledger_tally))
    }

    fn resolve_discrepancy(&mut self, tally: RoundTally) -> Result<Vec<EngineEvent>> {
        if self.phase != MatchPhase::Discrepancy {
            return Err(self.invalid("resolve_discrepancy"));
        }
        log::info!(
            "round {} resolved by master override: {:?}",
            self.current_round,
            tally
        );
        Ok(self.finalize_round(tally))
    }

    fn finalize_round(&mut self, tally: RoundTally) -> Vec<EngineEvent> {
        let winner = RoundWinner::from_tally(tally);
        match winner.side() {
            Some(TeamSide::Home) => self.rounds_won.0 += 1,
            Some(TeamSide::Away) => self.rounds_won.1 += 1,
            None => {}
        }
        self.rounds.push(RoundSummary {
            number: self.current_round,
            home: self.ledger.side(TeamSide::Home),
            away: self.ledger.side(TeamSide::Away),
            bout_count: self.round_bouts.len() as u32,
            winner,
        });
        self.recorder_tallies.clear();
        self.timer = None;
        self.phase = MatchPhase::RoundComplete;
        vec![
            EngineEvent::RoundEnded { round: self.current_round, winner },
            EngineEvent::StateChanged { phase: MatchPhase::RoundComplete },
            self.score_event(),
        ]
    }

    fn pause(&mut self) -> Result<Vec<EngineEvent>> {
        if self.phase != MatchPhase::RoundActive {
            return Err(self.invalid("pause"));
        }
        self.phase_before_pause = self.phase;
        self.phase = MatchPhase::Paused;
        if let Some(timer) = self.timer.as_mut() {
            timer.pause();
        }
        Ok(vec![
            EngineEvent::StateChanged { phase: MatchPhase::Paused },
            self.score_event(),
        ])
    }

    fn resume(&mut self) -> Result<Vec<EngineEvent>> {
        if self.phase != MatchPhase::Paused {
            return Err(self.invalid("resume"));
        }
        self.phase = self.phase_before_pause;
        if let Some(timer) = self.timer.as_mut() {
            timer.resume();
        }
        Ok(vec![
            EngineEvent::StateChanged { phase: self.phase },
            self.score_event(),
        ])
    }

    fn end_match(&mut self, at: DateTime<Utc>) -> Result<Vec<EngineEvent>> {
        let team_out = self
            .queues
            .as_ref()
            .map(|(h, a)| h.is_team_eliminated() || a.is_team_eliminated())
            .unwrap_or(false);
        let allowed = self.phase == MatchPhase::RoundComplete
            || (self.phase == MatchPhase::RoundActive && team_out);
        if !allowed {
            return Err(self.invalid("end_match"));
        }

        let home_ap = self.ledger.side(TeamSide::Home).ap;
        let away_ap = self.ledger.side(TeamSide::Away).ap;
        // Cumulative AP decides; rounds won break a tie; otherwise declared.
        let winner = if home_ap != away_ap {
            if home_ap > away_ap { RoundWinner::Home } else { RoundWinner::Away }
        } else if self.rounds_won.0 != self.rounds_won.1 {
            if self.rounds_won.0 > self.rounds_won.1 {
                RoundWinner::Home
            } else {
                RoundWinner::Away
            }
        } else {
            RoundWinner::Tie
        };
        let result = FinalResult {
            winner,
            home_ap,
            away_ap,
            home_rounds_won: self.rounds_won.0,
            away_rounds_won: self.rounds_won.1,
            rounds_played: self.rounds.len() as u8,
        };
        self.result = Some(result.clone());
        self.completed_at = Some(at);
        self.phase = MatchPhase::Completed;
        Ok(vec![
            EngineEvent::MatchCompleted { result },
            EngineEvent::StateChanged { phase: MatchPhase::Completed },
            self.score_event(),
        ])
    }

    /// A completed result may be put under protest. Whether the protest
    /// window is still open is the caller's business.
    fn protest(&mut self, reason: String) -> Result<Vec<EngineEvent>> {
        if self.phase != MatchPhase::Completed {
            return Err(self.invalid("protest"));
        }
        log::warn!("result protested: {reason}");
        self.protest_reason = Some(reason);
        self.phase = MatchPhase::Protested;
        Ok(vec![
            EngineEvent::StateChanged { phase: MatchPhase::Protested },
            self.score_event(),
        ])
    }

    fn timer_tick(&mut self, elapsed_ms: u64) -> Result<Vec<EngineEvent>> {
        if !matches!(self.phase, MatchPhase::RoundActive | MatchPhase::Paused) {
            return Err(self.invalid("timer_tick"));
        }
        let mut events = Vec::new();
        if self.phase == MatchPhase::RoundActive {
            self.clock_ms += elapsed_ms;
        }
        if let Some(timer) = self.timer.as_mut() {
            for signal in timer.advance(elapsed_ms) {
                events.push(match signal {
                    TimerSignal::Warning(seconds_left) => {
                        EngineEvent::TimeWarning { seconds_left }
                    }
                    TimerSignal::PauseViolation => {
                        EngineEvent::PauseViolation { side_hint: None }
                    }
                    TimerSignal::Expired => {
                        EngineEvent::RoundExpired { round: self.current_round }
                    }
                });
            }
            events.push(EngineEvent::TimerTick { reading: timer.reading() });
        }
        Ok(events)
    }

    // ---- lookups and snapshots --------------------------------------------

    fn config_ref(&self) -> Result<&MatchConfig> {
        self.config
            .as_ref()
            .ok_or(EngineError::InvalidState { command: "setup_match", state: self.phase })
    }

    /// Side a participant belongs to, including mid-match substitutes that
    /// only the queues know about.
    fn side_of_participant(&self, id: PlayerId) -> Option<TeamSide> {
        if let Some((home, away)) = &self.queues {
            if home.contains(id) || home.was_eliminated(id) {
                return Some(TeamSide::Home);
            }
            if away.contains(id) || away.was_eliminated(id) {
                return Some(TeamSide::Away);
            }
        }
        self.config.as_ref().and_then(|c| c.side_of(id))
    }

    /// For a bout, the participant must be eligible to stand in the Red
    /// Zone: the configured single, or the box 1 occupant of their queue.
    fn expected_bout_side(&self, id: PlayerId) -> Result<TeamSide> {
        if let Some((home, away)) = &self.queues {
            for queue in [home, away] {
                if let Some(active) = queue.active_player() {
                    if active.id == id {
                        return Ok(queue.side());
                    }
                }
            }
            return Err(EngineError::Validation(format!(
                "player {id} is not in the Red Zone"
            )));
        }
        self.side_of_participant(id)
            .ok_or(EngineError::UnknownParticipant(id))
    }

    fn timer_reading(&self, config: &MatchConfig) -> TimerReading {
        if let Some(timer) = &self.timer {
            return timer.reading();
        }
        if config.mode.uses_rosters() {
            let target = self
                .queues
                .as_ref()
                .map(|(h, a)| h.active_count().max(a.active_count()) as u32)
                .unwrap_or(0);
            TimerReading::CycleProgress { completed: 0, target }
        } else {
            TimerReading::Countdown { remaining_ms: ROUND_DURATION_MS }
        }
    }

    fn score_event(&self) -> EngineEvent {
        // Only called after setup, when a config is guaranteed.
        match self.score_snapshot() {
            Some(snapshot) => EngineEvent::ScoreUpdated { snapshot },
            None => EngineEvent::StateChanged { phase: self.phase },
        }
    }

    /// Live score view; `None` before setup.
    pub fn score_snapshot(&self) -> Option<ScoreSnapshot> {
        let config = self.config.as_ref()?;
        let (home_remaining, away_remaining, home_subs, away_subs) = match &self.queues {
            Some((h, a)) => (
                Some(h.active_count() as u8),
                Some(a.active_count() as u8),
                h.substitutions_used(),
                a.substitutions_used(),
            ),
            None => (None, None, 0, 0),
        };
        Some(ScoreSnapshot {
            match_id: self.match_id,
            mode: config.mode,
            phase: self.phase,
            current_round: self.current_round,
            total_rounds: config.total_rounds,
            bout_count: self.round_bouts.len() as u32,
            home_name: config.home.display_name().to_string(),
            away_name: config.away.display_name().to_string(),
            home: self.ledger.side(TeamSide::Home),
            away: self.ledger.side(TeamSide::Away),
            timer: self.timer_reading(config),
            home_remaining,
            away_remaining,
            home_substitutions_used: home_subs,
            away_substitutions_used: away_subs,
        })
    }

    /// Full persisted/exported view; `None` before setup.
    pub fn snapshot(&self) -> Option<MatchSnapshot> {
        let config = self.config.as_ref()?;
        Some(MatchSnapshot {
            match_id: self.match_id,
            mode: config.mode,
            phase: self.phase,
            total_rounds: config.total_rounds,
            officials: config.officials.clone(),
            score: self.score_snapshot()?,
            rounds: self.rounds.clone(),
            penalties: self.penalty_records.clone(),
            eliminations: self.eliminations.clone(),
            protest_reason: self.protest_reason.clone(),
            result: self.result.clone(),
            started_at: self.started_at,
            completed_at: self.completed_at,
            command_seq: self.log.last_seq(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use chrono::TimeZone;

    use crate::models::match_setup::{GameMode, Participant, TEAM_MODE_ROUNDS};
    use crate::models::official::full_crew;
    use crate::store::{MemoryStore, StoreError};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 15, 0, 0).unwrap()
    }

    fn h2h_config() -> MatchConfig {
        MatchConfig {
            mode: GameMode::HeadToHead,
            total_rounds: 5,
            home: SideEntry::Single(Participant::new(1, "Kofi")),
            away: SideEntry::Single(Participant::new(2, "Ama")),
            officials: full_crew(),
        }
    }

    fn team_config(per_side: u32) -> MatchConfig {
        let roster = |name: &str, start: u32| SideEntry::Roster {
            team_name: name.to_string(),
            players: (start..start + per_side)
                .map(|i| Participant::new(i, format!("P{i}")))
                .collect(),
        };
        MatchConfig {
            mode: GameMode::TeamElimination,
            total_rounds: TEAM_MODE_ROUNDS,
            home: roster("Accra", 1),
            away: roster("Kumasi", 100),
            officials: full_crew(),
        }
    }

    fn engine_with(config: MatchConfig) -> (MatchEngine, MemoryStore) {
        let store = MemoryStore::new();
        let mut engine =
            MatchEngine::new(Box::new(store.clone()), EventBus::new());
        engine.apply(t0(), Command::SetupMatch { config }).unwrap();
        engine.apply(t0(), Command::StartMatch).unwrap();
        (engine, store)
    }

    fn record(engine: &mut MatchEngine, call: CallType, winner: PlayerId, loser: PlayerId) {
        engine
            .apply(t0(), Command::RecordBout { call, winner, loser })
            .unwrap();
    }

    #[test]
    fn test_start_match_opens_round_one() {
        let (engine, _) = engine_with(h2h_config());
        assert_eq!(engine.phase(), MatchPhase::RoundActive);
        assert_eq!(engine.current_round(), 1);
    }

    #[test]
    fn test_bout_rejected_before_start() {
        let store = MemoryStore::new();
        let mut engine = MatchEngine::new(Box::new(store), EventBus::new());
        let err = engine.apply(
            t0(),
            Command::RecordBout { call: CallType::Opa, winner: 1, loser: 2 },
        );
        assert!(matches!(err, Err(EngineError::InvalidState { .. })));
        assert!(engine.command_log().is_empty());
    }

    #[test]
    fn test_head_to_head_scoring_and_round_end() {
        let (mut engine, store) = engine_with(h2h_config());
        // P1 takes three opa bouts, P2 two oshi bouts.
        for _ in 0..3 {
            record(&mut engine, CallType::Opa, 1, 2);
        }
        for _ in 0..2 {
            record(&mut engine, CallType::Oshi, 2, 1);
        }

        let snap = engine.score_snapshot().unwrap();
        assert_eq!(snap.home.ap, 3);
        assert_eq!(snap.home.opa_wins, 3);
        assert_eq!(snap.away.ap, 2);
        assert_eq!(snap.away.oshi_wins, 2);
        assert_eq!(snap.bout_count, 5);
        assert_eq!(store.records().bouts.len(), 5);

        let events = engine.apply(t0(), Command::EndRound).unwrap();
        assert!(matches!(
            events[0],
            EngineEvent::RoundEnded { round: 1, winner: RoundWinner::Home }
        ));
        assert_eq!(engine.phase(), MatchPhase::RoundComplete);
    }

    #[test]
    fn test_full_match_to_result() {
        let (mut engine, _) = engine_with(h2h_config());
        for round in 1..=5u8 {
            if round > 1 {
                engine.apply(t0(), Command::StartRound).unwrap();
            }
            record(&mut engine, CallType::Opa, 1, 2);
            if round == 1 {
                record(&mut engine, CallType::Oshi, 2, 1);
            }
            engine.apply(t0(), Command::EndRound).unwrap();
        }
        let events = engine.apply(t0(), Command::EndMatch).unwrap();
        let result = match &events[0] {
            EngineEvent::MatchCompleted { result } => result.clone(),
            other => panic!("unexpected event {other:?}"),
        };
        assert_eq!(result.winner, RoundWinner::Home);
        assert_eq!(result.home_ap, 5);
        assert_eq!(result.away_ap, 1);
        assert_eq!(result.rounds_played, 5);
        assert_eq!(engine.phase(), MatchPhase::Completed);

        // Terminal: nothing else is accepted.
        let err = engine.apply(t0(), Command::StartRound);
        assert!(matches!(err, Err(EngineError::InvalidState { .. })));
    }

    #[test]
    fn test_undo_restores_score_and_sequence() {
        let (mut engine, store) = engine_with(h2h_config());
        record(&mut engine, CallType::Opa, 1, 2);
        record(&mut engine, CallType::Oshi, 2, 1);
        engine.apply(t0(), Command::UndoBout).unwrap();

        let snap = engine.score_snapshot().unwrap();
        assert_eq!(snap.away.ap, 0);
        assert_eq!(snap.bout_count, 1);

        // The next bout reuses the undone sequence number.
        record(&mut engine, CallType::Opa, 1, 2);
        let snap = engine.score_snapshot().unwrap();
        assert_eq!(snap.bout_count, 2);

        // The journal keeps all three bouts plus the undo marker, so the
        // reused sequence number stays unambiguous on disk.
        let records = store.records();
        assert_eq!(records.bouts.len(), 3);
        assert_eq!(records.bout_undos, vec![(1, 2)]);
    }

    #[test]
    fn test_timer_ticks_warn_and_expire() {
        let (mut engine, _) = engine_with(h2h_config());
        let mut warned = Vec::new();
        let mut expired = false;
        let mut violations = 0;
        for _ in 0..(ROUND_DURATION_MS / 100) {
            let events = engine
                .apply(t0(), Command::TimerTick { elapsed_ms: 100 })
                .unwrap();
            for event in events {
                match event {
                    EngineEvent::TimeWarning { seconds_left } => warned.push(seconds_left),
                    EngineEvent::RoundExpired { .. } => expired = true,
                    EngineEvent::PauseViolation { .. } => violations += 1,
                    _ => {}
                }
            }
        }
        assert_eq!(warned, vec![30, 10, 5]);
        assert!(expired);
        // 60s without a bout: the 10s inactivity violation fired once.
        assert_eq!(violations, 1);
        // Expiry does not end the round by itself.
        assert_eq!(engine.phase(), MatchPhase::RoundActive);
    }

    #[test]
    fn test_pause_freezes_countdown() {
        let (mut engine, _) = engine_with(h2h_config());
        engine.apply(t0(), Command::TimerTick { elapsed_ms: 5_000 }).unwrap();
        engine.apply(t0(), Command::Pause).unwrap();
        engine.apply(t0(), Command::TimerTick { elapsed_ms: 20_000 }).unwrap();

        let err = engine.apply(
            t0(),
            Command::RecordBout { call: CallType::Opa, winner: 1, loser: 2 },
        );
        assert!(matches!(err, Err(EngineError::InvalidState { .. })));

        engine.apply(t0(), Command::Resume).unwrap();
        let snap = engine.score_snapshot().unwrap();
        assert_eq!(
            snap.timer,
            TimerReading::Countdown { remaining_ms: ROUND_DURATION_MS - 5_000 }
        );
        assert_eq!(engine.phase(), MatchPhase::RoundActive);
    }

    #[test]
    fn test_foul_deduction_and_audit_record() {
        let (mut engine, store) = engine_with(h2h_config());
        record(&mut engine, CallType::Opa, 1, 2);

        // Second delay-of-game costs 1 AP.
        for _ in 0..2 {
            engine
                .apply(
                    t0(),
                    Command::ApplyFoul {
                        participant: 1,
                        kind: FoulKind::DelayOfGame,
                        deduction: None,
                        note: None,
                    },
                )
                .unwrap();
        }
        let snap = engine.score_snapshot().unwrap();
        assert_eq!(snap.home.ap, 0);

        let records = store.records();
        assert_eq!(records.penalties.len(), 2);
        assert_eq!(records.penalties[1].occurrence, 2);
        assert_eq!(records.penalties[1].deducted, 1);
    }

    #[test]
    fn test_disqualification_removes_without_bonus() {
        let (mut engine, _) = engine_with(team_config(5));
        engine
            .apply(
                t0(),
                Command::ApplyFoul {
                    participant: 3,
                    kind: FoulKind::IntentionalFoul,
                    deduction: None,
                    note: Some("struck an official".into()),
                },
            )
            .unwrap();

        let snap = engine.snapshot().unwrap();
        assert_eq!(snap.eliminations.len(), 1);
        assert!(snap.eliminations[0].by_disqualification);
        assert_eq!(snap.eliminations[0].bonus_awarded, 0);
        assert_eq!(snap.score.away.ap, 0);
        assert_eq!(snap.score.home_remaining, Some(4));
    }

    #[test]
    fn test_elimination_bonus_tiers_accumulate() {
        let (mut engine, _) = engine_with(team_config(5));
        // Eliminations are applied once the round is closed, not mid-round.
        let err = engine.apply(t0(), Command::EliminatePlayer { participant: 1 });
        assert!(matches!(err, Err(EngineError::InvalidState { .. })));
        engine.apply(t0(), Command::EndRound).unwrap();

        // Home loses players one by one; away collects escalating bonuses.
        for (player, expected_total) in [(1u32, 3u32), (2, 6), (3, 11), (4, 21), (5, 36)] {
            engine
                .apply(t0(), Command::EliminatePlayer { participant: player })
                .unwrap();
            let snap = engine.score_snapshot().unwrap();
            assert_eq!(snap.away.ap, expected_total);
        }
        assert_eq!(engine.score_snapshot().unwrap().home_remaining, Some(0));
        engine.apply(t0(), Command::EndMatch).unwrap();
        assert_eq!(engine.result().unwrap().winner, RoundWinner::Away);
    }

    #[test]
    fn test_team_bout_requires_red_zone_players() {
        let (mut engine, _) = engine_with(team_config(5));
        // Box 1 occupants are 1 (home) and 100 (away).
        let err = engine.apply(
            t0(),
            Command::RecordBout { call: CallType::Opa, winner: 2, loser: 100 },
        );
        assert!(matches!(err, Err(EngineError::Validation(_))));

        record(&mut engine, CallType::Opa, 1, 100);
        // Both queues rotated.
        let err = engine.apply(
            t0(),
            Command::RecordBout { call: CallType::Opa, winner: 1, loser: 101 },
        );
        assert!(matches!(err, Err(EngineError::Validation(_))));
        record(&mut engine, CallType::Oshi, 101, 2);
    }

    #[test]
    fn test_substitution_between_rounds_only() {
        let (mut engine, _) = engine_with(team_config(5));
        let sub = Participant::new(50, "Bench");
        let err = engine.apply(
            t0(),
            Command::Substitute { side: TeamSide::Home, out: 3, replacement: sub.clone() },
        );
        assert!(matches!(err, Err(EngineError::InvalidState { .. })));

        engine.apply(t0(), Command::EndRound).unwrap();
        engine
            .apply(
                t0(),
                Command::Substitute { side: TeamSide::Home, out: 3, replacement: sub },
            )
            .unwrap();
        assert_eq!(engine.score_snapshot().unwrap().home_substitutions_used, 1);
    }

    #[test]
    fn test_matching_tallies_close_the_round() {
        let (mut engine, _) = engine_with(h2h_config());
        record(&mut engine, CallType::Opa, 1, 2);
        let tally = RoundTally { home_ap: 1, away_ap: 0 };
        engine
            .apply(t0(), Command::SubmitRecorderTally { slot: RecorderSlot::A, tally })
            .unwrap();
        engine
            .apply(t0(), Command::SubmitRecorderTally { slot: RecorderSlot::B, tally })
            .unwrap();
        engine.apply(t0(), Command::EndRound).unwrap();
        assert_eq!(engine.phase(), MatchPhase::RoundComplete);
    }

    #[test]
    fn test_discrepancy_blocks_until_resolved() {
        let (mut engine, _) = engine_with(h2h_config());
        record(&mut engine, CallType::Opa, 1, 2);
        engine
            .apply(
                t0(),
                Command::SubmitRecorderTally {
                    slot: RecorderSlot::A,
                    tally: RoundTally { home_ap: 2, away_ap: 0 },
                },
            )
            .unwrap();
        let events = engine.apply(t0(), Command::EndRound).unwrap();
        assert!(matches!(events[0], EngineEvent::DiscrepancyDetected { .. }));
        assert_eq!(engine.phase(), MatchPhase::Discrepancy);

        let err = engine.apply(t0(), Command::StartRound);
        assert!(matches!(
            err,
            Err(EngineError::DiscrepancyDetected { round: 1 })
        ));

        engine
            .apply(
                t0(),
                Command::ResolveDiscrepancy {
                    tally: RoundTally { home_ap: 1, away_ap: 0 },
                },
            )
            .unwrap();
        assert_eq!(engine.phase(), MatchPhase::RoundComplete);
        assert_eq!(engine.snapshot().unwrap().rounds[0].winner, RoundWinner::Home);
    }

    #[test]
    fn test_protest_only_after_completion() {
        let (mut engine, _) = engine_with(h2h_config());
        let err = engine.apply(
            t0(),
            Command::Protest { reason: "contested call in bout 3".into() },
        );
        assert!(matches!(err, Err(EngineError::InvalidState { .. })));

        record(&mut engine, CallType::Opa, 1, 2);
        engine.apply(t0(), Command::EndRound).unwrap();
        engine.apply(t0(), Command::EndMatch).unwrap();
        engine
            .apply(t0(), Command::Protest { reason: "contested call in bout 3".into() })
            .unwrap();
        assert_eq!(engine.phase(), MatchPhase::Protested);
        assert_eq!(
            engine.snapshot().unwrap().protest_reason.as_deref(),
            Some("contested call in bout 3")
        );

        let err = engine.apply(t0(), Command::StartRound);
        assert!(matches!(err, Err(EngineError::InvalidState { .. })));
    }

    struct FailStore;

    impl MatchStore for FailStore {
        fn save_bout(&mut self, _: &Bout) -> std::result::Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }
        fn save_bout_undo(
            &mut self,
            _: u8,
            _: u32,
            _: DateTime<Utc>,
        ) -> std::result::Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }
        fn save_penalty(
            &mut self,
            _: &PenaltyRecord,
        ) -> std::result::Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }
        fn save_snapshot(
            &mut self,
            _: &MatchSnapshot,
        ) -> std::result::Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_store_failure_rejects_bout() {
        let mut engine = MatchEngine::new(Box::new(FailStore), EventBus::new());
        engine.apply(t0(), Command::SetupMatch { config: h2h_config() }).unwrap();
        engine.apply(t0(), Command::StartMatch).unwrap();

        let before = engine.score_snapshot().unwrap();
        let err = engine.apply(
            t0(),
            Command::RecordBout { call: CallType::Opa, winner: 1, loser: 2 },
        );
        assert!(matches!(err, Err(EngineError::Persistence(_))));
        assert_eq!(engine.score_snapshot().unwrap(), before);
        // Rejected commands never reach the log.
        assert_eq!(engine.command_log().last_seq(), 2);
    }

    /// Saves bouts and penalties fine, but snapshot writes fail while armed.
    struct ArmedSnapshotStore {
        fail_snapshots: Arc<AtomicBool>,
    }

    impl MatchStore for ArmedSnapshotStore {
        fn save_bout(&mut self, _: &Bout) -> std::result::Result<(), StoreError> {
            Ok(())
        }
        fn save_bout_undo(
            &mut self,
            _: u8,
            _: u32,
            _: DateTime<Utc>,
        ) -> std::result::Result<(), StoreError> {
            Ok(())
        }
        fn save_penalty(
            &mut self,
            _: &PenaltyRecord,
        ) -> std::result::Result<(), StoreError> {
            Ok(())
        }
        fn save_snapshot(
            &mut self,
            _: &MatchSnapshot,
        ) -> std::result::Result<(), StoreError> {
            if self.fail_snapshots.load(Ordering::Relaxed) {
                Err(StoreError::Io(std::io::Error::other("disk full")))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_snapshot_failure_rolls_back_bout() {
        let fail = Arc::new(AtomicBool::new(false));
        let store = ArmedSnapshotStore { fail_snapshots: fail.clone() };
        let mut engine = MatchEngine::new(Box::new(store), EventBus::new());
        engine.apply(t0(), Command::SetupMatch { config: h2h_config() }).unwrap();
        engine.apply(t0(), Command::StartMatch).unwrap();

        fail.store(true, Ordering::Relaxed);
        let before = engine.score_snapshot().unwrap();
        let err = engine.apply(
            t0(),
            Command::RecordBout { call: CallType::Opa, winner: 1, loser: 2 },
        );
        assert!(matches!(err, Err(EngineError::Persistence(_))));
        // The whole command rolls back: score, bout list, and the log.
        assert_eq!(engine.score_snapshot().unwrap(), before);
        assert_eq!(engine.command_log().last_seq(), 2);

        // Once the store recovers, the same bout applies cleanly.
        fail.store(false, Ordering::Relaxed);
        record(&mut engine, CallType::Opa, 1, 2);
        let snap = engine.score_snapshot().unwrap();
        assert_eq!(snap.bout_count, 1);
        assert_eq!(snap.home.ap, 1);
        assert_eq!(engine.command_log().last_seq(), 3);
    }

    #[test]
    fn test_replay_reproduces_state() {
        let (mut engine, _) = engine_with(h2h_config());
        record(&mut engine, CallType::Opa, 1, 2);
        engine.apply(t0(), Command::TimerTick { elapsed_ms: 12_300 }).unwrap();
        record(&mut engine, CallType::Oshi, 2, 1);
        engine
            .apply(
                t0(),
                Command::ApplyFoul {
                    participant: 2,
                    kind: FoulKind::ExcessiveContact,
                    deduction: None,
                    note: None,
                },
            )
            .unwrap();
        engine.apply(t0(), Command::EndRound).unwrap();

        let replayed = MatchEngine::replay(
            engine.match_id,
            engine.command_log().entries(),
            Box::new(MemoryStore::new()),
            EventBus::new(),
        )
        .unwrap();
        assert_eq!(replayed.snapshot(), engine.snapshot());
    }
}
