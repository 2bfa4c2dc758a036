//! Match persistence - every scoring mutation is written before it counts.
//!
//! The engine calls the store BEFORE committing a bout or penalty to its
//! in-memory state; a store failure rejects the command and leaves the match
//! untouched. Bouts and penalties append to journal files so a crash loses at
//! most the entry being written; snapshots are replaced atomically.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::bout::Bout;
use crate::models::foul::PenaltyRecord;
use crate::models::snapshot::MatchSnapshot;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store written with schema v{found}, this build reads v{expected}")]
    SchemaMismatch { found: u32, expected: u32 },
}

/// One line of the bout journal. Undone bouts are never erased; the undo is
/// its own record, so the journal alone tells a live bout from a struck one
/// even when a later bout reuses the sequence number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum BoutJournalLine {
    Recorded(Bout),
    Undone { round: u8, sequence: u32, at: DateTime<Utc> },
}

/// Durable sink for match records. Implementations must make each call
/// durable before returning Ok; the engine treats Ok as committed.
pub trait MatchStore: Send {
    fn save_bout(&mut self, bout: &Bout) -> Result<(), StoreError>;
    fn save_bout_undo(
        &mut self,
        round: u8,
        sequence: u32,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
    fn save_penalty(&mut self, record: &PenaltyRecord) -> Result<(), StoreError>;
    fn save_snapshot(&mut self, snapshot: &MatchSnapshot) -> Result<(), StoreError>;
}

/// In-memory store for tests and dry-run officiating. The inner records are
/// shared so a test can keep a handle while the engine owns the store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryRecords>>,
}

#[derive(Debug, Default)]
pub struct MemoryRecords {
    pub bouts: Vec<Bout>,
    /// `(round, sequence)` of each undone bout, in undo order.
    pub bout_undos: Vec<(u8, u32)>,
    pub penalties: Vec<PenaltyRecord>,
    pub snapshots: Vec<MatchSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> std::sync::MutexGuard<'_, MemoryRecords> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl MatchStore for MemoryStore {
    fn save_bout(&mut self, bout: &Bout) -> Result<(), StoreError> {
        self.records().bouts.push(bout.clone());
        Ok(())
    }

    fn save_bout_undo(
        &mut self,
        round: u8,
        sequence: u32,
        _at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.records().bout_undos.push((round, sequence));
        Ok(())
    }

    fn save_penalty(&mut self, record: &PenaltyRecord) -> Result<(), StoreError> {
        self.records().penalties.push(record.clone());
        Ok(())
    }

    fn save_snapshot(&mut self, snapshot: &MatchSnapshot) -> Result<(), StoreError> {
        self.records().snapshots.push(snapshot.clone());
        Ok(())
    }
}

/// File-backed store: `bouts.jsonl` and `penalties.jsonl` journals plus a
/// `match.json` snapshot written via temp-file-and-rename.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct StoreMeta {
    schema_version: u32,
}

impl JsonFileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let meta_path = dir.join("meta.json");
        if meta_path.exists() {
            let meta: StoreMeta = serde_json::from_slice(&fs::read(&meta_path)?)?;
            if meta.schema_version != crate::SCHEMA_VERSION {
                return Err(StoreError::SchemaMismatch {
                    found: meta.schema_version,
                    expected: crate::SCHEMA_VERSION,
                });
            }
        } else {
            let meta = StoreMeta { schema_version: crate::SCHEMA_VERSION };
            fs::write(&meta_path, serde_json::to_vec_pretty(&meta)?)?;
        }
        log::info!("match store opened at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn append_line<T: serde::Serialize>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(value)?;
        line.push(b'\n');
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(file))?;
        f.write_all(&line)?;
        f.sync_data()?;
        Ok(())
    }

    /// Load the last persisted snapshot, if the file exists.
    pub fn load_snapshot(&self) -> Result<Option<MatchSnapshot>, StoreError> {
        let path = self.dir.join("match.json");
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&data)?))
    }
}

impl MatchStore for JsonFileStore {
    fn save_bout(&mut self, bout: &Bout) -> Result<(), StoreError> {
        self.append_line("bouts.jsonl", &BoutJournalLine::Recorded(bout.clone()))?;
        log::debug!("persisted bout r{} #{}", bout.round, bout.sequence);
        Ok(())
    }

    fn save_bout_undo(
        &mut self,
        round: u8,
        sequence: u32,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.append_line("bouts.jsonl", &BoutJournalLine::Undone { round, sequence, at })?;
        log::debug!("persisted undo of bout r{round} #{sequence}");
        Ok(())
    }

    fn save_penalty(&mut self, record: &PenaltyRecord) -> Result<(), StoreError> {
        self.append_line("penalties.jsonl", record)?;
        log::debug!(
            "persisted penalty: player {} {:?}",
            record.participant,
            record.kind
        );
        Ok(())
    }

    fn save_snapshot(&mut self, snapshot: &MatchSnapshot) -> Result<(), StoreError> {
        let path = self.dir.join("match.json");
        let tmp = self.dir.join("match.json.tmp");
        let data = serde_json::to_vec_pretty(snapshot)?;
        {
            let mut f = File::create(&tmp)?;
            f.write_all(&data)?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        log::debug!("persisted snapshot at seq {}", snapshot.command_seq);
        Ok(())
    }
}
