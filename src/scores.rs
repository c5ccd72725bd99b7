// Score persistence
//
// The simulation never talks to storage. After a round ends the caller asks the
// `ScoreRecorder` to save a persistable score; the write runs on tokio's blocking
// pool and failures are only logged.

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::engine::RoundSummary;

const ANONYMOUS: &str = "anonymous";

/// One row of the score table
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u32,
    pub achieved_at: DateTime<Utc>,
}

/// Key-value score storage used after a round ends
pub trait ScoreStore: Send + Sync {
    /// Returns false when the score could not be stored
    fn insert_score(&self, name: &str, score: u32) -> bool;

    /// Highest scores first, at most `limit` entries
    fn get_top_scores(&self, limit: usize) -> Vec<ScoreEntry>;
}

/// Trims a player name; blank names are stored as "anonymous"
pub fn normalize_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        ANONYMOUS.to_string()
    } else {
        trimmed.to_string()
    }
}

fn rank(entries: &mut Vec<ScoreEntry>, limit: usize) {
    // Equal scores keep the earlier achievement first
    entries.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.achieved_at.cmp(&b.achieved_at))
    });
    entries.truncate(limit);
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    entries: Mutex<Vec<ScoreEntry>>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn insert_score(&self, name: &str, score: u32) -> bool {
        self.entries.lock().push(ScoreEntry {
            name: normalize_name(name),
            score,
            achieved_at: Utc::now(),
        });
        true
    }

    fn get_top_scores(&self, limit: usize) -> Vec<ScoreEntry> {
        let mut entries = self.entries.lock().clone();
        rank(&mut entries, limit);
        entries
    }
}

/// Append-only JSONL file, one `ScoreEntry` per line
#[derive(Debug)]
pub struct JsonlScoreStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlScoreStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        JsonlScoreStore {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, entry: &ScoreEntry) -> Result<(), String> {
        let line = serde_json::to_string(entry)
            .map_err(|e| format!("Failed to serialize score entry: {}", e))?;

        let _guard = self.write_lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| format!("Failed to open score file '{}': {}", self.path.display(), e))?;
        writeln!(file, "{}", line).map_err(|e| format!("Failed to write score entry: {}", e))?;
        file.flush()
            .map_err(|e| format!("Failed to flush score file: {}", e))
    }

    fn load(&self) -> Result<Vec<ScoreEntry>, String> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(format!(
                    "Failed to open score file '{}': {}",
                    self.path.display(),
                    e
                ))
            }
        };

        let mut entries = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ScoreEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping malformed score on line {}: {}", line_num + 1, e),
            }
        }
        Ok(entries)
    }
}

impl ScoreStore for JsonlScoreStore {
    fn insert_score(&self, name: &str, score: u32) -> bool {
        let entry = ScoreEntry {
            name: normalize_name(name),
            score,
            achieved_at: Utc::now(),
        };
        match self.append(&entry) {
            Ok(()) => true,
            Err(e) => {
                error!("{}", e);
                false
            }
        }
    }

    fn get_top_scores(&self, limit: usize) -> Vec<ScoreEntry> {
        match self.load() {
            Ok(mut entries) => {
                rank(&mut entries, limit);
                entries
            }
            Err(e) => {
                error!("{}", e);
                Vec::new()
            }
        }
    }
}

/// Fire-and-forget front end for a `ScoreStore`
#[derive(Clone)]
pub struct ScoreRecorder {
    store: Arc<dyn ScoreStore>,
}

impl ScoreRecorder {
    pub fn new(store: Arc<dyn ScoreStore>) -> Self {
        ScoreRecorder { store }
    }

    /// Saves the score on the blocking pool. The handle may be awaited or dropped.
    /// Must be called from within a tokio runtime.
    pub fn record(&self, name: &str, score: u32) -> JoinHandle<bool> {
        let store = self.store.clone();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || {
            let saved = store.insert_score(&name, score);
            if saved {
                info!("Saved score {} for {}", score, normalize_name(&name));
            } else {
                warn!("Score {} for {} was not saved", score, normalize_name(&name));
            }
            saved
        })
    }

    /// Records the round if it produced a persistable score
    pub fn record_round(&self, name: &str, summary: &RoundSummary) -> Option<JoinHandle<bool>> {
        summary
            .persistable_score()
            .map(|score| self.record(name, score))
    }

    pub fn top_scores(&self, limit: usize) -> Vec<ScoreEntry> {
        self.store.get_top_scores(limit)
    }
}
