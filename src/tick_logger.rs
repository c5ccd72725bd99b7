// Asynchronous per-tick logging
//
// Ticks are queued on an unbounded channel and written by one background task,
// so logging never delays the frame clock and lines land in tick order. Each
// tick's snapshot and events are written to a JSONL file.

use log::error;
use serde::{Deserialize, Serialize};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::engine::{Snapshot, TickEvent, TickResult};

/// Represents a single tick log entry
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TickLogEntry {
    pub tick: u64,
    pub snapshot: Snapshot,
    pub events: Vec<TickEvent>,
    pub timestamp: String,
}

/// Handle to the tick log writer
pub struct TickLogger {
    sender: Option<UnboundedSender<TickLogEntry>>,
    writer: Option<JoinHandle<()>>,
}

impl TickLogger {
    /// Creates a new tick logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    /// and starts the writer task. Must be called from within a tokio runtime.
    pub async fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return TickLogger::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
            .await
        {
            Ok(file) => {
                log::info!("Tick logging enabled: {}", log_file_path);
                let (sender, receiver) = mpsc::unbounded_channel();
                TickLogger {
                    sender: Some(sender),
                    writer: Some(tokio::spawn(Self::write_entries(file, receiver))),
                }
            }
            Err(e) => {
                error!("Failed to create tick log file '{}': {}", log_file_path, e);
                TickLogger::disabled()
            }
        }
    }

    /// Creates a disabled tick logger (no-op)
    pub fn disabled() -> Self {
        TickLogger {
            sender: None,
            writer: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Queues a tick for the writer (fire-and-forget)
    pub fn log_tick(&self, result: &TickResult) {
        let Some(sender) = &self.sender else {
            return;
        };

        let entry = TickLogEntry {
            tick: result.snapshot.tick,
            snapshot: result.snapshot.clone(),
            events: result.events.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        if sender.send(entry).is_err() {
            error!("Tick log writer stopped; dropping tick {}", result.snapshot.tick);
        }
    }

    /// Closes the queue and waits until every queued tick is on disk
    pub async fn finish(mut self) {
        drop(self.sender.take());
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.await {
                error!("Tick log writer failed: {}", e);
            }
        }
    }

    /// Writer task: drains the queue in order until every sender is gone
    async fn write_entries(mut file: File, mut receiver: UnboundedReceiver<TickLogEntry>) {
        while let Some(entry) = receiver.recv().await {
            match serde_json::to_string(&entry) {
                Ok(json_line) => {
                    let line_with_newline = format!("{}\n", json_line);
                    if let Err(e) = file.write_all(line_with_newline.as_bytes()).await {
                        error!("Failed to write tick log entry: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to serialize tick log entry: {}", e);
                }
            }
        }

        if let Err(e) = file.flush().await {
            error!("Failed to flush tick log: {}", e);
        }
    }
}
