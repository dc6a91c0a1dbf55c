// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only event log on disk: one JSON `Event` per line.
//!
//! This is the durability sidecar for [`crate::memory::MemoryStore`] — the
//! in-memory `MaterializedState` is the read path; `EventLog` is strictly
//! write-behind-then-fsync and replay-on-open. A truncated trailing line
//! (process killed mid-write) is dropped during replay rather than failing
//! the whole open, since the writer always appends a complete line before
//! returning from `append`.

use fleetd_core::Event;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct EventLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl EventLog {
    /// Open (creating if absent) the log file at `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, writer: BufWriter::new(file) })
    }

    /// Replay every well-formed line in `path` in file order. Missing file
    /// replays as empty (a fresh store has no prior log).
    pub fn replay(path: impl AsRef<Path>) -> std::io::Result<Vec<Event>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(path)?);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Event>(&line) {
                Ok(event) => events.push(event),
                Err(err) => {
                    tracing::warn!(error = %err, "dropping malformed wal line during replay");
                }
            }
        }
        Ok(events)
    }

    /// Append one event as a single JSON line and flush to the OS. Does
    /// not call `fsync`; callers that need crash-durability beyond a
    /// process kill should wrap the backing file descriptor themselves.
    pub fn append(&mut self, event: &Event) -> std::io::Result<()> {
        let line = serde_json::to_string(event)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
