// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The client-trace-file table.
//!
//! Trace files are shared: two connections tracing to the same resolved
//! name share one handle, counted by reference. The file closes and the
//! entry clears exactly when the count reaches zero. `PRINT$` is the
//! process stdout stream and is never opened or closed.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the stdout pseudo-file.
pub const PRINT_FILE: &str = "PRINT$";

/// Where trace output for one resolved name goes.
#[derive(Debug)]
pub enum TraceSink {
    File(File),
    Stdout,
}

/// A shared, serialised trace destination.
#[derive(Debug)]
pub struct ClientTraceFile {
    name: String,
    sink: Mutex<TraceSink>,
}

impl ClientTraceFile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_stdout(&self) -> bool {
        matches!(*self.sink.lock(), TraceSink::Stdout)
    }

    /// Append one trace line under the sink's lock.
    pub fn write_line(&self, line: &str) {
        let mut sink = self.sink.lock();
        match &mut *sink {
            TraceSink::File(file) => {
                let _ = writeln!(file, "{line}");
            }
            TraceSink::Stdout => {
                println!("{line}");
            }
        }
    }

    /// Flush buffered trace output through to the file.
    pub fn flush(&self) -> std::io::Result<()> {
        match &*self.sink.lock() {
            TraceSink::File(file) => file.sync_all(),
            TraceSink::Stdout => Ok(()),
        }
    }
}

struct Entry {
    file: Arc<ClientTraceFile>,
    refcount: u32,
    /// Catalogue sequence, for DISPLAY output ordering.
    seq: u32,
}

/// Bounded map from resolved trace-file name to its shared handle.
pub struct ClientTraceTable {
    dir: PathBuf,
    entries: HashMap<String, Entry>,
    next_seq: u32,
    max_entries: usize,
}

impl ClientTraceTable {
    /// `dir` is where trace files land; resolved names map into it with
    /// the qualifier separator flattened.
    pub fn new(dir: PathBuf, max_entries: usize) -> Self {
        Self {
            dir,
            entries: HashMap::new(),
            next_seq: 0,
            max_entries,
        }
    }

    /// Open (or attach to) the trace file with the given resolved name.
    ///
    /// Bumps the reference count when the name is already catalogued;
    /// otherwise opens the file (erase or append) and inserts the entry.
    pub fn open(&mut self, name: &str, erase: bool) -> std::io::Result<Arc<ClientTraceFile>> {
        if name == PRINT_FILE {
            // Stdout attaches without cataloguing.
            return Ok(Arc::new(ClientTraceFile {
                name: PRINT_FILE.to_string(),
                sink: Mutex::new(TraceSink::Stdout),
            }));
        }

        if let Some(entry) = self.entries.get_mut(name) {
            entry.refcount += 1;
            return Ok(Arc::clone(&entry.file));
        }

        if self.entries.len() >= self.max_entries {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "client trace file table is full",
            ));
        }

        let path = self.sink_path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = if erase {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)?
        } else {
            OpenOptions::new().create(true).append(true).open(&path)?
        };

        self.next_seq += 1;
        let handle = Arc::new(ClientTraceFile {
            name: name.to_string(),
            sink: Mutex::new(TraceSink::File(file)),
        });
        self.entries.insert(
            name.to_string(),
            Entry {
                file: Arc::clone(&handle),
                refcount: 1,
                seq: self.next_seq,
            },
        );
        Ok(handle)
    }

    /// Drop one reference. The entry clears exactly when the count reaches
    /// zero, flushing the file through to disk; a flush failure surfaces
    /// to the caller after the entry is gone. Returns whether the file was
    /// actually closed.
    pub fn close(&mut self, name: &str) -> std::io::Result<bool> {
        if name == PRINT_FILE {
            return Ok(false);
        }
        let Some(entry) = self.entries.get_mut(name) else {
            return Ok(false);
        };
        entry.refcount -= 1;
        if entry.refcount > 0 {
            return Ok(false);
        }
        if let Some(entry) = self.entries.remove(name) {
            entry.file.flush()?;
        }
        Ok(true)
    }

    pub fn refcount(&self, name: &str) -> Option<u32> {
        self.entries.get(name).map(|e| e.refcount)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Catalogued names in open order, for DISPLAY output.
    pub fn names(&self) -> Vec<String> {
        let mut entries: Vec<(&String, u32)> =
            self.entries.iter().map(|(name, e)| (name, e.seq)).collect();
        entries.sort_by_key(|(_, seq)| *seq);
        entries.into_iter().map(|(name, _)| name.clone()).collect()
    }

    /// Flatten a qualified name (`QUAL*file-1`) into a path under the
    /// trace directory.
    fn sink_path(&self, name: &str) -> PathBuf {
        self.dir.join(name.replace('*', "."))
    }
}

#[cfg(test)]
#[path = "client_trace_tests.rs"]
mod tests;
