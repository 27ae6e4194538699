// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator log and trace files.
//!
//! These are the operator-facing server artifacts, distinct from the
//! `tracing` diagnostic log: every entry is timestamped, writes are
//! serialised by the owning lock cell in SGS, and the console CYCLE
//! command rotates them.

pub mod client_trace;

pub use client_trace::{ClientTraceFile, ClientTraceTable, TraceSink};

use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One append-only, cycleable log file.
#[derive(Debug)]
pub struct LogFile {
    path: PathBuf,
    file: File,
    max_cycles: u32,
}

impl LogFile {
    /// Open (appending) or create the file.
    pub fn open(path: &Path, max_cycles: u32) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            max_cycles,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped entry. Failures surface to the caller; the
    /// console handler escalates a failed close at shutdown, not a failed
    /// write.
    pub fn write_entry(&mut self, message: &str) -> std::io::Result<()> {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        writeln!(self.file, "{stamp} {message}")?;
        self.file.flush()
    }

    /// Rotate: the live file becomes `.1`, `.1` becomes `.2`, and so on up
    /// to the cycle cap; a fresh live file is opened.
    pub fn cycle(&mut self) -> std::io::Result<()> {
        self.file.flush()?;

        let cycle_path = |n: u32| -> PathBuf {
            let mut name = self.path.as_os_str().to_owned();
            name.push(format!(".{n}"));
            PathBuf::from(name)
        };

        let oldest = cycle_path(self.max_cycles);
        if oldest.exists() {
            std::fs::remove_file(&oldest)?;
        }
        for n in (1..self.max_cycles).rev() {
            let from = cycle_path(n);
            if from.exists() {
                std::fs::rename(&from, cycle_path(n + 1))?;
            }
        }
        if self.path.exists() {
            std::fs::rename(&self.path, cycle_path(1))?;
        }

        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
