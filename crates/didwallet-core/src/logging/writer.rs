//! Append-only JSONL writer, one file per run.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::warn;

use super::entry::LogEntry;

/// Appends [`LogEntry`] lines to `<log_dir>/raw/<date>_<run>.jsonl`.
pub struct RunLogWriter {
    run: String,
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl RunLogWriter {
    /// Open (or continue) the log file for `run`, creating `raw/` as needed.
    pub fn new(log_dir: impl AsRef<Path>, run: impl Into<String>) -> std::io::Result<Self> {
        let run = run.into();
        let raw_dir = log_dir.as_ref().join("raw");
        fs::create_dir_all(&raw_dir)?;

        let date = chrono::Local::now().format("%Y-%m-%d");
        let path = raw_dir.join(format!("{}_{}.jsonl", date, run));

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            run,
            writer: Mutex::new(BufWriter::new(file)),
            path,
        })
    }

    pub fn run(&self) -> &str {
        &self.run
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry and flush it.
    pub fn write(&self, entry: &LogEntry) -> std::io::Result<()> {
        let json = entry
            .to_json_line()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let mut writer = self.writer.lock();
        writeln!(writer, "{}", json)?;
        writer.flush()
    }

    pub fn flush(&self) -> std::io::Result<()> {
        self.writer.lock().flush()
    }
}

impl Drop for RunLogWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Every entry under `<log_dir>/raw`, ordered by timestamp.
///
/// Unparseable lines are skipped.
pub fn read_all_entries(log_dir: impl AsRef<Path>) -> std::io::Result<Vec<LogEntry>> {
    read_entries(log_dir.as_ref(), |_| true)
}

/// Entries of one run, ordered by timestamp.
pub fn read_run_entries(log_dir: impl AsRef<Path>, run: &str) -> std::io::Result<Vec<LogEntry>> {
    let suffix = format!("_{}.jsonl", run);
    read_entries(log_dir.as_ref(), |name| name.ends_with(&suffix))
}

fn read_entries(log_dir: &Path, keep_file: impl Fn(&str) -> bool) -> std::io::Result<Vec<LogEntry>> {
    let raw_dir = log_dir.join("raw");
    if !raw_dir.exists() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for dir_entry in fs::read_dir(&raw_dir)? {
        let path = dir_entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(".jsonl") || !keep_file(name) {
            continue;
        }

        for line in fs::read_to_string(&path)?.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match LogEntry::from_json_line(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unparseable log line"),
            }
        }
    }

    entries.sort_by(|a, b| a.ts.cmp(&b.ts));
    Ok(entries)
}
