//! Append-only outcome log and its `;`-separated export.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::challenge::Resolution;
use crate::error::ExportError;

pub const EXPORT_HEADER: [&str; 4] = ["Score", "ActionType", "ReactionTimeMs", "Timestamp"];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// One resolved challenge
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEntry {
    pub score_after: u32,
    pub label: String,
    pub success: bool,
    pub reaction_time: Duration,
    pub timestamp: DateTime<Local>,
}

impl ResultEntry {
    pub fn from_resolution(res: &Resolution, score_after: u32, timestamp: DateTime<Local>) -> Self {
        Self {
            score_after,
            label: res.label(),
            success: res.is_success(),
            reaction_time: res.reaction_time,
            timestamp,
        }
    }

    pub fn reaction_ms(&self) -> f64 {
        self.reaction_time.as_secs_f64() * 1000.0
    }

    fn record(&self) -> [String; 4] {
        [
            self.score_after.to_string(),
            self.label.clone(),
            format!("{:.2}", self.reaction_ms()),
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        ]
    }
}

/// Aggregate view of a session's log
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LogSummary {
    pub successes: usize,
    pub failures: usize,
    pub mean_reaction_ms: Option<f64>,
    pub std_dev_reaction_ms: Option<f64>,
    pub best_reaction_ms: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct ResultLog {
    entries: Vec<ResultEntry>,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ResultEntry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| !e.success).count()
    }

    pub fn summary(&self) -> LogSummary {
        let reactions: Vec<f64> = self
            .entries
            .iter()
            .filter(|e| e.success)
            .map(ResultEntry::reaction_ms)
            .collect();

        let mean = match reactions.len() {
            0 => None,
            n => Some(reactions.iter().sum::<f64>() / n as f64),
        };
        let std_dev = mean.map(|m| {
            let variance =
                reactions.iter().map(|r| (r - m) * (r - m)).sum::<f64>() / reactions.len() as f64;
            variance.sqrt()
        });

        LogSummary {
            successes: reactions.len(),
            failures: self.failures(),
            mean_reaction_ms: mean,
            std_dev_reaction_ms: std_dev,
            best_reaction_ms: reactions.iter().copied().reduce(f64::min),
        }
    }

    /// Write the header and one row per entry to `out`.
    pub fn write_to<W: Write>(&self, out: W) -> Result<(), ExportError> {
        if self.entries.is_empty() {
            return Err(ExportError::Empty);
        }

        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(out);

        writer.write_record(EXPORT_HEADER)?;
        for entry in &self.entries {
            writer.write_record(entry.record())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Export into `dir` under a time-stamped file name; returns the path written.
    pub fn export_to_dir(&self, dir: &Path, now: DateTime<Local>) -> Result<PathBuf, ExportError> {
        if self.entries.is_empty() {
            return Err(ExportError::Empty);
        }
        fs::create_dir_all(dir)?;
        let path = dir.join(export_file_name(now));
        let file = File::create(&path)?;
        self.write_to(file)?;
        Ok(path)
    }
}

pub fn export_file_name(now: DateTime<Local>) -> String {
    format!("flinch_results_{}.csv", now.format("%Y%m%d_%H%M%S"))
}
