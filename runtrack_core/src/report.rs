//! Run report formatting and export.
//!
//! Reports are rendered as a short plain-text summary (miles and
//! `HH:MM:SS`) and written atomically to a reports directory, one file per
//! run named after the day it finished.

use crate::{Error, Result, RunReport};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Meters in one statute mile
pub const METERS_PER_MILE: f64 = 1609.34;

/// Report sink trait for exporting finished runs
pub trait ReportSink {
    fn export(&mut self, report: &RunReport) -> Result<()>;
}

pub fn meters_to_miles(meters: f64) -> f64 {
    meters / METERS_PER_MILE
}

/// Distance in miles with two decimals, e.g. `3.11`
pub fn format_miles(meters: f64) -> String {
    format!("{:.2}", meters_to_miles(meters))
}

/// Elapsed time as `HH:MM:SS`. Hours keep counting past 24.
pub fn format_elapsed(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total / 60) % 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

impl RunReport {
    /// Human-readable report body
    pub fn render_text(&self) -> String {
        let mut text = String::from("Run Report\n\n");
        text.push_str(&format!(
            "Date: {}\n",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        if let Some(ref activity) = self.activity {
            text.push_str(&format!("Activity: {}\n", activity));
        }
        text.push_str(&format!(
            "Distance: {} miles\n",
            format_miles(self.distance_meters)
        ));
        text.push_str(&format!("Time: {}\n", format_elapsed(self.duration_seconds)));
        text
    }

    /// `run-YYYY-MM-DD.txt`, dated by the finish time
    pub fn file_name(&self) -> String {
        format!("run-{}.txt", self.finished_at.format("%Y-%m-%d"))
    }
}

/// Writes each report as a text file into a directory
pub struct TextExporter {
    dir: PathBuf,
    last_written: Option<PathBuf>,
}

impl TextExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            last_written: None,
        }
    }

    /// Path of the most recent export, if any
    pub fn last_written(&self) -> Option<&Path> {
        self.last_written.as_deref()
    }

    /// Candidate paths for `file_name`: `run-2024-05-01.txt`, then
    /// `run-2024-05-01-2.txt`, `run-2024-05-01-3.txt`, ...
    fn candidate_path(&self, file_name: &str, attempt: u32) -> PathBuf {
        if attempt <= 1 {
            return self.dir.join(file_name);
        }
        let stem = file_name.trim_end_matches(".txt");
        self.dir.join(format!("{}-{}.txt", stem, attempt))
    }
}

impl ReportSink for TextExporter {
    fn export(&mut self, report: &RunReport) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let mut temp = NamedTempFile::new_in(&self.dir)?;
        temp.write_all(report.render_text().as_bytes())?;
        temp.as_file().sync_all()?;

        let file_name = report.file_name();
        let mut attempt = 1;
        loop {
            let path = self.candidate_path(&file_name, attempt);
            // Fails with AlreadyExists if another export holds the name
            match temp.persist_noclobber(&path) {
                Ok(_) => {
                    tracing::info!("Exported run report to {:?}", path);
                    self.last_written = Some(path);
                    return Ok(());
                }
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                    temp = e.file;
                    attempt += 1;
                }
                Err(e) => return Err(Error::Io(e.error)),
            }
        }
    }
}
