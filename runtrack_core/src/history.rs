//! Run history log.
//!
//! Finished runs are appended to a JSONL (JSON Lines) file with file locking
//! so several processes can record runs safely.

use crate::report::ReportSink;
use crate::{Result, RunReport};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// JSONL-based report history with file locking
pub struct JsonlHistory {
    path: PathBuf,
}

impl JsonlHistory {
    /// Create a new history log for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl ReportSink for JsonlHistory {
    fn export(&mut self, report: &RunReport) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(report)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended run {} to history", report.id);
        Ok(())
    }
}

/// Read all reports from a history file in the order they were recorded.
///
/// Corrupt lines are logged and skipped. A run recorded more than once keeps
/// its first position and its last written contents.
pub fn read_reports(path: &Path) -> Result<Vec<RunReport>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut reports: Vec<RunReport> = Vec::new();
    let mut seen: HashMap<Uuid, usize> = HashMap::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<RunReport>(&line) {
            Ok(report) => match seen.get(&report.id) {
                Some(&idx) => {
                    tracing::debug!("Run {} recorded twice, keeping the later line", report.id);
                    reports[idx] = report;
                }
                None => {
                    seen.insert(report.id, reports.len());
                    reports.push(report);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to parse run at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} runs from history", reports.len());
    Ok(reports)
}

/// The most recent `limit` runs, newest first
pub fn recent_reports(path: &Path, limit: usize) -> Result<Vec<RunReport>> {
    let mut reports = read_reports(path)?;
    reports.sort_by(|a, b| b.finished_at.cmp(&a.finished_at));
    reports.truncate(limit);
    Ok(reports)
}

/// Aggregate figures over a set of runs
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HistoryTotals {
    pub runs: usize,
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

impl HistoryTotals {
    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a RunReport>) -> Self {
        reports
            .into_iter()
            .fold(HistoryTotals::default(), |mut totals, report| {
                totals.runs += 1;
                totals.distance_meters += report.distance_meters;
                totals.duration_seconds += report.duration_seconds;
                totals
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn create_test_report(minutes_ago: i64) -> RunReport {
        let finished_at = Utc::now() - Duration::minutes(minutes_ago);
        RunReport {
            id: Uuid::new_v4(),
            started_at: finished_at - Duration::minutes(30),
            finished_at,
            distance_meters: 4_200.0,
            duration_seconds: 1_800.0,
            accepted_fixes: 250,
            rejected_fixes: 4,
            activity: Some("run".into()),
        }
    }

    #[test]
    fn test_append_and_read_single_report() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("history.jsonl");

        let report = create_test_report(0);
        let mut history = JsonlHistory::new(&path);
        history.export(&report).unwrap();

        let reports = read_reports(&path).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].id, report.id);
        assert_eq!(reports[0].activity.as_deref(), Some("run"));
    }

    #[test]
    fn test_read_missing_history() {
        let temp_dir = tempfile::tempdir().unwrap();
        let reports = read_reports(&temp_dir.path().join("nonexistent.jsonl")).unwrap();
        assert!(reports.is_empty());
    }

    #[test]
    fn test_corrupt_lines_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("history.jsonl");

        let mut history = JsonlHistory::new(&path);
        history.export(&create_test_report(5)).unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file, "{{ not json").unwrap();
        }
        history.export(&create_test_report(1)).unwrap();

        assert_eq!(read_reports(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_recent_reports_newest_first() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("history.jsonl");

        let mut history = JsonlHistory::new(&path);
        let oldest = create_test_report(120);
        let middle = create_test_report(60);
        let newest = create_test_report(1);
        history.export(&middle).unwrap();
        history.export(&newest).unwrap();
        history.export(&oldest).unwrap();

        let recent = recent_reports(&path, 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, newest.id);
        assert_eq!(recent[1].id, middle.id);
    }

    #[test]
    fn test_duplicate_ids_collapse_to_latest() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("history.jsonl");

        let mut history = JsonlHistory::new(&path);
        let first = create_test_report(30);
        let other = create_test_report(10);
        let mut rewritten = first.clone();
        rewritten.distance_meters = 5_000.0;

        history.export(&first).unwrap();
        history.export(&other).unwrap();
        history.export(&rewritten).unwrap();

        let reports = read_reports(&path).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].id, first.id);
        assert_eq!(reports[0].distance_meters, 5_000.0);
        assert_eq!(reports[1].id, other.id);
    }

    #[test]
    fn test_totals() {
        let reports = vec![create_test_report(60), create_test_report(1)];
        let totals = HistoryTotals::from_reports(&reports);
        assert_eq!(totals.runs, 2);
        assert_eq!(totals.distance_meters, 8_400.0);
        assert_eq!(totals.duration_seconds, 3_600.0);

        assert_eq!(HistoryTotals::from_reports(std::iter::empty()), HistoryTotals::default());
    }
}
