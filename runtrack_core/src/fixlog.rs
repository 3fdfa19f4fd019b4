//! Recorded fix logs.
//!
//! Stands in for a live position sensor. Two formats are read:
//!
//! - `.csv` with headers `latitude,longitude,accuracy,timestamp_ms`
//! - `.jsonl`, one object per line: either a fix with the same fields, or a
//!   control event such as `{"event": "pause", "timestamp_ms": 60000}`
//!
//! `replay` feeds the events through a `RunSession` in file order, using the
//! event timestamps as the run clock.

use crate::filter::FilterDecision;
use crate::session::RunSession;
use crate::{Error, GeoPoint, Result, RunReport, SensorError};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One fix row as written in a log, before validation
#[derive(Clone, Debug, Deserialize)]
pub struct FixRecord {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(alias = "accuracy_meters")]
    pub accuracy: f64,
    #[serde(alias = "timestamp_millis")]
    pub timestamp_ms: u64,
}

impl FixRecord {
    pub fn into_fix(self) -> Result<GeoPoint> {
        GeoPoint::new(self.latitude, self.longitude, self.accuracy, self.timestamp_ms)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum ControlKind {
    Pause,
    Resume,
    SensorError,
}

#[derive(Clone, Debug, Deserialize)]
struct ControlRecord {
    event: ControlKind,
    timestamp_ms: u64,
    #[serde(default)]
    error: Option<SensorError>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum JsonlRow {
    Control(ControlRecord),
    Fix(FixRecord),
}

/// An entry of a fix log, in file order
#[derive(Clone, Debug, PartialEq)]
pub enum FixEvent {
    Fix(GeoPoint),
    Pause { timestamp_ms: u64 },
    Resume { timestamp_ms: u64 },
    SensorError { timestamp_ms: u64, error: SensorError },
}

impl FixEvent {
    pub fn timestamp_millis(&self) -> u64 {
        match self {
            FixEvent::Fix(fix) => fix.timestamp_millis(),
            FixEvent::Pause { timestamp_ms }
            | FixEvent::Resume { timestamp_ms }
            | FixEvent::SensorError { timestamp_ms, .. } => *timestamp_ms,
        }
    }
}

/// Read a fix log, picking the format from the file extension.
///
/// Rows with out-of-range values are skipped with a warning. Rows that cannot
/// be parsed at all are an error when `strict` is set and skipped otherwise.
pub fn read_events(path: &Path, strict: bool) -> Result<Vec<FixEvent>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    let events = match extension.as_deref() {
        Some("csv") => read_csv(path, strict)?,
        Some("jsonl") | Some("json") => read_jsonl(path, strict)?,
        _ => {
            return Err(Error::Other(format!(
                "Unsupported fix log format: {} (expected .csv or .jsonl)",
                path.display()
            )))
        }
    };

    tracing::info!("Read {} events from {:?}", events.len(), path);
    Ok(events)
}

fn read_csv(path: &Path, strict: bool) -> Result<Vec<FixEvent>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let mut events = Vec::new();

    for (index, row) in reader.deserialize::<FixRecord>().enumerate() {
        // Header is line 1
        let line = index + 2;
        match row {
            Ok(record) => push_fix(&mut events, record, line),
            Err(e) if strict => {
                return Err(Error::FixLog {
                    line,
                    message: e.to_string(),
                })
            }
            Err(e) => tracing::warn!("Skipping unreadable fix at line {}: {}", line, e),
        }
    }

    Ok(events)
}

fn read_jsonl(path: &Path, strict: bool) -> Result<Vec<FixEvent>> {
    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();

    for (index, line_result) in reader.lines().enumerate() {
        let line = index + 1;
        let text = line_result?;
        if text.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<JsonlRow>(&text) {
            Ok(JsonlRow::Fix(record)) => push_fix(&mut events, record, line),
            Ok(JsonlRow::Control(control)) => {
                let timestamp_ms = control.timestamp_ms;
                events.push(match control.event {
                    ControlKind::Pause => FixEvent::Pause { timestamp_ms },
                    ControlKind::Resume => FixEvent::Resume { timestamp_ms },
                    ControlKind::SensorError => FixEvent::SensorError {
                        timestamp_ms,
                        error: control.error.unwrap_or(SensorError::Unavailable),
                    },
                });
            }
            Err(e) if strict => {
                return Err(Error::FixLog {
                    line,
                    message: e.to_string(),
                })
            }
            Err(e) => tracing::warn!("Skipping unreadable event at line {}: {}", line, e),
        }
    }

    Ok(events)
}

fn push_fix(events: &mut Vec<FixEvent>, record: FixRecord, line: usize) {
    match record.into_fix() {
        Ok(fix) => events.push(FixEvent::Fix(fix)),
        Err(e) => tracing::warn!("Skipping invalid fix at line {}: {}", line, e),
    }
}

fn instant(timestamp_ms: u64) -> Result<DateTime<Utc>> {
    i64::try_from(timestamp_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .ok_or_else(|| Error::Other(format!("Timestamp out of range: {}", timestamp_ms)))
}

/// Drive a session through a recorded run.
///
/// The run starts at the first event's timestamp and stops at the last one.
/// `on_event` sees the session after each event together with the filter
/// decision for fixes.
pub fn replay<F>(session: &mut RunSession, events: &[FixEvent], mut on_event: F) -> Result<RunReport>
where
    F: FnMut(&RunSession, &FixEvent, Option<FilterDecision>),
{
    let (Some(first), Some(last)) = (events.first(), events.last()) else {
        return Err(Error::Other("Fix log contains no events".into()));
    };

    session.start(instant(first.timestamp_millis())?)?;

    for event in events {
        let decision = match event {
            FixEvent::Fix(fix) => session.on_fix_received(*fix),
            FixEvent::Pause { timestamp_ms } => {
                session.pause(instant(*timestamp_ms)?)?;
                None
            }
            FixEvent::Resume { timestamp_ms } => {
                session.start(instant(*timestamp_ms)?)?;
                None
            }
            FixEvent::SensorError { error, .. } => {
                session.on_sensor_error(*error);
                None
            }
        };
        on_event(&*session, event, decision);
    }

    session.stop(instant(last.timestamp_millis())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FilterConfig;

    fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_read_csv() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = write(
            temp_dir.path(),
            "run.csv",
            "latitude,longitude,accuracy,timestamp_ms\n\
             0.0, 0.0, 5.0, 0\n\
             0.0001,0.0001,5.0,10000\n",
        );

        let events = read_events(&path, true).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].timestamp_millis(), 10_000);
    }

    #[test]
    fn test_csv_invalid_fix_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = write(
            temp_dir.path(),
            "run.csv",
            "latitude,longitude,accuracy,timestamp_ms\n\
             95.0,0.0,5.0,0\n\
             0.0,0.0,5.0,1000\n",
        );

        let events = read_events(&path, true).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_csv_garbage_row_strict_and_lenient() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = write(
            temp_dir.path(),
            "run.csv",
            "latitude,longitude,accuracy,timestamp_ms\n\
             0.0,0.0,5.0,0\n\
             north,0.0,5.0,1000\n",
        );

        match read_events(&path, true) {
            Err(Error::FixLog { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected fix log error, got {:?}", other),
        }
        assert_eq!(read_events(&path, false).unwrap().len(), 1);
    }

    #[test]
    fn test_read_jsonl_with_control_events() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = write(
            temp_dir.path(),
            "run.jsonl",
            r#"{"latitude": 0.0, "longitude": 0.0, "accuracy": 5.0, "timestamp_ms": 0}
{"event": "pause", "timestamp_ms": 5000}

{"event": "sensor_error", "timestamp_ms": 6000, "error": "permission_denied"}
{"event": "resume", "timestamp_ms": 8000}
{"latitude": 0.0001, "longitude": 0.0, "accuracy_meters": 5.0, "timestamp_millis": 9000}
"#,
        );

        let events = read_events(&path, true).unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(events[1], FixEvent::Pause { timestamp_ms: 5000 });
        assert_eq!(
            events[2],
            FixEvent::SensorError {
                timestamp_ms: 6000,
                error: SensorError::PermissionDenied
            }
        );
        assert!(matches!(events[4], FixEvent::Fix(_)));
    }

    #[test]
    fn test_unknown_extension() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = write(temp_dir.path(), "run.gpx", "<gpx/>");
        assert!(read_events(&path, false).is_err());
    }

    #[test]
    fn test_replay_with_pause() {
        crate::logging::init_test();
        let fix = |lat: f64, ts: u64| FixEvent::Fix(GeoPoint::new(lat, 0.0, 5.0, ts).unwrap());
        let events = vec![
            fix(0.0, 0),
            fix(0.0001, 10_000),
            FixEvent::Pause { timestamp_ms: 20_000 },
            // Ignored while paused
            fix(0.0010, 25_000),
            FixEvent::Resume { timestamp_ms: 50_000 },
            fix(0.0002, 60_000),
        ];

        let mut session = RunSession::new(FilterConfig::default()).unwrap();
        let mut decisions = Vec::new();
        let report = replay(&mut session, &events, |_, _, d| decisions.push(d)).unwrap();

        assert_eq!(decisions.len(), 6);
        assert_eq!(decisions[3], None);
        // 20s before the pause plus 10s after it
        assert_eq!(report.duration_seconds, 30.0);
        // Two ~11.1m steps north
        assert!((report.distance_meters - 22.24).abs() < 0.05);
        assert_eq!(report.accepted_fixes, 3);
    }

    #[test]
    fn test_replay_empty_log() {
        let mut session = RunSession::new(FilterConfig::default()).unwrap();
        assert!(replay(&mut session, &[], |_, _, _| {}).is_err());
    }
}
