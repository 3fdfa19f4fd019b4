#![forbid(unsafe_code)]

//! Core domain model and tracking logic for the runtrack system.
//!
//! This crate provides:
//! - Position fixes and great-circle distance
//! - The fix filter (accuracy, ordering and implied-speed rules)
//! - The run session state machine (start/pause/stop/reset)
//! - Report formatting, export and history
//! - Fix log replay for driving sessions from recorded data

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod activity;
pub mod distance;
pub mod filter;
pub mod signal;
pub mod session;
pub mod report;
pub mod history;
pub mod fixlog;

// Re-export commonly used types
pub use error::{Error, Result, SensorError};
pub use types::*;
pub use config::{Config, FilterConfig};
pub use activity::ActivityProfile;
pub use distance::{great_circle_distance, EARTH_RADIUS_METERS};
pub use filter::{FilterDecision, FixFilter, RejectReason};
pub use signal::SignalQuality;
pub use session::RunSession;
pub use report::{format_elapsed, format_miles, ReportSink, TextExporter};
pub use history::{read_reports, recent_reports, HistoryTotals, JsonlHistory};
pub use fixlog::{read_events, replay, FixEvent};
