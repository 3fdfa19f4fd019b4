//! Run session state machine.
//!
//! ```text
//!            start             pause
//!   Idle ───────────▶ Tracking ──────▶ Paused
//!    ▲                  ▲  │             │ │
//!    │                  │  └──── start ◀─┘ │
//!    │                  │                  │
//!    └── reset ◀── Stopped ◀──── stop ─────┘
//! ```
//!
//! The session owns the distance accumulator and the run clock. Elapsed time
//! is never counted by ticks: it is derived from the `now` passed in by the
//! caller, the run start and the total time spent paused.
//!
//! All methods take `&mut self`. Callers receiving sensor events on several
//! threads must funnel them through a single writer.

use crate::filter::{FilterDecision, FixFilter};
use crate::signal::SignalQuality;
use crate::{Error, FilterConfig, GeoPoint, Result, RunReport, RunStatus, SensorError};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

type ReportCallback = Box<dyn FnMut(&RunReport)>;

/// One tracked run, reusable across runs via `reset`
pub struct RunSession {
    filter: FixFilter,
    activity: Option<String>,
    status: RunStatus,
    distance_meters: f64,
    last_accepted_fix: Option<GeoPoint>,
    started_at: Option<DateTime<Utc>>,
    paused_total: Duration,
    pause_began_at: Option<DateTime<Utc>>,
    accepted_fixes: u32,
    rejected_fixes: u32,
    signal: SignalQuality,
    report_callbacks: Vec<ReportCallback>,
}

impl RunSession {
    /// Create an idle session with the given filter thresholds
    pub fn new(config: FilterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            filter: FixFilter::new(config),
            activity: None,
            status: RunStatus::Idle,
            distance_meters: 0.0,
            last_accepted_fix: None,
            started_at: None,
            paused_total: Duration::zero(),
            pause_began_at: None,
            accepted_fixes: 0,
            rejected_fixes: 0,
            signal: SignalQuality::None,
            report_callbacks: Vec::new(),
        })
    }

    /// Tag reports from this session with an activity name
    pub fn with_activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = Some(activity.into());
        self
    }

    /// Register a callback invoked once with each finalized report
    pub fn on_report_finalized<F>(&mut self, callback: F)
    where
        F: FnMut(&RunReport) + 'static,
    {
        self.report_callbacks.push(Box::new(callback));
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Begin a run from `Idle`, or resume one from `Paused`
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<()> {
        match self.status {
            RunStatus::Idle => {
                self.started_at = Some(now);
                self.paused_total = Duration::zero();
                self.pause_began_at = None;
                self.status = RunStatus::Tracking;
                tracing::info!("Run started at {}", now);
                Ok(())
            }
            RunStatus::Paused => {
                if let Some(began) = self.pause_began_at.take() {
                    let pause = (now - began).max(Duration::zero());
                    self.paused_total = self.paused_total + pause;
                    tracing::info!("Run resumed after {}s paused", pause.num_seconds());
                }
                self.status = RunStatus::Tracking;
                Ok(())
            }
            from => Err(Error::InvalidTransition {
                from,
                action: "start",
            }),
        }
    }

    /// Freeze the clock and stop folding distance
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status != RunStatus::Tracking {
            return Err(Error::InvalidTransition {
                from: self.status,
                action: "pause",
            });
        }

        self.pause_began_at = Some(now);
        self.status = RunStatus::Paused;
        tracing::info!(
            "Run paused at {:.1}m, {:.0}s elapsed",
            self.distance_meters,
            self.current_elapsed_seconds(now)
        );
        Ok(())
    }

    /// Finish the run, hand the report to every registered callback and
    /// return to `Idle`
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<RunReport> {
        let started_at = match (self.status, self.started_at) {
            (RunStatus::Tracking | RunStatus::Paused, Some(started_at)) => started_at,
            (from, _) => {
                return Err(Error::InvalidTransition {
                    from,
                    action: "stop",
                })
            }
        };

        let duration_seconds = self.current_elapsed_seconds(now);
        self.status = RunStatus::Stopped;

        let report = RunReport {
            id: Uuid::new_v4(),
            started_at,
            finished_at: now,
            distance_meters: self.distance_meters,
            duration_seconds,
            accepted_fixes: self.accepted_fixes,
            rejected_fixes: self.rejected_fixes,
            activity: self.activity.clone(),
        };

        tracing::info!(
            "Run {} finished: {:.1}m in {:.0}s ({} fixes accepted, {} rejected)",
            report.id,
            report.distance_meters,
            report.duration_seconds,
            report.accepted_fixes,
            report.rejected_fixes
        );

        for callback in self.report_callbacks.iter_mut() {
            callback(&report);
        }

        self.reset();
        Ok(report)
    }

    /// Drop the current run, whatever its state
    pub fn reset(&mut self) {
        self.status = RunStatus::Idle;
        self.distance_meters = 0.0;
        self.last_accepted_fix = None;
        self.started_at = None;
        self.paused_total = Duration::zero();
        self.pause_began_at = None;
        self.accepted_fixes = 0;
        self.rejected_fixes = 0;
        tracing::debug!("Session reset");
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    /// Feed one sensor fix.
    ///
    /// Signal quality is always updated. Distance is only touched while
    /// tracking; in any other state this returns `None`.
    pub fn on_fix_received(&mut self, fix: GeoPoint) -> Option<FilterDecision> {
        self.signal = SignalQuality::from_accuracy(fix.accuracy_meters());

        if self.status != RunStatus::Tracking {
            return None;
        }

        let decision = self.filter.evaluate(self.last_accepted_fix.as_ref(), &fix);
        match decision {
            FilterDecision::Anchor => {
                self.last_accepted_fix = Some(fix);
                self.accepted_fixes = self.accepted_fixes.saturating_add(1);
                tracing::debug!(
                    "Anchored run at ({:.6}, {:.6})",
                    fix.latitude(),
                    fix.longitude()
                );
            }
            FilterDecision::Accept { segment_meters } => {
                self.distance_meters += segment_meters;
                assert!(
                    self.distance_meters >= 0.0,
                    "accumulated distance went negative: {}",
                    self.distance_meters
                );
                self.last_accepted_fix = Some(fix);
                self.accepted_fixes = self.accepted_fixes.saturating_add(1);
                tracing::debug!(
                    "Accepted {:.2}m segment, total {:.1}m",
                    segment_meters,
                    self.distance_meters
                );
            }
            FilterDecision::Reject(reason) => {
                self.rejected_fixes = self.rejected_fixes.saturating_add(1);
                tracing::debug!("Rejected fix at {}: {:?}", fix.timestamp_millis(), reason);
            }
        }

        Some(decision)
    }

    /// Record a sensor failure as a loss of signal
    pub fn on_sensor_error(&mut self, err: SensorError) {
        tracing::warn!("Sensor error: {}", err);
        self.signal = SignalQuality::from_sensor_error(err);
    }

    // ------------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------------

    pub fn current_status(&self) -> RunStatus {
        self.status
    }

    pub fn current_distance_meters(&self) -> f64 {
        self.distance_meters
    }

    /// Active (unpaused) time of the current run as of `now`
    pub fn current_elapsed_seconds(&self, now: DateTime<Utc>) -> f64 {
        let Some(started_at) = self.started_at else {
            return 0.0;
        };

        let until = match (self.status, self.pause_began_at) {
            (RunStatus::Paused, Some(began)) => began,
            (RunStatus::Tracking, _) => now,
            _ => return 0.0,
        };

        let active = until - started_at - self.paused_total;
        (active.num_milliseconds() as f64 / 1000.0).max(0.0)
    }

    pub fn signal_quality(&self) -> SignalQuality {
        self.signal
    }

    pub fn last_accepted_fix(&self) -> Option<&GeoPoint> {
        self.last_accepted_fix.as_ref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn filter_config(&self) -> &FilterConfig {
        self.filter.config()
    }

    pub fn activity(&self) -> Option<&str> {
        self.activity.as_deref()
    }
}

impl std::fmt::Debug for RunSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunSession")
            .field("status", &self.status)
            .field("distance_meters", &self.distance_meters)
            .field("last_accepted_fix", &self.last_accepted_fix)
            .field("started_at", &self.started_at)
            .field("signal", &self.signal)
            .field("report_callbacks", &self.report_callbacks.len())
            .finish()
    }
}
