//! Fix filter: decides which fixes are trustworthy.
//!
//! The filter is a pure policy over `(last accepted fix, candidate, config)`.
//! Rules are evaluated in order:
//!
//! 1. **No anchor yet**: accept the candidate as the anchor, fold nothing
//! 2. **Accuracy**: reject fixes less precise than the accuracy threshold
//! 3. **Ordering**: reject fixes not strictly later than the anchor
//! 4. **Implied speed**: reject segments faster than the speed ceiling
//! 5. Otherwise accept and fold the segment distance

use crate::distance::great_circle_distance;
use crate::{FilterConfig, GeoPoint};

/// Why a fix was discarded
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RejectReason {
    /// Reported accuracy radius exceeds the threshold
    LowAccuracy { accuracy_meters: f64 },
    /// Timestamp is not after the last accepted fix
    NonMonotonic { elapsed_millis: i64 },
    /// Segment would require moving faster than the ceiling
    ImpliedSpeed { meters_per_second: f64 },
}

/// Outcome of evaluating one fix
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterDecision {
    /// First fix of a run: becomes the anchor, no distance folded
    Anchor,
    /// Fix accepted; `segment_meters` is added to the run distance
    Accept { segment_meters: f64 },
    /// Fix discarded; the anchor is unchanged
    Reject(RejectReason),
}

impl FilterDecision {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, FilterDecision::Reject(_))
    }
}

/// Stateless filter policy over injected thresholds
#[derive(Clone, Debug)]
pub struct FixFilter {
    config: FilterConfig,
}

impl FixFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Evaluate `fix` against the last accepted fix of the run
    pub fn evaluate(&self, last: Option<&GeoPoint>, fix: &GeoPoint) -> FilterDecision {
        let Some(last) = last else {
            return FilterDecision::Anchor;
        };

        if fix.accuracy_meters() > self.config.accuracy_threshold_meters {
            return FilterDecision::Reject(RejectReason::LowAccuracy {
                accuracy_meters: fix.accuracy_meters(),
            });
        }

        let (fix_ts, last_ts) = (fix.timestamp_millis(), last.timestamp_millis());
        if fix_ts <= last_ts {
            let behind = i128::from(fix_ts) - i128::from(last_ts);
            return FilterDecision::Reject(RejectReason::NonMonotonic {
                elapsed_millis: i64::try_from(behind).unwrap_or(i64::MIN),
            });
        }
        let elapsed_seconds = (fix_ts - last_ts) as f64 / 1000.0;

        let segment_meters = great_circle_distance(last, fix, self.config.earth_radius_meters);
        let meters_per_second = segment_meters / elapsed_seconds;
        if meters_per_second > self.config.speed_threshold_meters_per_second {
            return FilterDecision::Reject(RejectReason::ImpliedSpeed { meters_per_second });
        }

        FilterDecision::Accept { segment_meters }
    }
}

impl Default for FixFilter {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}
