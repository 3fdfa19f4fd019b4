//! Core domain types for the run tracker.
//!
//! This module defines the values that flow through the system:
//! - Position fixes (`GeoPoint`)
//! - Run status for the session state machine
//! - The finalized `RunReport` handed to exporters

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Position Fixes
// ============================================================================

/// One position sample reported by the sensor.
///
/// Validated once at construction and never mutated afterwards. Timestamp
/// ordering between fixes is checked by the session filter, not here.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
    accuracy_meters: f64,
    timestamp_millis: u64,
}

impl GeoPoint {
    pub fn new(
        latitude: f64,
        longitude: f64,
        accuracy_meters: f64,
        timestamp_millis: u64,
    ) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidFix(format!(
                "latitude {} outside [-90, 90]",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidFix(format!(
                "longitude {} outside [-180, 180]",
                longitude
            )));
        }
        if !accuracy_meters.is_finite() || accuracy_meters < 0.0 {
            return Err(Error::InvalidFix(format!(
                "accuracy {} must be a non-negative number of meters",
                accuracy_meters
            )));
        }

        Ok(Self {
            latitude,
            longitude,
            accuracy_meters,
            timestamp_millis,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn accuracy_meters(&self) -> f64 {
        self.accuracy_meters
    }

    pub fn timestamp_millis(&self) -> u64 {
        self.timestamp_millis
    }

    /// Fix timestamp as a UTC instant (None if out of chrono's range)
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp_millis)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
    }
}

// ============================================================================
// Session State
// ============================================================================

/// Tracking status of a run session
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Idle,
    Tracking,
    Paused,
    Stopped,
}

// ============================================================================
// Reports
// ============================================================================

/// Summary of a finished run, produced exactly once per `stop`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    #[serde(default)]
    pub accepted_fixes: u32,
    #[serde(default)]
    pub rejected_fixes: u32,
    #[serde(default)]
    pub activity: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_fix() {
        let fix = GeoPoint::new(51.5, -0.12, 4.0, 1_700_000_000_000).unwrap();
        assert_eq!(fix.latitude(), 51.5);
        assert_eq!(fix.longitude(), -0.12);
        assert_eq!(fix.accuracy_meters(), 4.0);
        assert_eq!(fix.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_boundary_coordinates_accepted() {
        assert!(GeoPoint::new(90.0, 180.0, 0.0, 0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0, 0.0, 0).is_ok());
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(matches!(
            GeoPoint::new(90.5, 0.0, 5.0, 0),
            Err(Error::InvalidFix(_))
        ));
        assert!(matches!(
            GeoPoint::new(0.0, -180.1, 5.0, 0),
            Err(Error::InvalidFix(_))
        ));
        assert!(matches!(
            GeoPoint::new(0.0, 0.0, -1.0, 0),
            Err(Error::InvalidFix(_))
        ));
        assert!(GeoPoint::new(f64::NAN, 0.0, 5.0, 0).is_err());
        assert!(GeoPoint::new(0.0, 0.0, f64::INFINITY, 0).is_err());
    }

    #[test]
    fn test_fix_timestamp_conversion() {
        let fix = GeoPoint::new(0.0, 0.0, 1.0, 1_000).unwrap();
        let ts = fix.timestamp().unwrap();
        assert_eq!(ts.timestamp_millis(), 1_000);
    }
}
