//! GPS signal quality indicator.
//!
//! A side channel for display only. It is updated by every fix, accepted or
//! not, and by sensor errors, and has no effect on the distance accumulator.

use crate::SensorError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Five-level signal indicator derived from fix accuracy
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum SignalQuality {
    #[default]
    None,
    Weak,
    Medium,
    Good,
    Excellent,
}

impl SignalQuality {
    /// Bucket an accuracy radius in meters
    pub fn from_accuracy(accuracy_meters: f64) -> Self {
        if accuracy_meters.is_nan() {
            SignalQuality::None
        } else if accuracy_meters <= 5.0 {
            SignalQuality::Excellent
        } else if accuracy_meters <= 10.0 {
            SignalQuality::Good
        } else if accuracy_meters <= 20.0 {
            SignalQuality::Medium
        } else if accuracy_meters <= 30.0 {
            SignalQuality::Weak
        } else {
            SignalQuality::None
        }
    }

    /// Any sensor failure means no usable signal
    pub fn from_sensor_error(_err: SensorError) -> Self {
        SignalQuality::None
    }

    pub fn label(&self) -> &'static str {
        match self {
            SignalQuality::None => "none",
            SignalQuality::Weak => "weak",
            SignalQuality::Medium => "medium",
            SignalQuality::Good => "good",
            SignalQuality::Excellent => "excellent",
        }
    }
}

impl fmt::Display for SignalQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_buckets() {
        assert_eq!(SignalQuality::from_accuracy(0.0), SignalQuality::Excellent);
        assert_eq!(SignalQuality::from_accuracy(5.0), SignalQuality::Excellent);
        assert_eq!(SignalQuality::from_accuracy(7.5), SignalQuality::Good);
        assert_eq!(SignalQuality::from_accuracy(20.0), SignalQuality::Medium);
        assert_eq!(SignalQuality::from_accuracy(25.0), SignalQuality::Weak);
        assert_eq!(SignalQuality::from_accuracy(30.1), SignalQuality::None);
    }

    #[test]
    fn test_sensor_errors_clear_signal() {
        assert_eq!(
            SignalQuality::from_sensor_error(SensorError::PermissionDenied),
            SignalQuality::None
        );
    }

    #[test]
    fn test_ordering() {
        assert!(SignalQuality::Excellent > SignalQuality::Weak);
        assert!(SignalQuality::None < SignalQuality::Weak);
    }
}
