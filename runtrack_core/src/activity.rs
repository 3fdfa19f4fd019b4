//! Activity profiles.
//!
//! Each profile carries the fastest plausible speed for the activity and the
//! worst accuracy worth trusting.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Filter presets for one kind of activity
#[derive(Clone, Debug, PartialEq)]
pub struct ActivityProfile {
    pub name: &'static str,
    pub speed_threshold_meters_per_second: f64,
    pub accuracy_threshold_meters: f64,
}

static PROFILES: Lazy<HashMap<&'static str, ActivityProfile>> = Lazy::new(|| {
    [
        ActivityProfile {
            name: "walk",
            speed_threshold_meters_per_second: 3.0,
            accuracy_threshold_meters: 20.0,
        },
        ActivityProfile {
            name: "run",
            speed_threshold_meters_per_second: 8.94,
            accuracy_threshold_meters: 20.0,
        },
        ActivityProfile {
            name: "cycle",
            speed_threshold_meters_per_second: 22.0,
            accuracy_threshold_meters: 25.0,
        },
    ]
    .into_iter()
    .map(|p| (p.name, p))
    .collect()
});

impl ActivityProfile {
    /// Find a profile by name, ignoring case
    pub fn lookup(name: &str) -> Option<&'static ActivityProfile> {
        PROFILES.get(name.trim().to_lowercase().as_str())
    }

    /// All known profiles, sorted by speed ceiling
    pub fn all() -> Vec<&'static ActivityProfile> {
        let mut profiles: Vec<_> = PROFILES.values().collect();
        profiles.sort_by(|a, b| {
            a.speed_threshold_meters_per_second
                .total_cmp(&b.speed_threshold_meters_per_second)
        });
        profiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let profile = ActivityProfile::lookup("Cycle").unwrap();
        assert_eq!(profile.name, "cycle");
        assert!(ActivityProfile::lookup(" RUN ").is_some());
        assert!(ActivityProfile::lookup("swim").is_none());
    }

    #[test]
    fn test_run_matches_default_filter() {
        let run = ActivityProfile::lookup("run").unwrap();
        let defaults = crate::FilterConfig::default();
        assert_eq!(
            run.speed_threshold_meters_per_second,
            defaults.speed_threshold_meters_per_second
        );
        assert_eq!(run.accuracy_threshold_meters, defaults.accuracy_threshold_meters);
    }

    #[test]
    fn test_all_sorted_by_speed() {
        let names: Vec<_> = ActivityProfile::all().iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["walk", "run", "cycle"]);
    }
}
