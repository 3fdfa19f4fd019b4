//! Configuration file support for runtrack.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/runtrack/config.toml`.

use crate::activity::ActivityProfile;
use crate::distance::EARTH_RADIUS_METERS;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub activity: ActivityConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Thresholds used by the fix filter, injected into each session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FilterConfig {
    #[serde(default = "default_accuracy_threshold")]
    pub accuracy_threshold_meters: f64,

    #[serde(default = "default_speed_threshold")]
    pub speed_threshold_meters_per_second: f64,

    #[serde(default = "default_earth_radius")]
    pub earth_radius_meters: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            accuracy_threshold_meters: default_accuracy_threshold(),
            speed_threshold_meters_per_second: default_speed_threshold(),
            earth_radius_meters: default_earth_radius(),
        }
    }
}

impl FilterConfig {
    /// Filter thresholds for a named activity, keeping the default radius
    pub fn for_activity(profile: &ActivityProfile) -> Self {
        Self {
            accuracy_threshold_meters: profile.accuracy_threshold_meters,
            speed_threshold_meters_per_second: profile.speed_threshold_meters_per_second,
            ..Self::default()
        }
    }

    /// Reject thresholds that would make the filter meaningless
    pub fn validate(&self) -> Result<()> {
        if !self.accuracy_threshold_meters.is_finite() || self.accuracy_threshold_meters < 0.0 {
            return Err(Error::Config(format!(
                "accuracy_threshold_meters must be >= 0, got {}",
                self.accuracy_threshold_meters
            )));
        }
        if !self.speed_threshold_meters_per_second.is_finite()
            || self.speed_threshold_meters_per_second <= 0.0
        {
            return Err(Error::Config(format!(
                "speed_threshold_meters_per_second must be > 0, got {}",
                self.speed_threshold_meters_per_second
            )));
        }
        if !self.earth_radius_meters.is_finite() || self.earth_radius_meters <= 0.0 {
            return Err(Error::Config(format!(
                "earth_radius_meters must be > 0, got {}",
                self.earth_radius_meters
            )));
        }
        Ok(())
    }
}

/// Activity selection
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ActivityConfig {
    /// Activity profile applied when none is given on the command line
    #[serde(default)]
    pub default: Option<String>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        PathBuf::from(home).join(".local/share")
    });
    base.join("runtrack")
}

fn default_accuracy_threshold() -> f64 {
    20.0
}

fn default_speed_threshold() -> f64 {
    8.94
}

fn default_earth_radius() -> f64 {
    EARTH_RADIUS_METERS
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.filter.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
        base.join("runtrack").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = self.to_toml()?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Render the configuration as pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Resolve the filter thresholds for a run.
    ///
    /// An explicit activity wins over `[activity] default`; with neither, the
    /// `[filter]` table is used as written.
    pub fn filter_for(&self, activity: Option<&str>) -> Result<FilterConfig> {
        let name = activity.or(self.activity.default.as_deref());
        let filter = match name {
            Some(name) => {
                let profile = ActivityProfile::lookup(name).ok_or_else(|| {
                    Error::Config(format!("Unknown activity profile: {}", name))
                })?;
                FilterConfig {
                    earth_radius_meters: self.filter.earth_radius_meters,
                    ..FilterConfig::for_activity(profile)
                }
            }
            None => self.filter.clone(),
        };
        filter.validate()?;
        Ok(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.filter.accuracy_threshold_meters, 20.0);
        assert_eq!(config.filter.speed_threshold_meters_per_second, 8.94);
        assert_eq!(config.filter.earth_radius_meters, 6_371_000.0);
        assert!(config.activity.default.is_none());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.filter, parsed.filter);
        assert_eq!(config.data.data_dir, parsed.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[filter]
speed_threshold_meters_per_second = 15.0
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.filter.speed_threshold_meters_per_second, 15.0);
        assert_eq!(config.filter.accuracy_threshold_meters, 20.0); // default
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let filter = FilterConfig {
            speed_threshold_meters_per_second: 0.0,
            ..FilterConfig::default()
        };
        assert!(matches!(filter.validate(), Err(Error::Config(_))));

        let filter = FilterConfig {
            accuracy_threshold_meters: -1.0,
            ..FilterConfig::default()
        };
        assert!(filter.validate().is_err());

        let filter = FilterConfig {
            earth_radius_meters: f64::NAN,
            ..FilterConfig::default()
        };
        assert!(filter.validate().is_err());
    }

    #[test]
    fn test_load_from_rejects_invalid_filter() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[filter]\nspeed_threshold_meters_per_second = -3.0\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.activity.default = Some("cycle".into());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.activity.default.as_deref(), Some("cycle"));
    }

    #[test]
    fn test_filter_for_activity() {
        let mut config = Config::default();

        let filter = config.filter_for(Some("cycle")).unwrap();
        assert!(filter.speed_threshold_meters_per_second > 8.94);

        config.activity.default = Some("walk".into());
        let filter = config.filter_for(None).unwrap();
        assert!(filter.speed_threshold_meters_per_second < 8.94);

        // Explicit activity overrides the configured default
        let filter = config.filter_for(Some("run")).unwrap();
        assert_eq!(filter.speed_threshold_meters_per_second, 8.94);

        assert!(config.filter_for(Some("skydive")).is_err());
    }

    #[test]
    fn test_filter_for_without_activity_uses_table() {
        let mut config = Config::default();
        config.filter.speed_threshold_meters_per_second = 12.0;
        let filter = config.filter_for(None).unwrap();
        assert_eq!(filter.speed_threshold_meters_per_second, 12.0);
    }
}
