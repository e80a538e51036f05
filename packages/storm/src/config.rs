//! Storm ingestion settings, loaded from TOML.
//!
//! Every key is optional; an empty file yields the NHC defaults.
//!
//! ```toml
//! forecast_base_url = "https://www.nhc.noaa.gov/gis/forecast/archive"
//! best_track_base_url = "https://www.nhc.noaa.gov/gis/best_track"
//! source_timezone = "America/Chicago"
//! display_timezone = "America/New_York"
//! display_zone_label = "EST"
//! hour_padding = "unpadded"
//! request_timeout_secs = 30
//! ```

use std::path::Path;
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::StormError;

fn default_forecast_base_url() -> String {
    "https://www.nhc.noaa.gov/gis/forecast/archive".to_string()
}

fn default_best_track_base_url() -> String {
    "https://www.nhc.noaa.gov/gis/best_track".to_string()
}

fn default_source_timezone() -> String {
    "America/Chicago".to_string()
}

fn default_display_timezone() -> String {
    "America/New_York".to_string()
}

fn default_display_zone_label() -> String {
    "EST".to_string()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

/// Whether hours and days in labels are zero-padded (`09:00 AM`) or not
/// (`9:00 AM`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HourPadding {
    /// `Sep 8<br>9:00 AM`.
    #[default]
    Unpadded,
    /// `Sep 08<br>09:00 AM`.
    ZeroPadded,
}

/// Storm ingestion settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StormConfig {
    /// Directory holding `{id}_5day_latest.zip`.
    #[serde(default = "default_forecast_base_url")]
    pub forecast_base_url: String,
    /// Directory holding `{id}_best_track.zip`.
    #[serde(default = "default_best_track_base_url")]
    pub best_track_base_url: String,
    /// IANA zone for forecast times that carry no `TIMEZONE` abbreviation.
    #[serde(default = "default_source_timezone")]
    pub source_timezone: String,
    /// IANA zone labels are shown in.
    #[serde(default = "default_display_timezone")]
    pub display_timezone: String,
    /// Zone name printed in tooltips.
    #[serde(default = "default_display_zone_label")]
    pub display_zone_label: String,
    /// Label padding style.
    #[serde(default)]
    pub hour_padding: HourPadding,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for StormConfig {
    fn default() -> Self {
        Self {
            forecast_base_url: default_forecast_base_url(),
            best_track_base_url: default_best_track_base_url(),
            source_timezone: default_source_timezone(),
            display_timezone: default_display_timezone(),
            display_zone_label: default_display_zone_label(),
            hour_padding: HourPadding::default(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl StormConfig {
    /// Parses a config from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`StormError::Config`] if the TOML is malformed, has unknown
    /// keys, or names an unknown time zone.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, StormError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| StormError::Config {
            message: e.to_string(),
        })?;
        config.source_tz()?;
        config.display_tz()?;
        Ok(config)
    }

    /// Reads a config file.
    ///
    /// # Errors
    ///
    /// * [`StormError::Io`] if the file cannot be read
    /// * any error from [`Self::from_toml_str`]
    pub fn from_path(path: &Path) -> Result<Self, StormError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// URL of a storm's 5-day forecast archive.
    #[must_use]
    pub fn forecast_url(&self, archive_id: &str) -> String {
        format!(
            "{}/{archive_id}_5day_latest.zip",
            self.forecast_base_url.trim_end_matches('/')
        )
    }

    /// URL of a storm's best-track archive.
    #[must_use]
    pub fn best_track_url(&self, archive_id: &str) -> String {
        format!(
            "{}/{archive_id}_best_track.zip",
            self.best_track_base_url.trim_end_matches('/')
        )
    }

    /// Zone for forecast times without a `TIMEZONE` abbreviation.
    ///
    /// # Errors
    ///
    /// Returns [`StormError::Config`] if the zone name is unknown.
    pub fn source_tz(&self) -> Result<Tz, StormError> {
        parse_tz("source_timezone", &self.source_timezone)
    }

    /// Zone labels are shown in.
    ///
    /// # Errors
    ///
    /// Returns [`StormError::Config`] if the zone name is unknown.
    pub fn display_tz(&self) -> Result<Tz, StormError> {
        parse_tz("display_timezone", &self.display_timezone)
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The label formatting policy these settings describe.
    #[must_use]
    pub fn format_policy(&self) -> FormatPolicy {
        FormatPolicy {
            hour_padding: self.hour_padding,
            zone_label: self.display_zone_label.clone(),
        }
    }
}

fn parse_tz(key: &str, name: &str) -> Result<Tz, StormError> {
    name.parse().map_err(|_| StormError::Config {
        message: format!("{key}: unknown time zone {name:?}"),
    })
}

/// How forecast times are rendered in titles and tooltips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatPolicy {
    /// Padding style.
    pub hour_padding: HourPadding,
    /// Zone name printed in tooltips.
    pub zone_label: String,
}

impl Default for FormatPolicy {
    fn default() -> Self {
        StormConfig::default().format_policy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_nhc_defaults() {
        let config = StormConfig::from_toml_str("").unwrap();
        assert_eq!(config, StormConfig::default());
        assert_eq!(config.source_tz().unwrap(), chrono_tz::America::Chicago);
        assert_eq!(config.display_tz().unwrap(), chrono_tz::America::New_York);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn builds_archive_urls() {
        let config = StormConfig::default();
        assert_eq!(
            config.forecast_url("al092022"),
            "https://www.nhc.noaa.gov/gis/forecast/archive/al092022_5day_latest.zip"
        );
        assert_eq!(
            config.best_track_url("al092022"),
            "https://www.nhc.noaa.gov/gis/best_track/al092022_best_track.zip"
        );
    }

    #[test]
    fn overrides_and_padding() {
        let config = StormConfig::from_toml_str(
            r#"
            forecast_base_url = "http://localhost:8080/forecast/"
            hour_padding = "zero_padded"
            request_timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(
            config.forecast_url("ep012023"),
            "http://localhost:8080/forecast/ep012023_5day_latest.zip"
        );
        assert_eq!(config.format_policy().hour_padding, HourPadding::ZeroPadded);
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn rejects_unknown_zone_and_keys() {
        assert!(matches!(
            StormConfig::from_toml_str(r#"source_timezone = "Mars/Olympus""#),
            Err(StormError::Config { .. })
        ));
        assert!(matches!(
            StormConfig::from_toml_str("retries = 3"),
            Err(StormError::Config { .. })
        ));
    }
}
