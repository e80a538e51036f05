#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Storm feed types.
//!
//! Defines the storm request a caller makes, the metadata parsed from the
//! NHC feed, the shapefile layers read from the NHC archives, and the
//! intensity classification that drives point styling.

use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Marker color for hurricane points.
pub const HURRICANE_COLOR: &str = "#e06618";

/// Marker color for every other point.
pub const MUTED_COLOR: &str = "#567282";

/// Miles per hour to kilometres per hour.
pub const KMH_PER_MPH: f64 = 1.60934;

/// Storm intensity, as coded in the NHC shapefiles.
///
/// Forecast points use single letters (`D`, `S`, `H`, `M`); best-track
/// points use two-letter codes (`TD`, `TS`, `HU`, `MH`, `EX`, `LO`, …).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IntensityCode {
    /// Tropical depression.
    Depression,
    /// Tropical storm.
    Storm,
    /// Hurricane, including major hurricanes.
    Hurricane,
    /// Anything else (post-tropical, low, extratropical, …), kept verbatim.
    Other(String),
}

impl IntensityCode {
    /// Classifies a raw intensity code. Matching ignores case and
    /// surrounding whitespace.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        let code = code.trim();
        match code.to_ascii_uppercase().as_str() {
            "D" | "TD" => Self::Depression,
            "S" | "TS" => Self::Storm,
            "H" | "HU" | "M" | "MH" => Self::Hurricane,
            _ => Self::Other(code.to_string()),
        }
    }

    /// Text drawn inside the marker: `D`, `S`, `H`, or empty.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Depression => "D",
            Self::Storm => "S",
            Self::Hurricane => "H",
            Self::Other(_) => "",
        }
    }

    /// Marker color: orange for hurricanes, muted blue otherwise.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Hurricane => HURRICANE_COLOR,
            Self::Depression | Self::Storm | Self::Other(_) => MUTED_COLOR,
        }
    }

    /// Lowercased name used in tooltips (`"hurricane"`).
    #[must_use]
    pub fn label(&self) -> String {
        self.to_string().to_lowercase()
    }
}

impl fmt::Display for IntensityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Depression => f.write_str("Depression"),
            Self::Storm => f.write_str("Storm"),
            Self::Hurricane => f.write_str("Hurricane"),
            Self::Other(code) => f.write_str(code),
        }
    }
}

/// Which NHC archive a layer is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ArchiveKind {
    /// `{id}_5day_latest.zip`.
    Forecast,
    /// `{id}_best_track.zip`.
    BestTrack,
}

/// A shapefile layer inside one of the NHC archives.
///
/// Variant order is the order layers are concatenated per storm.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Layer {
    /// Forecast center line.
    ForecastTrack,
    /// Forecast cone of uncertainty.
    ForecastCone,
    /// Observed track line.
    HistoricalTrack,
    /// Observed positions.
    HistoricalPoints,
    /// Forecast positions.
    ForecastPoints,
}

impl Layer {
    /// File-name suffix that identifies the layer's `.shp` in its archive.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::ForecastTrack => "5day_lin.shp",
            Self::ForecastCone => "5day_pgn.shp",
            Self::ForecastPoints => "5day_pts.shp",
            Self::HistoricalTrack => "lin.shp",
            Self::HistoricalPoints => "pts.shp",
        }
    }

    /// The archive holding this layer.
    #[must_use]
    pub const fn archive(self) -> ArchiveKind {
        match self {
            Self::ForecastTrack | Self::ForecastCone | Self::ForecastPoints => {
                ArchiveKind::Forecast
            }
            Self::HistoricalTrack | Self::HistoricalPoints => ArchiveKind::BestTrack,
        }
    }
}

/// Current state of one storm, from the NHC RSS feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StormMetadata {
    /// ATCF id (e.g. `"AL092022"`).
    pub storm_id: String,
    /// Storm name (e.g. `"Ian"`).
    pub name: String,
    /// Current classification (e.g. `"Hurricane"`).
    pub classification: String,
    /// Maximum sustained wind in mph.
    pub wind_mph: u32,
    /// Maximum sustained wind in km/h, truncated.
    pub wind_kmh: u32,
    /// Latitude of the current center.
    pub latitude: f64,
    /// Longitude of the current center.
    pub longitude: f64,
}

/// Converts mph to km/h, truncating toward zero.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn kmh_from_mph(mph: u32) -> u32 {
    (f64::from(mph) * KMH_PER_MPH) as u32
}

/// One feature of a storm layer, reduced to what marker styling needs.
#[derive(Debug, Clone, PartialEq)]
pub struct StormObservation {
    /// ATCF id of the storm this belongs to.
    pub storm_id: String,
    /// Layer the feature was read from.
    pub layer: Layer,
    /// Feature geometry in WGS84.
    pub geometry: geo::Geometry<f64>,
    /// Valid time in the display zone; points only.
    pub timestamp: Option<DateTime<Tz>>,
    /// Intensity classification; points only.
    pub intensity: Option<IntensityCode>,
}

/// A storm to ingest: its ATCF id and the RSS feed that describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StormRequest {
    /// ATCF id (e.g. `"AL092022"`).
    pub storm_id: String,
    /// NHC RSS feed URL (e.g. `"https://www.nhc.noaa.gov/nhc_at4.xml"`).
    pub feed_url: String,
}

impl StormRequest {
    /// The storm id lowercased, as used in archive file names.
    #[must_use]
    pub fn archive_id(&self) -> String {
        self.storm_id.to_lowercase()
    }
}

impl FromStr for StormRequest {
    type Err = String;

    /// Parses `ID=FEED_URL`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (storm_id, feed_url) = s
            .split_once('=')
            .ok_or_else(|| format!("expected STORM_ID=FEED_URL, got {s:?}"))?;
        let storm_id = storm_id.trim();
        let feed_url = feed_url.trim();
        if storm_id.is_empty() || feed_url.is_empty() {
            return Err(format!("expected STORM_ID=FEED_URL, got {s:?}"));
        }
        Ok(Self {
            storm_id: storm_id.to_string(),
            feed_url: feed_url.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator as _;

    #[test]
    fn classifies_forecast_and_best_track_codes() {
        assert_eq!(IntensityCode::from_code("D"), IntensityCode::Depression);
        assert_eq!(IntensityCode::from_code("td"), IntensityCode::Depression);
        assert_eq!(IntensityCode::from_code("TS"), IntensityCode::Storm);
        assert_eq!(IntensityCode::from_code(" H "), IntensityCode::Hurricane);
        assert_eq!(IntensityCode::from_code("MH"), IntensityCode::Hurricane);
        assert_eq!(
            IntensityCode::from_code("EX"),
            IntensityCode::Other("EX".to_string())
        );
    }

    #[test]
    fn intensity_colors() {
        assert_eq!(IntensityCode::Hurricane.color(), "#e06618");
        assert_eq!(IntensityCode::Hurricane.symbol(), "H");
        assert_eq!(IntensityCode::Depression.color(), "#567282");
        assert_eq!(IntensityCode::Storm.color(), "#567282");

        let other = IntensityCode::from_code("LO");
        assert_eq!(other.symbol(), "");
        assert_eq!(other.color(), "#567282");
        assert_eq!(other.label(), "lo");
    }

    #[test]
    fn labels_are_lowercase_names() {
        assert_eq!(IntensityCode::Hurricane.label(), "hurricane");
        assert_eq!(IntensityCode::Depression.label(), "depression");
    }

    #[test]
    fn layer_suffixes_and_archives() {
        assert_eq!(Layer::ForecastCone.suffix(), "5day_pgn.shp");
        assert_eq!(Layer::HistoricalTrack.archive(), ArchiveKind::BestTrack);
        assert_eq!(Layer::ForecastPoints.archive(), ArchiveKind::Forecast);
        assert_eq!(Layer::ForecastTrack.to_string(), "forecast-track");
    }

    #[test]
    fn layers_iterate_in_concatenation_order() {
        let order: Vec<_> = Layer::iter().collect();
        assert_eq!(
            order,
            vec![
                Layer::ForecastTrack,
                Layer::ForecastCone,
                Layer::HistoricalTrack,
                Layer::HistoricalPoints,
                Layer::ForecastPoints,
            ]
        );
    }

    #[test]
    fn converts_wind_speed() {
        assert_eq!(kmh_from_mph(120), 193);
        assert_eq!(kmh_from_mph(0), 0);
        assert_eq!(kmh_from_mph(40), 64);
    }

    #[test]
    fn parses_storm_request() {
        let request: StormRequest = "AL092022=https://www.nhc.noaa.gov/nhc_at4.xml"
            .parse()
            .unwrap();
        assert_eq!(request.storm_id, "AL092022");
        assert_eq!(request.feed_url, "https://www.nhc.noaa.gov/nhc_at4.xml");
        assert_eq!(request.archive_id(), "al092022");

        assert!("AL092022".parse::<StormRequest>().is_err());
        assert!("=https://example.com".parse::<StormRequest>().is_err());
    }
}
