//! Styling storm layers as marker input rows.
//!
//! Each layer record is first reduced to a [`StormObservation`] (geometry,
//! valid time, intensity) and then styled by layer into an [`InputRow`].

use chrono_tz::Tz;
use dw_graphics_marker_models::{ColorOrFlag, InputRow};
use dw_graphics_storm_models::{IntensityCode, Layer, StormObservation};

use crate::archive::ShapeRecord;
use crate::{FormatPolicy, StormError, timestamp};

/// Cone of uncertainty color.
pub const CONE_COLOR: &str = "#6a3d99";

/// Line color for the forecast and observed tracks.
pub const TRACK_COLOR: &str = "#000000";

/// Dash pattern for the observed track.
pub const HISTORY_DASHARRAY: &str = "1,2.2";

/// Cone title.
pub const CONE_TITLE: &str = "Probable path";

/// Icon scale for storm points.
pub const POINT_SCALE: f64 = 1.1;

/// Forecast point intensity (`D`, `S`, `H`, `M`).
pub const FORECAST_INTENSITY_FIELD: &str = "DVLBL";
/// Forecast point valid time, long form.
pub const FULL_DATE_FIELD: &str = "FLDATELBL";
/// Forecast point valid time, short form.
pub const SHORT_DATE_FIELD: &str = "DATELBL";
/// Zone abbreviation the forecast labels are written in.
pub const TIMEZONE_FIELD: &str = "TIMEZONE";
/// Best-track point intensity (`TD`, `TS`, `HU`, …).
pub const BEST_TRACK_INTENSITY_FIELD: &str = "STORMTYPE";
/// Best-track storm name, uppercase.
pub const STORM_NAME_FIELD: &str = "STORMNAME";

/// Zones forecast times are read in and shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastClock {
    /// Zone for labels without a known `TIMEZONE` abbreviation.
    pub source: Tz,
    /// Zone titles and tooltips are shown in.
    pub display: Tz,
}

impl Default for ForecastClock {
    fn default() -> Self {
        Self {
            source: chrono_tz::America::Chicago,
            display: chrono_tz::America::New_York,
        }
    }
}

/// Reduces a layer record to an observation.
///
/// Forecast points get a valid time and an intensity from `DVLBL`;
/// best-track points get an intensity from `STORMTYPE`; lines and the cone
/// carry geometry only.
///
/// # Errors
///
/// Returns [`StormError::Timestamp`] if a forecast point's valid time cannot
/// be resolved.
pub fn observe(
    storm_id: &str,
    layer: Layer,
    record: ShapeRecord,
    clock: &ForecastClock,
) -> Result<StormObservation, StormError> {
    let (timestamp, intensity) = match layer {
        Layer::ForecastPoints => {
            let time = timestamp::resolve(
                record.attribute(FULL_DATE_FIELD),
                record.attribute(SHORT_DATE_FIELD),
                record.attribute(TIMEZONE_FIELD),
                clock.source,
                clock.display,
            )?;
            let intensity =
                IntensityCode::from_code(record.attribute(FORECAST_INTENSITY_FIELD).unwrap_or(""));
            (Some(time), Some(intensity))
        }
        Layer::HistoricalPoints => {
            let intensity = IntensityCode::from_code(
                record
                    .attribute(BEST_TRACK_INTENSITY_FIELD)
                    .unwrap_or(""),
            );
            (None, Some(intensity))
        }
        Layer::ForecastTrack | Layer::ForecastCone | Layer::HistoricalTrack => (None, None),
    };

    Ok(StormObservation {
        storm_id: storm_id.to_string(),
        layer,
        geometry: record.geometry,
        timestamp,
        intensity,
    })
}

/// Returns `true` if a best-track point belongs to the named storm.
///
/// Archives can hold fixes from a precursor system under another name.
/// Records without a name are kept.
#[must_use]
pub fn belongs_to_storm(record: &ShapeRecord, storm_name: &str) -> bool {
    record
        .attribute(STORM_NAME_FIELD)
        .is_none_or(|name| name.eq_ignore_ascii_case(storm_name.trim()))
}

fn area_row(observation: &StormObservation) -> InputRow {
    InputRow {
        marker_type: Some("area".to_string()),
        icon: Some("area".to_string()),
        geometry: Some(observation.geometry.clone()),
        ..InputRow::default()
    }
}

fn point_row(observation: &StormObservation) -> InputRow {
    let intensity = observation
        .intensity
        .clone()
        .unwrap_or_else(|| IntensityCode::Other(String::new()));

    let mut row = InputRow {
        marker_type: Some("point".to_string()),
        icon: Some("circle".to_string()),
        scale: Some(POINT_SCALE),
        marker_symbol: Some(intensity.symbol().to_string()),
        marker_color: Some(intensity.color().to_string()),
        ..InputRow::default()
    };

    match &observation.geometry {
        geo::Geometry::Point(point) => {
            row.latitude = Some(point.y());
            row.longitude = Some(point.x());
        }
        other => row.geometry = Some(other.clone()),
    }
    row
}

/// Styles an observation by its layer.
#[must_use]
pub fn styled_row(observation: &StormObservation, policy: &FormatPolicy) -> InputRow {
    match observation.layer {
        Layer::ForecastTrack => InputRow {
            stroke: ColorOrFlag::Color(TRACK_COLOR.to_string()),
            fill_opacity: Some(0.0),
            stroke_opacity: Some(0.5),
            ..area_row(observation)
        },
        Layer::ForecastCone => InputRow {
            title: Some(CONE_TITLE.to_string()),
            marker_color: Some(CONE_COLOR.to_string()),
            fill: ColorOrFlag::Color(CONE_COLOR.to_string()),
            stroke: ColorOrFlag::Color(CONE_COLOR.to_string()),
            fill_opacity: Some(0.3),
            stroke_opacity: Some(0.0),
            ..area_row(observation)
        },
        Layer::HistoricalTrack => InputRow {
            fill: ColorOrFlag::Flag(false),
            stroke: ColorOrFlag::Color(TRACK_COLOR.to_string()),
            fill_opacity: Some(0.0),
            stroke_opacity: Some(1.0),
            stroke_dasharray: Some(HISTORY_DASHARRAY.to_string()),
            ..area_row(observation)
        },
        Layer::HistoricalPoints => point_row(observation),
        Layer::ForecastPoints => {
            let mut row = point_row(observation);
            if let Some(time) = &observation.timestamp {
                let intensity = observation
                    .intensity
                    .clone()
                    .unwrap_or_else(|| IntensityCode::Other(String::new()));
                row.title = Some(policy.title(time));
                row.tooltip = Some(policy.tooltip(time, &intensity));
            }
            row
        }
    }
}
