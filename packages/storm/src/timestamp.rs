//! Forecast valid-time parsing and label formatting.
//!
//! NHC forecast points carry a full label (`FLDATELBL`, e.g.
//! `"2022-09-28 8:00 PM Wed"`), a short label (`DATELBL`) and the zone
//! abbreviation the labels are written in (`TIMEZONE`, e.g. `"EDT"`).

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone as _};
use chrono_tz::Tz;
use dw_graphics_storm_models::IntensityCode;

use crate::{FormatPolicy, HourPadding, StormError};

/// Formats tried, in order, against a label.
const LABEL_FORMATS: &[&str] = &[
    "%Y-%m-%d %I:%M %p %a",
    "%Y-%m-%d %I:%M %p",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// UTC offset in hours for the zone abbreviations NHC uses.
#[must_use]
pub fn abbreviation_offset_hours(abbreviation: &str) -> Option<i32> {
    match abbreviation.trim().to_ascii_uppercase().as_str() {
        "UTC" | "GMT" | "Z" => Some(0),
        "AST" | "EDT" => Some(-4),
        "EST" | "CDT" => Some(-5),
        "CST" | "MDT" => Some(-6),
        "MST" | "PDT" => Some(-7),
        "PST" => Some(-8),
        "HST" => Some(-10),
        _ => None,
    }
}

/// Parses a label as a naive local time.
///
/// # Errors
///
/// Returns [`StormError::Timestamp`] if no known format matches.
pub fn parse_label(label: &str) -> Result<NaiveDateTime, StormError> {
    let label = label.trim();
    LABEL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(label, format).ok())
        .or_else(|| {
            // A weekday that disagrees with the date is dropped rather than
            // rejected.
            let (rest, weekday) = label.rsplit_once(' ')?;
            weekday
                .chars()
                .all(char::is_alphabetic)
                .then(|| NaiveDateTime::parse_from_str(rest, "%Y-%m-%d %I:%M %p").ok())
                .flatten()
        })
        .ok_or_else(|| StormError::Timestamp {
            message: format!("unrecognized forecast time {label:?}"),
        })
}

/// Resolves a forecast point's valid time in the display zone.
///
/// `full_label` (`FLDATELBL`) is preferred over `short_label` (`DATELBL`).
/// The naive time is localized with the `TIMEZONE` abbreviation when it is
/// known, and with `source` otherwise.
///
/// # Errors
///
/// Returns [`StormError::Timestamp`] if neither label parses, or the local
/// time does not exist in `source`.
pub fn resolve(
    full_label: Option<&str>,
    short_label: Option<&str>,
    abbreviation: Option<&str>,
    source: Tz,
    display: Tz,
) -> Result<DateTime<Tz>, StormError> {
    let naive = match (full_label, short_label) {
        (Some(full), short) => parse_label(full).or_else(|e| short.map_or(Err(e), parse_label)),
        (None, Some(short)) => parse_label(short),
        (None, None) => Err(StormError::Timestamp {
            message: "forecast point has neither FLDATELBL nor DATELBL".to_string(),
        }),
    }?;

    let fixed = abbreviation
        .and_then(abbreviation_offset_hours)
        .and_then(|hours| FixedOffset::east_opt(hours * 3600));

    let localized = match fixed {
        Some(offset) => offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&display)),
        None => source
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&display)),
    };

    localized.ok_or_else(|| StormError::Timestamp {
        message: format!("{naive} does not exist in {source}"),
    })
}

impl FormatPolicy {
    fn day_format(&self) -> &'static str {
        match self.hour_padding {
            HourPadding::Unpadded => "%b %-d",
            HourPadding::ZeroPadded => "%b %d",
        }
    }

    fn time_format(&self) -> &'static str {
        match self.hour_padding {
            HourPadding::Unpadded => "%-I:%M %p",
            HourPadding::ZeroPadded => "%I:%M %p",
        }
    }

    /// Marker title for a forecast point: `"Sep 28<br>8:00 PM"`.
    #[must_use]
    pub fn title(&self, time: &DateTime<Tz>) -> String {
        format!(
            "{}<br>{}",
            time.format(self.day_format()),
            time.format(self.time_format())
        )
    }

    /// Tooltip for a forecast point: `"On Sep 28 at 8:00 PM EST, the storm
    /// is projected to be classified as a hurricane."`.
    #[must_use]
    pub fn tooltip(&self, time: &DateTime<Tz>, intensity: &IntensityCode) -> String {
        format!(
            "On {} at {} {}, the storm is projected to be classified as a {}.",
            time.format(self.day_format()),
            time.format(self.time_format()),
            self.zone_label,
            intensity.label()
        )
    }
}
