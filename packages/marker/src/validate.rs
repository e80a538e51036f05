//! Field validation for input rows.
//!
//! Every check is pure: a value that is absent always passes, and the
//! first failing field is reported with its name, value and allow-list.

use std::sync::LazyLock;

use dw_graphics_marker_models::{Anchor, ColorOrFlag, IconRegistry, InputRow, MarkerType};
use regex::Regex;
use strum::VariantNames as _;

use crate::MarkerError;

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap_or_else(|_| unreachable!()));

/// Returns `true` if `value` is a `#rrggbb` color.
#[must_use]
pub fn is_hex_color(value: &str) -> bool {
    HEX_COLOR.is_match(value)
}

/// Checks an enumerated field against its allow-list.
///
/// # Errors
///
/// Returns [`MarkerError::InvalidMarkerData`] if `value` is present and not
/// in `allowed`.
pub fn validate_enum(field: &str, value: Option<&str>, allowed: &[&str]) -> Result<(), MarkerError> {
    match value {
        Some(value) if !allowed.contains(&value) => Err(invalid_enum(field, value, allowed)),
        _ => Ok(()),
    }
}

pub(crate) fn invalid_enum(field: &str, value: &str, allowed: &[&str]) -> MarkerError {
    MarkerError::InvalidMarkerData {
        field: field.to_string(),
        value: value.to_string(),
        allowed: allowed.iter().map(ToString::to_string).collect(),
    }
}

/// Checks a color-only field such as `markerColor`.
///
/// # Errors
///
/// Returns [`MarkerError::InvalidHexcode`] if `value` is present and not a
/// hex color.
pub fn validate_hex(field: &str, value: Option<&str>) -> Result<(), MarkerError> {
    match value {
        Some(value) if !is_hex_color(value) => Err(MarkerError::InvalidHexcode {
            field: field.to_string(),
            value: value.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Checks a `fill`/`stroke` field, which may be a hex color or a boolean.
///
/// # Errors
///
/// Returns [`MarkerError::InvalidHexcode`] if `value` is a color string
/// that is not a hex color.
pub fn validate_hex_or_bool(field: &str, value: &ColorOrFlag) -> Result<(), MarkerError> {
    match value {
        ColorOrFlag::Color(color) => validate_hex(field, Some(color)),
        ColorOrFlag::Flag(_) | ColorOrFlag::Absent => Ok(()),
    }
}

/// Validates every checked field of `row`, in the fixed order `type`,
/// `anchor`, `icon`, `markerColor`, `fill`, `stroke`, `markerTextColor`.
///
/// `icon` is checked against the names in `icons`. Validation stops at the
/// first failure.
///
/// # Errors
///
/// Returns the first [`MarkerError::InvalidMarkerData`] or
/// [`MarkerError::InvalidHexcode`] encountered.
pub fn validate_row(row: &InputRow, icons: &IconRegistry) -> Result<(), MarkerError> {
    let icon_names: Vec<&str> = icons.names().collect();

    validate_enum("type", row.marker_type.as_deref(), MarkerType::VARIANTS)?;
    validate_enum("anchor", row.anchor.as_deref(), Anchor::VARIANTS)?;
    validate_enum("icon", row.icon.as_deref(), &icon_names)?;
    validate_hex("markerColor", row.marker_color.as_deref())?;
    validate_hex_or_bool("fill", &row.fill)?;
    validate_hex_or_bool("stroke", &row.stroke)?;
    validate_hex("markerTextColor", row.marker_text_color.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_values_always_pass() {
        assert!(validate_enum("anchor", None, Anchor::VARIANTS).is_ok());
        assert!(validate_hex("markerColor", None).is_ok());
        assert!(validate_hex_or_bool("fill", &ColorOrFlag::Absent).is_ok());
    }

    #[test]
    fn hex_pattern_is_anchored() {
        assert!(is_hex_color("#e06618"));
        assert!(is_hex_color("#C42127"));
        assert!(!is_hex_color("e06618"));
        assert!(!is_hex_color("#e0661"));
        assert!(!is_hex_color("#e066189"));
        assert!(!is_hex_color("xx#e06618"));
        assert!(!is_hex_color("#gggggg"));
    }

    #[test]
    fn marker_color_rejects_non_hex() {
        let err = validate_hex("markerColor", Some("red")).unwrap_err();
        assert!(matches!(
            err,
            MarkerError::InvalidHexcode { ref field, ref value }
                if field == "markerColor" && value == "red"
        ));
        assert!(validate_hex("markerTextColor", Some("#333333")).is_ok());
    }

    #[test]
    fn fill_and_stroke_accept_booleans() {
        assert!(validate_hex_or_bool("fill", &ColorOrFlag::Flag(false)).is_ok());
        assert!(validate_hex_or_bool("stroke", &ColorOrFlag::Flag(true)).is_ok());
        assert!(validate_hex_or_bool("fill", &ColorOrFlag::Color("#6a3d99".into())).is_ok());
        assert!(validate_hex_or_bool("fill", &ColorOrFlag::Color("purple".into())).is_err());
    }

    #[test]
    fn unknown_anchor_reports_full_allow_list() {
        let err = validate_enum("anchor", Some("middle"), Anchor::VARIANTS).unwrap_err();
        let MarkerError::InvalidMarkerData { allowed, .. } = err else {
            panic!("expected InvalidMarkerData, got {err:?}");
        };
        assert_eq!(allowed.len(), 9);
        assert_eq!(allowed[0], "middle-left");
    }

    #[test]
    fn validates_in_fixed_order() {
        let icons = IconRegistry::embedded();
        let row = InputRow {
            anchor: Some("nowhere".into()),
            marker_color: Some("red".into()),
            ..InputRow::default()
        };
        let err = validate_row(&row, &icons).unwrap_err();
        assert!(
            matches!(err, MarkerError::InvalidMarkerData { ref field, .. } if field == "anchor")
        );

        let row = InputRow {
            marker_color: Some("red".into()),
            fill: ColorOrFlag::Color("blue".into()),
            ..InputRow::default()
        };
        let err = validate_row(&row, &icons).unwrap_err();
        assert!(matches!(err, MarkerError::InvalidHexcode { ref field, .. } if field == "markerColor"));
    }

    #[test]
    fn icon_must_exist_in_registry() {
        let icons = IconRegistry::embedded();
        let row = InputRow {
            icon: Some("rocket".into()),
            ..InputRow::default()
        };
        let err = validate_row(&row, &icons).unwrap_err();
        assert!(matches!(err, MarkerError::InvalidMarkerData { ref field, .. } if field == "icon"));

        let row = InputRow {
            icon: Some("attention".into()),
            ..InputRow::default()
        };
        assert!(validate_row(&row, &icons).is_ok());
    }

    #[test]
    fn marker_symbol_is_free_text() {
        let icons = IconRegistry::embedded();
        let row = InputRow {
            marker_symbol: Some("H".into()),
            ..InputRow::default()
        };
        assert!(validate_row(&row, &icons).is_ok());
    }
}
