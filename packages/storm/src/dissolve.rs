//! Dissolving best-track line segments.
//!
//! The best-track line layer has one feature per segment between
//! consecutive fixes. For the map each storm's track is a single line, so
//! segments sharing a key attribute are joined into one feature.

use std::collections::BTreeMap;

use geo::{Coord, Geometry, LineString, MultiLineString};

use crate::archive::ShapeRecord;

/// Attribute that identifies which storm a best-track segment belongs to.
pub const STORM_NUMBER_FIELD: &str = "STORMNUM";

/// Joins line features that share `key` into one feature per key value.
///
/// Groups come out in key order; records without the key form one group.
/// Within a group, a segment whose first point equals the previous
/// segment's last point extends it; otherwise a new part starts and the
/// result is a `MultiLineString`. Each output keeps the attributes of its
/// group's first record. Non-line geometries are dropped.
#[must_use]
pub fn dissolve_by_key(records: Vec<ShapeRecord>, key: &str) -> Vec<ShapeRecord> {
    let mut groups: BTreeMap<String, Vec<ShapeRecord>> = BTreeMap::new();
    for record in records {
        let value = record.attribute(key).unwrap_or_default().to_string();
        groups.entry(value).or_default().push(record);
    }

    groups
        .into_values()
        .filter_map(|group| {
            let attributes = group.first()?.attributes.clone();
            let parts = join_segments(group.into_iter().flat_map(|r| line_parts(r.geometry)));
            let geometry = match parts.len() {
                0 => return None,
                1 => Geometry::LineString(parts.into_iter().next()?),
                _ => Geometry::MultiLineString(MultiLineString::new(parts)),
            };
            Some(ShapeRecord {
                geometry,
                attributes,
            })
        })
        .collect()
}

fn line_parts(geometry: Geometry<f64>) -> Vec<LineString<f64>> {
    match geometry {
        Geometry::Line(line) => vec![LineString::new(vec![line.start, line.end])],
        Geometry::LineString(line) => vec![line],
        Geometry::MultiLineString(lines) => lines.0,
        _ => Vec::new(),
    }
}

fn join_segments(segments: impl Iterator<Item = LineString<f64>>) -> Vec<LineString<f64>> {
    let mut parts: Vec<Vec<Coord<f64>>> = Vec::new();
    for segment in segments {
        let mut coords = segment.0;
        if coords.is_empty() {
            continue;
        }
        match parts.last_mut() {
            Some(current) if current.last() == coords.first() => {
                current.extend(coords.drain(1..));
            }
            _ => parts.push(coords),
        }
    }
    parts.into_iter().map(LineString::new).collect()
}
