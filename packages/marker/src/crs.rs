//! Coordinate reference systems a dataset may arrive in, and reprojection
//! to WGS84 longitude/latitude.

use std::f64::consts::FRAC_PI_2;
use std::fmt;

use geo::{Coord, Geometry, MapCoords as _};

use crate::MarkerError;

/// Sphere radius used by Web Mercator, in meters.
const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;

/// A supported coordinate reference system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Crs {
    /// Geographic longitude/latitude in degrees (`EPSG:4326`). NAD83
    /// (`EPSG:4269`) and `CRS:84` are treated as equivalent.
    #[default]
    Wgs84,
    /// Spherical Web Mercator in meters (`EPSG:3857`, `EPSG:900913`).
    WebMercator,
}

impl Crs {
    /// Parses a CRS identifier.
    ///
    /// Accepts `AUTHORITY:CODE` forms such as `"EPSG:4326"` or `"CRS:84"`
    /// (case-insensitive) and OGC URNs such as
    /// `"urn:ogc:def:crs:EPSG::3857"`.
    ///
    /// # Errors
    ///
    /// Returns [`MarkerError::UnsupportedCrs`] for any other CRS.
    pub fn from_code(code: &str) -> Result<Self, MarkerError> {
        let upper = code.trim().to_uppercase();
        let normalized = match upper.strip_prefix("URN:OGC:DEF:CRS:") {
            Some(rest) => {
                let authority = rest.split(':').next().unwrap_or_default();
                let id = rest.rsplit(':').next().unwrap_or_default();
                format!("{authority}:{id}")
            }
            None => upper,
        };

        match normalized.as_str() {
            "EPSG:4326" | "EPSG:4269" | "CRS:84" | "OGC:CRS84" => Ok(Self::Wgs84),
            "EPSG:3857" | "EPSG:900913" => Ok(Self::WebMercator),
            _ => Err(MarkerError::UnsupportedCrs(code.to_string())),
        }
    }

    /// Identifies the CRS described by a shapefile `.prj` (ESRI WKT).
    ///
    /// Geographic definitions are taken as WGS84; projected definitions are
    /// accepted only when they name a Web Mercator projection.
    ///
    /// # Errors
    ///
    /// Returns [`MarkerError::UnsupportedCrs`] for any other projection.
    pub fn from_prj(wkt: &str) -> Result<Self, MarkerError> {
        let trimmed = wkt.trim_start();
        if trimmed.starts_with("GEOGCS") {
            return Ok(Self::Wgs84);
        }

        let upper = trimmed.to_uppercase();
        if upper.starts_with("PROJCS")
            && (upper.contains("WEB_MERCATOR") || upper.contains("PSEUDO_MERCATOR"))
        {
            return Ok(Self::WebMercator);
        }

        let name = trimmed
            .split_once('[')
            .map_or(trimmed, |(_, rest)| rest.split(',').next().unwrap_or(rest));
        Err(MarkerError::UnsupportedCrs(name.trim_matches('"').to_string()))
    }

    /// Converts one coordinate from this CRS to WGS84 longitude/latitude.
    #[must_use]
    pub fn coord_to_wgs84(self, coord: Coord<f64>) -> Coord<f64> {
        match self {
            Self::Wgs84 => coord,
            Self::WebMercator => Coord {
                x: (coord.x / WEB_MERCATOR_RADIUS).to_degrees(),
                y: (2.0f64.mul_add((coord.y / WEB_MERCATOR_RADIUS).exp().atan(), -FRAC_PI_2))
                    .to_degrees(),
            },
        }
    }

    /// Reprojects a geometry from this CRS to WGS84 longitude/latitude.
    #[must_use]
    pub fn to_wgs84(self, geometry: Geometry<f64>) -> Geometry<f64> {
        match self {
            Self::Wgs84 => geometry,
            Self::WebMercator => geometry.map_coords(|coord| self.coord_to_wgs84(coord)),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Wgs84 => "EPSG:4326",
            Self::WebMercator => "EPSG:3857",
        })
    }
}
