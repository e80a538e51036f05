#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Datawrapper API client.
//!
//! Opens, copies, or creates charts, edits their title, intro and footer,
//! uploads marker payloads, and publishes. [`LocatorMap`] wraps a chart
//! that has been verified to be a locator map and exposes the single
//! normalize-then-upload entry point.

pub mod api;
pub mod auth;
pub mod config;
pub mod locator_map;

pub use api::{ChartMetadata, ChartSource, DatawrapperClient, Footer};
pub use config::ClientConfig;
pub use locator_map::LocatorMap;

use dw_graphics_marker::MarkerError;
use thiserror::Error;

/// Errors that can occur talking to Datawrapper.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No API token was supplied by any source.
    #[error(
        "No Datawrapper API token: pass one explicitly, create ./auth.txt, or set DW_AUTH_TOKEN"
    )]
    MissingToken,

    /// The API answered with a non-2xx status.
    #[error("Datawrapper API error (HTTP {status}): {reason}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Reason given by the API, or the status text.
        reason: String,
    },

    /// The chart is not the graphic type the operation needs.
    #[error("Chart is a {actual}, expected a {expected}")]
    WrongGraphicType {
        /// Type reported by the API.
        actual: String,
        /// Type the operation needs.
        expected: String,
    },

    /// The markers read back after an upload differ from those sent.
    #[error("Chart {chart_id} did not keep the uploaded markers: {reason}")]
    ReadBack {
        /// Chart that was uploaded to.
        chart_id: String,
        /// First difference found.
        reason: String,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Building the marker payload failed.
    #[error("Marker error: {0}")]
    Marker(#[from] MarkerError),

    /// File I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is invalid.
    #[error("Config error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}
