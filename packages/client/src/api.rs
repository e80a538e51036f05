//! Datawrapper REST calls.

use chrono::{DateTime, Timelike as _};
use chrono_tz::Tz;
use dw_graphics_marker_models::MarkerList;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{ClientConfig, ClientError};

/// Which chart an operation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartSource {
    /// An existing chart, edited in place.
    Existing(String),
    /// A fresh copy of an existing chart.
    CopyOf(String),
    /// A new, empty chart.
    New {
        /// Graphic type, e.g. `"locator-map"`.
        chart_type: String,
        /// Folder to create the chart in.
        folder_id: Option<String>,
    },
}

/// Chart properties as returned by `GET /charts/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    /// Chart id.
    #[serde(default)]
    pub id: Option<String>,
    /// Public chart id; older responses only carry this one.
    #[serde(default)]
    pub public_id: Option<String>,
    /// Graphic type, e.g. `"locator-map"`.
    #[serde(rename = "type", default)]
    pub chart_type: String,
    /// Chart headline.
    #[serde(default)]
    pub title: Option<String>,
    /// Everything else, kept as returned.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChartMetadata {
    /// The chart id, preferring `id` over `publicId`.
    #[must_use]
    pub fn chart_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.public_id.as_deref())
    }
}

/// Footer fields shown under a chart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Footer {
    /// Data source credit.
    pub source: Option<String>,
    /// Author byline.
    pub byline: Option<String>,
    /// Free-form note; a "last updated" stamp is appended when `updated`
    /// is set.
    pub note: Option<String>,
    /// Time to stamp into the note.
    pub updated: Option<DateTime<Tz>>,
}

/// `"Last updated on October 9, 2026 at 3:05 p.m."`.
#[must_use]
pub fn last_updated(time: &DateTime<Tz>) -> String {
    let meridiem = if time.hour() < 12 { "a.m." } else { "p.m." };
    format!(
        "Last updated on {} at {} {meridiem}",
        time.format("%B %-d, %Y"),
        time.format("%-I:%M")
    )
}

/// Body for `POST /charts`.
#[must_use]
pub fn create_body(chart_type: &str, folder_id: Option<&str>) -> Value {
    let mut body = json!({ "type": chart_type });
    if let Some(folder_id) = folder_id {
        body["folderId"] = Value::String(folder_id.to_string());
    }
    body
}

/// `PATCH /charts/{id}` body setting the headline.
#[must_use]
pub fn title_patch(title: &str) -> Value {
    json!({ "title": title })
}

/// `PATCH /charts/{id}` body setting the intro text.
#[must_use]
pub fn intro_patch(intro: &str) -> Value {
    json!({ "metadata": { "describe": { "intro": intro } } })
}

/// `PATCH /charts/{id}` body setting the footer. Unset fields are left
/// untouched.
#[must_use]
pub fn footer_patch(footer: &Footer) -> Value {
    let mut describe = Map::new();
    if let Some(source) = &footer.source {
        describe.insert("source-name".to_string(), Value::String(source.clone()));
    }
    if let Some(byline) = &footer.byline {
        describe.insert("byline".to_string(), Value::String(byline.clone()));
    }

    let notes = [
        footer.note.clone(),
        footer.updated.as_ref().map(last_updated),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.trim().is_empty())
    .collect::<Vec<_>>()
    .join(" ");

    let mut metadata = Map::new();
    if !describe.is_empty() {
        metadata.insert("describe".to_string(), Value::Object(describe));
    }
    if !notes.is_empty() {
        metadata.insert("annotate".to_string(), json!({ "notes": notes }));
    }
    json!({ "metadata": metadata })
}

/// Extracts a readable reason from an error response body.
///
/// Datawrapper error bodies are JSON with a `message` field; anything else
/// falls back to the status text and the raw body.
#[must_use]
pub fn api_reason(status: reqwest::StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        value
            .get("message")
            .and_then(Value::as_str)
            .map(ToString::to_string)
    });
    let status_text = status.canonical_reason().unwrap_or("Unknown status");

    match message {
        Some(message) => message,
        None if body.trim().is_empty() => status_text.to_string(),
        None => format!("{status_text}: {}", body.trim()),
    }
}

/// Compares the markers stored on a chart with the list that was uploaded.
///
/// Both must hold the same ids in the same order.
///
/// # Errors
///
/// Returns [`ClientError::ReadBack`] describing the first difference.
pub fn check_read_back(
    chart_id: &str,
    uploaded: &MarkerList,
    stored: &[Value],
) -> Result<(), ClientError> {
    let mismatch = |reason: String| ClientError::ReadBack {
        chart_id: chart_id.to_string(),
        reason,
    };

    if stored.len() != uploaded.len() {
        return Err(mismatch(format!(
            "{} markers stored, {} uploaded",
            stored.len(),
            uploaded.len()
        )));
    }

    for (index, (sent, kept)) in uploaded.markers.iter().zip(stored).enumerate() {
        let kept_id = kept.get("id").and_then(Value::as_str);
        if sent.id() != kept_id {
            return Err(mismatch(format!(
                "marker {index} is {kept_id:?}, expected {:?}",
                sent.id()
            )));
        }
    }
    Ok(())
}

/// An authenticated Datawrapper API client.
pub struct DatawrapperClient {
    client: reqwest::Client,
    config: ClientConfig,
    token: String,
}

impl DatawrapperClient {
    /// Creates a client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// * [`ClientError::MissingToken`] if `token` is blank
    /// * [`ClientError::Http`] if the HTTP client cannot be built
    pub fn new(config: ClientConfig, token: String) -> Result<Self, ClientError> {
        if token.trim().is_empty() {
            return Err(ClientError::MissingToken);
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self {
            client,
            config,
            token,
        })
    }

    /// The settings in use.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends a request and returns the body of a 2xx response.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<String, ClientError> {
        let url = self.config.url(path);
        log::debug!("{method} {url}");

        let mut request = self
            .client
            .request(method, &url)
            .header("Accept", "*/*")
            .header("Authorization", format!("Bearer {}", self.token));
        if let Some(body) = body {
            request = request
                .header("Content-Type", "application/json")
                .body(body);
        }

        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                reason: api_reason(status, &text),
            });
        }
        Ok(text)
    }

    async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: &Value,
    ) -> Result<String, ClientError> {
        self.send(method, path, Some(serde_json::to_string(body)?))
            .await
    }

    fn new_chart_id(response: &str) -> Result<String, ClientError> {
        let metadata: ChartMetadata = serde_json::from_str(response)?;
        metadata
            .chart_id()
            .map(ToString::to_string)
            .ok_or_else(|| ClientError::Api {
                status: 200,
                reason: "response has no chart id".to_string(),
            })
    }

    /// Creates an empty chart and returns its id.
    ///
    /// # Errors
    ///
    /// * [`ClientError::Api`] if the API rejects the request
    /// * [`ClientError::Http`] / [`ClientError::Json`] on transport or
    ///   decoding failures
    pub async fn create_chart(
        &self,
        chart_type: &str,
        folder_id: Option<&str>,
    ) -> Result<String, ClientError> {
        let response = self
            .send_json(Method::POST, "charts", &create_body(chart_type, folder_id))
            .await?;
        let id = Self::new_chart_id(&response)?;
        log::info!("Created {chart_type} chart {id}");
        Ok(id)
    }

    /// Copies a chart and returns the copy's id.
    ///
    /// # Errors
    ///
    /// * [`ClientError::Api`] if the API rejects the request
    /// * [`ClientError::Http`] / [`ClientError::Json`] on transport or
    ///   decoding failures
    pub async fn copy_chart(&self, chart_id: &str) -> Result<String, ClientError> {
        let response = self
            .send(Method::POST, &format!("charts/{chart_id}/copy"), None)
            .await?;
        let id = Self::new_chart_id(&response)?;
        log::info!("Created chart {id} as a copy of {chart_id}");
        Ok(id)
    }

    /// Resolves a [`ChartSource`] to the id of the chart to work on,
    /// copying or creating a chart as needed.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::copy_chart`] or
    /// [`Self::create_chart`].
    pub async fn open(&self, source: &ChartSource) -> Result<String, ClientError> {
        match source {
            ChartSource::Existing(chart_id) => Ok(chart_id.clone()),
            ChartSource::CopyOf(chart_id) => self.copy_chart(chart_id).await,
            ChartSource::New {
                chart_type,
                folder_id,
            } => self.create_chart(chart_type, folder_id.as_deref()).await,
        }
    }

    /// Fetches a chart's properties.
    ///
    /// # Errors
    ///
    /// * [`ClientError::Api`] if the chart does not exist or is not
    ///   accessible
    /// * [`ClientError::Http`] / [`ClientError::Json`] on transport or
    ///   decoding failures
    pub async fn metadata(&self, chart_id: &str) -> Result<ChartMetadata, ClientError> {
        let response = self
            .send(Method::GET, &format!("charts/{chart_id}"), None)
            .await?;
        Ok(serde_json::from_str(&response)?)
    }

    /// Verifies a chart is of the expected graphic type.
    ///
    /// # Errors
    ///
    /// * [`ClientError::WrongGraphicType`] if the type differs
    /// * any error from [`Self::metadata`]
    pub async fn check_graphic_type(
        &self,
        chart_id: &str,
        expected: &str,
    ) -> Result<ChartMetadata, ClientError> {
        let metadata = self.metadata(chart_id).await?;
        if metadata.chart_type != expected {
            return Err(ClientError::WrongGraphicType {
                actual: metadata.chart_type,
                expected: expected.to_string(),
            });
        }
        Ok(metadata)
    }

    /// Replaces a locator map's markers.
    ///
    /// # Errors
    ///
    /// * [`ClientError::Api`] if the upload is rejected
    /// * [`ClientError::Http`] / [`ClientError::Json`] on transport or
    ///   encoding failures
    pub async fn upload_markers(
        &self,
        chart_id: &str,
        markers: &MarkerList,
    ) -> Result<(), ClientError> {
        let payload = serde_json::to_string(markers)?;
        self.send(Method::PUT, &format!("charts/{chart_id}/data"), Some(payload))
            .await?;
        log::info!("Uploaded {} markers to {chart_id}", markers.len());
        Ok(())
    }

    /// Reads a locator map's current markers.
    ///
    /// # Errors
    ///
    /// * [`ClientError::Api`] if the chart is not accessible
    /// * [`ClientError::Http`] / [`ClientError::Json`] on transport or
    ///   decoding failures
    pub async fn get_markers(&self, chart_id: &str) -> Result<Vec<Value>, ClientError> {
        #[derive(Deserialize)]
        struct MarkerData {
            #[serde(default)]
            markers: Vec<Value>,
        }

        let response = self
            .send(Method::GET, &format!("charts/{chart_id}/data"), None)
            .await?;
        let data: MarkerData = serde_json::from_str(&response)?;
        Ok(data.markers)
    }

    /// Sets the chart headline.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] if the update is rejected, or a
    /// transport error.
    pub async fn set_title(&self, chart_id: &str, title: &str) -> Result<(), ClientError> {
        self.send_json(Method::PATCH, &format!("charts/{chart_id}"), &title_patch(title))
            .await?;
        log::info!("Set title of {chart_id}");
        Ok(())
    }

    /// Sets the intro text under the headline.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] if the update is rejected, or a
    /// transport error.
    pub async fn set_intro(&self, chart_id: &str, intro: &str) -> Result<(), ClientError> {
        self.send_json(Method::PATCH, &format!("charts/{chart_id}"), &intro_patch(intro))
            .await?;
        log::info!("Set intro of {chart_id}");
        Ok(())
    }

    /// Sets the source, byline and notes.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] if the update is rejected, or a
    /// transport error.
    pub async fn set_footer(&self, chart_id: &str, footer: &Footer) -> Result<(), ClientError> {
        self.send_json(
            Method::PATCH,
            &format!("charts/{chart_id}"),
            &footer_patch(footer),
        )
        .await?;
        log::info!("Set footer of {chart_id}");
        Ok(())
    }

    /// Publishes the chart.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] if publishing is rejected, or a
    /// transport error.
    pub async fn publish(&self, chart_id: &str) -> Result<(), ClientError> {
        self.send(Method::POST, &format!("charts/{chart_id}/publish"), None)
            .await?;
        log::info!("Published {chart_id}");
        Ok(())
    }
}
