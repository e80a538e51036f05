//! Per-storm ingestion: feed, forecast archive, best-track archive, rows.

use dw_graphics_marker::{Crs, Dataset};
use dw_graphics_marker_models::InputRow;
use dw_graphics_storm_models::{Layer, StormMetadata, StormObservation, StormRequest};

use crate::archive::{ShapeRecord, StormArchive, fetch_archive};
use crate::dissolve::{STORM_NUMBER_FIELD, dissolve_by_key};
use crate::rows::{ForecastClock, belongs_to_storm, observe, styled_row};
use crate::{FormatPolicy, StormConfig, StormError, feed};

/// Everything read for one storm.
#[derive(Debug, Clone)]
pub struct StormBundle {
    /// Current state from the feed.
    pub metadata: StormMetadata,
    /// Styled rows in concatenation order.
    pub rows: Vec<InputRow>,
}

/// Layer records for one storm, before styling.
#[derive(Debug, Clone, Default)]
pub struct StormLayers {
    /// Forecast center line.
    pub forecast_track: Vec<ShapeRecord>,
    /// Forecast cone.
    pub forecast_cone: Vec<ShapeRecord>,
    /// Forecast positions.
    pub forecast_points: Vec<ShapeRecord>,
    /// Observed track segments, not yet dissolved.
    pub historical_track: Vec<ShapeRecord>,
    /// Observed positions.
    pub historical_points: Vec<ShapeRecord>,
}

impl StormLayers {
    fn take(&mut self, layer: Layer) -> Vec<ShapeRecord> {
        std::mem::take(match layer {
            Layer::ForecastTrack => &mut self.forecast_track,
            Layer::ForecastCone => &mut self.forecast_cone,
            Layer::ForecastPoints => &mut self.forecast_points,
            Layer::HistoricalTrack => &mut self.historical_track,
            Layer::HistoricalPoints => &mut self.historical_points,
        })
    }
}

/// Turns a storm's layers into styled rows.
///
/// Rows come out as center line, cone, observed track (dissolved per
/// storm number), observed points (only those named for this storm), then
/// forecast points.
///
/// # Errors
///
/// Returns [`StormError::Timestamp`] if a forecast point's valid time cannot
/// be resolved.
pub fn assemble(
    metadata: &StormMetadata,
    mut layers: StormLayers,
    clock: &ForecastClock,
    policy: &FormatPolicy,
) -> Result<Vec<InputRow>, StormError> {
    let order = [
        Layer::ForecastTrack,
        Layer::ForecastCone,
        Layer::HistoricalTrack,
        Layer::HistoricalPoints,
        Layer::ForecastPoints,
    ];

    let mut rows = Vec::new();
    for layer in order {
        let records = match layer {
            Layer::HistoricalTrack => {
                dissolve_by_key(layers.take(layer), STORM_NUMBER_FIELD)
            }
            Layer::HistoricalPoints => layers
                .take(layer)
                .into_iter()
                .filter(|record| belongs_to_storm(record, &metadata.name))
                .collect(),
            _ => layers.take(layer),
        };

        let count = rows.len();
        for record in records {
            let observation: StormObservation = observe(&metadata.storm_id, layer, record, clock)?;
            rows.push(styled_row(&observation, policy));
        }
        log::debug!(
            "{}: {} {layer} rows",
            metadata.storm_id,
            rows.len() - count
        );
    }

    Ok(rows)
}

/// Fetches storms and turns them into marker input rows.
pub struct StormIngestor {
    client: reqwest::Client,
    config: StormConfig,
}

impl StormIngestor {
    /// Creates an ingestor with the configured request timeout.
    ///
    /// # Errors
    ///
    /// * [`StormError::Config`] if a configured time zone is unknown
    /// * [`StormError::Http`] if the HTTP client cannot be built
    pub fn new(config: StormConfig) -> Result<Self, StormError> {
        config.source_tz()?;
        config.display_tz()?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("dw_graphics/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StormError::Http)?;

        Ok(Self { client, config })
    }

    /// The settings in use.
    #[must_use]
    pub const fn config(&self) -> &StormConfig {
        &self.config
    }

    fn clock(&self) -> Result<ForecastClock, StormError> {
        Ok(ForecastClock {
            source: self.config.source_tz()?,
            display: self.config.display_tz()?,
        })
    }

    async fn read_archive(
        &self,
        url: &str,
        layers: &[Layer],
        into: &mut StormLayers,
    ) -> Result<(), StormError> {
        let bytes = fetch_archive(&self.client, url).await?;
        let mut archive = StormArchive::from_bytes(url, bytes)?;
        for layer in layers {
            let records = archive.read_layer(*layer)?;
            match layer {
                Layer::ForecastTrack => into.forecast_track = records,
                Layer::ForecastCone => into.forecast_cone = records,
                Layer::ForecastPoints => into.forecast_points = records,
                Layer::HistoricalTrack => into.historical_track = records,
                Layer::HistoricalPoints => into.historical_points = records,
            }
        }
        Ok(())
    }

    /// Fetches one storm: its feed entry and both archives.
    ///
    /// # Errors
    ///
    /// * [`StormError::NoStormData`] if the feed is unreachable, missing, or
    ///   does not list the storm
    /// * [`StormError::ArchiveUnavailable`] if an archive download fails
    /// * any archive, shapefile, or timestamp error
    pub async fn fetch_storm(&self, request: &StormRequest) -> Result<StormBundle, StormError> {
        let metadata = feed::fetch_metadata(&self.client, request).await?;
        let archive_id = request.archive_id();

        let mut layers = StormLayers::default();
        self.read_archive(
            &self.config.forecast_url(&archive_id),
            &[
                Layer::ForecastTrack,
                Layer::ForecastCone,
                Layer::ForecastPoints,
            ],
            &mut layers,
        )
        .await?;
        self.read_archive(
            &self.config.best_track_url(&archive_id),
            &[Layer::HistoricalTrack, Layer::HistoricalPoints],
            &mut layers,
        )
        .await?;

        let rows = assemble(
            &metadata,
            layers,
            &self.clock()?,
            &self.config.format_policy(),
        )?;
        log::info!("{}: {} rows", metadata.storm_id, rows.len());

        Ok(StormBundle { metadata, rows })
    }

    /// Fetches every storm, one at a time, into a single WGS84 dataset.
    ///
    /// Storms whose feed is unreachable or does not list them are logged and
    /// skipped; any other failure aborts the batch. Metadata is returned for
    /// the storms that were included, in request order.
    ///
    /// # Errors
    ///
    /// Returns the first error other than [`StormError::NoStormData`].
    pub async fn build_dataset(
        &self,
        requests: &[StormRequest],
    ) -> Result<(Dataset, Vec<StormMetadata>), StormError> {
        let mut rows = Vec::new();
        let mut included = Vec::new();

        for request in requests {
            match self.fetch_storm(request).await {
                Ok(bundle) => {
                    rows.extend(bundle.rows);
                    included.push(bundle.metadata);
                }
                Err(e) if e.is_no_storm_data() => {
                    log::warn!("Skipping {}: {e}", request.storm_id);
                }
                Err(e) => return Err(e),
            }
        }

        log::info!(
            "Built {} rows for {} of {} storms",
            rows.len(),
            included.len(),
            requests.len()
        );
        Ok((Dataset::new(rows, Crs::Wgs84), included))
    }
}
