//! Locator-map charts.

use std::path::Path;

use dw_graphics_marker::{Dataset, MarkerBuilder, normalize};
use dw_graphics_marker_models::MarkerList;

use crate::api::check_read_back;
use crate::{ChartSource, ClientError, DatawrapperClient, Footer};

/// Datawrapper's graphic type for locator maps.
pub const LOCATOR_MAP_TYPE: &str = "locator-map";

/// A chart verified to be a locator map.
pub struct LocatorMap {
    client: DatawrapperClient,
    chart_id: String,
    builder: MarkerBuilder,
}

impl LocatorMap {
    /// Opens, copies, or creates a chart and verifies it is a locator map.
    ///
    /// Markers are built with the embedded templates and icons.
    ///
    /// # Errors
    ///
    /// * [`ClientError::WrongGraphicType`] if the chart is not a locator map
    /// * any error from [`DatawrapperClient::open`] or
    ///   [`DatawrapperClient::check_graphic_type`]
    pub async fn open(client: DatawrapperClient, source: &ChartSource) -> Result<Self, ClientError> {
        let chart_id = client.open(source).await?;
        let metadata = client
            .check_graphic_type(&chart_id, LOCATOR_MAP_TYPE)
            .await?;
        log::info!(
            "Opened locator map {chart_id} ({})",
            metadata.title.as_deref().unwrap_or("untitled")
        );

        Ok(Self {
            client,
            chart_id,
            builder: MarkerBuilder::embedded(),
        })
    }

    /// The chart id.
    #[must_use]
    pub fn chart_id(&self) -> &str {
        &self.chart_id
    }

    /// Normalizes a dataset (plus optional supplemental shapes) into
    /// markers and replaces the chart's markers with them.
    ///
    /// Nothing is uploaded if any row fails.
    ///
    /// # Errors
    ///
    /// * [`ClientError::Marker`] if normalization fails
    /// * any error from [`DatawrapperClient::upload_markers`]
    pub async fn normalize_and_upload(
        &self,
        dataset: Dataset,
        supplemental: Option<&Path>,
    ) -> Result<MarkerList, ClientError> {
        let markers = normalize(dataset, supplemental, &self.builder)?;
        self.client.upload_markers(&self.chart_id, &markers).await?;
        Ok(markers)
    }

    /// Reads the chart's markers back and checks they match `uploaded`.
    ///
    /// # Errors
    ///
    /// * [`ClientError::ReadBack`] if the stored markers differ
    /// * any error from [`DatawrapperClient::get_markers`]
    pub async fn verify_markers(&self, uploaded: &MarkerList) -> Result<(), ClientError> {
        let stored = self.client.get_markers(&self.chart_id).await?;
        check_read_back(&self.chart_id, uploaded, &stored)?;
        log::info!("Verified {} markers on {}", stored.len(), self.chart_id);
        Ok(())
    }

    /// Sets the chart headline.
    ///
    /// # Errors
    ///
    /// Returns any error from [`DatawrapperClient::set_title`].
    pub async fn set_title(&self, title: &str) -> Result<(), ClientError> {
        self.client.set_title(&self.chart_id, title).await
    }

    /// Sets the intro text.
    ///
    /// # Errors
    ///
    /// Returns any error from [`DatawrapperClient::set_intro`].
    pub async fn set_intro(&self, intro: &str) -> Result<(), ClientError> {
        self.client.set_intro(&self.chart_id, intro).await
    }

    /// Sets the footer.
    ///
    /// # Errors
    ///
    /// Returns any error from [`DatawrapperClient::set_footer`].
    pub async fn set_footer(&self, footer: &Footer) -> Result<(), ClientError> {
        self.client.set_footer(&self.chart_id, footer).await
    }

    /// Publishes the chart.
    ///
    /// # Errors
    ///
    /// Returns any error from [`DatawrapperClient::publish`].
    pub async fn publish(&self) -> Result<(), ClientError> {
        self.client.publish(&self.chart_id).await
    }
}
