//! Where a marker payload goes: a file, stdout, or a Datawrapper chart.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use clap::Args;
use dw_graphics_client::auth::resolve_token;
use dw_graphics_client::locator_map::LOCATOR_MAP_TYPE;
use dw_graphics_client::{ChartSource, ClientConfig, DatawrapperClient, Footer, LocatorMap};
use dw_graphics_marker::{Dataset, MarkerBuilder, normalize};
use dw_graphics_marker_models::MarkerList;

/// Chart and output options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct ChartArgs {
    /// Supplemental shapes (JSON object or array) appended verbatim after
    /// the built markers.
    #[arg(long)]
    pub append: Option<PathBuf>,

    /// Write the payload here. Without a chart option, the payload goes to
    /// stdout when this is omitted.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Upload to this existing locator map.
    #[arg(long, conflicts_with_all = ["copy_of", "new_chart"])]
    pub chart_id: Option<String>,

    /// Upload to a fresh copy of this locator map.
    #[arg(long, conflicts_with = "new_chart")]
    pub copy_of: Option<String>,

    /// Upload to a newly created locator map.
    #[arg(long = "new-chart")]
    pub new_chart: bool,

    /// Folder for `--new-chart`.
    #[arg(long, requires = "new_chart")]
    pub folder_id: Option<String>,

    /// API token; falls back to the token file, then `DW_AUTH_TOKEN`.
    #[arg(long)]
    pub token: Option<String>,

    /// Client settings (TOML).
    #[arg(long)]
    pub client_config: Option<PathBuf>,

    /// Chart headline.
    #[arg(long)]
    pub title: Option<String>,

    /// Text under the headline.
    #[arg(long)]
    pub intro: Option<String>,

    /// Data source credit.
    #[arg(long)]
    pub source_name: Option<String>,

    /// Author byline.
    #[arg(long)]
    pub byline: Option<String>,

    /// Footer note.
    #[arg(long)]
    pub note: Option<String>,

    /// Append a "last updated" stamp to the footer note.
    #[arg(long)]
    pub stamp_updated: bool,

    /// Zone for the "last updated" stamp.
    #[arg(long, default_value = "America/New_York")]
    pub timezone: String,

    /// Read the chart's markers back after uploading and check them.
    #[arg(long)]
    pub verify: bool,

    /// Publish the chart after uploading.
    #[arg(long)]
    pub publish: bool,
}

impl ChartArgs {
    /// The chart to upload to, if any.
    pub fn source(&self) -> Option<ChartSource> {
        if let Some(chart_id) = &self.chart_id {
            Some(ChartSource::Existing(chart_id.clone()))
        } else if let Some(chart_id) = &self.copy_of {
            Some(ChartSource::CopyOf(chart_id.clone()))
        } else if self.new_chart {
            Some(ChartSource::New {
                chart_type: LOCATOR_MAP_TYPE.to_string(),
                folder_id: self.folder_id.clone(),
            })
        } else {
            None
        }
    }

    fn footer(&self) -> Result<Option<Footer>, Box<dyn std::error::Error>> {
        let updated = if self.stamp_updated {
            let zone: Tz = self
                .timezone
                .parse()
                .map_err(|_| format!("unknown time zone {:?}", self.timezone))?;
            Some(chrono::Utc::now().with_timezone(&zone))
        } else {
            None
        };

        let footer = Footer {
            source: self.source_name.clone(),
            byline: self.byline.clone(),
            note: self.note.clone(),
            updated,
        };
        Ok((footer != Footer::default()).then_some(footer))
    }

    /// Normalizes the dataset and sends the payload where these options
    /// say.
    pub async fn deliver(&self, dataset: Dataset) -> Result<(), Box<dyn std::error::Error>> {
        let Some(source) = self.source() else {
            let markers = normalize(dataset, self.append.as_deref(), &MarkerBuilder::embedded())?;
            return write_payload(&markers, self.output.as_deref());
        };

        let config = match &self.client_config {
            Some(path) => ClientConfig::from_path(path)?,
            None => ClientConfig::default(),
        };
        let token = resolve_token(self.token.as_deref(), &config.token_file)?;
        let client = DatawrapperClient::new(config, token)?;

        let map = LocatorMap::open(client, &source).await?;
        let markers = map
            .normalize_and_upload(dataset, self.append.as_deref())
            .await?;
        if self.verify {
            map.verify_markers(&markers).await?;
        }
        if let Some(output) = &self.output {
            write_payload(&markers, Some(output))?;
        }

        if let Some(title) = &self.title {
            map.set_title(title).await?;
        }
        if let Some(intro) = &self.intro {
            map.set_intro(intro).await?;
        }
        if let Some(footer) = self.footer()? {
            map.set_footer(&footer).await?;
        }
        if self.publish {
            map.publish().await?;
        }

        println!("{}", map.chart_id());
        Ok(())
    }
}

/// Writes a payload as pretty JSON to `output`, or to stdout.
fn write_payload(
    markers: &MarkerList,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(markers)?;
    match output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))?;
            log::info!("Wrote {} markers to {}", markers.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        chart: ChartArgs,
    }

    fn parse(args: &[&str]) -> Result<ChartArgs, clap::Error> {
        Harness::try_parse_from(std::iter::once("test").chain(args.iter().copied()))
            .map(|harness| harness.chart)
    }

    #[test]
    fn selects_chart_source() {
        assert_eq!(parse(&[]).unwrap().source(), None);
        assert_eq!(
            parse(&["--chart-id", "Ab1Cd"]).unwrap().source(),
            Some(ChartSource::Existing("Ab1Cd".to_string()))
        );
        assert_eq!(
            parse(&["--copy-of", "Ab1Cd"]).unwrap().source(),
            Some(ChartSource::CopyOf("Ab1Cd".to_string()))
        );
        assert_eq!(
            parse(&["--new-chart", "--folder-id", "42"]).unwrap().source(),
            Some(ChartSource::New {
                chart_type: "locator-map".to_string(),
                folder_id: Some("42".to_string()),
            })
        );
    }

    #[test]
    fn verify_is_opt_in() {
        assert!(!parse(&["--chart-id", "Ab1Cd"]).unwrap().verify);
        assert!(parse(&["--chart-id", "Ab1Cd", "--verify"]).unwrap().verify);
    }

    #[test]
    fn chart_options_are_exclusive() {
        assert!(parse(&["--chart-id", "a", "--copy-of", "b"]).is_err());
        assert!(parse(&["--chart-id", "a", "--new-chart"]).is_err());
        assert!(parse(&["--copy-of", "a", "--new-chart"]).is_err());
    }

    #[test]
    fn footer_only_when_requested() {
        assert_eq!(parse(&[]).unwrap().footer().unwrap(), None);

        let footer = parse(&["--source-name", "NHC", "--stamp-updated"])
            .unwrap()
            .footer()
            .unwrap()
            .unwrap();
        assert_eq!(footer.source.as_deref(), Some("NHC"));
        assert!(footer.updated.is_some());

        assert!(
            parse(&["--stamp-updated", "--timezone", "Mars/Olympus"])
                .unwrap()
                .footer()
                .is_err()
        );
    }

    #[test]
    fn writes_payload_file() {
        let path = std::env::temp_dir().join("dw_graphics_cli_payload.json");
        write_payload(&MarkerList::default(), Some(&path)).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, serde_json::json!({"markers": []}));
        std::fs::remove_file(&path).unwrap();
    }
}
