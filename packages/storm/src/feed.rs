//! NHC RSS feed parsing.
//!
//! Each active storm in a feed is an `nhc:Cyclone` element whose children
//! (`nhc:center`, `nhc:type`, `nhc:name`, `nhc:atcf`, `nhc:wind`, …) hold
//! its current state as text.

use std::collections::BTreeMap;

use dw_graphics_storm_models::{StormMetadata, StormRequest, kmh_from_mph};
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::StormError;

/// Child elements of one `nhc:Cyclone`, keyed by local name.
pub type CycloneFields = BTreeMap<String, String>;

/// Collects every `nhc:Cyclone` element in a feed.
///
/// # Errors
///
/// Returns [`StormError::Xml`] if the feed is not well-formed XML.
pub fn parse_cyclones(xml: &str) -> Result<Vec<CycloneFields>, StormError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut cyclones = Vec::new();
    let mut current: Option<CycloneFields> = None;
    let mut field: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "Cyclone" {
                    current = Some(CycloneFields::new());
                } else if current.is_some() {
                    field = Some(name);
                }
            }
            Event::Text(t) => {
                if let (Some(cyclone), Some(field)) = (current.as_mut(), field.as_ref()) {
                    cyclone
                        .entry(field.clone())
                        .or_default()
                        .push_str(&t.unescape()?);
                }
            }
            Event::CData(t) => {
                if let (Some(cyclone), Some(field)) = (current.as_mut(), field.as_ref()) {
                    cyclone
                        .entry(field.clone())
                        .or_default()
                        .push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"Cyclone"
                    && let Some(cyclone) = current.take()
                {
                    cyclones.push(cyclone);
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(cyclones)
}

/// Finds the cyclone with the given ATCF id and parses its metadata.
///
/// # Errors
///
/// * [`StormError::Xml`] if the feed is not well-formed XML
/// * [`StormError::NoStormData`] if no cyclone has a matching `atcf` id
/// * [`StormError::Feed`] if the matching cyclone lacks a field or a field
///   is malformed
pub fn parse_metadata(xml: &str, storm_id: &str) -> Result<StormMetadata, StormError> {
    let cyclones = parse_cyclones(xml)?;
    let available: Vec<String> = cyclones
        .iter()
        .filter_map(|c| c.get("atcf").map(|id| id.trim().to_string()))
        .collect();

    let cyclone = cyclones
        .into_iter()
        .find(|c| {
            c.get("atcf")
                .is_some_and(|id| id.trim().eq_ignore_ascii_case(storm_id))
        })
        .ok_or_else(|| StormError::NoStormData {
            storm_id: storm_id.to_string(),
            reason: if available.is_empty() {
                "feed lists no cyclones".to_string()
            } else {
                format!("feed lists {}", available.join(", "))
            },
        })?;

    let field = |key: &str| {
        cyclone
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| StormError::Feed {
                message: format!("cyclone {storm_id} has no {key}"),
            })
    };

    let wind_mph = parse_wind(field("wind")?)?;
    let (latitude, longitude) = parse_center(field("center")?)?;

    Ok(StormMetadata {
        storm_id: field("atcf")?.to_string(),
        name: field("name")?.to_string(),
        classification: field("type")?.to_string(),
        wind_mph,
        wind_kmh: kmh_from_mph(wind_mph),
        latitude,
        longitude,
    })
}

/// Parses `"120 mph"` into 120.
fn parse_wind(text: &str) -> Result<u32, StormError> {
    let trimmed = text.trim();
    let number = trimmed
        .strip_suffix("mph")
        .or_else(|| trimmed.strip_suffix("MPH"))
        .unwrap_or(trimmed)
        .trim();
    number.parse().map_err(|_| StormError::Feed {
        message: format!("invalid wind speed {text:?}"),
    })
}

/// Parses `"25.5, -82.9"` into `(25.5, -82.9)`.
fn parse_center(text: &str) -> Result<(f64, f64), StormError> {
    let invalid = || StormError::Feed {
        message: format!("invalid storm center {text:?}"),
    };
    let (lat, lon) = text.split_once(',').ok_or_else(invalid)?;
    let lat = lat.trim().parse().map_err(|_| invalid())?;
    let lon = lon.trim().parse().map_err(|_| invalid())?;
    Ok((lat, lon))
}

/// Downloads a storm's feed and parses its metadata.
///
/// # Errors
///
/// * [`StormError::NoStormData`] if the feed is unreachable, missing, or
///   does not list the storm
/// * any error from [`parse_metadata`]
pub async fn fetch_metadata(
    client: &reqwest::Client,
    request: &StormRequest,
) -> Result<StormMetadata, StormError> {
    log::info!(
        "Fetching feed for {} from {}",
        request.storm_id,
        request.feed_url
    );

    let unavailable = |reason: String| StormError::NoStormData {
        storm_id: request.storm_id.clone(),
        reason: format!("feed {} {reason}", request.feed_url),
    };

    let response = client
        .get(&request.feed_url)
        .send()
        .await
        .map_err(|e| unavailable(format!("is unreachable: {e}")))?;
    let status = response.status();
    if !status.is_success() {
        return Err(unavailable(format!("returned HTTP {}", status.as_u16())));
    }

    let body = response
        .text()
        .await
        .map_err(|e| unavailable(format!("could not be read: {e}")))?;
    let metadata = parse_metadata(&body, &request.storm_id)?;

    log::info!(
        "{} {} at {}, {}: {} mph ({} km/h)",
        metadata.classification,
        metadata.name,
        metadata.latitude,
        metadata.longitude,
        metadata.wind_mph,
        metadata.wind_kmh
    );
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:nhc="https://www.nhc.noaa.gov">
  <channel>
    <title>National Hurricane Center</title>
    <item>
      <title>Summary for Hurricane Ian (AT4/AL092022)</title>
      <nhc:Cyclone>
        <nhc:center>25.5, -82.9</nhc:center>
        <nhc:type>Hurricane</nhc:type>
        <nhc:name>Ian</nhc:name>
        <nhc:wallet>AT4</nhc:wallet>
        <nhc:atcf>AL092022</nhc:atcf>
        <nhc:datetime>5:00 AM EDT Wed Sep 28</nhc:datetime>
        <nhc:movement>NNE at 10 mph</nhc:movement>
        <nhc:pressure>937 mb</nhc:pressure>
        <nhc:wind>155 mph</nhc:wind>
        <nhc:headline><![CDATA[ IAN EXPECTED TO MAKE LANDFALL ]]></nhc:headline>
      </nhc:Cyclone>
    </item>
    <item>
      <title>Summary for Tropical Storm Orlene (EP1/EP162022)</title>
      <nhc:Cyclone>
        <nhc:center>15.1, -105.2</nhc:center>
        <nhc:type>Tropical Storm</nhc:type>
        <nhc:name>Orlene</nhc:name>
        <nhc:atcf>EP162022</nhc:atcf>
        <nhc:wind>45 mph</nhc:wind>
      </nhc:Cyclone>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn collects_every_cyclone() {
        let cyclones = parse_cyclones(FEED).unwrap();
        assert_eq!(cyclones.len(), 2);
        assert_eq!(cyclones[0]["name"], "Ian");
        assert_eq!(cyclones[0]["headline"].trim(), "IAN EXPECTED TO MAKE LANDFALL");
        assert_eq!(cyclones[1]["atcf"], "EP162022");
    }

    #[test]
    fn selects_cyclone_by_atcf_id() {
        let metadata = parse_metadata(FEED, "al092022").unwrap();
        assert_eq!(metadata.storm_id, "AL092022");
        assert_eq!(metadata.name, "Ian");
        assert_eq!(metadata.classification, "Hurricane");
        assert_eq!(metadata.wind_mph, 155);
        assert_eq!(metadata.wind_kmh, 249);
        assert!((metadata.latitude - 25.5).abs() < f64::EPSILON);
        assert!((metadata.longitude - -82.9).abs() < f64::EPSILON);

        let orlene = parse_metadata(FEED, "EP162022").unwrap();
        assert_eq!(orlene.classification, "Tropical Storm");
        assert_eq!(orlene.wind_kmh, 72);
    }

    #[test]
    fn unknown_storm_is_no_storm_data() {
        let err = parse_metadata(FEED, "AL142022").unwrap_err();
        assert!(err.is_no_storm_data());
        assert!(err.to_string().contains("AL092022, EP162022"));

        let empty = r#"<rss xmlns:nhc="https://www.nhc.noaa.gov"><channel></channel></rss>"#;
        assert!(parse_metadata(empty, "AL092022").unwrap_err().is_no_storm_data());
    }

    #[test]
    fn malformed_fields_are_feed_errors() {
        let xml = r#"<rss xmlns:nhc="https://www.nhc.noaa.gov"><channel><item><nhc:Cyclone>
            <nhc:center>somewhere</nhc:center><nhc:type>Hurricane</nhc:type>
            <nhc:name>X</nhc:name><nhc:atcf>AL012023</nhc:atcf><nhc:wind>fast</nhc:wind>
            </nhc:Cyclone></item></channel></rss>"#;
        assert!(matches!(
            parse_metadata(xml, "AL012023"),
            Err(StormError::Feed { .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_feed_is_no_storm_data() {
        let request = StormRequest {
            storm_id: "AL092022".to_string(),
            feed_url: "http://127.0.0.1:1/nhc_at4.xml".to_string(),
        };
        let err = fetch_metadata(&reqwest::Client::new(), &request)
            .await
            .unwrap_err();
        assert!(err.is_no_storm_data(), "{err}");
        assert!(err.to_string().contains("unreachable"));
    }

    #[test]
    fn parses_wind_and_center() {
        assert_eq!(parse_wind("120 mph").unwrap(), 120);
        assert_eq!(parse_wind("35").unwrap(), 35);
        assert_eq!(parse_center("25.5, -82.9").unwrap(), (25.5, -82.9));
        assert!(parse_center("25.5").is_err());
    }
}
