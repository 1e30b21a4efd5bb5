use crate::{
    error::{Result, SeasonError},
    observation::{RawRow, MISSING_MARKER},
};
use serde::Deserialize;
use serde_json::Value;

#[cfg(feature = "api")]
use crate::{season::SeasonWindow, station::Station};
#[cfg(feature = "api")]
use log::{info, warn};
#[cfg(feature = "api")]
use reqwest::{Client, StatusCode};
#[cfg(feature = "api")]
use snow_utils::dates::format_date;
#[cfg(feature = "api")]
use std::time::Duration;

/// ACIS StnData endpoint.
pub const STN_DATA_URL: &str = "https://data.rcc-acis.org/StnData";

/// ACIS element for daily snowfall in inches.
pub const SNOW_ELEMENT: &str = "snow";

#[derive(Debug, Deserialize)]
struct StnMeta {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StnDataResponse {
    meta: Option<StnMeta>,
    data: Option<Vec<Vec<Value>>>,
    error: Option<String>,
}

/// Rows and station metadata parsed from one StnData response.
#[derive(Debug, Clone, PartialEq)]
pub struct AcisResponse {
    pub station_name: Option<String>,
    pub rows: Vec<RawRow>,
}

/// Text of a data cell. ACIS sends strings, but flagged output nests
/// `[value, flag]` and some mirrors send bare numbers.
fn cell_text(cell: Option<&Value>) -> String {
    match cell {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Array(inner)) => cell_text(inner.first()),
        _ => String::from(MISSING_MARKER),
    }
}

/// Parse a StnData JSON body into raw rows.
///
/// A body carrying `error`, or lacking `data`, is an upstream failure and
/// must not be cached.
pub fn parse_acis_response(body: &str) -> Result<AcisResponse> {
    let response: StnDataResponse = serde_json::from_str(body)?;
    if let Some(error) = response.error {
        return Err(SeasonError::Upstream(error));
    }
    let data = response
        .data
        .ok_or_else(|| SeasonError::Upstream(String::from("No snowfall data returned from ACIS")))?;
    let rows = data
        .iter()
        .filter_map(|row| match row.first() {
            Some(Value::String(date)) => Some(RawRow::new(date.clone(), cell_text(row.get(1)))),
            _ => None,
        })
        .collect();
    Ok(AcisResponse {
        station_name: response.meta.and_then(|m| m.name),
        rows,
    })
}

/// HTTP client for the ACIS StnData service, bound to one station.
#[cfg(feature = "api")]
#[derive(Debug, Clone)]
pub struct AcisClient {
    client: Client,
    base_url: String,
    station: Station,
    max_tries: u32,
}

#[cfg(feature = "api")]
impl AcisClient {
    pub fn new(station: Station) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent("snowfall-widget")
            .build()?;
        Ok(AcisClient {
            client,
            base_url: String::from(STN_DATA_URL),
            station,
            max_tries: 3,
        })
    }

    /// Point the client at another StnData-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn station(&self) -> &Station {
        &self.station
    }

    async fn request_body(&self, window: &SeasonWindow) -> Result<String> {
        let sdate = format_date(&window.start);
        let edate = format_date(&window.end);
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("sid", self.station.sid.as_str()),
                ("sdate", sdate.as_str()),
                ("edate", edate.as_str()),
                ("elems", SNOW_ELEMENT),
                ("output", "json"),
            ])
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Err(SeasonError::ResponseParse(format!(
                "bad response status {}",
                response.status()
            )));
        }
        let body = response.text().await?;
        if body.len() <= 2 {
            return Err(SeasonError::ResponseParse(String::from("empty response")));
        }
        Ok(body)
    }

    /// Fetch the raw rows for a date window, retrying transport failures
    /// with exponential backoff. An ACIS error message is returned at once.
    pub async fn fetch_rows(&self, window: &SeasonWindow) -> Result<AcisResponse> {
        let mut sleep_millis: u64 = 1000;
        let mut attempt = 1;
        loop {
            match self.request_body(window).await {
                Ok(body) => return parse_acis_response(&body),
                Err(e) if attempt >= self.max_tries => {
                    warn!("All attempts failed for {}: {}", self.station.sid, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        "Attempt {}/{}: request failed for {} ({} -> {}): {}",
                        attempt, self.max_tries, self.station.sid, window.start, window.end, e
                    );
                }
            }
            info!(
                "Sleeping for {} milliseconds before retry for {}",
                sleep_millis, self.station.sid
            );
            tokio::time::sleep(Duration::from_millis(sleep_millis)).await;
            sleep_millis *= 2;
            attempt += 1;
        }
    }
}
