use crate::{output::write_json, report::resolve_season, source::SeasonSource, SharedArgs};
use log::{info, warn};
use serde::Serialize;
use snow_stats::forecast::{forecast, ForecastBand};
use snow_utils::dates::parse_date;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct ForecastReport {
    pub season: String,
    pub source: String,
    /// Start years of the analog seasons that loaded.
    pub analogs: Vec<i32>,
    /// None when no analog season was usable.
    pub forecast: Option<ForecastBand>,
}

/// Prior start years used as analogs for `start_year`, oldest first.
pub fn analog_years(start_year: i32, history: u32) -> Vec<i32> {
    let history = history as i32;
    (start_year - history..start_year).collect()
}

pub async fn run_forecast(
    shared: &SharedArgs,
    season: Option<i32>,
    as_of: Option<&str>,
    history: u32,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let mut source = SeasonSource::new(shared)?;
    let as_of = match as_of {
        Some(s) => parse_date(s)?,
        None => source.today(),
    };
    let start_year = resolve_season(season, &as_of);
    let current = source.season(start_year).await?;
    // every analog fetch settles before the forecast runs
    let historical = source.seasons(&analog_years(start_year, history)).await;

    let band = forecast(&current, as_of, &historical);
    match &band {
        Some(band) => info!(
            "{}: {}\" so far, forecast {:.1}-{:.1}\" (median {:.1}\") from {} seasons",
            current.label, band.current_total, band.low, band.high, band.middle, band.sample_size
        ),
        None => warn!("No usable historical seasons to forecast {}", current.label),
    }
    let report = ForecastReport {
        season: current.label.clone(),
        source: current.station.source_label(),
        analogs: historical.iter().map(|s| s.start_year).collect(),
        forecast: band,
    };
    write_json(&report, output)
}
