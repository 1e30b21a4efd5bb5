//! Season payload, stats, records and custom-range reports.

use crate::{
    output::{write_json, write_output},
    source::SeasonSource,
    Format, SharedArgs,
};
use anyhow::bail;
use chrono::NaiveDate;
use log::info;
use serde::Serialize;
use snow_acis::{
    observation::DailyRecord,
    season::{SeasonPayload, SeasonWindow},
};
use snow_stats::{
    records::{RecordBook, SeasonSummary},
    scan::{scan_with_policy, MissingDayPolicy, SeasonStats},
    window::RangeSummary,
};
use snow_utils::dates::{parse_date, season_start_year_for_date};
use std::path::Path;

/// The season to report on: the given year, or the one containing today.
pub fn resolve_season(season: Option<i32>, today: &NaiveDate) -> i32 {
    season.unwrap_or_else(|| season_start_year_for_date(today))
}

pub async fn run_fetch(
    shared: &SharedArgs,
    season: Option<i32>,
    format: Format,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let mut source = SeasonSource::new(shared)?;
    let start_year = resolve_season(season, &source.today());
    let record = source.season(start_year).await?;
    info!(
        "{}: {} days, {:.1}\" total",
        record.label,
        record.daily_records.len(),
        record.season_total
    );
    match format {
        Format::Json => write_json(&SeasonPayload::from(&record), output),
        Format::Csv => write_output(&record.to_csv()?, output),
    }
}

#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub season: String,
    pub source: String,
    pub season_total: f64,
    pub days_since_measurable: Option<i64>,
    pub stats: SeasonStats,
}

pub async fn run_stats(
    shared: &SharedArgs,
    season: Option<i32>,
    missing_breaks_drought: bool,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let mut source = SeasonSource::new(shared)?;
    let today = source.today();
    let record = source.season(resolve_season(season, &today)).await?;
    let policy = if missing_breaks_drought {
        MissingDayPolicy::BreaksDrought
    } else {
        MissingDayPolicy::ContinuesDrought
    };
    let stats = scan_with_policy(&record.daily_records, &shared.thresholds(), policy);
    let as_of = record.window.clamp(today);
    let report = StatsReport {
        season: record.label.clone(),
        source: record.station.source_label(),
        season_total: record.season_total,
        days_since_measurable: stats.days_since_measurable(&as_of),
        stats,
    };
    write_json(&report, output)
}

#[derive(Debug, Serialize)]
pub struct RecordsReport {
    pub seasons: Vec<SeasonSummary>,
    pub records: RecordBook,
}

pub async fn run_records(
    shared: &SharedArgs,
    from: i32,
    to: Option<i32>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let mut source = SeasonSource::new(shared)?;
    let to = resolve_season(to, &source.today());
    if from > to {
        bail!("--from {} is after --to {}", from, to);
    }
    let years: Vec<i32> = (from..=to).collect();
    let seasons = source.seasons(&years).await;
    if seasons.is_empty() {
        bail!("Unable to load any season between {} and {}", from, to);
    }
    let thresholds = shared.thresholds();
    let summaries: Vec<SeasonSummary> = seasons
        .iter()
        .map(|season| SeasonSummary::from_season(season, &thresholds))
        .collect();
    let records = RecordBook::compile(&summaries);
    write_json(
        &RecordsReport {
            seasons: summaries,
            records,
        },
        output,
    )
}

pub async fn run_range(
    shared: &SharedArgs,
    start: &str,
    end: &str,
    format: Format,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let (start, end) = (parse_date(start)?, parse_date(end)?);
    if start > end {
        bail!("Start date must be on or before the end date.");
    }
    let window = SeasonWindow::new(start, end)?;
    let years: Vec<i32> =
        (season_start_year_for_date(&start)..=season_start_year_for_date(&end)).collect();

    let mut source = SeasonSource::new(shared)?;
    let seasons = source.seasons(&years).await;
    let daily: Vec<DailyRecord> = seasons
        .iter()
        .flat_map(|season| season.daily_records.iter().copied())
        .collect();
    let Some(summary) = RangeSummary::collect(&daily, &window, shared.measurable) else {
        bail!("No snowfall data exists for the selected window.");
    };
    info!(
        "Loaded {} day{} of data",
        summary.days.len(),
        if summary.days.len() == 1 { "" } else { "s" }
    );
    match format {
        Format::Json => write_json(&summary, output),
        Format::Csv => write_output(&summary.to_csv()?, output),
    }
}
