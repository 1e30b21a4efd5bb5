use chrono::{Datelike, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};
use snow_acis::season::SeasonRecord;
use snow_utils::dates::aligned_date_in_season;

/// Percentile of an ascending slice, interpolating linearly between
/// neighbouring ranks (`index = p/100 * (n-1)`).
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let index = (p / 100.0).clamp(0.0, 1.0) * last as f64;
    let lo = index.floor() as usize;
    let hi = index.ceil() as usize;
    let (a, b) = (sorted[lo], sorted[hi]);
    Some(a + (b - a) * (index - lo as f64))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub date: NaiveDate,
    pub low: f64,
    pub middle: f64,
    pub high: f64,
}

/// Range for the season's final total, built from historical analogs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastBand {
    pub as_of: NaiveDate,
    pub current_total: f64,
    pub low: f64,
    pub middle: f64,
    pub high: f64,
    pub daily_projection: Vec<ProjectionPoint>,
    /// Share of days from season start through `as_of` with a reported
    /// value. Missing days add nothing to `current_total`.
    pub coverage: f64,
    /// Historical seasons that contributed a remaining total.
    pub sample_size: usize,
}

/// Snowfall after the day matching `as_of` in a historical season, or None
/// when that season cannot serve as an analog.
fn remaining_total(season: &SeasonRecord, as_of: &NaiveDate) -> Option<f64> {
    let aligned = aligned_date_in_season(as_of.month(), as_of.day(), season.start_year)?;
    if !season.window.contains(&aligned) {
        return None;
    }
    let remaining: Vec<_> = season
        .daily_records
        .iter()
        .filter(|r| r.date > aligned && r.date <= season.window.end)
        .collect();
    if !remaining.is_empty() && remaining.iter().all(|r| r.snow.is_missing()) {
        return None;
    }
    Some(remaining.iter().map(|r| r.snow.or_zero()).sum())
}

/// Forecast the final total of `current` from how much snow fell after the
/// same calendar day in each of `historical`.
///
/// `as_of` is pulled into the current season window. Historical seasons
/// with the same start year, or without data after the aligned day, are
/// skipped. Returns None when no season is usable.
pub fn forecast(
    current: &SeasonRecord,
    as_of: NaiveDate,
    historical: &[SeasonRecord],
) -> Option<ForecastBand> {
    let as_of = current.window.clamp(as_of);
    let mut reported_days = 0usize;
    let mut current_total = 0.0;
    for record in current.daily_records.iter().filter(|r| r.date <= as_of) {
        if let Some(v) = record.snow.value() {
            current_total += v;
            if record.date >= current.window.start {
                reported_days += 1;
            }
        }
    }
    let elapsed_days = (as_of - current.window.start).num_days() + 1;
    let coverage = (reported_days as f64 / elapsed_days as f64).min(1.0);

    let mut remaining: Vec<f64> = historical
        .iter()
        .filter(|season| season.start_year != current.start_year)
        .filter_map(|season| {
            let total = remaining_total(season, &as_of);
            if total.is_none() {
                debug!("season {} is not usable as an analog", season.label);
            }
            total
        })
        .collect();
    if remaining.is_empty() {
        return None;
    }
    remaining.sort_by(f64::total_cmp);

    let p25 = percentile(&remaining, 25.0)?;
    let p50 = percentile(&remaining, 50.0)?;
    let p75 = percentile(&remaining, 75.0)?;

    let span = (current.window.end - as_of).num_days();
    let daily_projection = current
        .window
        .days()
        .skip_while(|d| *d < as_of)
        .map(|date| {
            let fraction = if span == 0 {
                1.0
            } else {
                (date - as_of).num_days() as f64 / span as f64
            };
            ProjectionPoint {
                date,
                low: current_total + p25 * fraction,
                middle: current_total + p50 * fraction,
                high: current_total + p75 * fraction,
            }
        })
        .collect();

    Some(ForecastBand {
        as_of,
        current_total,
        low: current_total + p25,
        middle: current_total + p50,
        high: current_total + p75,
        daily_projection,
        coverage,
        sample_size: remaining.len(),
    })
}
