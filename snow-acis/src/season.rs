use crate::{
    error::{Result, SeasonError},
    observation::{DailyRecord, SnowValue},
    station::Station,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use snow_utils::dates::{aligned_date_in_season, format_date, season_bounds, season_label};

/// An inclusive date window. A full snowfall season runs from July 1 to
/// June 30; contest windows are sub-ranges of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeasonWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SeasonWindow {
    /// Build a window, rejecting one whose start falls after its end.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(SeasonError::DataShape { start, end });
        }
        Ok(SeasonWindow { start, end })
    }

    /// Jul 1 of `start_year` through Jun 30 of the following year.
    pub fn for_start_year(start_year: i32) -> Option<Self> {
        season_bounds(start_year).map(|(start, end)| SeasonWindow { start, end })
    }

    /// Every calendar day in the window, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    /// Number of days in the window, both ends included.
    pub fn len_days(&self) -> usize {
        ((self.end - self.start).num_days() + 1).max(0) as usize
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.start <= *date && *date <= self.end
    }

    /// Pull a date into the window.
    pub fn clamp(&self, date: NaiveDate) -> NaiveDate {
        date.clamp(self.start, self.end)
    }
}

/// Month/day bounds of the guessing contest, applied to any season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestWindow {
    pub start_month: u32,
    pub start_day: u32,
    pub end_month: u32,
    pub end_day: u32,
}

impl Default for ContestWindow {
    /// Dec 1 through Mar 31.
    fn default() -> Self {
        ContestWindow {
            start_month: 12,
            start_day: 1,
            end_month: 3,
            end_day: 31,
        }
    }
}

impl ContestWindow {
    pub fn new(start: (u32, u32), end: (u32, u32)) -> Self {
        ContestWindow {
            start_month: start.0,
            start_day: start.1,
            end_month: end.0,
            end_day: end.1,
        }
    }

    /// The concrete contest window inside the season starting in `start_year`.
    pub fn for_season(&self, start_year: i32) -> Result<SeasonWindow> {
        let start = aligned_date_in_season(self.start_month, self.start_day, start_year);
        let end = aligned_date_in_season(self.end_month, self.end_day, start_year);
        match (start, end) {
            (Some(start), Some(end)) => SeasonWindow::new(start, end),
            _ => Err(SeasonError::InvalidWindow(format!(
                "contest window {:02}-{:02}..{:02}-{:02} has no date in season {}",
                self.start_month, self.start_day, self.end_month, self.end_day, start_year
            ))),
        }
    }

    /// Scoring window: guesses lock at the end of the opening day, so
    /// official totals count from the day after the contest opens.
    pub fn official_window(&self, start_year: i32) -> Result<SeasonWindow> {
        let window = self.for_season(start_year)?;
        let official_start = window.start + Duration::days(1);
        SeasonWindow::new(official_start.min(window.end), window.end)
    }
}

/// One fetched season of daily snowfall. Built once by the fetch layer and
/// treated as immutable input by the analytics engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonRecord {
    pub start_year: i32,
    pub label: String,
    pub station: Station,
    pub window: SeasonWindow,
    pub daily_records: Vec<DailyRecord>,
    /// Sum of all reported values; missing days add nothing.
    pub season_total: f64,
}

impl SeasonRecord {
    /// Wrap a normalized daily series. The season total is derived here.
    pub fn new(
        start_year: i32,
        station: Station,
        window: SeasonWindow,
        daily_records: Vec<DailyRecord>,
    ) -> Self {
        let season_total = daily_records.iter().map(|r| r.snow.or_zero()).sum();
        SeasonRecord {
            start_year,
            label: season_label(start_year),
            station,
            window,
            daily_records,
            season_total,
        }
    }

    /// Running season total for each day (`seasonal_cum`).
    pub fn cumulative(&self) -> Vec<f64> {
        self.daily_records
            .iter()
            .scan(0.0, |total, record| {
                *total += record.snow.or_zero();
                Some(*total)
            })
            .collect()
    }

    /// Most recent day with a reported (non-missing) value.
    pub fn last_reported_date(&self) -> Option<NaiveDate> {
        self.daily_records
            .iter()
            .rev()
            .find(|r| !r.snow.is_missing())
            .map(|r| r.date)
    }

    /// True while `today` lies inside the season; active seasons still change.
    pub fn is_active_on(&self, today: &NaiveDate) -> bool {
        self.window.contains(today)
    }

    /// Export as `date,snow,seasonal_cum` with an empty cell for missing days.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(vec![]);
        writer.write_record(["date", "snow", "seasonal_cum"])?;
        for (record, cum) in self.daily_records.iter().zip(self.cumulative()) {
            let snow = record.snow.value().map_or(String::new(), |v| v.to_string());
            writer.write_record([format_date(&record.date), snow, cum.to_string()])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| SeasonError::CsvWrite(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| SeasonError::CsvWrite(e.to_string()))
    }
}

/// A day in the season payload, carrying its running total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadDay {
    pub date: NaiveDate,
    pub snow: SnowValue,
    pub seasonal_cum: f64,
}

/// The JSON document served for one season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonPayload {
    pub station_name: String,
    pub station_sid: String,
    pub season_label: String,
    pub season_start: NaiveDate,
    pub season_end: NaiveDate,
    pub seasonal_total_in: f64,
    pub last_reported: Option<NaiveDate>,
    pub daily: Vec<PayloadDay>,
}

impl From<&SeasonRecord> for SeasonPayload {
    fn from(season: &SeasonRecord) -> Self {
        let daily = season
            .daily_records
            .iter()
            .zip(season.cumulative())
            .map(|(record, seasonal_cum)| PayloadDay {
                date: record.date,
                snow: record.snow,
                seasonal_cum,
            })
            .collect();
        SeasonPayload {
            station_name: season.station.name.clone(),
            station_sid: season.station.sid.clone(),
            season_label: season.label.clone(),
            season_start: season.window.start,
            season_end: season.window.end,
            seasonal_total_in: season.season_total,
            last_reported: season.last_reported_date(),
            daily,
        }
    }
}
