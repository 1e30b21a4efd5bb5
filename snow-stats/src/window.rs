use crate::scan::LargestDaily;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use snow_acis::{
    error::{Result, SeasonError},
    observation::{DailyRecord, SnowValue},
    season::SeasonWindow,
};

/// Sum of reported snowfall inside `window`.
///
/// None when no record falls inside the window at all, so "no data" stays
/// distinct from "no snow".
pub fn window_total(daily: &[DailyRecord], window: &SeasonWindow) -> Option<f64> {
    let mut included = false;
    let mut total = 0.0;
    for record in daily.iter().filter(|r| window.contains(&r.date)) {
        included = true;
        total += record.snow.or_zero();
    }
    included.then_some(total)
}

/// Where `today` sits relative to a contest window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Pre,
    Active,
    Done,
}

impl Stage {
    pub fn on(today: &NaiveDate, window: &SeasonWindow) -> Stage {
        if *today < window.start {
            Stage::Pre
        } else if *today > window.end {
            Stage::Done
        } else {
            Stage::Active
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeDay {
    pub date: NaiveDate,
    pub snow: SnowValue,
    pub cumulative: f64,
}

/// Snowfall over an arbitrary date range, possibly spanning seasons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: Vec<RangeDay>,
    pub total: f64,
    pub measurable_days: usize,
    pub peak: Option<LargestDaily>,
}

impl RangeSummary {
    /// Summarise the records of `daily` that fall in `window`. `daily` may be
    /// several seasons concatenated in any order. None if nothing matches.
    pub fn collect(daily: &[DailyRecord], window: &SeasonWindow, measurable: f64) -> Option<Self> {
        let mut selected: Vec<DailyRecord> = daily
            .iter()
            .filter(|r| window.contains(&r.date))
            .copied()
            .collect();
        if selected.is_empty() {
            return None;
        }
        selected.sort_by_key(|r| r.date);
        selected.dedup_by_key(|r| r.date);

        let mut cumulative = 0.0;
        let mut measurable_days = 0;
        let mut peak: Option<LargestDaily> = None;
        let days = selected
            .into_iter()
            .map(|record| {
                if let SnowValue::Measured(v) = record.snow {
                    cumulative += v;
                    if v >= measurable {
                        measurable_days += 1;
                    }
                    if peak.map_or(true, |p| v > p.value) {
                        peak = Some(LargestDaily {
                            value: v,
                            date: record.date,
                        });
                    }
                }
                RangeDay {
                    date: record.date,
                    snow: record.snow,
                    cumulative,
                }
            })
            .collect();
        Some(RangeSummary {
            start: window.start,
            end: window.end,
            days,
            total: cumulative,
            measurable_days,
            peak,
        })
    }

    /// `date,snow,cumulative` rows for export.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(vec![]);
        writer.write_record(["date", "snow", "cumulative"])?;
        for day in &self.days {
            let snow = day.snow.value().map_or(String::new(), |v| v.to_string());
            writer.write_record([day.date.to_string(), snow, day.cumulative.to_string()])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| SeasonError::CsvWrite(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| SeasonError::CsvWrite(e.to_string()))
    }
}
