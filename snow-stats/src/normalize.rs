use chrono::NaiveDate;
use log::{debug, warn};
use snow_acis::{
    error::Result,
    observation::{DailyRecord, RawRow, SnowValue},
    season::SeasonWindow,
};
use snow_utils::dates::parse_date;
use std::collections::HashMap;

/// Turn sparse upstream rows into exactly one record per day of
/// `[season_start, season_end]`.
///
/// Rows may arrive out of order or repeated; the later row for a date wins.
/// Days with no row are `Missing`. Rows whose date does not parse, or falls
/// outside the window, are dropped.
pub fn normalize(
    raw_rows: &[RawRow],
    season_start: NaiveDate,
    season_end: NaiveDate,
) -> Result<Vec<DailyRecord>> {
    let window = SeasonWindow::new(season_start, season_end)?;
    Ok(normalize_window(raw_rows, &window))
}

/// [`normalize`] for a window that is already known to be well formed.
pub fn normalize_window(raw_rows: &[RawRow], window: &SeasonWindow) -> Vec<DailyRecord> {
    let mut by_date: HashMap<NaiveDate, SnowValue> = HashMap::with_capacity(raw_rows.len());
    let mut outside = 0usize;
    for row in raw_rows {
        match parse_date(&row.date) {
            Ok(date) if window.contains(&date) => {
                by_date.insert(date, SnowValue::parse_acis(&row.value));
            }
            Ok(_) => outside += 1,
            Err(e) => warn!("skipping row with bad date {:?}: {}", row.date, e),
        }
    }
    if outside > 0 {
        debug!(
            "dropped {} rows outside {} -> {}",
            outside, window.start, window.end
        );
    }
    window
        .days()
        .map(|date| {
            let snow = by_date.get(&date).copied().unwrap_or(SnowValue::Missing);
            DailyRecord::new(date, snow)
        })
        .collect()
}
