//! Shared utility functions for the snowfall season crates.

/// Date utility functions
pub mod dates {
    use chrono::{Datelike, NaiveDate, Weekday};

    /// Month a snowfall season starts in (July).
    pub const SEASON_START_MONTH: u32 = 7;

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
    }

    /// Parse a "MM-DD" month/day pair, as used for contest window options.
    pub fn parse_month_day(s: &str) -> anyhow::Result<(u32, u32)> {
        let (month, day) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| anyhow::anyhow!("expected MM-DD, got {s:?}"))?;
        let month: u32 = month.parse()?;
        let day: u32 = day.parse()?;
        // 2000 is a leap year, so Feb 29 is accepted here
        if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
            anyhow::bail!("invalid month/day {s:?}");
        }
        Ok((month, day))
    }

    /// Get the snowfall season start year for a given date.
    /// A season runs Jul 1 to Jun 30.
    /// e.g., Jul 1 2024 -> 2024, Jun 30 2025 -> 2024
    pub fn season_start_year_for_date(date: &NaiveDate) -> i32 {
        if date.month() >= SEASON_START_MONTH {
            date.year()
        } else {
            date.year() - 1
        }
    }

    /// First and last day of the season starting in `start_year`.
    pub fn season_bounds(start_year: i32) -> Option<(NaiveDate, NaiveDate)> {
        let start = NaiveDate::from_ymd_opt(start_year, SEASON_START_MONTH, 1)?;
        let end = NaiveDate::from_ymd_opt(start_year + 1, 6, 30)?;
        Some((start, end))
    }

    /// Human label for a season, e.g. "2024-2025".
    pub fn season_label(start_year: i32) -> String {
        format!("{}-{}", start_year, start_year + 1)
    }

    /// Days elapsed since Jul 1 of the date's season (Jul 1 = 0).
    ///
    /// Unlike the calendar date this lets first/last snow dates from
    /// different seasons be compared on one axis.
    pub fn day_of_season(date: &NaiveDate) -> i64 {
        let start_year = season_start_year_for_date(date);
        match NaiveDate::from_ymd_opt(start_year, SEASON_START_MONTH, 1) {
            Some(jul1) => (*date - jul1).num_days(),
            None => 0,
        }
    }

    /// The date with the given month/day inside the season starting in
    /// `start_year`. Jul-Dec land in `start_year`, Jan-Jun in the next
    /// calendar year. Feb 29 falls back to Feb 28 when that year is not leap.
    pub fn aligned_date_in_season(month: u32, day: u32, start_year: i32) -> Option<NaiveDate> {
        let year = if month >= SEASON_START_MONTH {
            start_year
        } else {
            start_year + 1
        };
        NaiveDate::from_ymd_opt(year, month, day).or_else(|| {
            if (month, day) == (2, 29) {
                NaiveDate::from_ymd_opt(year, 2, 28)
            } else {
                None
            }
        })
    }

    /// The `nth` (1-based) occurrence of `weekday` in a month, e.g. the
    /// 4th Thursday of November. None if the month has no such day.
    pub fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, nth: u8) -> Option<NaiveDate> {
        NaiveDate::from_weekday_of_month_opt(year, month, weekday, nth)
    }

}

/// Inch formatting shared by CLI output and contest messages.
pub mod inches {
    /// Round to one decimal and drop a trailing ".0"; "--" for NaN.
    pub fn format_inches(value: f64) -> String {
        if value.is_nan() {
            return String::from("--");
        }
        let rounded = (value * 10.0).round() / 10.0;
        let s = format!("{rounded:.1}");
        match s.strip_suffix(".0") {
            Some(whole) => whole.to_string(),
            None => s,
        }
    }

    /// Describe a contest margin, e.g. "within 1.5\"" or "over by 2\"".
    pub fn describe_margin(margin: Option<f64>, went_over: bool) -> String {
        match margin {
            None => String::new(),
            Some(m) if m.is_nan() => String::new(),
            Some(m) if went_over => format!("over by {}\"", format_inches(m)),
            Some(m) if m < 1e-6 => String::from("exact match"),
            Some(m) => format!("within {}\"", format_inches(m)),
        }
    }

}
