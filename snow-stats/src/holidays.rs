use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use snow_acis::observation::DailyRecord;
use snow_utils::dates::nth_weekday_of_month;

/// Holidays tracked for "did it snow on ..." trivia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Holiday {
    Thanksgiving,
    Christmas,
    NewYear,
    MlkDay,
    PresidentsDay,
}

impl Holiday {
    pub fn label(&self) -> &'static str {
        match self {
            Holiday::Thanksgiving => "Thanksgiving",
            Holiday::Christmas => "Christmas",
            Holiday::NewYear => "New Year's Day",
            Holiday::MlkDay => "MLK Day",
            Holiday::PresidentsDay => "Presidents Day",
        }
    }
}

/// Holiday dates that fall in the season starting in `start_year`, in
/// calendar order.
pub fn holidays_for_season(start_year: i32) -> Vec<(Holiday, NaiveDate)> {
    let next_year = start_year + 1;
    [
        (Holiday::Thanksgiving, nth_weekday_of_month(start_year, 11, Weekday::Thu, 4)),
        (Holiday::Christmas, NaiveDate::from_ymd_opt(start_year, 12, 25)),
        (Holiday::NewYear, NaiveDate::from_ymd_opt(next_year, 1, 1)),
        (Holiday::MlkDay, nth_weekday_of_month(next_year, 1, Weekday::Mon, 3)),
        (Holiday::PresidentsDay, nth_weekday_of_month(next_year, 2, Weekday::Mon, 3)),
    ]
    .into_iter()
    .filter_map(|(holiday, date)| date.map(|d| (holiday, d)))
    .collect()
}

/// Snowfall reported on one holiday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolidaySnow {
    pub holiday: Holiday,
    pub date: NaiveDate,
    /// None when the day is missing or not in the series.
    pub amount: Option<f64>,
    pub measurable: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HolidayTally {
    pub days: Vec<HolidaySnow>,
    /// Holidays with measurable snow.
    pub hits: usize,
}

impl HolidayTally {
    /// Look up each holiday of the season in `daily`.
    pub fn from_daily(daily: &[DailyRecord], start_year: i32, measurable: f64) -> Self {
        let days: Vec<HolidaySnow> = holidays_for_season(start_year)
            .into_iter()
            .map(|(holiday, date)| {
                let amount = daily
                    .binary_search_by_key(&date, |r| r.date)
                    .ok()
                    .and_then(|idx| daily[idx].snow.value());
                HolidaySnow {
                    holiday,
                    date,
                    amount,
                    measurable: amount.is_some_and(|v| v >= measurable),
                }
            })
            .collect();
        let hits = days.iter().filter(|d| d.measurable).count();
        HolidayTally { days, hits }
    }

    pub fn total(&self) -> usize {
        self.days.len()
    }

    /// Every tracked holiday had measurable snow.
    pub fn clean_sweep(&self) -> bool {
        !self.days.is_empty() && self.hits == self.days.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{holidays_for_season, Holiday, HolidayTally};
    use chrono::NaiveDate;
    use snow_acis::observation::{DailyRecord, SnowValue};
    use snow_acis::season::SeasonWindow;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_holidays_2024_season() {
        let holidays = holidays_for_season(2024);
        assert_eq!(
            holidays,
            vec![
                (Holiday::Thanksgiving, date(2024, 11, 28)),
                (Holiday::Christmas, date(2024, 12, 25)),
                (Holiday::NewYear, date(2025, 1, 1)),
                (Holiday::MlkDay, date(2025, 1, 20)),
                (Holiday::PresidentsDay, date(2025, 2, 17)),
            ]
        );
    }

    #[test]
    fn test_tally_hits_and_sweep() {
        let window = SeasonWindow::for_start_year(2024).unwrap();
        let snowy_days = [
            date(2024, 11, 28),
            date(2024, 12, 25),
            date(2025, 1, 1),
            date(2025, 1, 20),
        ];
        let mut daily: Vec<DailyRecord> = window
            .days()
            .map(|d| {
                let snow = if snowy_days.contains(&d) { 1.0 } else { 0.0 };
                DailyRecord::new(d, SnowValue::Measured(snow))
            })
            .collect();
        let tally = HolidayTally::from_daily(&daily, 2024, 0.1);
        assert_eq!(tally.total(), 5);
        assert_eq!(tally.hits, 4);
        assert!(!tally.clean_sweep());
        assert_eq!(tally.days[4].amount, Some(0.0));

        let presidents = daily.iter().position(|r| r.date == date(2025, 2, 17)).unwrap();
        daily[presidents].snow = SnowValue::Measured(0.5);
        assert!(HolidayTally::from_daily(&daily, 2024, 0.1).clean_sweep());

        daily[presidents].snow = SnowValue::Missing;
        let tally = HolidayTally::from_daily(&daily, 2024, 0.1);
        assert_eq!(tally.days[4].amount, None);
        assert!(!tally.days[4].measurable);
    }
}
