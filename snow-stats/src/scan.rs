use crate::holidays::HolidayTally;
use chrono::{Datelike, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};
use snow_acis::observation::{DailyRecord, SnowValue};
use snow_utils::dates::season_start_year_for_date;

/// Snowfall levels, in inches, that a day is classified against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// A day at or above this counts toward streaks and ends droughts.
    pub measurable: f64,
    pub heavy: f64,
    pub major: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            measurable: 0.1,
            heavy: 2.0,
            major: 6.0,
        }
    }
}

/// How a `Missing` day is treated inside a drought.
///
/// A missing report may hide real snowfall, so this is a policy knob rather
/// than a fact about the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissingDayPolicy {
    /// A missing day counts as a dry day.
    #[default]
    ContinuesDrought,
    /// A missing day ends the current drought without counting toward it.
    BreaksDrought,
}

/// The reported longest run of measurable days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreakResult {
    pub length: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// How many runs share the maximal length, including this one.
    pub tie_count: usize,
    pub total_snow_in_streak: f64,
}

/// The longest run of non-measurable days between the first and last
/// measurable day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroughtRun {
    pub length: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LargestDaily {
    pub value: f64,
    pub date: NaiveDate,
}

/// Per-calendar-month subtotal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub year: i32,
    pub month: u32,
    pub total: f64,
    pub measurable_days: usize,
    pub missing_days: usize,
}

/// Everything a single pass over a season yields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonStats {
    pub first_measurable_day: Option<NaiveDate>,
    pub last_measurable_day: Option<NaiveDate>,
    pub best_streak: Option<StreakResult>,
    pub longest_drought: Option<DroughtRun>,
    pub largest_daily: Option<LargestDaily>,
    pub heavy_day_count: usize,
    pub major_day_count: usize,
    pub total_snow: f64,
    pub measurable_day_count: usize,
    /// Mean snowfall over measurable days.
    pub average_measurable: Option<f64>,
    pub missing_day_count: usize,
    pub last_reported: Option<NaiveDate>,
    pub monthly: Vec<MonthlyTotal>,
    pub holidays: HolidayTally,
}

impl SeasonStats {
    pub fn drought_length(&self) -> usize {
        self.longest_drought.map_or(0, |d| d.length)
    }

    pub fn streak_length(&self) -> usize {
        self.best_streak.map_or(0, |s| s.length)
    }

    /// Days from the last measurable snow to `as_of`.
    pub fn days_since_measurable(&self, as_of: &NaiveDate) -> Option<i64> {
        self.last_measurable_day
            .filter(|last| last <= as_of)
            .map(|last| (*as_of - last).num_days())
    }
}

struct OpenRun {
    start: NaiveDate,
    end: NaiveDate,
    length: usize,
    total: f64,
}

impl OpenRun {
    fn push(run: &mut Option<OpenRun>, date: NaiveDate, snow: f64) {
        match run {
            Some(open) => {
                open.end = date;
                open.length += 1;
                open.total += snow;
            }
            None => {
                *run = Some(OpenRun {
                    start: date,
                    end: date,
                    length: 1,
                    total: snow,
                })
            }
        }
    }
}

#[derive(Default)]
struct StreakTracker {
    open: Option<OpenRun>,
    best: Option<StreakResult>,
}

impl StreakTracker {
    fn extend(&mut self, date: NaiveDate, snow: f64) {
        OpenRun::push(&mut self.open, date, snow);
    }

    fn finalize(&mut self) {
        let Some(run) = self.open.take() else {
            return;
        };
        let best_length = self.best.map_or(0, |b| b.length);
        if run.length > best_length {
            self.best = Some(StreakResult {
                length: run.length,
                start_date: run.start,
                end_date: run.end,
                tie_count: 1,
                total_snow_in_streak: run.total,
            });
        } else if run.length == best_length {
            if let Some(best) = self.best.as_mut() {
                best.tie_count += 1;
                if run.total > best.total_snow_in_streak {
                    best.start_date = run.start;
                    best.end_date = run.end;
                    best.total_snow_in_streak = run.total;
                }
            }
        }
    }
}

#[derive(Default)]
struct DroughtTracker {
    open: Option<OpenRun>,
    best: Option<DroughtRun>,
}

impl DroughtTracker {
    fn extend(&mut self, date: NaiveDate) {
        OpenRun::push(&mut self.open, date, 0.0);
    }

    fn finalize(&mut self) {
        let Some(run) = self.open.take() else {
            return;
        };
        if run.length > self.best.map_or(0, |b| b.length) {
            self.best = Some(DroughtRun {
                length: run.length,
                start_date: run.start,
                end_date: run.end,
            });
        }
    }
}

/// Scan a normalized season with the default drought policy.
pub fn scan(daily: &[DailyRecord], thresholds: &Thresholds) -> SeasonStats {
    scan_with_policy(daily, thresholds, MissingDayPolicy::default())
}

/// Scan a normalized season (one record per day, ascending) for streaks,
/// droughts and extremes.
pub fn scan_with_policy(
    daily: &[DailyRecord],
    thresholds: &Thresholds,
    policy: MissingDayPolicy,
) -> SeasonStats {
    let mut streaks = StreakTracker::default();
    let mut first_idx: Option<usize> = None;
    let mut last_idx: Option<usize> = None;
    let mut largest_daily: Option<LargestDaily> = None;
    let mut heavy_day_count = 0;
    let mut major_day_count = 0;
    let mut total_snow = 0.0;
    let mut measurable_total = 0.0;
    let mut measurable_day_count = 0;
    let mut missing_day_count = 0;
    let mut last_reported = None;
    let mut monthly: Vec<MonthlyTotal> = Vec::new();

    for (idx, record) in daily.iter().enumerate() {
        let (year, month) = (record.date.year(), record.date.month());
        if !matches!(monthly.last(), Some(m) if m.year == year && m.month == month) {
            monthly.push(MonthlyTotal {
                year,
                month,
                total: 0.0,
                measurable_days: 0,
                missing_days: 0,
            });
        }
        let Some(bucket) = monthly.last_mut() else {
            continue;
        };

        let snow = match record.snow {
            SnowValue::Measured(v) => v,
            SnowValue::Missing => {
                missing_day_count += 1;
                bucket.missing_days += 1;
                streaks.finalize();
                continue;
            }
        };
        total_snow += snow;
        bucket.total += snow;
        last_reported = Some(record.date);
        if snow >= thresholds.heavy {
            heavy_day_count += 1;
        }
        if snow >= thresholds.major {
            major_day_count += 1;
        }
        if largest_daily.map_or(true, |l| snow > l.value) {
            largest_daily = Some(LargestDaily {
                value: snow,
                date: record.date,
            });
        }
        if snow >= thresholds.measurable {
            streaks.extend(record.date, snow);
            first_idx.get_or_insert(idx);
            last_idx = Some(idx);
            measurable_day_count += 1;
            measurable_total += snow;
            bucket.measurable_days += 1;
        } else {
            streaks.finalize();
        }
    }
    streaks.finalize();

    let longest_drought = match (first_idx, last_idx) {
        (Some(first), Some(last)) => {
            longest_drought(&daily[first..=last], thresholds.measurable, policy)
        }
        _ => None,
    };

    let holidays = daily
        .first()
        .map(|r| {
            HolidayTally::from_daily(
                daily,
                season_start_year_for_date(&r.date),
                thresholds.measurable,
            )
        })
        .unwrap_or_default();

    let stats = SeasonStats {
        first_measurable_day: first_idx.map(|i| daily[i].date),
        last_measurable_day: last_idx.map(|i| daily[i].date),
        best_streak: streaks.best,
        longest_drought,
        largest_daily,
        heavy_day_count,
        major_day_count,
        total_snow,
        measurable_day_count,
        average_measurable: (measurable_day_count > 0)
            .then(|| measurable_total / measurable_day_count as f64),
        missing_day_count,
        last_reported,
        monthly,
        holidays,
    };
    debug!(
        "scanned {} days: streak {}, drought {}, total {:.1}",
        daily.len(),
        stats.streak_length(),
        stats.drought_length(),
        stats.total_snow
    );
    stats
}

/// Longest dry run inside `bounded`, which starts and ends on measurable days.
fn longest_drought(
    bounded: &[DailyRecord],
    measurable: f64,
    policy: MissingDayPolicy,
) -> Option<DroughtRun> {
    let mut drought = DroughtTracker::default();
    for record in bounded {
        match (record.snow, policy) {
            (SnowValue::Measured(v), _) if v >= measurable => drought.finalize(),
            (SnowValue::Measured(_), _) => drought.extend(record.date),
            (SnowValue::Missing, MissingDayPolicy::ContinuesDrought) => {
                drought.extend(record.date)
            }
            (SnowValue::Missing, MissingDayPolicy::BreaksDrought) => drought.finalize(),
        }
    }
    drought.finalize();
    drought.best
}

#[cfg(test)]
mod tests {
    use super::{scan, scan_with_policy, MissingDayPolicy, Thresholds};
    use chrono::{Duration, NaiveDate};
    use snow_acis::observation::{DailyRecord, SnowValue};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Consecutive days from `start`; `None` is a missing day.
    fn series(start: NaiveDate, values: &[Option<f64>]) -> Vec<DailyRecord> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| DailyRecord::new(start + Duration::days(i as i64), SnowValue::from(*v)))
            .collect()
    }

    #[test]
    fn test_round_trip_scenario() {
        let daily = series(date(2025, 1, 1), &[Some(1.0), Some(0.0), Some(3.0)]);
        let stats = scan(&daily, &Thresholds::default());
        let largest = stats.largest_daily.unwrap();
        assert_eq!(largest.value, 3.0);
        assert_eq!(largest.date, date(2025, 1, 3));
        assert_eq!(stats.first_measurable_day, Some(date(2025, 1, 1)));
        assert_eq!(stats.last_measurable_day, Some(date(2025, 1, 3)));
        let streak = stats.best_streak.unwrap();
        assert_eq!(streak.length, 1);
        assert_eq!(streak.tie_count, 2);
        assert_eq!(streak.start_date, date(2025, 1, 3));
        assert_eq!(streak.end_date, date(2025, 1, 3));
        assert_eq!(streak.total_snow_in_streak, 3.0);
        assert_eq!(stats.drought_length(), 1);
    }

    #[test]
    fn test_making_a_day_measurable_never_shortens_streak() {
        let base = [Some(0.5), Some(0.0), Some(0.4), Some(0.3), None, Some(0.2), Some(0.0)];
        let thresholds = Thresholds::default();
        let before = scan(&series(date(2025, 1, 1), &base), &thresholds).streak_length();
        for i in 0..base.len() {
            let mut bumped = base;
            bumped[i] = Some(1.0);
            let after = scan(&series(date(2025, 1, 1), &bumped), &thresholds).streak_length();
            assert!(after >= before, "day {i}: {after} < {before}");
        }
    }

    #[test]
    fn test_single_run_streak() {
        let mut values = vec![Some(0.0); 10];
        for v in values.iter_mut().skip(3).take(4) {
            *v = Some(0.5);
        }
        let daily = series(date(2024, 12, 1), &values);
        let streak = scan(&daily, &Thresholds::default()).best_streak.unwrap();
        assert_eq!(streak.length, 4);
        assert_eq!(streak.tie_count, 1);
        assert_eq!(streak.start_date, date(2024, 12, 4));
        assert_eq!(streak.end_date, date(2024, 12, 7));
    }

    #[test]
    fn test_streak_open_at_end_is_closed() {
        let daily = series(date(2025, 3, 1), &[Some(0.0), Some(1.0), Some(1.0)]);
        let streak = scan(&daily, &Thresholds::default()).best_streak.unwrap();
        assert_eq!(streak.length, 2);
        assert_eq!(streak.end_date, date(2025, 3, 3));
    }

    #[test]
    fn test_streak_tie_break_prefers_more_snow() {
        let thresholds = Thresholds::default();
        // the snowier run first
        let daily = series(
            date(2025, 1, 1),
            &[Some(2.0), Some(2.0), Some(0.0), Some(0.5), Some(0.5)],
        );
        let streak = scan(&daily, &thresholds).best_streak.unwrap();
        assert_eq!(streak.start_date, date(2025, 1, 1));
        assert_eq!(streak.tie_count, 2);
        assert_eq!(streak.total_snow_in_streak, 4.0);

        // the snowier run second
        let daily = series(
            date(2025, 1, 1),
            &[Some(0.5), Some(0.5), Some(0.0), Some(2.0), Some(2.0)],
        );
        let streak = scan(&daily, &thresholds).best_streak.unwrap();
        assert_eq!(streak.start_date, date(2025, 1, 4));
        assert_eq!(streak.tie_count, 2);
        assert_eq!(streak.total_snow_in_streak, 4.0);
    }

    #[test]
    fn test_longer_streak_resets_tie_count() {
        let daily = series(
            date(2025, 1, 1),
            &[Some(1.0), Some(0.0), Some(1.0), Some(0.0), Some(0.2), Some(0.2)],
        );
        let streak = scan(&daily, &Thresholds::default()).best_streak.unwrap();
        assert_eq!(streak.length, 2);
        assert_eq!(streak.tie_count, 1);
    }

    #[test]
    fn test_missing_day_breaks_streak() {
        let daily = series(date(2025, 1, 1), &[Some(1.0), None, Some(1.0)]);
        let stats = scan(&daily, &Thresholds::default());
        let streak = stats.best_streak.unwrap();
        assert_eq!(streak.length, 1);
        assert_eq!(streak.tie_count, 2);
        assert_eq!(stats.missing_day_count, 1);
    }

    #[test]
    fn test_drought_is_bounded_by_measurable_days() {
        // dry lead-in and tail are longer than the inner gap
        let mut values = vec![Some(0.0); 20];
        values.push(Some(1.0));
        values.extend([Some(0.0), Some(0.0), Some(0.0)]);
        values.push(Some(0.5));
        values.extend(vec![Some(0.0); 30]);
        let daily = series(date(2024, 11, 1), &values);
        let stats = scan(&daily, &Thresholds::default());
        let drought = stats.longest_drought.unwrap();
        assert_eq!(drought.length, 3);
        assert!(drought.start_date > stats.first_measurable_day.unwrap());
        assert!(drought.end_date < stats.last_measurable_day.unwrap());
    }

    #[test]
    fn test_drought_first_occurrence_wins() {
        let daily = series(
            date(2025, 1, 1),
            &[Some(1.0), Some(0.0), Some(0.0), Some(1.0), Some(0.0), Some(0.0), Some(1.0)],
        );
        let drought = scan(&daily, &Thresholds::default()).longest_drought.unwrap();
        assert_eq!(drought.length, 2);
        assert_eq!(drought.start_date, date(2025, 1, 2));
    }

    #[test]
    fn test_missing_day_policy() {
        let daily = series(
            date(2025, 1, 1),
            &[Some(1.0), Some(0.0), None, Some(0.0), Some(1.0)],
        );
        let thresholds = Thresholds::default();
        let continues = scan(&daily, &thresholds);
        assert_eq!(continues.drought_length(), 3);
        let breaks = scan_with_policy(&daily, &thresholds, MissingDayPolicy::BreaksDrought);
        assert_eq!(breaks.drought_length(), 1);
        assert_eq!(breaks.longest_drought.unwrap().start_date, date(2025, 1, 2));
    }

    #[test]
    fn test_every_day_measurable_has_no_drought() {
        let daily = series(date(2025, 2, 1), &[Some(1.0), Some(2.0), Some(0.1)]);
        let stats = scan(&daily, &Thresholds::default());
        assert_eq!(stats.drought_length(), 0);
        assert!(stats.longest_drought.is_none());
        assert_eq!(stats.streak_length(), 3);
    }

    #[test]
    fn test_no_measurable_days() {
        let daily = series(date(2024, 7, 1), &[Some(0.0), None, Some(0.05)]);
        let stats = scan(&daily, &Thresholds::default());
        assert!(stats.first_measurable_day.is_none());
        assert!(stats.last_measurable_day.is_none());
        assert!(stats.best_streak.is_none());
        assert!(stats.longest_drought.is_none());
        assert!(stats.average_measurable.is_none());
        assert_eq!(stats.largest_daily.unwrap().value, 0.05);
        assert_eq!(stats.heavy_day_count, 0);

        let empty = scan(&[], &Thresholds::default());
        assert!(empty.largest_daily.is_none());
        assert!(empty.monthly.is_empty());
        assert_eq!(empty.holidays.total(), 0);
    }

    #[test]
    fn test_largest_daily_first_occurrence() {
        let daily = series(date(2025, 1, 1), &[Some(4.0), Some(1.0), Some(4.0)]);
        let largest = scan(&daily, &Thresholds::default()).largest_daily.unwrap();
        assert_eq!(largest.date, date(2025, 1, 1));
    }

    #[test]
    fn test_threshold_counts_and_monthly() {
        let daily = series(
            date(2025, 1, 30),
            &[Some(2.0), Some(6.5), Some(0.0), None, Some(3.0)],
        );
        let stats = scan(&daily, &Thresholds::default());
        assert_eq!(stats.heavy_day_count, 3);
        assert_eq!(stats.major_day_count, 1);
        assert_eq!(stats.measurable_day_count, 3);
        assert!((stats.total_snow - 11.5).abs() < 1e-9);
        assert!((stats.average_measurable.unwrap() - 11.5 / 3.0).abs() < 1e-9);
        assert_eq!(stats.last_reported, Some(date(2025, 2, 3)));
        assert_eq!(stats.monthly.len(), 2);
        assert_eq!(stats.monthly[0].month, 1);
        assert!((stats.monthly[0].total - 8.5).abs() < 1e-9);
        assert_eq!(stats.monthly[1].missing_days, 1);
        assert_eq!(stats.monthly[1].measurable_days, 1);
    }

    #[test]
    fn test_days_since_measurable() {
        let daily = series(date(2025, 1, 1), &[Some(1.0), Some(0.0), Some(0.0)]);
        let stats = scan(&daily, &Thresholds::default());
        assert_eq!(stats.days_since_measurable(&date(2025, 1, 10)), Some(9));
        assert_eq!(stats.days_since_measurable(&date(2024, 12, 31)), None);
    }
}
