use crate::scan::{scan, DroughtRun, LargestDaily, SeasonStats, StreakResult, Thresholds};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use snow_acis::season::SeasonRecord;
use snow_utils::dates::day_of_season;

/// One season's stats, labelled for record keeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub start_year: i32,
    pub label: String,
    pub stats: SeasonStats,
}

impl SeasonSummary {
    pub fn from_season(season: &SeasonRecord, thresholds: &Thresholds) -> Self {
        SeasonSummary {
            start_year: season.start_year,
            label: season.label.clone(),
            stats: scan(&season.daily_records, thresholds),
        }
    }
}

/// A record value and the season that holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEntry<T> {
    pub start_year: i32,
    pub season: String,
    pub value: T,
}

/// All-time records across a set of seasons. The earliest season in input
/// order keeps a record on a tie.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordBook {
    pub earliest_first_snow: Option<RecordEntry<NaiveDate>>,
    pub latest_first_snow: Option<RecordEntry<NaiveDate>>,
    pub earliest_last_snow: Option<RecordEntry<NaiveDate>>,
    pub latest_last_snow: Option<RecordEntry<NaiveDate>>,
    pub longest_drought: Option<RecordEntry<DroughtRun>>,
    pub longest_streak: Option<RecordEntry<StreakResult>>,
    pub largest_daily: Option<RecordEntry<LargestDaily>>,
    pub snowiest_season: Option<RecordEntry<f64>>,
    pub most_heavy_days: Option<RecordEntry<usize>>,
    pub most_major_days: Option<RecordEntry<usize>>,
    /// Seasons with measurable snow on every tracked holiday.
    pub clean_sweeps: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Prefer {
    Lowest,
    Highest,
}

fn pick<T, K, V, F>(summaries: &[SeasonSummary], value: V, key: F, prefer: Prefer) -> Option<RecordEntry<T>>
where
    V: Fn(&SeasonSummary) -> Option<T>,
    F: Fn(&T) -> K,
    K: PartialOrd,
{
    let mut best: Option<RecordEntry<T>> = None;
    for summary in summaries {
        let Some(candidate) = value(summary) else {
            continue;
        };
        let better = match &best {
            None => true,
            Some(held) => match prefer {
                Prefer::Lowest => key(&candidate) < key(&held.value),
                Prefer::Highest => key(&candidate) > key(&held.value),
            },
        };
        if better {
            best = Some(RecordEntry {
                start_year: summary.start_year,
                season: summary.label.clone(),
                value: candidate,
            });
        }
    }
    best
}

impl RecordBook {
    /// First and last snow dates compare by position within their season, so
    /// a Nov 1 first snow beats a Dec 1 one whatever the calendar years.
    pub fn compile(summaries: &[SeasonSummary]) -> Self {
        let first = |s: &SeasonSummary| s.stats.first_measurable_day;
        let last = |s: &SeasonSummary| s.stats.last_measurable_day;
        let by_season_day = |d: &NaiveDate| day_of_season(d);
        RecordBook {
            earliest_first_snow: pick(summaries, first, by_season_day, Prefer::Lowest),
            latest_first_snow: pick(summaries, first, by_season_day, Prefer::Highest),
            earliest_last_snow: pick(summaries, last, by_season_day, Prefer::Lowest),
            latest_last_snow: pick(summaries, last, by_season_day, Prefer::Highest),
            longest_drought: pick(
                summaries,
                |s| s.stats.longest_drought,
                |d| d.length,
                Prefer::Highest,
            ),
            longest_streak: pick(
                summaries,
                |s| s.stats.best_streak,
                |s| s.length,
                Prefer::Highest,
            ),
            largest_daily: pick(
                summaries,
                |s| s.stats.largest_daily,
                |l| l.value,
                Prefer::Highest,
            ),
            snowiest_season: pick(
                summaries,
                |s| Some(s.stats.total_snow),
                |t| *t,
                Prefer::Highest,
            ),
            most_heavy_days: pick(
                summaries,
                |s| Some(s.stats.heavy_day_count),
                |c| *c,
                Prefer::Highest,
            ),
            most_major_days: pick(
                summaries,
                |s| Some(s.stats.major_day_count),
                |c| *c,
                Prefer::Highest,
            ),
            clean_sweeps: summaries
                .iter()
                .filter(|s| s.stats.holidays.clean_sweep())
                .map(|s| s.label.clone())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RecordBook, SeasonSummary};
    use crate::holidays::holidays_for_season;
    use crate::scan::Thresholds;
    use chrono::NaiveDate;
    use snow_acis::observation::{DailyRecord, SnowValue};
    use snow_acis::season::{SeasonRecord, SeasonWindow};
    use snow_acis::station::Station;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// A full season that is dry except for the listed days.
    fn summary(start_year: i32, snowy: &[(NaiveDate, f64)]) -> SeasonSummary {
        let window = SeasonWindow::for_start_year(start_year).unwrap();
        let daily = window
            .days()
            .map(|d| {
                let snow = snowy
                    .iter()
                    .find(|(day, _)| *day == d)
                    .map_or(0.0, |(_, v)| *v);
                DailyRecord::new(d, SnowValue::Measured(snow))
            })
            .collect();
        let season = SeasonRecord::new(start_year, Station::default(), window, daily);
        SeasonSummary::from_season(&season, &Thresholds::default())
    }

    #[test]
    fn test_first_and_last_snow_compare_within_season() {
        let summaries = vec![
            // first snow Dec 10, last Mar 1
            summary(2021, &[(date(2021, 12, 10), 1.0), (date(2022, 3, 1), 1.0)]),
            // first snow Nov 5, last Apr 20
            summary(2022, &[(date(2022, 11, 5), 1.0), (date(2023, 4, 20), 7.0)]),
            // first snow Jan 3 of the next calendar year, last Feb 1
            summary(2023, &[(date(2024, 1, 3), 2.5), (date(2024, 2, 1), 2.5)]),
        ];
        let book = RecordBook::compile(&summaries);
        assert_eq!(book.earliest_first_snow.as_ref().unwrap().season, "2022-2023");
        assert_eq!(book.latest_first_snow.as_ref().unwrap().value, date(2024, 1, 3));
        assert_eq!(book.earliest_last_snow.as_ref().unwrap().start_year, 2023);
        assert_eq!(book.latest_last_snow.as_ref().unwrap().value, date(2023, 4, 20));
        assert_eq!(book.largest_daily.as_ref().unwrap().start_year, 2022);
        assert_eq!(book.most_major_days.as_ref().unwrap().value, 1);
        assert_eq!(book.most_heavy_days.as_ref().unwrap().start_year, 2023);
        assert_eq!(book.snowiest_season.as_ref().unwrap().value, 8.0);
        // Nov 5 -> Apr 20 is the widest gap
        let drought = book.longest_drought.as_ref().unwrap();
        assert_eq!(drought.start_year, 2022);
        assert_eq!(drought.value.start_date, date(2022, 11, 6));
    }

    #[test]
    fn test_ties_keep_first_season() {
        let summaries = vec![
            summary(2019, &[(date(2020, 1, 1), 3.0)]),
            summary(2020, &[(date(2021, 1, 1), 3.0)]),
        ];
        let book = RecordBook::compile(&summaries);
        assert_eq!(book.largest_daily.unwrap().start_year, 2019);
        assert_eq!(book.longest_streak.unwrap().start_year, 2019);
        assert_eq!(book.snowiest_season.unwrap().start_year, 2019);
        assert!(book.longest_drought.is_none());
    }

    #[test]
    fn test_clean_sweeps() {
        let holidays: Vec<(NaiveDate, f64)> = holidays_for_season(2020)
            .into_iter()
            .map(|(_, d)| (d, 0.5))
            .collect();
        let summaries = vec![summary(2020, &holidays), summary(2021, &[])];
        let book = RecordBook::compile(&summaries);
        assert_eq!(book.clean_sweeps, vec!["2020-2021".to_string()]);
        assert!(book.earliest_first_snow.is_some());
    }

    #[test]
    fn test_empty_book() {
        let book = RecordBook::compile(&[]);
        assert_eq!(book, RecordBook::default());
    }
}
