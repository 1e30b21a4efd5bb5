use crate::window::{window_total, Stage};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use snow_acis::{guess::GuessEntry, observation::DailyRecord, season::SeasonWindow};

/// Guesses within this many inches of each other are tied.
pub const CONTEST_EPSILON: f64 = 1e-6;

/// Bin widths a guess histogram snaps to.
const BIN_STEPS: [f64; 8] = [0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 25.0, 50.0];
/// Upper bound on histogram bins, however far apart the guesses are.
const MAX_BINS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestResolution {
    pub winners: Vec<GuessEntry>,
    /// Distance from the target to the winning guess(es).
    pub margin: Option<f64>,
    /// Every guess exceeded the target; `winners` are the least-over entries.
    pub all_over: bool,
}

impl ContestResolution {
    fn empty() -> Self {
        ContestResolution {
            winners: Vec::new(),
            margin: None,
            all_over: false,
        }
    }
}

/// Entries whose margin is within epsilon of the smallest one.
fn closest(scored: &[(&GuessEntry, f64)]) -> (Vec<GuessEntry>, Option<f64>) {
    let Some(best) = scored.iter().map(|(_, m)| *m).reduce(f64::min) else {
        return (Vec::new(), None);
    };
    let winners = scored
        .iter()
        .filter(|(_, m)| (m - best).abs() <= CONTEST_EPSILON)
        .map(|(entry, _)| (*entry).clone())
        .collect();
    (winners, Some(best))
}

/// Closest absolute difference wins; ties share.
pub fn resolve_closest(guesses: &[GuessEntry], target: f64) -> ContestResolution {
    if !target.is_finite() {
        return ContestResolution::empty();
    }
    let scored: Vec<(&GuessEntry, f64)> = guesses
        .iter()
        .filter(|g| g.guess_inches.is_finite())
        .map(|g| (g, (target - g.guess_inches).abs()))
        .collect();
    let (winners, margin) = closest(&scored);
    ContestResolution {
        winners,
        margin,
        all_over: false,
    }
}

/// Closest without going over. When every guess is over, the least-over
/// guesses are reported with `all_over` set.
pub fn resolve_no_overshoot(guesses: &[GuessEntry], target: f64) -> ContestResolution {
    if !target.is_finite() {
        return ContestResolution::empty();
    }
    let (eligible, over): (Vec<_>, Vec<_>) = guesses
        .iter()
        .filter(|g| g.guess_inches.is_finite())
        .map(|g| (g, target - g.guess_inches))
        .partition(|(_, delta)| *delta >= -CONTEST_EPSILON);

    if !eligible.is_empty() {
        let scored: Vec<_> = eligible.into_iter().map(|(g, d)| (g, d.max(0.0))).collect();
        let (winners, margin) = closest(&scored);
        return ContestResolution {
            winners,
            margin,
            all_over: false,
        };
    }
    let scored: Vec<_> = over.into_iter().map(|(g, d)| (g, d.abs())).collect();
    let (winners, margin) = closest(&scored);
    let all_over = !winners.is_empty();
    ContestResolution {
        winners,
        margin,
        all_over,
    }
}

/// Which resolver a contest uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContestRule {
    Closest,
    #[default]
    NoOvershoot,
}

impl ContestRule {
    pub fn resolve(&self, guesses: &[GuessEntry], target: f64) -> ContestResolution {
        match self {
            ContestRule::Closest => resolve_closest(guesses, target),
            ContestRule::NoOvershoot => resolve_no_overshoot(guesses, target),
        }
    }
}

/// Summary figures for a set of guesses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessStats {
    pub count: usize,
    pub average: Option<f64>,
    pub closest_to_average: Vec<GuessEntry>,
    pub lowest: Option<f64>,
    pub lowest_entries: Vec<GuessEntry>,
    pub highest: Option<f64>,
    pub highest_entries: Vec<GuessEntry>,
}

impl GuessStats {
    pub fn from_guesses(guesses: &[GuessEntry]) -> Self {
        let valid: Vec<GuessEntry> = guesses
            .iter()
            .filter(|g| g.guess_inches.is_finite())
            .cloned()
            .collect();
        let count = valid.len();
        let values = || valid.iter().map(|g| g.guess_inches);
        let average = (count > 0).then(|| values().sum::<f64>() / count as f64);
        let lowest = values().reduce(f64::min);
        let highest = values().reduce(f64::max);
        let entries_at = |value: Option<f64>| -> Vec<GuessEntry> {
            value.map_or(Vec::new(), |v| {
                valid
                    .iter()
                    .filter(|g| (g.guess_inches - v).abs() < CONTEST_EPSILON)
                    .cloned()
                    .collect()
            })
        };
        GuessStats {
            count,
            average,
            closest_to_average: average.map_or(Vec::new(), |avg| resolve_closest(&valid, avg).winners),
            lowest,
            lowest_entries: entries_at(lowest),
            highest,
            highest_entries: entries_at(highest),
        }
    }
}

/// One histogram bar: guesses in `[low, high)`, the last bar closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessBin {
    pub low: f64,
    pub high: f64,
    pub count: usize,
}

impl GuessBin {
    /// `10–20"`, with one decimal for sub-inch bins.
    pub fn label(&self) -> String {
        let width = self.high - self.low;
        let fmt = |v: f64| {
            let s = if width < 1.0 {
                format!("{:.1}", v)
            } else {
                format!("{:.0}", v)
            };
            s.strip_suffix(".0").map(str::to_string).unwrap_or(s)
        };
        format!("{}–{}\"", fmt(self.low), fmt(self.high))
    }
}

fn snap_bin_size(span: f64, desired_bins: usize) -> f64 {
    let raw = span / desired_bins.max(1) as f64;
    BIN_STEPS
        .iter()
        .copied()
        .find(|step| raw <= *step)
        .unwrap_or(BIN_STEPS[BIN_STEPS.len() - 1])
}

/// Bucket guesses into bins of a round width, aiming for 4 to 10 bins.
pub fn histogram(guesses: &[GuessEntry]) -> Vec<GuessBin> {
    let values: Vec<f64> = guesses
        .iter()
        .map(|g| g.guess_inches)
        .filter(|v| v.is_finite())
        .collect();
    let (Some(min), Some(max)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) else {
        return Vec::new();
    };
    let span = (max - min).max(1.0);
    let desired_bins = ((values.len() as f64).sqrt().round() as usize).clamp(4, 10);
    let mut bin_size = snap_bin_size(span, desired_bins);
    // an outlier guess widens the bins rather than multiplying them
    while (max / bin_size).ceil() - (min / bin_size).floor() > MAX_BINS as f64 {
        bin_size *= 10.0;
    }
    let start = (min / bin_size).floor() * bin_size;
    let end = (max / bin_size).ceil() * bin_size;
    let bin_count = (((end - start) / bin_size).ceil() as usize).clamp(1, MAX_BINS);

    let mut bins: Vec<GuessBin> = (0..bin_count)
        .map(|idx| {
            let low = start + idx as f64 * bin_size;
            GuessBin {
                low,
                high: low + bin_size,
                count: 0,
            }
        })
        .collect();
    for v in values {
        let idx = (((v - start) / bin_size).floor() as usize).min(bin_count - 1);
        bins[idx].count += 1;
    }
    bins
}

/// Contest state for one window of one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub window: SeasonWindow,
    pub stage: Stage,
    /// Snowfall so far inside the window; None without data.
    pub total: Option<f64>,
    /// None before the window opens or without data.
    pub resolution: Option<ContestResolution>,
}

/// Evaluate `guesses` against the snowfall in `window` as of `today`.
pub fn standings(
    daily: &[DailyRecord],
    window: &SeasonWindow,
    guesses: &[GuessEntry],
    rule: ContestRule,
    today: &NaiveDate,
) -> Standing {
    let stage = Stage::on(today, window);
    let total = window_total(daily, window);
    let resolution = match (stage, total) {
        (Stage::Pre, _) | (_, None) => None,
        (_, Some(total)) => Some(rule.resolve(guesses, total)),
    };
    Standing {
        window: *window,
        stage,
        total,
        resolution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snow_acis::observation::SnowValue;

    fn entry(name: &str, guess: f64) -> GuessEntry {
        GuessEntry::new(name, "", guess)
    }

    fn names(resolution: &ContestResolution) -> Vec<&str> {
        resolution.winners.iter().map(|w| w.name.as_str()).collect()
    }

    #[test]
    fn test_resolve_closest_shares_exact_tie() {
        let guesses = vec![entry("a", 10.0), entry("b", 10.0)];
        let result = resolve_closest(&guesses, 10.0);
        assert_eq!(names(&result), vec!["a", "b"]);
        assert_eq!(result.margin, Some(0.0));
        assert!(!result.all_over);
    }

    #[test]
    fn test_resolve_closest_either_side() {
        let guesses = vec![entry("under", 38.0), entry("over", 42.0), entry("far", 60.0)];
        let result = resolve_closest(&guesses, 40.0);
        assert_eq!(names(&result), vec!["under", "over"]);
        assert_eq!(result.margin, Some(2.0));
    }

    #[test]
    fn test_no_overshoot_all_over() {
        let guesses = vec![entry("twelve", 12.0), entry("fifteen", 15.0)];
        let result = resolve_no_overshoot(&guesses, 10.0);
        assert_eq!(names(&result), vec!["twelve"]);
        assert!(result.all_over);
        assert_eq!(result.margin, Some(2.0));
    }

    #[test]
    fn test_no_overshoot_prefers_under() {
        let guesses = vec![entry("over", 40.5), entry("under", 37.0), entry("low", 20.0)];
        let result = resolve_no_overshoot(&guesses, 40.0);
        assert_eq!(names(&result), vec!["under"]);
        assert!(!result.all_over);
        assert_eq!(result.margin, Some(3.0));
    }

    #[test]
    fn test_no_overshoot_epsilon_counts_as_exact() {
        let guesses = vec![entry("hair-over", 40.0 + 1e-7)];
        let result = resolve_no_overshoot(&guesses, 40.0);
        assert!(!result.all_over);
        assert_eq!(result.margin, Some(0.0));
    }

    #[test]
    fn test_resolvers_handle_empty_and_non_finite() {
        for result in [
            resolve_closest(&[], 10.0),
            resolve_no_overshoot(&[], 10.0),
            resolve_closest(&[entry("nan", f64::NAN)], 10.0),
            resolve_no_overshoot(&[entry("a", 5.0)], f64::INFINITY),
        ] {
            assert!(result.winners.is_empty());
            assert_eq!(result.margin, None);
            assert!(!result.all_over);
        }
        let mixed = vec![entry("nan", f64::NAN), entry("ok", 9.0)];
        assert_eq!(names(&resolve_no_overshoot(&mixed, 10.0)), vec!["ok"]);
    }

    #[test]
    fn test_guess_stats() {
        let guesses = vec![
            entry("a", 20.0),
            entry("b", 30.0),
            entry("c", 40.0),
            entry("d", 40.0),
            entry("bad", f64::NAN),
        ];
        let stats = GuessStats::from_guesses(&guesses);
        assert_eq!(stats.count, 4);
        assert_eq!(stats.average, Some(32.5));
        assert_eq!(stats.closest_to_average.len(), 1);
        assert_eq!(stats.closest_to_average[0].name, "b");
        assert_eq!(stats.lowest, Some(20.0));
        assert_eq!(stats.lowest_entries.len(), 1);
        assert_eq!(stats.highest, Some(40.0));
        assert_eq!(stats.highest_entries.len(), 2);

        let empty = GuessStats::from_guesses(&[]);
        assert_eq!(empty.count, 0);
        assert!(empty.average.is_none());
        assert!(empty.closest_to_average.is_empty());
    }

    #[test]
    fn test_histogram_bins() {
        // 9 guesses -> 4 desired bins, span 40 -> raw 10 -> bin 10
        let guesses: Vec<GuessEntry> = [12.0, 18.0, 25.0, 30.0, 31.0, 35.0, 44.0, 50.0, 52.0]
            .iter()
            .map(|g| entry("x", *g))
            .collect();
        let bins = histogram(&guesses);
        assert_eq!(bins.len(), 5);
        assert_eq!(bins[0].low, 10.0);
        assert_eq!(bins[4].high, 60.0);
        let counts: Vec<usize> = bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 1, 3, 1, 2]);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 9);
        assert_eq!(bins[0].label(), "10–20\"");
    }

    #[test]
    fn test_histogram_single_value() {
        let bins = histogram(&[entry("only", 40.0)]);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[0].label(), "40–40.5\"");
        assert!(histogram(&[]).is_empty());
    }

    #[test]
    fn test_histogram_outlier_guess() {
        let bins = histogram(&[entry("a", 0.0), entry("typo", 1e20)]);
        assert!(!bins.is_empty() && bins.len() <= MAX_BINS);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[bins.len() - 1].count, 1);
        assert!(bins[bins.len() - 1].high >= 1e20);

        let guesses: Vec<GuessEntry> = [20.0, 30.0, 35.0, 1e9].iter().map(|g| entry("x", *g)).collect();
        let bins = histogram(&guesses);
        assert!(bins.len() <= MAX_BINS);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 4);
        assert_eq!(bins[0].count, 3);
    }

    #[test]
    fn test_standings_by_stage() {
        let d = |m: u32, day: u32| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
        let daily = vec![
            DailyRecord::new(d(1, 1), SnowValue::Measured(5.0)),
            DailyRecord::new(d(1, 2), SnowValue::Measured(3.0)),
        ];
        let window = SeasonWindow::new(d(1, 1), d(1, 31)).unwrap();
        let guesses = vec![entry("a", 7.0), entry("b", 9.0)];

        let pre = standings(&daily, &window, &guesses, ContestRule::NoOvershoot, &d(1, 1).pred_opt().unwrap());
        assert_eq!(pre.stage, Stage::Pre);
        assert!(pre.resolution.is_none());

        let active = standings(&daily, &window, &guesses, ContestRule::NoOvershoot, &d(1, 15));
        assert_eq!(active.stage, Stage::Active);
        assert_eq!(active.total, Some(8.0));
        let resolution = active.resolution.unwrap();
        assert_eq!(names(&resolution), vec!["a"]);
        assert_eq!(resolution.margin, Some(1.0));

        let done = standings(&daily, &window, &guesses, ContestRule::Closest, &d(2, 1));
        assert_eq!(done.stage, Stage::Done);
        assert_eq!(names(&done.resolution.unwrap()), vec!["a", "b"]);
    }
}
