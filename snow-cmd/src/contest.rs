//! Contest standings for a guess sheet.

use crate::{output::write_json, report::resolve_season, source::SeasonSource, SharedArgs};
use log::{info, warn};
use serde::Serialize;
use snow_acis::{
    guess::{parse_guess_sheet, GuessEntry},
    season::ContestWindow,
};
use snow_stats::{
    contest::{histogram, standings, ContestRule, GuessBin, GuessStats, Standing},
    window::Stage,
};
use snow_utils::{
    dates::parse_date,
    inches::{describe_margin, format_inches},
};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct HistogramBar {
    pub label: String,
    pub low: f64,
    pub high: f64,
    pub count: usize,
}

impl From<&GuessBin> for HistogramBar {
    fn from(bin: &GuessBin) -> Self {
        HistogramBar {
            label: bin.label(),
            low: bin.low,
            high: bin.high,
            count: bin.count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContestReport {
    pub season: String,
    pub source: String,
    pub rule: ContestRule,
    pub entries: usize,
    pub official: Standing,
    pub official_headline: String,
    pub seasonal: Standing,
    pub seasonal_headline: String,
    pub guess_stats: GuessStats,
    pub histogram: Vec<HistogramBar>,
}

fn names(winners: &[GuessEntry]) -> String {
    winners
        .iter()
        .map(GuessEntry::display)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Which standing a headline describes. The official board covers the
/// contest window; the seasonal board covers the whole snow year and never
/// names an official winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Board {
    Official,
    Seasonal,
}

impl Board {
    fn not_open(self, opens: &str) -> String {
        match self {
            Board::Official => format!(
                "Contest opens on {}. Leaders are posted once snowfall is recorded.",
                opens
            ),
            Board::Seasonal => format!(
                "Snow year begins on {}. We'll post standings once the season starts.",
                opens
            ),
        }
    }

    fn no_data(self) -> &'static str {
        match self {
            Board::Official => "Snowfall data is unavailable for this season.",
            Board::Seasonal => "Seasonal snowfall data is unavailable for this season.",
        }
    }

    fn leader(self, done: bool) -> &'static str {
        match (self, done) {
            (Board::Official, true) => "Official winner",
            (Board::Official, false) => "Current leader",
            (Board::Seasonal, true) => "Unofficial winner",
            (Board::Seasonal, false) => "Unofficial leader",
        }
    }

    fn total(self, done: bool) -> &'static str {
        match (self, done) {
            (Board::Official, true) => "Final contest total",
            (Board::Official, false) => "Contest total so far",
            (Board::Seasonal, true) => "Final seasonal total",
            (Board::Seasonal, false) => "Seasonal total so far",
        }
    }

    fn all_over(self, done: bool) -> &'static str {
        match (self, done) {
            (Board::Official, true) => {
                "Contest completed with no qualifying winner (all guesses exceeded the final total)."
            }
            (Board::Official, false) => {
                "No qualifying leader yet; every guess is still above the current total."
            }
            (Board::Seasonal, true) => {
                "Snow year completed with no qualifying unofficial winner (all guesses exceeded the final total)."
            }
            (Board::Seasonal, false) => {
                "No unofficial leader yet; every guess is still above the current total."
            }
        }
    }
}

/// One-line description of a standing, e.g.
/// `Current leader: Ada – Payroll (30") · Contest total so far: 28" · within 2"`.
pub fn headline(standing: &Standing, board: Board, opens: &str) -> String {
    let done = standing.stage == Stage::Done;
    let (total, resolution) = match (standing.stage, standing.total, &standing.resolution) {
        (Stage::Pre, _, _) => return board.not_open(opens),
        (_, None, _) | (_, _, None) => return board.no_data().to_string(),
        (_, Some(total), Some(resolution)) => (total, resolution),
    };
    if resolution.winners.is_empty() {
        return String::from("No leader could be determined.");
    }
    let margin = describe_margin(resolution.margin, resolution.all_over);
    let margin = if margin.is_empty() {
        margin
    } else {
        format!(" · {}", margin)
    };
    let lead = if resolution.all_over {
        format!(
            "{} Closest over guess: {}",
            board.all_over(done),
            names(&resolution.winners)
        )
    } else {
        let plural = if resolution.winners.len() > 1 { "s" } else { "" };
        format!("{}{}: {}", board.leader(done), plural, names(&resolution.winners))
    };
    format!(
        "{} · {}: {}\"{}",
        lead,
        board.total(done),
        format_inches(total),
        margin
    )
}

pub async fn run_contest(
    shared: &SharedArgs,
    season: Option<i32>,
    guesses_path: &Path,
    rule: ContestRule,
    window: ContestWindow,
    today: Option<&str>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let guesses = parse_guess_sheet(&std::fs::read(guesses_path)?)?;
    if guesses.is_empty() {
        warn!("No usable guesses in {}", guesses_path.display());
    }

    let mut source = SeasonSource::new(shared)?;
    let today = match today {
        Some(s) => parse_date(s)?,
        None => source.today(),
    };
    let start_year = resolve_season(season, &today);
    let record = source.season(start_year).await?;

    let official_window = window.official_window(start_year)?;
    let official = standings(&record.daily_records, &official_window, &guesses, rule, &today);
    let seasonal = standings(&record.daily_records, &record.window, &guesses, rule, &today);
    let official_headline = headline(
        &official,
        Board::Official,
        &official_window.start.format("%b %-d").to_string(),
    );
    let seasonal_headline = headline(
        &seasonal,
        Board::Seasonal,
        &record.window.start.format("%b %-d").to_string(),
    );
    info!("{}", official_headline);

    let report = ContestReport {
        season: record.label.clone(),
        source: record.station.source_label(),
        rule,
        entries: guesses.len(),
        official,
        official_headline,
        seasonal,
        seasonal_headline,
        guess_stats: GuessStats::from_guesses(&guesses),
        histogram: histogram(&guesses).iter().map(HistogramBar::from).collect(),
    };
    write_json(&report, output)
}
