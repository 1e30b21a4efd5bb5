//! Command implementations for the snowfall season CLI.
//!
//! Each subcommand fetches the seasons it needs through [`source::SeasonSource`],
//! runs the season analytics over them and writes the result as JSON (or CSV
//! where noted) to stdout or a file.

use clap::{Args, Subcommand, ValueEnum};
use snow_acis::{
    season::ContestWindow,
    station::{Station, DEFAULT_STATION_NAME, DEFAULT_STATION_SID},
};
use snow_stats::{contest::ContestRule, scan::Thresholds};
use snow_utils::dates::parse_month_day;
use std::path::PathBuf;

pub mod contest;
pub mod forecast;
pub mod output;
pub mod report;
pub mod source;

/// Options every subcommand accepts.
#[derive(Args, Debug, Clone)]
pub struct SharedArgs {
    /// ACIS station id
    #[arg(long, default_value = DEFAULT_STATION_SID)]
    pub station_sid: String,

    /// Station display name, used when ACIS does not return one
    #[arg(long, default_value = DEFAULT_STATION_NAME)]
    pub station_name: String,

    /// Directory for cached season JSON files (in-memory only when unset)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Inches for a day to count as measurable snow
    #[arg(long, default_value_t = 0.1)]
    pub measurable: f64,

    /// Inches for a heavy snow day
    #[arg(long, default_value_t = 2.0)]
    pub heavy: f64,

    /// Inches for a major snow day
    #[arg(long, default_value_t = 6.0)]
    pub major: f64,
}

impl SharedArgs {
    pub fn station(&self) -> Station {
        Station::new(self.station_sid.clone(), self.station_name.clone())
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            measurable: self.measurable,
            heavy: self.heavy,
            major: self.major,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Csv,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Closest absolute difference
    Closest,
    /// Closest without going over
    NoOvershoot,
}

impl From<Rule> for ContestRule {
    fn from(rule: Rule) -> Self {
        match rule {
            Rule::Closest => ContestRule::Closest,
            Rule::NoOvershoot => ContestRule::NoOvershoot,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch one season of daily snowfall with running totals
    Fetch {
        #[command(flatten)]
        shared: SharedArgs,

        /// Season start year (defaults to the current season)
        #[arg(short, long)]
        season: Option<i32>,

        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Output path (stdout when unset)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Streaks, droughts, extremes, monthly and holiday tallies for a season
    Stats {
        #[command(flatten)]
        shared: SharedArgs,

        #[arg(short, long)]
        season: Option<i32>,

        /// Let missing days end a drought instead of extending it
        #[arg(long)]
        missing_breaks_drought: bool,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// All-time records across a range of seasons
    Records {
        #[command(flatten)]
        shared: SharedArgs,

        /// First season start year
        #[arg(long, default_value_t = 2012)]
        from: i32,

        /// Last season start year (defaults to the current season)
        #[arg(long)]
        to: Option<i32>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Contest standings for a guess sheet
    Contest {
        #[command(flatten)]
        shared: SharedArgs,

        #[arg(short, long)]
        season: Option<i32>,

        /// CSV guess sheet with a header row
        #[arg(short, long)]
        guesses: PathBuf,

        #[arg(long, value_enum, default_value_t = Rule::NoOvershoot)]
        rule: Rule,

        /// Contest opening day as MM-DD
        #[arg(long, default_value = "12-01")]
        contest_start: String,

        /// Contest closing day as MM-DD
        #[arg(long, default_value = "03-31")]
        contest_end: String,

        /// Evaluate as of this YYYY-MM-DD instead of today
        #[arg(long)]
        today: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Percentile forecast of the season's final total
    Forecast {
        #[command(flatten)]
        shared: SharedArgs,

        #[arg(short, long)]
        season: Option<i32>,

        /// Forecast as of this YYYY-MM-DD instead of today
        #[arg(long)]
        as_of: Option<String>,

        /// Number of prior seasons to use as analogs
        #[arg(long, default_value_t = 10)]
        history: u32,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Snowfall over an arbitrary date range, across seasons if needed
    Range {
        #[command(flatten)]
        shared: SharedArgs,

        /// First day as YYYY-MM-DD
        #[arg(long)]
        start: String,

        /// Last day as YYYY-MM-DD
        #[arg(long)]
        end: String,

        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn contest_window(start: &str, end: &str) -> anyhow::Result<ContestWindow> {
    Ok(ContestWindow::new(parse_month_day(start)?, parse_month_day(end)?))
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Fetch {
            shared,
            season,
            format,
            output,
        } => report::run_fetch(&shared, season, format, output.as_deref()).await,
        Command::Stats {
            shared,
            season,
            missing_breaks_drought,
            output,
        } => report::run_stats(&shared, season, missing_breaks_drought, output.as_deref()).await,
        Command::Records {
            shared,
            from,
            to,
            output,
        } => report::run_records(&shared, from, to, output.as_deref()).await,
        Command::Contest {
            shared,
            season,
            guesses,
            rule,
            contest_start,
            contest_end,
            today,
            output,
        } => {
            let window = contest_window(&contest_start, &contest_end)?;
            contest::run_contest(
                &shared,
                season,
                &guesses,
                rule.into(),
                window,
                today.as_deref(),
                output.as_deref(),
            )
            .await
        }
        Command::Forecast {
            shared,
            season,
            as_of,
            history,
            output,
        } => forecast::run_forecast(&shared, season, as_of.as_deref(), history, output.as_deref()).await,
        Command::Range {
            shared,
            start,
            end,
            format,
            output,
        } => report::run_range(&shared, &start, &end, format, output.as_deref()).await,
    }
}

#[cfg(test)]
mod tests {
    use super::{contest_window, Command};
    use clap::{FromArgMatches, Subcommand};

    fn parse(args: &[&str]) -> Command {
        let cmd = Command::augment_subcommands(clap::Command::new("snow-cli"));
        let matches = cmd.try_get_matches_from(args).unwrap();
        Command::from_arg_matches(&matches).unwrap()
    }

    #[test]
    fn test_shared_defaults() {
        match parse(&["snow-cli", "stats", "--season", "2023"]) {
            Command::Stats { shared, season, .. } => {
                assert_eq!(season, Some(2023));
                assert_eq!(shared.station().sid, "208941");
                assert_eq!(shared.thresholds().heavy, 2.0);
                assert!(shared.cache_dir.is_none());
            }
            _ => panic!("expected stats"),
        }
    }

    #[test]
    fn test_contest_args() {
        match parse(&[
            "snow-cli",
            "contest",
            "--guesses",
            "guesses.csv",
            "--rule",
            "closest",
            "--measurable",
            "0.2",
        ]) {
            Command::Contest {
                shared,
                contest_start,
                contest_end,
                ..
            } => {
                assert_eq!(shared.measurable, 0.2);
                let window = contest_window(&contest_start, &contest_end).unwrap();
                assert_eq!((window.start_month, window.start_day), (12, 1));
                assert_eq!((window.end_month, window.end_day), (3, 31));
            }
            _ => panic!("expected contest"),
        }
        assert!(contest_window("13-01", "03-31").is_err());
    }
}
