use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// ACIS marker for a day with no report.
pub const MISSING_MARKER: &str = "M";

/// ACIS marker for a trace amount (below 0.1"), counted as 0.0.
pub const TRACE_MARKER: &str = "T";

/// A single day's snowfall reading.
/// - `Measured(f64)`: snowfall in inches (trace is `Measured(0.0)`)
/// - `Missing`: the station did not report; distinct from a zero reading
///
/// Serialises as a JSON number or `null`, matching the season payload.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum SnowValue {
    Measured(f64),
    Missing,
}

impl SnowValue {
    /// Interpret an ACIS cell. Anything that is not a finite number, a
    /// trace, or a number followed by a flag letter is `Missing`.
    pub fn parse_acis(raw: &str) -> SnowValue {
        let raw = raw.trim();
        match raw {
            "" | MISSING_MARKER => SnowValue::Missing,
            TRACE_MARKER => SnowValue::Measured(0.0),
            s => match s.parse::<f64>() {
                Ok(v) => SnowValue::from(Some(v)),
                Err(_) => SnowValue::from(leading_number(s)),
            },
        }
    }

    /// The numeric value, if reported.
    pub fn value(&self) -> Option<f64> {
        match self {
            SnowValue::Measured(v) => Some(*v),
            SnowValue::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, SnowValue::Missing)
    }

    /// True when a reported value reaches `threshold`.
    pub fn is_at_least(&self, threshold: f64) -> bool {
        matches!(self, SnowValue::Measured(v) if *v >= threshold)
    }

    /// Contribution to a running total: missing days add nothing.
    pub fn or_zero(&self) -> f64 {
        self.value().unwrap_or(0.0)
    }
}

impl From<Option<f64>> for SnowValue {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => SnowValue::Measured(v),
            _ => SnowValue::Missing,
        }
    }
}

impl From<SnowValue> for Option<f64> {
    fn from(value: SnowValue) -> Self {
        value.value()
    }
}

/// Longest numeric prefix of `s` ("1.2A" -> 1.2), if any.
fn leading_number(s: &str) -> Option<f64> {
    let end = s
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    s[..end].parse::<f64>().ok()
}

/// One row as delivered by the upstream API: an ISO date string and the
/// raw cell text. Rows may be sparse, duplicated, or out of order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub date: String,
    pub value: String,
}

impl RawRow {
    pub fn new(date: impl Into<String>, value: impl Into<String>) -> Self {
        RawRow {
            date: date.into(),
            value: value.into(),
        }
    }
}

/// A normalized daily reading: exactly one per calendar day in a season.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub snow: SnowValue,
}

impl DailyRecord {
    pub fn new(date: NaiveDate, snow: SnowValue) -> Self {
        DailyRecord { date, snow }
    }
}
