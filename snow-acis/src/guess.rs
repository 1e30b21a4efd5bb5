use crate::error::Result;
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};

/// Fallback column positions when the header row names nothing we recognise.
const DEFAULT_NAME_COLUMN: usize = 0;
const DEFAULT_GUESS_COLUMN: usize = 2;

/// One contestant's season-total guess.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct GuessEntry {
    pub name: String,
    pub department: String,
    pub guess_inches: f64,
}

impl GuessEntry {
    pub fn new(name: impl Into<String>, department: impl Into<String>, guess_inches: f64) -> Self {
        GuessEntry {
            name: name.into(),
            department: department.into(),
            guess_inches,
        }
    }

    /// "Name – Dept (12.5\")" as shown in contest standings.
    pub fn display(&self) -> String {
        let guess = snow_utils::inches::format_inches(self.guess_inches);
        if self.department.is_empty() {
            format!("{} ({}\")", self.name, guess)
        } else {
            format!("{} – {} ({}\")", self.name, self.department, guess)
        }
    }
}

/// Column positions resolved from a guess sheet header.
#[derive(Debug, PartialEq, Clone, Copy)]
struct GuessColumns {
    name: usize,
    guess: usize,
    department: Option<usize>,
}

impl GuessColumns {
    fn from_header(header: &StringRecord) -> Self {
        let normalized: Vec<String> = header
            .iter()
            .map(|cell| {
                cell.trim()
                    .to_lowercase()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect()
            })
            .collect();
        let find = |pred: &dyn Fn(&str) -> bool, skip: Option<usize>| {
            normalized
                .iter()
                .enumerate()
                .position(|(idx, h)| Some(idx) != skip && pred(h))
        };
        let name = find(&|h: &str| h.contains("name") || h.contains("guesser"), None)
            .unwrap_or(DEFAULT_NAME_COLUMN);
        let guess = find(
            &|h: &str| (h.starts_with("guess") && h != "guesser") || h == "snowguess" || h == "totalguess",
            Some(name),
        )
        .unwrap_or(DEFAULT_GUESS_COLUMN);
        let department = find(
            &|h: &str| h.contains("dist") || h.contains("dept") || h.contains("department"),
            Some(name),
        );
        GuessColumns {
            name,
            guess,
            department,
        }
    }
}

/// Pull a number out of free-form spreadsheet text ("  42 in" -> 42).
///
/// Only the leading number counts, so a range like "40-45" reads as 40.
fn parse_guess_cell(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    (1..=cleaned.len())
        .rev()
        .find_map(|end| cleaned[..end].parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Parse a contestant guess sheet exported as CSV.
///
/// The header row decides which columns hold the name, the guess and the
/// department. Rows with no name or no usable guess are dropped, so the
/// result only holds finite guesses.
pub fn parse_guess_sheet(raw: &[u8]) -> Result<Vec<GuessEntry>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(raw);
    let columns = GuessColumns::from_header(rdr.headers()?);
    let mut entries = Vec::new();
    let mut skipped = 0u32;
    for row in rdr.records() {
        let record = row?;
        let name = record.get(columns.name).unwrap_or("").trim();
        let guess = record.get(columns.guess).and_then(parse_guess_cell);
        let department = columns
            .department
            .and_then(|idx| record.get(idx))
            .unwrap_or("")
            .trim();
        match guess {
            Some(guess_inches) if !name.is_empty() => {
                entries.push(GuessEntry::new(name, department, guess_inches));
            }
            _ => skipped += 1,
        }
    }
    log::debug!(
        "guess sheet: parsed {} entries, skipped {}",
        entries.len(),
        skipped
    );
    Ok(entries)
}
