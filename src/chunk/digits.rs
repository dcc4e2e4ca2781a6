//! Digit idioms
//!
//! Digit runs that people build out of smaller meaningful pieces (a date, a
//! pair of years, a repeated group) are split into those pieces. Plain
//! sequences such as `123` or `4321` are kept whole.

use crate::resources::{read_tsv, ResourceResult};
use rustc_hash::FxHashMap;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct DigitIdioms {
    table: FxHashMap<String, Vec<String>>,
}

impl DigitIdioms {
    /// Rule-based idioms only, no explicit table.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Load a `digits<TAB>piece piece ...` table. Rules still apply to runs
    /// missing from the table.
    pub fn from_file(path: &Path) -> ResourceResult<Self> {
        let mut table = FxHashMap::default();
        for row in read_tsv(path, 2)? {
            let pieces: Vec<String> = row.fields[1].split_whitespace().map(str::to_string).collect();
            if pieces.concat() == row.fields[0] {
                table.insert(row.fields[0].clone(), pieces);
            } else {
                tracing::warn!(
                    "{}:{}: pieces do not spell '{}'; skipping",
                    path.display(),
                    row.line,
                    row.fields[0]
                );
            }
        }
        info!("Loaded {} digit idioms from {}", table.len(), path.display());
        Ok(Self { table })
    }

    pub fn insert(&mut self, digits: &str, pieces: &[&str]) {
        self.table.insert(
            digits.to_string(),
            pieces.iter().map(|p| p.to_string()).collect(),
        );
    }

    /// Split a digit run into its idiomatic pieces, or return it unchanged.
    pub fn split(&self, run: &str) -> Vec<String> {
        if let Some(pieces) = self.table.get(run) {
            return pieces.clone();
        }
        if let Some(pieces) = split_repeated(run) {
            return pieces;
        }
        if let Some(pieces) = split_date(run) {
            return pieces;
        }
        vec![run.to_string()]
    }
}

/// `123123` -> `123 123`, `6969` -> `69 69`. Units of one digit are not split.
fn split_repeated(run: &str) -> Option<Vec<String>> {
    let n = run.len();
    if n < 4 || !run.is_ascii() {
        return None;
    }
    for unit in 2..=n / 2 {
        if n % unit != 0 {
            continue;
        }
        let head = &run[..unit];
        if head.bytes().all(|b| b == head.as_bytes()[0]) {
            continue;
        }
        if run.as_bytes().chunks(unit).all(|c| c == head.as_bytes()) {
            return Some(vec![head.to_string(); n / unit]);
        }
    }
    None
}

fn is_year(s: &str) -> bool {
    matches!(s.parse::<u32>(), Ok(y) if (1900..=2099).contains(&y))
}

fn is_short_year(s: &str) -> bool {
    s.len() == 2
}

fn is_day_month(s: &str) -> bool {
    let (a, b) = (&s[..2], &s[2..]);
    let (Ok(a), Ok(b)) = (a.parse::<u32>(), b.parse::<u32>()) else {
        return false;
    };
    let dm = (1..=31).contains(&a) && (1..=12).contains(&b);
    let md = (1..=12).contains(&a) && (1..=31).contains(&b);
    dm || md
}

/// Dates and year pairs split after the fourth digit:
/// `ddmmyyyy`, `mmddyyyy`, `yyyymmdd`, `yyyyyyyy`, `ddmmyy`.
fn split_date(run: &str) -> Option<Vec<String>> {
    if !run.is_ascii() || run.len() < 6 {
        return None;
    }
    let (head, tail) = run.split_at(4);
    let is_date = match run.len() {
        8 => {
            (is_day_month(head) && is_year(tail))
                || (is_year(head) && is_day_month(tail))
                || (is_year(head) && is_year(tail))
        }
        6 => is_day_month(head) && is_short_year(tail),
        _ => false,
    };
    is_date.then(|| vec![head.to_string(), tail.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequences_stay_whole() {
        let idioms = DigitIdioms::builtin();
        assert_eq!(idioms.split("123"), vec!["123"]);
        assert_eq!(idioms.split("123456"), vec!["123456"]);
        assert_eq!(idioms.split("4321"), vec!["4321"]);
    }

    #[test]
    fn test_repeated_groups() {
        let idioms = DigitIdioms::builtin();
        assert_eq!(idioms.split("123123"), vec!["123", "123"]);
        assert_eq!(idioms.split("6969"), vec!["69", "69"]);
        assert_eq!(idioms.split("1111"), vec!["1111"]);
    }

    #[test]
    fn test_dates_and_years() {
        let idioms = DigitIdioms::builtin();
        assert_eq!(idioms.split("01011990"), vec!["0101", "1990"]);
        assert_eq!(idioms.split("19900101"), vec!["1990", "0101"]);
        assert_eq!(idioms.split("19992000"), vec!["1999", "2000"]);
        assert_eq!(idioms.split("250390"), vec!["2503", "90"]);
        assert_eq!(idioms.split("98765432"), vec!["98765432"]);
    }

    #[test]
    fn test_table_takes_precedence() {
        let mut idioms = DigitIdioms::builtin();
        idioms.insert("1234567", &["1234", "567"]);
        assert_eq!(idioms.split("1234567"), vec!["1234", "567"]);
    }
}
