//! Reference samples and scored query lines

use anyhow::{Context, Result};
use std::io::BufRead;
use tracing::warn;

/// One `password<TAB>probability` row of a reference sample.
///
/// `probability` is `None` when the field is missing or not a number.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    pub password: String,
    pub probability: Option<f64>,
}

/// A pre-scored query: `password base-structure probability`
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPassword {
    pub password: String,
    pub base_structure: String,
    pub probability: f64,
}

pub fn parse_probability(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|p| !p.is_nan())
}

/// Read a tab-separated reference sample.
///
/// The probability is the last field, so passwords may contain tabs.
pub fn read_sample<R: BufRead>(reader: R) -> Result<Vec<SampleRow>> {
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read sample line {}", idx + 1))?;
        let line = line.trim_end_matches(&['\r', '\n'][..]);
        if line.is_empty() {
            continue;
        }
        let row = match line.rsplit_once('\t') {
            Some((password, p)) => SampleRow {
                password: password.to_string(),
                probability: parse_probability(p),
            },
            None => SampleRow {
                password: line.to_string(),
                probability: None,
            },
        };
        rows.push(row);
    }
    Ok(rows)
}

fn split_last(s: &str) -> Option<(&str, &str)> {
    let (rest, last) = s.trim_end().rsplit_once(char::is_whitespace)?;
    Some((rest.trim_end(), last))
}

/// Parse a whitespace-separated `password base-structure probability` line,
/// splitting from the right so the password may contain spaces.
///
/// Malformed lines are logged and yield `None`.
pub fn parse_scored_line(line: &str) -> Option<ScoredPassword> {
    let parsed = split_last(line).and_then(|(rest, p)| {
        let (password, base_structure) = split_last(rest)?;
        let probability = parse_probability(p)?;
        (!password.is_empty()).then(|| ScoredPassword {
            password: password.to_string(),
            base_structure: base_structure.to_string(),
            probability,
        })
    });
    if parsed.is_none() {
        warn!("Malformed line: {}", line.trim_end());
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_sample_with_malformed_probabilities() {
        let input = "password\t0.01\n123456\tNaN\nletmein\tnot-a-number\n\nlonely\nspace word\t1e-5\r\n";
        let rows = read_sample(Cursor::new(input)).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].probability, Some(0.01));
        assert_eq!(rows[1].probability, None);
        assert_eq!(rows[2].probability, None);
        assert_eq!(rows[3].password, "lonely");
        assert_eq!(rows[3].probability, None);
        assert_eq!(rows[4].password, "space word");
        assert_eq!(rows[4].probability, Some(1e-5));
    }

    #[test]
    fn test_parse_scored_line() {
        let scored = parse_scored_line("ilove you nn1 vv0 2.5e-7\n").unwrap();
        assert_eq!(scored.password, "ilove you nn1");
        assert_eq!(scored.base_structure, "vv0");
        assert_eq!(scored.probability, 2.5e-7);

        let scored = parse_scored_line("dog123  nn1_animal\t0").unwrap();
        assert_eq!(scored.password, "dog123");
        assert_eq!(scored.probability, 0.0);
    }

    #[test]
    fn test_malformed_scored_lines() {
        assert!(parse_scored_line("").is_none());
        assert!(parse_scored_line("password 0.5").is_none());
        assert!(parse_scored_line("password nn1 high").is_none());
    }
}
