//! Password counting

use crate::models::PasswordRecord;
use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use std::io::BufRead;
use tracing::{info, warn};

/// Count distinct passwords, one per line.
///
/// Trailing line breaks are stripped and blank or whitespace-only lines
/// ignored. Lines that
/// are not valid UTF-8 are skipped with a warning. Records come back sorted
/// by password so downstream batching does not depend on hash order.
pub fn tally<R: BufRead>(reader: R, lowercase: bool) -> Result<Vec<PasswordRecord>> {
    let mut counts: FxHashMap<String, u64> = FxHashMap::default();
    let mut skipped = 0usize;

    for (idx, line) in reader.split(b'\n').enumerate() {
        let line = line.context("Failed to read password list")?;
        let line = match String::from_utf8(line) {
            Ok(line) => line,
            Err(_) => {
                skipped += 1;
                warn!("Line {}: not valid UTF-8, skipping", idx + 1);
                continue;
            }
        };
        let password = line.trim_end_matches(&['\r', '\n'][..]);
        if password.trim().is_empty() {
            continue;
        }
        let password = if lowercase {
            password.to_lowercase()
        } else {
            password.to_string()
        };
        *counts.entry(password).or_insert(0) += 1;
    }

    let mut records: Vec<PasswordRecord> = counts
        .into_iter()
        .map(|(password, count)| PasswordRecord::new(password, count))
        .collect();
    records.sort_by(|a, b| a.password.cmp(&b.password));

    let total: u64 = records.iter().map(|r| r.count).sum();
    info!(
        "Tallied {} distinct passwords ({} occurrences, {} lines skipped)",
        records.len(),
        total,
        skipped
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_counts_and_lowercases() {
        let input = "Password\npassword\r\n123456\n\nletmein\n123456\n";
        let records = tally(Cursor::new(input), true).unwrap();
        assert_eq!(
            records,
            vec![
                PasswordRecord::new("123456", 2),
                PasswordRecord::new("letmein", 1),
                PasswordRecord::new("password", 2),
            ]
        );
    }

    #[test]
    fn test_case_preserved_when_asked() {
        let records = tally(Cursor::new("Abc\nabc"), false).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_invalid_utf8_is_skipped() {
        let mut input = b"good\n".to_vec();
        input.extend_from_slice(&[0xff, 0xfe, b'\n']);
        input.extend_from_slice(b"good\n");
        let records = tally(Cursor::new(input), true).unwrap();
        assert_eq!(records, vec![PasswordRecord::new("good", 2)]);
    }

    #[test]
    fn test_whitespace_only_lines_are_ignored() {
        let records = tally(Cursor::new("   \n\t\npass\n \r\n"), true).unwrap();
        assert_eq!(records, vec![PasswordRecord::new("pass", 1)]);
    }

    #[test]
    fn test_inner_spaces_are_kept() {
        let records = tally(Cursor::new("my pass\n"), true).unwrap();
        assert_eq!(records, vec![PasswordRecord::new("my pass", 1)]);
    }
}
