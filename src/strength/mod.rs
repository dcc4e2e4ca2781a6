//! Monte Carlo password strength estimation
//!
//! Estimates guess numbers as in Dell'Amico and Filippone, "Monte Carlo
//! strength evaluation" (CCS 2015). Given `N` passwords sampled from a model
//! with probabilities `p_1 >= p_2 >= ... >= p_N`, the number of guesses an
//! attacker enumerating the model in probability order needs before
//! reaching probability `p_i` is estimated by
//!
//! ```text
//! C_i = (1 / N) * sum_{j <= i} 1 / p_j
//! ```
//!
//! A query probability is located among the sample probabilities by binary
//! search and gets the estimate of the nearest sampled probability above it.

mod sample;

pub use sample::{parse_probability, parse_scored_line, read_sample, SampleRow, ScoredPassword};

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, PartialEq)]
pub enum StrengthError {
    #[error("Strength sample has no usable probabilities")]
    EmptySample,

    #[error("Strength table is empty")]
    EmptyTable,

    #[error("Multiplier must be a positive number, got {0}")]
    InvalidMultiplier(f64),
}

pub type StrengthResult<T> = Result<T, StrengthError>;

/// Probability -> guess number lookup table.
///
/// Probabilities are kept ascending, so estimates are descending: a more
/// probable password is never estimated to be stronger.
#[derive(Debug, Clone, Default)]
pub struct StrengthTable {
    probabilities: Vec<f64>,
    estimates: Vec<f64>,
    multiplier: f64,
}

impl StrengthTable {
    /// Build a table from a scored sample.
    ///
    /// With `dedupe`, only the first row of each password is kept. Rows
    /// without a positive probability are skipped.
    pub fn build(rows: &[SampleRow], dedupe: bool) -> StrengthResult<Self> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let kept: Vec<&SampleRow> = rows
            .iter()
            .filter(|row| !dedupe || seen.insert(row.password.as_str()))
            .collect();
        if dedupe && kept.len() < rows.len() {
            info!("Dropped {} duplicate sample rows", rows.len() - kept.len());
        }

        let unusable = kept.iter().filter(|r| r.probability.is_none()).count();
        if unusable > 0 {
            warn!("Skipping {} sample rows without a probability", unusable);
        }
        Self::from_probabilities(kept.iter().filter_map(|r| r.probability).collect())
    }

    /// Build a table from raw sample probabilities.
    pub fn from_probabilities(mut probabilities: Vec<f64>) -> StrengthResult<Self> {
        let before = probabilities.len();
        probabilities.retain(|p| p.is_finite() && *p > 0.0);
        if probabilities.len() < before {
            warn!(
                "Skipping {} non-positive sample probabilities",
                before - probabilities.len()
            );
        }
        if probabilities.is_empty() {
            return Err(StrengthError::EmptySample);
        }

        probabilities.par_sort_by(|a, b| b.total_cmp(a));

        let n = probabilities.len() as f64;
        let mut running = 0.0;
        let mut estimates: Vec<f64> = probabilities
            .iter()
            .map(|p| {
                running += 1.0 / p;
                running / n
            })
            .collect();

        probabilities.reverse();
        estimates.reverse();

        info!("Strength table built from {} sample probabilities", probabilities.len());
        Ok(Self {
            probabilities,
            estimates,
            multiplier: 1.0,
        })
    }

    /// Scale every estimate, e.g. by the number of mangling rules applied
    /// to each guess.
    pub fn with_multiplier(mut self, multiplier: f64) -> StrengthResult<Self> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(StrengthError::InvalidMultiplier(multiplier));
        }
        self.multiplier = multiplier;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    /// Estimated number of guesses for a password of probability `p`.
    ///
    /// Passwords the model cannot generate (`p == 0`) get strength 0.
    pub fn estimate(&self, p: f64) -> StrengthResult<f64> {
        let n = self.probabilities.len();
        if n == 0 {
            return Err(StrengthError::EmptyTable);
        }
        if p.is_nan() || p <= 0.0 {
            return Ok(0.0);
        }
        // Leftmost position where p could be inserted keeping order, then the
        // next entry up
        let bisector = self.probabilities.partition_point(|&x| x < p);
        let index = (bisector + 1).min(n - 1);
        Ok(self.estimates[index] * self.multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(password: &str, p: Option<f64>) -> SampleRow {
        SampleRow {
            password: password.to_string(),
            probability: p,
        }
    }

    #[test]
    fn test_estimates_follow_cumulative_inverse_probability() {
        let table = StrengthTable::from_probabilities(vec![0.01, 0.1, 0.001]).unwrap();
        // descending: 0.1, 0.01, 0.001 -> cumsum(1/p) / 3 = 10/3, 110/3, 1110/3
        assert_eq!(table.len(), 3);
        assert!((table.estimate(0.001).unwrap() - 110.0 / 3.0).abs() < 1e-9);
        assert!((table.estimate(0.0005).unwrap() - 110.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_binary_search_boundary() {
        let table = StrengthTable::from_probabilities(vec![0.1, 0.01, 0.001]).unwrap();
        // 0.05 sits between 0.01 and 0.1 and takes the entry of 0.1
        assert!((table.estimate(0.05).unwrap() - 10.0 / 3.0).abs() < 1e-9);
        // above the most probable sample, the index is clamped
        assert!((table.estimate(0.5).unwrap() - 10.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_monotonic_in_probability() {
        let sample: Vec<f64> = (1..=500).map(|i| 1.0 / (i as f64 * 7.0)).collect();
        let table = StrengthTable::from_probabilities(sample).unwrap();
        let mut previous = f64::INFINITY;
        for k in 0..200 {
            let p = 1e-5 * 1.05f64.powi(k);
            let s = table.estimate(p).unwrap();
            assert!(s <= previous, "strength increased at p = {}", p);
            previous = s;
        }
    }

    #[test]
    fn test_zero_probability() {
        let table = StrengthTable::from_probabilities(vec![0.5, 0.25]).unwrap();
        assert_eq!(table.estimate(0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_empty_sample_and_table() {
        assert_eq!(
            StrengthTable::from_probabilities(vec![0.0, -1.0]).unwrap_err(),
            StrengthError::EmptySample
        );
        assert_eq!(
            StrengthTable::default().estimate(0.1).unwrap_err(),
            StrengthError::EmptyTable
        );
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let rows = vec![
            row("password", Some(0.5)),
            row("password", Some(0.001)),
            row("123456", Some(0.25)),
            row("broken", None),
        ];
        let all = StrengthTable::build(&rows, false).unwrap();
        assert_eq!(all.len(), 3);

        let deduped = StrengthTable::build(&rows, true).unwrap();
        assert_eq!(deduped.len(), 2);
        // 0.5, 0.25 -> 2/2, 6/2
        assert!((deduped.estimate(0.3).unwrap() - 1.0).abs() < 1e-9);
        assert!((deduped.estimate(0.1).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_multiplier_scales_estimates() {
        let table = StrengthTable::from_probabilities(vec![0.1, 0.01, 0.001])
            .unwrap()
            .with_multiplier(4.0)
            .unwrap();
        assert!((table.estimate(0.05).unwrap() - 40.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_positive_multiplier_rejected() {
        let table = StrengthTable::from_probabilities(vec![0.1, 0.01]).unwrap();
        for bad in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            let err = table.clone().with_multiplier(bad).unwrap_err();
            assert!(matches!(err, StrengthError::InvalidMultiplier(_)), "{}", bad);
        }
    }
}
