//! Unigram word segmentation
//!
//! Finds the split of a letter run that maximises the product of unigram
//! probabilities. Unknown words are scored `10 / (total * 10^len)` so that
//! long unknown fragments are strongly penalised.

use super::Segmenter;
use crate::resources::{parse_field, read_tsv, ResourceResult};
use rustc_hash::FxHashMap;
use std::path::Path;
use tracing::info;

/// Longest candidate word considered by the search
const MAX_WORD_LEN: usize = 24;

#[derive(Debug, Clone, Default)]
pub struct UnigramSegmenter {
    counts: FxHashMap<String, u64>,
    total: f64,
}

impl UnigramSegmenter {
    pub fn from_counts(counts: impl IntoIterator<Item = (String, u64)>) -> Self {
        let mut map = FxHashMap::default();
        for (word, count) in counts {
            *map.entry(word.to_lowercase()).or_insert(0) += count;
        }
        let total = map.values().sum::<u64>() as f64;
        Self { counts: map, total }
    }

    /// Load a `word<TAB>count` list.
    pub fn from_file(path: &Path) -> ResourceResult<Self> {
        let rows = read_tsv(path, 2)?;
        let mut counts = Vec::with_capacity(rows.len());
        for row in &rows {
            counts.push((row.fields[0].clone(), parse_field::<u64>(path, row, 1)?));
        }
        let segmenter = Self::from_counts(counts);
        info!("Loaded {} segmentation words from {}", segmenter.len(), path.display());
        Ok(segmenter)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    fn log_score(&self, word: &str) -> f64 {
        match self.counts.get(word) {
            Some(&count) if count > 0 => (count as f64 / self.total).log10(),
            _ => 1.0 - self.total.log10() - word.len() as f64,
        }
    }
}

impl Segmenter for UnigramSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        if self.total <= 0.0 || text.is_empty() || !text.is_ascii() {
            return vec![text.to_string()];
        }

        let text = text.to_lowercase();
        let n = text.len();
        // best[i] = (log probability of text[..i], start of the last word)
        let mut best: Vec<(f64, usize)> = vec![(f64::NEG_INFINITY, 0); n + 1];
        best[0] = (0.0, 0);

        for end in 1..=n {
            for start in end.saturating_sub(MAX_WORD_LEN)..end {
                let score = best[start].0 + self.log_score(&text[start..end]);
                if score > best[end].0 {
                    best[end] = (score, start);
                }
            }
        }

        let mut words = Vec::new();
        let mut end = n;
        while end > 0 {
            let start = best[end].1;
            words.push(text[start..end].to_string());
            end = start;
        }
        words.reverse();
        words
    }
}
