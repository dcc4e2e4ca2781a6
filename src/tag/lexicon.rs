//! Reference frequency vocabulary and the lexicon tagger built on it

use super::PosTagger;
use crate::resources::{parse_field, read_tsv, ResourceResult};
use anyhow::Result;
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Word -> (tag, frequency) list, most frequent tag first.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    entries: FxHashMap<String, Vec<(String, u64)>>,
}

impl Vocabulary {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str, u64)>) -> Self {
        let mut vocab = Self::default();
        for (word, tag, freq) in entries {
            vocab.add(word, tag, freq);
        }
        vocab.sort();
        vocab
    }

    /// Load a `word<TAB>tag<TAB>frequency` file (one row per word/tag pair).
    pub fn from_file(path: &Path) -> ResourceResult<Self> {
        let mut vocab = Self::default();
        for row in read_tsv(path, 3)? {
            let freq = parse_field::<u64>(path, &row, 2)?;
            vocab.add(&row.fields[0], &row.fields[1], freq);
        }
        vocab.sort();
        info!("Loaded {} vocabulary words from {}", vocab.len(), path.display());
        Ok(vocab)
    }

    fn add(&mut self, word: &str, tag: &str, freq: u64) {
        let tags = self.entries.entry(word.to_lowercase()).or_default();
        let tag = tag.to_lowercase();
        match tags.iter_mut().find(|(t, _)| *t == tag) {
            Some((_, f)) => *f += freq,
            None => tags.push((tag, freq)),
        }
    }

    fn sort(&mut self) {
        for tags in self.entries.values_mut() {
            tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    /// Most frequent (tag, frequency) for a word
    pub fn top(&self, word: &str) -> Option<(&str, u64)> {
        self.entries
            .get(word)
            .and_then(|tags| tags.first())
            .map(|(tag, freq)| (tag.as_str(), *freq))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Tags every word with its most frequent tag in the vocabulary.
pub struct LexiconTagger {
    vocabulary: Arc<Vocabulary>,
}

impl LexiconTagger {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self { vocabulary }
    }
}

impl PosTagger for LexiconTagger {
    fn tag(&self, tokens: &[String]) -> Result<Vec<Option<String>>> {
        Ok(tokens
            .iter()
            .map(|t| self.vocabulary.top(&t.to_lowercase()).map(|(tag, _)| tag.to_string()))
            .collect())
    }
}
