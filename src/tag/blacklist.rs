//! Noise filter applied before tagging

use super::Vocabulary;
use std::sync::Arc;

/// Flags tokens that should not be sent to the tagger.
#[derive(Debug, Clone)]
pub struct PosBlacklist {
    vocabulary: Arc<Vocabulary>,
    rare_threshold: u64,
}

impl PosBlacklist {
    pub fn new(vocabulary: Arc<Vocabulary>, rare_threshold: u64) -> Self {
        Self {
            vocabulary,
            rare_threshold,
        }
    }

    /// A token is noise when it is a single letter other than "a" or "i",
    /// when it is not in the vocabulary, or when it is shorter than four
    /// letters and rarer than the threshold.
    pub fn is_bad(&self, word: &str) -> bool {
        let len = word.chars().count();
        if len == 1 && word != "a" && word != "i" {
            return true;
        }
        match self.vocabulary.top(word) {
            None => true,
            Some((_, freq)) => len < 4 && freq < self.rare_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blacklist() -> PosBlacklist {
        let vocab = Vocabulary::from_entries([
            ("a", "at1", 90_000),
            ("x", "zz1", 5_000),
            ("cat", "nn1", 4_000),
            ("zed", "nn1", 12),
            ("zebra", "nn1", 15),
        ]);
        PosBlacklist::new(Arc::new(vocab), 1000)
    }

    #[test]
    fn test_single_letters() {
        let b = blacklist();
        assert!(!b.is_bad("a"));
        assert!(b.is_bad("x"));
    }

    #[test]
    fn test_unknown_and_rare_short_words() {
        let b = blacklist();
        assert!(b.is_bad("qqq"));
        assert!(b.is_bad("zed"));
        assert!(!b.is_bad("cat"));
        // rarity only matters below four letters
        assert!(!b.is_bad("zebra"));
    }
}
