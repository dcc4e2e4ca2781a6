//! Sense lookup for tagged tokens

use crate::models::{Sense, WordClass};
use crate::resources::{read_tsv, ResourceError, ResourceResult};
use crate::tag::Tagset;
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Default minimum token lengths for sense lookup
pub const MIN_NOUN_LENGTH: usize = 3;
pub const MIN_VERB_LENGTH: usize = 2;

/// Source of word senses, most frequent first.
pub trait SenseInventory: Send + Sync {
    /// Senses of `word` in the given class, most frequent first.
    fn senses(&self, word: &str, class: WordClass) -> Vec<Sense>;

    /// Every lemma with at least one sense in the given class.
    fn lemmas(&self, class: WordClass) -> Vec<String>;
}

// WordNet's detachment rules, tried in order after the surface form
const NOUN_SUFFIXES: &[(&str, &str)] = &[
    ("s", ""),
    ("ses", "s"),
    ("ves", "f"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("ies", "y"),
];
const VERB_SUFFIXES: &[(&str, &str)] = &[
    ("s", ""),
    ("ies", "y"),
    ("es", "e"),
    ("es", ""),
    ("ed", "e"),
    ("ed", ""),
    ("ing", "e"),
    ("ing", ""),
];
const ADJECTIVE_SUFFIXES: &[(&str, &str)] = &[("er", ""), ("est", ""), ("er", "e"), ("est", "e")];

/// Candidate base forms of an inflected word, surface form first.
pub fn base_forms(word: &str, class: WordClass) -> Vec<String> {
    let rules = match class {
        WordClass::Noun => NOUN_SUFFIXES,
        WordClass::Verb => VERB_SUFFIXES,
        WordClass::Adjective => ADJECTIVE_SUFFIXES,
        WordClass::Adverb => &[],
    };
    let mut forms = vec![word.to_string()];
    for (suffix, replacement) in rules {
        if let Some(stem) = word.strip_suffix(suffix) {
            if stem.is_empty() {
                continue;
            }
            let form = format!("{}{}", stem, replacement);
            if !forms.contains(&form) {
                forms.push(form);
            }
        }
    }
    forms
}

/// Sense table loaded from a `lemma<TAB>class<TAB>sense_key` file.
///
/// Rows for the same lemma and class are kept in file order, which is
/// expected to be most frequent first.
#[derive(Debug, Clone, Default)]
pub struct SenseTable {
    senses: FxHashMap<(String, WordClass), Vec<String>>,
    lemma_order: Vec<(String, WordClass)>,
}

impl SenseTable {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, WordClass, &'a str)>) -> Self {
        let mut table = Self::default();
        for (lemma, class, key) in entries {
            table.add(lemma, class, key);
        }
        table
    }

    pub fn from_file(path: &Path) -> ResourceResult<Self> {
        let mut table = Self::default();
        for row in read_tsv(path, 3)? {
            let class = WordClass::from_code(&row.fields[1]).ok_or_else(|| ResourceError::Malformed {
                path: path.to_path_buf(),
                line: row.line,
                reason: format!("unknown word class '{}'", row.fields[1]),
            })?;
            table.add(&row.fields[0], class, &row.fields[2]);
        }
        info!("Loaded {} sense lemmas from {}", table.len(), path.display());
        Ok(table)
    }

    fn add(&mut self, lemma: &str, class: WordClass, key: &str) {
        let id = (lemma.to_lowercase(), class);
        let keys = self.senses.entry(id.clone()).or_insert_with(|| {
            self.lemma_order.push(id);
            Vec::new()
        });
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.senses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senses.is_empty()
    }
}

impl SenseInventory for SenseTable {
    fn senses(&self, word: &str, class: WordClass) -> Vec<Sense> {
        let mut found: Vec<Sense> = Vec::new();
        for form in base_forms(word, class) {
            if let Some(keys) = self.senses.get(&(form, class)) {
                for key in keys {
                    if !found.iter().any(|s| &s.key == key) {
                        found.push(Sense::new(key.clone(), class));
                    }
                }
            }
        }
        found
    }

    fn lemmas(&self, class: WordClass) -> Vec<String> {
        self.lemma_order
            .iter()
            .filter(|(_, c)| *c == class)
            .map(|(lemma, _)| lemma.clone())
            .collect()
    }
}

/// Maps a (token, tag) pair to its most frequent sense.
#[derive(Clone)]
pub struct SemanticResolver {
    inventory: Arc<dyn SenseInventory>,
    tagset: Tagset,
    min_noun_length: usize,
    min_verb_length: usize,
}

impl SemanticResolver {
    pub fn new(inventory: Arc<dyn SenseInventory>, tagset: Tagset) -> Self {
        Self {
            inventory,
            tagset,
            min_noun_length: MIN_NOUN_LENGTH,
            min_verb_length: MIN_VERB_LENGTH,
        }
    }

    pub fn with_min_lengths(mut self, noun: usize, verb: usize) -> Self {
        self.min_noun_length = noun;
        self.min_verb_length = verb;
        self
    }

    pub fn tagset(&self) -> Tagset {
        self.tagset
    }

    pub fn inventory(&self) -> &dyn SenseInventory {
        self.inventory.as_ref()
    }

    /// Resolve a tagged token to a sense.
    ///
    /// Untagged tokens, proper nouns, closed-class tags, and tokens shorter
    /// than their class minimum resolve to `None`.
    pub fn resolve(&self, token: &str, tag: Option<&str>) -> Option<Sense> {
        let tag = tag?;
        if self.tagset.is_proper_noun(tag) {
            return None;
        }
        let class = self.tagset.word_class(tag)?;
        let min_length = match class {
            WordClass::Noun => self.min_noun_length,
            _ => self.min_verb_length,
        };
        if token.chars().count() < min_length {
            return None;
        }
        self.inventory.senses(token, class).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> SemanticResolver {
        let table = SenseTable::from_entries([
            ("dog", WordClass::Noun, "dog.n.01"),
            ("dog", WordClass::Noun, "frump.n.01"),
            ("dog", WordClass::Verb, "chase.v.01"),
            ("love", WordClass::Verb, "love.v.01"),
            ("ox", WordClass::Noun, "ox.n.01"),
            ("go", WordClass::Verb, "travel.v.01"),
            ("box", WordClass::Noun, "box.n.01"),
        ]);
        SemanticResolver::new(Arc::new(table), Tagset::Claws7)
    }

    #[test]
    fn test_first_sense_is_used() {
        let r = resolver();
        assert_eq!(r.resolve("dog", Some("nn1")).unwrap().key, "dog.n.01");
        assert_eq!(r.resolve("dog", Some("vv0")).unwrap().key, "chase.v.01");
    }

    #[test]
    fn test_missing_resolution_is_none() {
        let r = resolver();
        assert!(r.resolve("dog", None).is_none());
        assert!(r.resolve("dog", Some("np1")).is_none());
        assert!(r.resolve("dog", Some("at")).is_none());
        assert!(r.resolve("cat", Some("nn1")).is_none());
    }

    #[test]
    fn test_minimum_lengths_per_class() {
        let r = resolver();
        assert!(r.resolve("ox", Some("nn1")).is_none());
        assert_eq!(r.resolve("go", Some("vv0")).unwrap().key, "travel.v.01");
    }

    #[test]
    fn test_inflected_forms_reach_their_lemma() {
        let r = resolver();
        assert_eq!(r.resolve("dogs", Some("nn2")).unwrap().key, "dog.n.01");
        assert_eq!(r.resolve("boxes", Some("nn2")).unwrap().key, "box.n.01");
        assert_eq!(r.resolve("loving", Some("vvg")).unwrap().key, "love.v.01");
    }

    #[test]
    fn test_lemmas_by_class() {
        let r = resolver();
        assert_eq!(r.inventory().lemmas(WordClass::Verb), vec!["dog", "love", "go"]);
    }
}
