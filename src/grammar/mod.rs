//! Semantic password grammar
//!
//! A password is generated by first drawing a base structure (a sequence of
//! symbols such as `nn1_animal.n.01 digits3`) and then one terminal token
//! for every symbol. Training examples come from the cross-product builder
//! in [`expand`]; scoring of unseen passwords lives in [`score`].

pub mod expand;
mod model;
pub mod score;
pub mod vocab;

pub use expand::{expand, interpret, tag_only_example, MAX_INTERPRETATIONS};
pub use model::SemanticGrammar;
pub use score::Scorer;

use crate::models::{GrammarExample, Segment};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// File name of the serialized grammar inside a grammar directory
pub const GRAMMAR_FILE: &str = "grammar.json";
pub const NOUN_TREECUT_FILE: &str = "noun_treecut.bin";
pub const VERB_TREECUT_FILE: &str = "verb_treecut.bin";

/// Probability estimator used for the grammar and the tree cuts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Estimator {
    #[default]
    Mle,
    Laplace,
}

impl FromStr for Estimator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mle" => Ok(Estimator::Mle),
            "laplace" => Ok(Estimator::Laplace),
            other => Err(format!("unknown estimator '{}'", other)),
        }
    }
}

/// Whether chunks carry semantic classes (`backoff`) or POS tags only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    #[default]
    Backoff,
    Pos,
}

impl TagType {
    pub fn is_semantic(&self) -> bool {
        matches!(self, TagType::Backoff)
    }
}

impl FromStr for TagType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "backoff" => Ok(TagType::Backoff),
            "pos" => Ok(TagType::Pos),
            other => Err(format!("unknown tag type '{}'", other)),
        }
    }
}

#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid grammar file {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Grammar has no base structures; fit it before sampling")]
    Empty,
}

pub type GrammarResult<T> = Result<T, GrammarError>;

/// A probability model over segmented passwords.
pub trait Grammar: Send + Sync {
    /// Register tokens the model should know about before fitting.
    fn add_vocabulary(&mut self, entries: &[Segment]);

    /// Accumulate weighted examples.
    fn fit(&mut self, examples: &[GrammarExample]);

    /// Probability of one interpretation of a password.
    fn probability(&self, segments: &[Segment]) -> f64;

    /// Draw `n` passwords with their probabilities.
    fn sample(&self, n: usize, seed: u64) -> GrammarResult<Vec<(String, f64)>>;

    /// Persist into a grammar directory.
    fn save(&self, dir: &Path) -> GrammarResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options() {
        assert_eq!("Laplace".parse::<Estimator>().unwrap(), Estimator::Laplace);
        assert!("kneser-ney".parse::<Estimator>().is_err());
        assert_eq!("pos".parse::<TagType>().unwrap(), TagType::Pos);
        assert!(TagType::Backoff.is_semantic());
    }
}
