//! Project-level configuration support
//!
//! Loads configuration from `passgrammar.toml` or `.passgrammarrc.json` in
//! the working directory, or from an explicit file.
//!
//! # Configuration Format
//!
//! ```toml
//! # passgrammar.toml
//!
//! [train]
//! batch_size = 10000
//! estimator = "laplace"
//! tagtype = "backoff"
//! specificity = 2.0
//!
//! [strength]
//! zeroes = true
//!
//! [resources]
//! words = "resources/words.tsv"
//! vocabulary = "resources/vocabulary.tsv"
//! senses = "resources/senses.tsv"
//! noun_hypernyms = "resources/noun_hypernyms.tsv"
//! verb_hypernyms = "resources/verb_hypernyms.tsv"
//! ```
//!
//! Relative resource paths are resolved against the directory holding the
//! configuration file.

use crate::grammar::{Estimator, TagType};
use crate::semantic::{MIN_NOUN_LENGTH, MIN_VERB_LENGTH};
use crate::tag::Tagset;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const TOML_CONFIG: &str = "passgrammar.toml";
pub const JSON_CONFIG: &str = ".passgrammarrc.json";

/// Training settings (`[train]`)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Passwords per Stage 1 batch
    pub batch_size: usize,
    pub estimator: Estimator,
    pub tagtype: TagType,
    /// Noun tree-cut specificity; higher values give finer classes
    pub specificity: Option<f64>,
    pub tagset: Tagset,
    /// Keep short, rare and unknown tokens away from the tagger
    pub blacklist: bool,
    pub rare_threshold: u64,
    pub min_noun_length: usize,
    pub min_verb_length: usize,
    pub vocab_min_noun_length: usize,
    pub vocab_min_verb_length: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            batch_size: 10_000,
            estimator: Estimator::Mle,
            tagtype: TagType::Backoff,
            specificity: None,
            tagset: Tagset::Claws7,
            blacklist: true,
            rare_threshold: 1000,
            min_noun_length: MIN_NOUN_LENGTH,
            min_verb_length: MIN_VERB_LENGTH,
            vocab_min_noun_length: 3,
            vocab_min_verb_length: 2,
        }
    }
}

/// Strength estimation defaults (`[strength]`)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StrengthConfig {
    /// Keep only the first sample row of each password
    pub dedupe: bool,
    /// Report zero-probability passwords as strength 0 instead of dropping them
    pub zeroes: bool,
    pub multiplier: f64,
}

impl Default for StrengthConfig {
    fn default() -> Self {
        Self {
            dedupe: false,
            zeroes: false,
            multiplier: 1.0,
        }
    }
}

/// Resource file locations (`[resources]`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// `word<TAB>count` unigram list for segmentation
    pub words: Option<PathBuf>,
    /// `word<TAB>tag<TAB>frequency` tagging vocabulary
    pub vocabulary: Option<PathBuf>,
    /// `digits<TAB>piece piece ...` idiom table
    pub digits: Option<PathBuf>,
    /// `lemma<TAB>class<TAB>sense_key` sense table
    pub senses: Option<PathBuf>,
    pub noun_hypernyms: Option<PathBuf>,
    pub verb_hypernyms: Option<PathBuf>,
}

impl ResourceConfig {
    /// Make relative paths relative to `base`.
    pub fn resolve(mut self, base: &Path) -> Self {
        for path in [
            &mut self.words,
            &mut self.vocabulary,
            &mut self.digits,
            &mut self.senses,
            &mut self.noun_hypernyms,
            &mut self.verb_hypernyms,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}

/// Complete configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub train: TrainConfig,
    pub strength: StrengthConfig,
    pub resources: ResourceConfig,
}

/// Load configuration from a directory.
///
/// Searches for `passgrammar.toml`, then `.passgrammarrc.json`. Returns the
/// default configuration if neither exists or both fail to load.
pub fn load_project_config(dir: &Path) -> ProjectConfig {
    for name in [TOML_CONFIG, JSON_CONFIG] {
        let path = dir.join(name);
        if !path.exists() {
            continue;
        }
        match load_config_file(&path) {
            Ok(config) => {
                debug!("Loaded project config from {}", path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", path.display(), e);
            }
        }
    }

    debug!("No project config found, using defaults");
    ProjectConfig::default()
}

/// Load one configuration file, choosing the format by extension.
pub fn load_config_file(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    let mut config: ProjectConfig = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        _ => toml::from_str(&content)?,
    };
    let base = path.parent().unwrap_or(Path::new("."));
    config.resources = config.resources.resolve(base);
    Ok(config)
}
