//! Linguistic resources shared by the training workers
//!
//! Every resource is a plain tab-separated file. Blank lines and lines
//! starting with `#` are ignored. The loaded tables are read-only and shared
//! behind `Arc`; each worker clones a [`Resources`] handle at startup and
//! keeps its own mutable state elsewhere.

use crate::chunk::{Chunker, DigitIdioms, UnigramSegmenter};
use crate::config::{ResourceConfig, TrainConfig};
use crate::models::WordClass;
use crate::semantic::{SemanticResolver, SenseTable, Taxonomy};
use crate::tag::{LexiconTagger, PosBlacklist, PosTagger, Vocabulary};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while loading resource files
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Resource '{0}' is not configured (set it under [resources])")]
    NotConfigured(&'static str),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: {reason}", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

pub type ResourceResult<T> = Result<T, ResourceError>;

/// A parsed TSV row with its 1-based line number
#[derive(Debug)]
pub struct TsvRow {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Read a tab-separated file, keeping rows with at least `min_fields` fields.
///
/// Short rows are skipped with a warning rather than failing the load.
pub fn read_tsv(path: &Path, min_fields: usize) -> ResourceResult<Vec<TsvRow>> {
    let file = File::open(path).map_err(|source| ResourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rows = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| ResourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let trimmed = line.trim_end_matches(&['\r', '\n'][..]);
        if trimmed.trim().is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<String> = trimmed.split('\t').map(|f| f.trim().to_string()).collect();
        if fields.len() < min_fields {
            warn!(
                "{}:{}: expected {} fields, found {}; skipping",
                path.display(),
                idx + 1,
                min_fields,
                fields.len()
            );
            continue;
        }
        rows.push(TsvRow {
            line: idx + 1,
            fields,
        });
    }

    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Parse a numeric field, reporting the row on failure.
pub fn parse_field<T: std::str::FromStr>(path: &Path, row: &TsvRow, idx: usize) -> ResourceResult<T> {
    row.fields[idx]
        .parse::<T>()
        .map_err(|_| ResourceError::Malformed {
            path: path.to_path_buf(),
            line: row.line,
            reason: format!("'{}' is not a valid number", row.fields[idx]),
        })
}

fn required<'a>(path: &'a Option<PathBuf>, name: &'static str) -> ResourceResult<&'a Path> {
    path.as_deref().ok_or(ResourceError::NotConfigured(name))
}

/// Everything a training or scoring worker needs, loaded once per run.
#[derive(Clone)]
pub struct Resources {
    pub chunker: Chunker,
    pub tagger: Arc<dyn PosTagger>,
    pub blacklist: Option<PosBlacklist>,
    pub resolver: SemanticResolver,
    pub noun_taxonomy: Option<Arc<Taxonomy>>,
    pub verb_taxonomy: Option<Arc<Taxonomy>>,
}

impl Resources {
    /// Load the resources needed for chunking, tagging and sense lookup.
    ///
    /// Taxonomies are only loaded when `with_taxonomies` is set, since
    /// scoring and tag-only training never touch them.
    pub fn load(
        paths: &ResourceConfig,
        train: &TrainConfig,
        with_taxonomies: bool,
    ) -> ResourceResult<Self> {
        let segmenter = match &paths.words {
            Some(path) => UnigramSegmenter::from_file(path)?,
            None => {
                warn!("No word list configured; alphabetic runs will not be segmented");
                UnigramSegmenter::default()
            }
        };
        let digits = match &paths.digits {
            Some(path) => DigitIdioms::from_file(path)?,
            None => DigitIdioms::builtin(),
        };

        let vocabulary = Arc::new(Vocabulary::from_file(required(&paths.vocabulary, "vocabulary")?)?);
        let senses = Arc::new(SenseTable::from_file(required(&paths.senses, "senses")?)?);

        let (noun_taxonomy, verb_taxonomy) = if with_taxonomies {
            let noun = Taxonomy::from_file(
                WordClass::Noun,
                required(&paths.noun_hypernyms, "noun_hypernyms")?,
            )?;
            let verb = Taxonomy::from_file(
                WordClass::Verb,
                required(&paths.verb_hypernyms, "verb_hypernyms")?,
            )?;
            (Some(Arc::new(noun)), Some(Arc::new(verb)))
        } else {
            (None, None)
        };

        info!(
            "Loaded resources: {} vocabulary words, {} sense lemmas",
            vocabulary.len(),
            senses.len()
        );

        let blacklist = train
            .blacklist
            .then(|| PosBlacklist::new(Arc::clone(&vocabulary), train.rare_threshold));

        Ok(Self {
            chunker: Chunker::new(Arc::new(segmenter), Arc::new(digits)),
            tagger: Arc::new(LexiconTagger::new(vocabulary)),
            blacklist,
            resolver: SemanticResolver::new(senses, train.tagset)
                .with_min_lengths(train.min_noun_length, train.min_verb_length),
            noun_taxonomy,
            verb_taxonomy,
        })
    }
}
