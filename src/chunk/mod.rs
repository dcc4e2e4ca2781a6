//! Password chunking
//!
//! A password is split into maximal runs of symbols, letters and digits.
//! Letter runs are then segmented into dictionary words and digit runs into
//! known numeric idioms (dates, repeated groups).
//!
//! ```text
//! "pass123word!!" -> ["pass", "123", "word", "!!"]
//! "iloveyou2010"  -> ["i", "love", "you", "2010"]
//! ```

mod digits;
mod segment;

pub use digits::DigitIdioms;
pub use segment::UnigramSegmenter;

use crate::models::Chunk;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::warn;

/// Splits a run of letters into words.
pub trait Segmenter: Send + Sync {
    fn segment(&self, text: &str) -> Vec<String>;
}

fn run_pattern() -> &'static Regex {
    static RUNS: OnceLock<Regex> = OnceLock::new();
    RUNS.get_or_init(|| Regex::new(r"[\W_]+|[a-zA-Z]+|[0-9]+").expect("valid regex"))
}

/// Password chunker backed by a word segmenter and a digit idiom table.
#[derive(Clone)]
pub struct Chunker {
    segmenter: Arc<dyn Segmenter>,
    digits: Arc<DigitIdioms>,
}

impl Chunker {
    pub fn new(segmenter: Arc<dyn Segmenter>, digits: Arc<DigitIdioms>) -> Self {
        Self { segmenter, digits }
    }

    /// Split a normalized password into chunks, in order.
    ///
    /// Returns an empty vector (and logs a warning) when nothing in the
    /// password matches any character class.
    pub fn chunk(&self, password: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for run in run_pattern().find_iter(password).map(|m| m.as_str()) {
            let first = run.chars().next().unwrap_or_default();
            if first.is_alphabetic() && run.len() > 1 {
                chunks.extend(self.segmenter.segment(run).into_iter().map(Chunk::new));
            } else if first.is_ascii_digit() {
                chunks.extend(self.digits.split(run).into_iter().map(Chunk::new));
            } else {
                chunks.push(Chunk::new(run));
            }
        }

        if chunks.is_empty() {
            warn!("Unable to chunk password: {}", password);
        }

        chunks
    }
}
