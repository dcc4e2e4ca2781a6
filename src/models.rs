//! Core data models for passgrammar
//!
//! These models flow through the training pipeline: a tallied password
//! becomes chunks, chunks become tagged chunks, and tagged chunks are
//! expanded into weighted grammar examples.

use serde::{Deserialize, Serialize};

/// A distinct password and the number of times it occurs in the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordRecord {
    pub password: String,
    pub count: u64,
}

impl PasswordRecord {
    pub fn new(password: impl Into<String>, count: u64) -> Self {
        Self {
            password: password.into(),
            count,
        }
    }
}

/// Coarse character class of a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Word,
    Digits,
    Symbols,
}

impl ChunkKind {
    /// Classify a chunk by its first character.
    pub fn of(text: &str) -> Self {
        match text.chars().next() {
            Some(c) if c.is_alphabetic() => ChunkKind::Word,
            Some(c) if c.is_ascii_digit() => ChunkKind::Digits,
            _ => ChunkKind::Symbols,
        }
    }
}

impl std::fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkKind::Word => write!(f, "word"),
            ChunkKind::Digits => write!(f, "digits"),
            ChunkKind::Symbols => write!(f, "symbols"),
        }
    }
}

/// A piece of a password produced by the chunker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub kind: ChunkKind,
}

impl Chunk {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let kind = ChunkKind::of(&text);
        Self { text, kind }
    }

    pub fn is_alpha(&self) -> bool {
        self.kind == ChunkKind::Word
    }
}

/// A chunk with its part-of-speech tag, if it was tagged at all
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedChunk {
    pub text: String,
    pub tag: Option<String>,
}

impl TaggedChunk {
    pub fn new(text: impl Into<String>, tag: Option<&str>) -> Self {
        Self {
            text: text.into(),
            tag: tag.map(str::to_string),
        }
    }

    pub fn untagged(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tag: None,
        }
    }
}

/// Output of stage 1: one distinct password, chunked and tagged
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedPassword {
    pub chunks: Vec<TaggedChunk>,
    pub count: u64,
}

/// Coarse word class shared by the tagset converter and the sense inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WordClass {
    Noun,
    Verb,
    Adjective,
    Adverb,
}

impl WordClass {
    /// Single-letter WordNet code
    pub fn code(&self) -> char {
        match self {
            WordClass::Noun => 'n',
            WordClass::Verb => 'v',
            WordClass::Adjective => 'a',
            WordClass::Adverb => 'r',
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "n" => Some(WordClass::Noun),
            "v" => Some(WordClass::Verb),
            "a" | "s" => Some(WordClass::Adjective),
            "r" => Some(WordClass::Adverb),
            _ => None,
        }
    }
}

/// One meaning of a word in the taxonomy, e.g. `dog.n.01`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sense {
    pub key: String,
    pub class: WordClass,
}

impl Sense {
    pub fn new(key: impl Into<String>, class: WordClass) -> Self {
        Self {
            key: key.into(),
            class,
        }
    }
}

/// Identifier of a generalized semantic class chosen by a tree cut
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub String);

impl ClassId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassId {
    fn from(s: &str) -> Self {
        ClassId(s.to_string())
    }
}

/// A (token, tag, semantic class) triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub token: String,
    pub tag: Option<String>,
    pub class: Option<ClassId>,
}

impl Segment {
    pub fn new(token: impl Into<String>, tag: Option<String>, class: Option<ClassId>) -> Self {
        Self {
            token: token.into(),
            tag,
            class,
        }
    }

    /// Grammar symbol of this segment.
    ///
    /// Tagged segments use `tag` or `tag_class`; untagged segments use the
    /// chunk shape plus length, e.g. `digits4` or `symbols1`.
    pub fn symbol(&self) -> String {
        match (&self.tag, &self.class) {
            (Some(tag), Some(class)) => format!("{}_{}", tag, class),
            (Some(tag), None) => tag.clone(),
            (None, _) => format!(
                "{}{}",
                ChunkKind::of(&self.token),
                self.token.chars().count()
            ),
        }
    }
}

/// One weighted interpretation of one password occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarExample {
    pub segments: Vec<Segment>,
    pub weight: f64,
}

impl GrammarExample {
    pub fn new(segments: Vec<Segment>, weight: f64) -> Self {
        Self { segments, weight }
    }

    /// The base structure: the symbols of every segment joined by spaces
    pub fn base_structure(&self) -> String {
        base_structure(&self.segments)
    }

    /// The password this example spells out
    pub fn password(&self) -> String {
        self.segments.iter().map(|s| s.token.as_str()).collect()
    }
}

pub fn base_structure(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(Segment::symbol)
        .collect::<Vec<_>>()
        .join(" ")
}
