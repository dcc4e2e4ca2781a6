//! Tagset conversion
//!
//! Maps fine-grained CLAWS7 or Brown tags to the coarse word classes of the
//! sense inventory, and knows which tags mark proper nouns.

use crate::models::WordClass;
use serde::Deserialize;
use std::str::FromStr;

const CLAWS7_PROPER_NOUNS: &[&str] = &["np", "np1", "np2", "npd1", "npd2", "npm1", "npm2"];
const BROWN_PROPER_NOUNS: &[&str] = &["np", "nps", "np$", "nps$", "nr", "nrs"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tagset {
    #[default]
    Claws7,
    Brown,
}

impl FromStr for Tagset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "claws7" | "claws" => Ok(Tagset::Claws7),
            "brown" => Ok(Tagset::Brown),
            other => Err(format!("unknown tagset '{}'", other)),
        }
    }
}

impl Tagset {
    pub fn is_proper_noun(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        match self {
            Tagset::Claws7 => CLAWS7_PROPER_NOUNS.contains(&tag.as_str()),
            Tagset::Brown => BROWN_PROPER_NOUNS.contains(&tag.as_str()),
        }
    }

    /// Coarse word class of a tag, or `None` for closed-class tags.
    pub fn word_class(&self, tag: &str) -> Option<WordClass> {
        let tag = tag.to_lowercase();
        match self {
            Tagset::Claws7 => claws7_word_class(&tag),
            Tagset::Brown => brown_word_class(&tag),
        }
    }
}

fn claws7_word_class(tag: &str) -> Option<WordClass> {
    match tag.chars().next()? {
        'n' => Some(WordClass::Noun),
        'v' => Some(WordClass::Verb),
        'r' => Some(WordClass::Adverb),
        'j' => Some(WordClass::Adjective),
        _ => None,
    }
}

fn brown_word_class(tag: &str) -> Option<WordClass> {
    if tag.starts_with("np") {
        return None;
    }
    if tag.starts_with("do") {
        return Some(WordClass::Verb);
    }
    if tag.starts_with("wr") {
        return Some(WordClass::Adverb);
    }
    match tag.chars().next()? {
        'n' => Some(WordClass::Noun),
        'b' | 'v' | 'h' => Some(WordClass::Verb),
        'r' => Some(WordClass::Adverb),
        'j' => Some(WordClass::Adjective),
        _ => None,
    }
}
