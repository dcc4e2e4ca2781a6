//! Scoring of raw passwords against a trained grammar
//!
//! A password goes through the same chunk, tag and generalize steps as
//! training data. Its probability is that of its most probable
//! interpretation.

use super::{interpret, Grammar, SemanticGrammar, NOUN_TREECUT_FILE, VERB_TREECUT_FILE};
use crate::resources::Resources;
use crate::semantic::{Generalizer, MdlTreeCut};
use crate::tag::pos_tag;
use crate::models::Segment;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

pub struct Scorer<G: Grammar> {
    resources: Resources,
    generalizer: Option<Generalizer>,
    grammar: G,
}

impl Scorer<SemanticGrammar> {
    /// Load a grammar directory written by the training pipeline.
    pub fn load(dir: &Path, resources: Resources) -> Result<Self> {
        let grammar = SemanticGrammar::load(dir)?;
        let generalizer = if grammar.tagtype().is_semantic() {
            let noun = MdlTreeCut::load(&dir.join(NOUN_TREECUT_FILE))?;
            let verb = MdlTreeCut::load(&dir.join(VERB_TREECUT_FILE))?;
            Some(Generalizer::new(
                resources.resolver.clone(),
                Arc::new(noun),
                Arc::new(verb),
            ))
        } else {
            None
        };
        Ok(Self::new(resources, generalizer, grammar))
    }
}

impl<G: Grammar> Scorer<G> {
    pub fn new(resources: Resources, generalizer: Option<Generalizer>, grammar: G) -> Self {
        Self {
            resources,
            generalizer,
            grammar,
        }
    }

    pub fn grammar(&self) -> &G {
        &self.grammar
    }

    /// Every interpretation of a password, in cross-product order.
    ///
    /// Passwords the training pipeline would drop have none, and score 0.
    pub fn interpretations(&self, password: &str) -> Result<Vec<Vec<Segment>>> {
        let password = password.to_lowercase();
        let chunks = self.resources.chunker.chunk(&password);
        let tagged = pos_tag(
            &chunks,
            self.resources.tagger.as_ref(),
            self.resources.blacklist.as_ref(),
        )
        .with_context(|| format!("Failed to tag '{}'", password))?;

        let candidates = match &self.generalizer {
            Some(g) => tagged.iter().map(|c| g.classes(c)).collect(),
            None => vec![vec![None]; tagged.len()],
        };
        Ok(interpret(&tagged, &candidates))
    }

    /// Probability of the most probable interpretation, or 0.
    pub fn score(&self, password: &str) -> Result<f64> {
        Ok(self
            .interpretations(password)?
            .iter()
            .map(|segments| self.grammar.probability(segments))
            .fold(0.0, f64::max))
    }
}
