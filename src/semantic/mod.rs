//! Semantic generalization of tagged chunks
//!
//! A tagged token resolves to its most frequent sense, and a fitted tree
//! cut generalizes that sense to one or more coarser classes. Counting
//! senses over the taxonomy is what the tree cut is fitted on.

mod aggregate;
mod resolver;
mod taxonomy;
mod treecut;

pub use aggregate::LeafCounts;
pub use resolver::{
    base_forms, SemanticResolver, SenseInventory, SenseTable, MIN_NOUN_LENGTH, MIN_VERB_LENGTH,
};
pub use taxonomy::{ConceptNode, NodeId, Taxonomy, ROOT_KEY};
pub use treecut::{MdlFitter, MdlTreeCut, TreeCutFitter, TreeCutModel};

use crate::models::{ClassId, TaggedChunk, WordClass};
use std::sync::Arc;

/// Resolves tagged chunks to their candidate semantic classes.
#[derive(Clone)]
pub struct Generalizer {
    resolver: SemanticResolver,
    noun_model: Arc<dyn TreeCutModel>,
    verb_model: Arc<dyn TreeCutModel>,
}

impl Generalizer {
    pub fn new(
        resolver: SemanticResolver,
        noun_model: Arc<dyn TreeCutModel>,
        verb_model: Arc<dyn TreeCutModel>,
    ) -> Self {
        Self {
            resolver,
            noun_model,
            verb_model,
        }
    }

    /// Candidate classes of one chunk, first occurrence order, no repeats.
    ///
    /// A chunk without a noun or verb sense yields `[None]`. A sense the
    /// tree cut does not know yields an empty list, which makes the whole
    /// password uninterpretable.
    pub fn classes(&self, chunk: &TaggedChunk) -> Vec<Option<ClassId>> {
        let Some(sense) = self.resolver.resolve(&chunk.text, chunk.tag.as_deref()) else {
            return vec![None];
        };
        let predicted = match sense.class {
            WordClass::Noun => self.noun_model.predict(&sense),
            WordClass::Verb => self.verb_model.predict(&sense),
            _ => return vec![None],
        };

        let mut classes: Vec<Option<ClassId>> = Vec::with_capacity(predicted.len());
        for class in predicted {
            let class = Some(class);
            if !classes.contains(&class) {
                classes.push(class);
            }
        }
        classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sense;
    use crate::tag::Tagset;

    struct FixedModel(Vec<(&'static str, Vec<&'static str>)>);

    impl TreeCutModel for FixedModel {
        fn predict(&self, sense: &Sense) -> Vec<ClassId> {
            self.0
                .iter()
                .find(|(key, _)| *key == sense.key)
                .map(|(_, classes)| classes.iter().map(|c| ClassId::from(*c)).collect())
                .unwrap_or_default()
        }
    }

    fn generalizer() -> Generalizer {
        let table = SenseTable::from_entries([
            ("dog", WordClass::Noun, "dog.n.01"),
            ("love", WordClass::Verb, "love.v.01"),
            ("happy", WordClass::Adjective, "happy.a.01"),
            ("ghost", WordClass::Noun, "ghost.n.01"),
        ]);
        let resolver = SemanticResolver::new(Arc::new(table), Tagset::Claws7);
        Generalizer::new(
            resolver,
            Arc::new(FixedModel(vec![("dog.n.01", vec!["animal.n.01", "toy.n.01", "animal.n.01"])])),
            Arc::new(FixedModel(vec![("love.v.01", vec!["feel.v.01"])])),
        )
    }

    #[test]
    fn test_classes_are_deduplicated_in_order() {
        let g = generalizer();
        let classes = g.classes(&TaggedChunk::new("dog", Some("nn1")));
        assert_eq!(
            classes,
            vec![Some(ClassId::from("animal.n.01")), Some(ClassId::from("toy.n.01"))]
        );
    }

    #[test]
    fn test_unresolved_and_non_generalized_chunks() {
        let g = generalizer();
        assert_eq!(g.classes(&TaggedChunk::untagged("123")), vec![None]);
        assert_eq!(g.classes(&TaggedChunk::new("happy", Some("jj"))), vec![None]);
        assert_eq!(
            g.classes(&TaggedChunk::new("love", Some("vv0"))),
            vec![Some(ClassId::from("feel.v.01"))]
        );
        assert!(g.classes(&TaggedChunk::new("ghost", Some("nn1"))).is_empty());
    }
}
