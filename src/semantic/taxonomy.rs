//! Concept taxonomy arena
//!
//! The sense hierarchy is a DAG: a sense can have several hypernyms. It is
//! expanded into a tree with one node per inheritance path, so a single
//! sense key can own several nodes. Nodes live in a flat arena addressed by
//! [`NodeId`]; `index` maps a sense key to all of its nodes.
//!
//! Every internal node gets a first child `s.<key>` that stands for the
//! sense itself, as opposed to its hyponyms. Counts are only ever stored on
//! leaves, so the leaf vector fully describes a populated taxonomy.
//!
//! Nodes are created in preorder, so a child's id is always greater than its
//! parent's. Bottom-up passes simply walk the arena backwards.

use crate::models::WordClass;
use crate::resources::{read_tsv, ResourceResult};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::Path;
use tracing::info;

pub type NodeId = usize;

pub const ROOT_KEY: &str = "<root>";
const SELF_PREFIX: &str = "s.";

#[derive(Debug, Clone)]
pub struct ConceptNode {
    pub key: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// True for the `s.<key>` child standing for its parent's own sense
    pub is_self: bool,
}

#[derive(Debug, Clone)]
pub struct Taxonomy {
    class: WordClass,
    nodes: Vec<ConceptNode>,
    index: FxHashMap<String, Vec<NodeId>>,
    /// Leaf node ids in preorder; this is the fixed leaf order
    leaves: Vec<NodeId>,
    /// Position of each node in `leaves`, if it is a leaf
    leaf_position: Vec<Option<usize>>,
}

impl Taxonomy {
    /// Build from `(child, parent)` hypernym edges. Keys that never appear
    /// as a child hang directly under a synthetic root.
    pub fn from_edges<'a>(class: WordClass, edges: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut children: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
        let mut has_parent: FxHashSet<&str> = FxHashSet::default();
        let mut keys: Vec<&str> = Vec::new();
        let mut seen: FxHashSet<&str> = FxHashSet::default();

        for (child, parent) in edges {
            for key in [parent, child] {
                if seen.insert(key) {
                    keys.push(key);
                }
            }
            let siblings = children.entry(parent).or_default();
            if !siblings.contains(&child) {
                siblings.push(child);
            }
            has_parent.insert(child);
        }

        let tops: Vec<&str> = keys.iter().copied().filter(|k| !has_parent.contains(k)).collect();

        let mut taxonomy = Self {
            class,
            nodes: Vec::new(),
            index: FxHashMap::default(),
            leaves: Vec::new(),
            leaf_position: Vec::new(),
        };
        let root = taxonomy.push_node(ROOT_KEY.to_string(), None, false);

        // Preorder expansion with an explicit stack; children are pushed in
        // reverse so they are visited in file order.
        let mut stack: Vec<(&str, NodeId)> = tops.iter().rev().map(|k| (*k, root)).collect();

        while let Some((key, parent)) = stack.pop() {
            let node = taxonomy.push_node(key.to_string(), Some(parent), false);
            taxonomy.index.entry(key.to_string()).or_default().push(node);

            let kids: Vec<&str> = children
                .get(key)
                .map(|kids| kids.iter().copied().filter(|k| !taxonomy.on_path(node, k)).collect())
                .unwrap_or_default();
            if !kids.is_empty() {
                taxonomy.push_node(format!("{}{}", SELF_PREFIX, key), Some(node), true);
                stack.extend(kids.iter().rev().map(|k| (*k, node)));
            }
        }

        taxonomy.index_leaves();
        taxonomy
    }

    /// Load `child<TAB>parent` hypernym edges.
    pub fn from_file(class: WordClass, path: &Path) -> ResourceResult<Self> {
        let rows = read_tsv(path, 2)?;
        let taxonomy = Self::from_edges(
            class,
            rows.iter().map(|r| (r.fields[0].as_str(), r.fields[1].as_str())),
        );
        info!(
            "Loaded {:?} taxonomy from {}: {} nodes, {} leaves",
            class,
            path.display(),
            taxonomy.len(),
            taxonomy.leaf_count()
        );
        Ok(taxonomy)
    }

    fn push_node(&mut self, key: String, parent: Option<NodeId>, is_self: bool) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(ConceptNode {
            key,
            parent,
            children: Vec::new(),
            is_self,
        });
        if let Some(p) = parent {
            self.nodes[p].children.push(id);
        }
        id
    }

    /// Whether `key` already appears on the path from `node` to the root.
    fn on_path(&self, node: NodeId, key: &str) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if self.nodes[id].key == key {
                return true;
            }
            current = self.nodes[id].parent;
        }
        false
    }

    fn index_leaves(&mut self) {
        self.leaf_position = vec![None; self.nodes.len()];
        self.leaves.clear();
        for (id, node) in self.nodes.iter().enumerate() {
            if node.children.is_empty() {
                self.leaf_position[id] = Some(self.leaves.len());
                self.leaves.push(id);
            }
        }
    }

    pub fn class(&self) -> WordClass {
        self.class
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &ConceptNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    pub fn leaf_position(&self, id: NodeId) -> Option<usize> {
        self.leaf_position[id]
    }

    /// All nodes carrying a sense key (one per inheritance path).
    pub fn nodes_for(&self, key: &str) -> &[NodeId] {
        self.index.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate over every indexed sense key.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// The `s.<key>` child of an internal node.
    pub fn self_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id]
            .children
            .first()
            .copied()
            .filter(|&c| self.nodes[c].is_self)
    }

    /// Leaf that receives the mass of a sense occurrence at `id`.
    pub fn terminal(&self, id: NodeId) -> NodeId {
        self.self_child(id).unwrap_or(id)
    }

    /// Per-node totals (each node's count plus its descendants') from a
    /// leaf count vector.
    pub fn cumulative(&self, leaf_counts: &[f64]) -> Vec<f64> {
        let mut totals = vec![0.0; self.nodes.len()];
        for (pos, &leaf) in self.leaves.iter().enumerate() {
            totals[leaf] = leaf_counts.get(pos).copied().unwrap_or(0.0);
        }
        for id in (1..self.nodes.len()).rev() {
            if let Some(parent) = self.nodes[id].parent {
                totals[parent] += totals[id];
            }
        }
        totals
    }

    /// Number of leaves under each node.
    pub fn leaf_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.nodes.len()];
        for &leaf in &self.leaves {
            sizes[leaf] = 1;
        }
        for id in (1..self.nodes.len()).rev() {
            if let Some(parent) = self.nodes[id].parent {
                sizes[parent] += sizes[id];
            }
        }
        sizes
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// entity -> animal -> {dog, cat}; entity -> artifact -> toy;
    /// dog is also a toy ("hot dog" toy, say), giving it two paths.
    pub(crate) fn sample_taxonomy() -> Taxonomy {
        Taxonomy::from_edges(
            WordClass::Noun,
            [
                ("animal", "entity"),
                ("artifact", "entity"),
                ("dog", "animal"),
                ("cat", "animal"),
                ("toy", "artifact"),
                ("dog", "toy"),
                ("puppy", "dog"),
            ],
        )
    }

    fn keys(t: &Taxonomy, ids: &[NodeId]) -> Vec<String> {
        ids.iter().map(|&id| t.node(id).key.clone()).collect()
    }

    #[test]
    fn test_multiple_inheritance_creates_several_nodes() {
        let t = sample_taxonomy();
        assert_eq!(t.nodes_for("dog").len(), 2);
        assert_eq!(t.nodes_for("cat").len(), 1);
        assert!(t.nodes_for("unicorn").is_empty());
    }

    #[test]
    fn test_self_children_and_leaf_order() {
        let t = sample_taxonomy();
        assert_eq!(
            keys(&t, t.leaves()),
            vec![
                "s.entity", "s.animal", "s.dog", "puppy", "cat", "s.artifact",
                "s.toy", "s.dog", "puppy"
            ]
        );

        let cat = t.nodes_for("cat")[0];
        assert_eq!(t.terminal(cat), cat);

        let animal = t.nodes_for("animal")[0];
        assert_eq!(t.node(t.terminal(animal)).key, "s.animal");
    }

    #[test]
    fn test_cumulative_and_sizes() {
        let t = sample_taxonomy();
        let mut counts = vec![0.0; t.leaf_count()];
        let cat = t.leaf_position(t.nodes_for("cat")[0]).unwrap();
        counts[cat] = 3.0;
        let s_dog = t.leaf_position(t.terminal(t.nodes_for("dog")[1])).unwrap();
        counts[s_dog] = 1.5;

        let totals = t.cumulative(&counts);
        assert_eq!(totals[t.root()], 4.5);
        assert_eq!(totals[t.nodes_for("animal")[0]], 3.0);
        assert_eq!(totals[t.nodes_for("artifact")[0]], 1.5);

        let sizes = t.leaf_sizes();
        assert_eq!(sizes[t.root()], t.leaf_count());
        assert_eq!(sizes[t.nodes_for("dog")[0]], 2);
    }

    #[test]
    fn test_cycles_are_cut() {
        let t = Taxonomy::from_edges(WordClass::Verb, [("a", "b"), ("b", "a"), ("c", "a")]);
        // every key has a parent, so nothing hangs under the root
        assert!(t.is_empty());
        let t = Taxonomy::from_edges(WordClass::Verb, [("b", "a"), ("a", "b"), ("a", "top")]);
        assert_eq!(t.nodes_for("a").len(), 1);
        assert_eq!(t.nodes_for("b").len(), 1);
    }
}
