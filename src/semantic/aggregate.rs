//! Weighted sense counts over a taxonomy
//!
//! A sense occurrence is spread evenly over every node carrying its key.
//! Internal nodes hand their share to their `s.<key>` child, so the count
//! always lands on a leaf and "this sense occurred" stays distinct from "a
//! hyponym occurred".

use super::taxonomy::Taxonomy;

/// Leaf frequency vector of one taxonomy, in the taxonomy's leaf order.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafCounts {
    values: Vec<f64>,
}

impl LeafCounts {
    pub fn zeros(taxonomy: &Taxonomy) -> Self {
        Self {
            values: vec![0.0; taxonomy.leaf_count()],
        }
    }

    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Add `weight` occurrences of the sense `key`.
    ///
    /// Returns the number of nodes the weight was split across; zero when
    /// the key is not in the taxonomy, in which case nothing is recorded.
    pub fn increment(&mut self, taxonomy: &Taxonomy, key: &str, weight: f64) -> usize {
        let nodes = taxonomy.nodes_for(key);
        if nodes.is_empty() {
            return 0;
        }
        let share = weight / nodes.len() as f64;
        for &node in nodes {
            let leaf = taxonomy.terminal(node);
            if let Some(pos) = taxonomy.leaf_position(leaf) {
                self.values[pos] += share;
            }
        }
        nodes.len()
    }
}
