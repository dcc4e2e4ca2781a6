//! Tree-cut models
//!
//! A tree cut is a set of taxonomy nodes covering every leaf exactly once.
//! Each sense generalizes to the cut node(s) above it. The cut is chosen by
//! minimum description length (Li & Abe, 1998): a subtree is collapsed into
//! its root whenever describing it as one class is cheaper than describing
//! the best cut of its children.
//!
//! ```text
//! L(cut) = w * (|cut| / 2) * log2(S)  -  sum_C f(C) * log2(P(C) / |C|)
//! ```
//!
//! `S` is the total sample size, `|C|` the number of leaves under `C` and `w`
//! the inverse of the requested specificity.

use super::aggregate::LeafCounts;
use super::taxonomy::{NodeId, Taxonomy};
use crate::grammar::Estimator;
use crate::models::{ClassId, Sense, WordClass};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Generalizes a sense to zero or more coarser classes.
pub trait TreeCutModel: Send + Sync {
    fn predict(&self, sense: &Sense) -> Vec<ClassId>;
}

/// Fits a [`TreeCutModel`] to a populated taxonomy.
pub trait TreeCutFitter: Send + Sync {
    type Model: TreeCutModel;

    fn fit(&self, taxonomy: &Taxonomy, counts: &LeafCounts) -> Self::Model;
}

/// Minimum description length fitting parameters.
#[derive(Debug, Clone, Copy)]
pub struct MdlFitter {
    pub estimator: Estimator,
    pub specificity: Option<f64>,
}

impl TreeCutFitter for MdlFitter {
    type Model = MdlTreeCut;

    fn fit(&self, taxonomy: &Taxonomy, counts: &LeafCounts) -> MdlTreeCut {
        MdlTreeCut::fit(taxonomy, counts, self.estimator, self.specificity)
    }
}

/// A fitted MDL tree cut, stored as a sense key -> classes table so that it
/// can be used without the taxonomy it was fitted on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MdlTreeCut {
    class: WordClass,
    cut: Vec<String>,
    classes: HashMap<String, Vec<ClassId>>,
}

struct CutSearch<'a> {
    taxonomy: &'a Taxonomy,
    totals: Vec<f64>,
    sizes: Vec<usize>,
    sample: f64,
    leaves: f64,
    estimator: Estimator,
    param_weight: f64,
}

impl CutSearch<'_> {
    fn parameter_length(&self, k: usize) -> f64 {
        if self.sample <= 1.0 {
            return 0.0;
        }
        self.param_weight * (k as f64 / 2.0) * self.sample.log2()
    }

    fn data_length(&self, node: NodeId) -> f64 {
        let f = self.totals[node];
        if f <= 0.0 {
            return 0.0;
        }
        let size = self.sizes[node].max(1) as f64;
        let p = match self.estimator {
            Estimator::Mle => f / self.sample,
            Estimator::Laplace => (f + size) / (self.sample + self.leaves),
        };
        -f * (p / size).log2()
    }

    /// Best cut of the subtree at `node`, with its data description length.
    fn find(&self, node: NodeId) -> (Vec<NodeId>, f64) {
        let children = &self.taxonomy.node(node).children;
        if children.is_empty() {
            return (vec![node], self.data_length(node));
        }

        let mut cut = Vec::new();
        let mut data = 0.0;
        for &child in children {
            let (child_cut, child_data) = self.find(child);
            cut.extend(child_cut);
            data += child_data;
        }

        let collapsed = self.parameter_length(1) + self.data_length(node);
        let split = self.parameter_length(cut.len()) + data;
        if collapsed < split {
            (vec![node], self.data_length(node))
        } else {
            (cut, data)
        }
    }
}

impl MdlTreeCut {
    /// Fit a cut over a taxonomy populated with `counts`.
    ///
    /// `specificity` > 1 lowers the parameter cost and yields finer classes.
    pub fn fit(
        taxonomy: &Taxonomy,
        counts: &LeafCounts,
        estimator: Estimator,
        specificity: Option<f64>,
    ) -> Self {
        let param_weight = match specificity {
            Some(s) if s > 0.0 => 1.0 / s,
            _ => 1.0,
        };
        let totals = taxonomy.cumulative(counts.values());
        let search = CutSearch {
            taxonomy,
            sample: totals[taxonomy.root()],
            totals,
            sizes: taxonomy.leaf_sizes(),
            leaves: taxonomy.leaf_count() as f64,
            estimator,
            param_weight,
        };

        let (cut_nodes, data) = search.find(taxonomy.root());
        debug!(
            "{:?} tree cut: {} classes, data length {:.1} bits",
            taxonomy.class(),
            cut_nodes.len(),
            data
        );

        let mut in_cut = vec![false; taxonomy.len()];
        for &node in &cut_nodes {
            in_cut[node] = true;
        }

        let mut classes: HashMap<String, Vec<ClassId>> = HashMap::new();
        for key in taxonomy.keys() {
            let mut found: Vec<ClassId> = Vec::new();
            for &node in taxonomy.nodes_for(key) {
                let mut current = Some(taxonomy.terminal(node));
                while let Some(id) = current {
                    if in_cut[id] {
                        let class = ClassId(taxonomy.node(id).key.clone());
                        if !found.contains(&class) {
                            found.push(class);
                        }
                        break;
                    }
                    current = taxonomy.node(id).parent;
                }
            }
            classes.insert(key.to_string(), found);
        }

        info!(
            "Fitted {:?} tree cut: {} classes over {} senses (sample size {:.1})",
            taxonomy.class(),
            cut_nodes.len(),
            classes.len(),
            search.sample
        );

        Self {
            class: taxonomy.class(),
            cut: cut_nodes
                .iter()
                .map(|&n| taxonomy.node(n).key.clone())
                .collect(),
            classes,
        }
    }

    pub fn class(&self) -> WordClass {
        self.class
    }

    /// Keys of the nodes forming the cut, in leaf order.
    pub fn cut(&self) -> &[String] {
        &self.cut
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = bitcode::serialize(self).context("Failed to encode tree cut model")?;
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write tree cut model to {}", path.display()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read tree cut model {}", path.display()))?;
        bitcode::deserialize(&bytes)
            .with_context(|| format!("Invalid tree cut model {}", path.display()))
    }
}

impl TreeCutModel for MdlTreeCut {
    fn predict(&self, sense: &Sense) -> Vec<ClassId> {
        self.classes.get(&sense.key).cloned().unwrap_or_default()
    }
}
