//! Grammar training pipeline
//!
//! Orchestrates training from a raw password list:
//! 1. Tally, chunk and POS tag passwords (bounded work queue)
//! 2. Count senses over the taxonomies and fit the tree cuts (static shares)
//! 3. Expand passwords into weighted examples and fit the grammar
//!
//! Nothing is written until every stage has succeeded; see
//! [`TrainedModel::save`].

pub mod stages;
mod tally;

pub use tally::tally;

use crate::config::TrainConfig;
use crate::grammar::vocab::{noun_vocabulary, verb_vocabulary};
use crate::grammar::{
    Estimator, Grammar, SemanticGrammar, NOUN_TREECUT_FILE, VERB_TREECUT_FILE,
};
use crate::resources::Resources;
use crate::semantic::{Generalizer, MdlFitter, MdlTreeCut, TreeCutFitter, TreeCutModel};
use anyhow::{Context, Result};
use std::fmt;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Pipeline stage, reported to progress observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Tagging,
    TreeCut,
    Examples,
    Grammar,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Tagging => "counting, chunking and POS tagging",
            Stage::TreeCut => "training tree cut models",
            Stage::Examples => "building grammar examples",
            Stage::Grammar => "fitting grammar",
        };
        f.write_str(name)
    }
}

type StageObserver = Box<dyn Fn(Stage) + Send + Sync>;

/// Grammar training pipeline.
pub struct TrainingPipeline {
    resources: Resources,
    config: TrainConfig,
    workers: usize,
    observer: Option<StageObserver>,
}

impl TrainingPipeline {
    pub fn new(resources: Resources, config: TrainConfig) -> Self {
        Self {
            resources,
            config,
            workers: 2,
            observer: None,
        }
    }

    /// Set the number of worker threads (at least one).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Call `observer` as each stage starts.
    pub fn on_stage(mut self, observer: impl Fn(Stage) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    fn enter(&self, stage: Stage) -> Instant {
        info!("{}...", stage);
        if let Some(observer) = &self.observer {
            observer(stage);
        }
        Instant::now()
    }

    /// Train on a newline-separated password list.
    pub fn run<R: BufRead>(&self, input: R) -> Result<TrainedModel> {
        let mut stats = TrainStats::default();
        let semantic = self.config.tagtype.is_semantic();

        // Stage 1
        let started = self.enter(Stage::Tagging);
        let records = tally(input, true)?;
        stats.distinct = records.len();
        stats.occurrences = records.iter().map(|r| r.count).sum();
        let corpus = stages::chunk_and_tag(
            records,
            &self.resources,
            self.workers,
            self.config.batch_size,
        )?;
        stats.unchunkable = corpus.unchunkable;
        stats.record(Stage::Tagging, started.elapsed());

        // Stage 2
        let (noun_model, verb_model) = if semantic {
            let started = self.enter(Stage::TreeCut);
            let nouns = self
                .resources
                .noun_taxonomy
                .as_deref()
                .context("Noun taxonomy is not loaded")?;
            let verbs = self
                .resources
                .verb_taxonomy
                .as_deref()
                .context("Verb taxonomy is not loaded")?;
            let (noun_counts, verb_counts) = stages::accumulate_senses(
                &corpus.passwords,
                &self.resources.resolver,
                nouns,
                verbs,
                self.workers,
            )?;

            // Specificity only refines nouns; the verb hierarchy is shallow
            let noun_fitter = MdlFitter {
                estimator: self.config.estimator,
                specificity: self.config.specificity,
            };
            let verb_fitter = MdlFitter {
                estimator: self.config.estimator,
                specificity: None,
            };
            let models = (
                Arc::new(noun_fitter.fit(nouns, &noun_counts)),
                Arc::new(verb_fitter.fit(verbs, &verb_counts)),
            );
            stats.record(Stage::TreeCut, started.elapsed());
            (Some(models.0), Some(models.1))
        } else {
            (None, None)
        };

        let mut grammar = SemanticGrammar::new(self.config.estimator, self.config.tagtype);
        if self.config.estimator == Estimator::Laplace {
            stats.vocabulary = self.seed_vocabulary(
                &mut grammar,
                noun_model.as_deref(),
                verb_model.as_deref(),
            )?;
        }

        // Stage 3
        let started = self.enter(Stage::Examples);
        let generalizer = match (&noun_model, &verb_model) {
            (Some(noun), Some(verb)) => Some(Generalizer::new(
                self.resources.resolver.clone(),
                Arc::clone(noun) as Arc<dyn TreeCutModel>,
                Arc::clone(verb) as Arc<dyn TreeCutModel>,
            )),
            _ => None,
        };
        let set = stages::build_examples(&corpus.passwords, generalizer.as_ref(), self.workers)?;
        drop(corpus);
        stats.examples = set.examples.len();
        stats.dropped = set.dropped;
        stats.record(Stage::Examples, started.elapsed());

        let started = self.enter(Stage::Grammar);
        grammar.fit(&set.examples);
        stats.record(Stage::Grammar, started.elapsed());

        info!("Training done: {}", stats.summary());
        Ok(TrainedModel {
            grammar,
            noun_model,
            verb_model,
            stats,
        })
    }

    fn seed_vocabulary(
        &self,
        grammar: &mut SemanticGrammar,
        noun_model: Option<&MdlTreeCut>,
        verb_model: Option<&MdlTreeCut>,
    ) -> Result<usize> {
        let inventory = self.resources.resolver.inventory();
        let tagger = self.resources.tagger.as_ref();
        let nouns = noun_vocabulary(
            inventory,
            noun_model.map(|m| m as &dyn TreeCutModel),
            tagger,
            self.config.vocab_min_noun_length,
        )?;
        let verbs = verb_vocabulary(
            inventory,
            verb_model.map(|m| m as &dyn TreeCutModel),
            tagger,
            self.config.vocab_min_verb_length,
        )?;
        grammar.add_vocabulary(&nouns);
        grammar.add_vocabulary(&verbs);
        Ok(nouns.len() + verbs.len())
    }
}

/// Output of a training run
pub struct TrainedModel {
    pub grammar: SemanticGrammar,
    pub noun_model: Option<Arc<MdlTreeCut>>,
    pub verb_model: Option<Arc<MdlTreeCut>>,
    pub stats: TrainStats,
}

impl TrainedModel {
    /// Write `grammar.json` and, in semantic mode, both tree-cut models.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        self.grammar.save(dir)?;
        if let Some(model) = &self.noun_model {
            model.save(&dir.join(NOUN_TREECUT_FILE))?;
        }
        if let Some(model) = &self.verb_model {
            model.save(&dir.join(VERB_TREECUT_FILE))?;
        }
        info!("Model written to {}", dir.display());
        Ok(())
    }
}

/// Statistics from a training run.
#[derive(Debug, Default, Clone)]
pub struct TrainStats {
    /// Distinct passwords
    pub distinct: usize,
    /// Total password occurrences
    pub occurrences: u64,
    /// Passwords the chunker could not split
    pub unchunkable: usize,
    /// Vocabulary entries seeded before fitting
    pub vocabulary: usize,
    /// Grammar examples fitted
    pub examples: usize,
    /// Passwords that produced no example
    pub dropped: usize,
    pub timings: Vec<(Stage, Duration)>,
}

impl TrainStats {
    fn record(&mut self, stage: Stage, elapsed: Duration) {
        info!("Done {} in {:.2?}", stage, elapsed);
        self.timings.push((stage, elapsed));
    }

    pub fn elapsed(&self) -> Duration {
        self.timings.iter().map(|(_, d)| *d).sum()
    }

    /// Get a summary string.
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("{} passwords", self.distinct),
            format!("{} occurrences", self.occurrences),
            format!("{} examples", self.examples),
        ];
        if self.vocabulary > 0 {
            parts.push(format!("{} vocabulary entries", self.vocabulary));
        }
        if self.dropped + self.unchunkable > 0 {
            parts.push(format!("{} dropped", self.dropped + self.unchunkable));
        }
        parts.join(", ")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::chunk::{Chunker, DigitIdioms, UnigramSegmenter};
    use crate::grammar::TagType;
    use crate::models::{ClassId, Segment, WordClass};
    use crate::semantic::{SemanticResolver, SenseTable, Taxonomy};
    use crate::tag::{LexiconTagger, PosBlacklist, Tagset, Vocabulary};
    use std::io::Cursor;

    pub(crate) const CORPUS: &str = "ilovedog\ndog123\ncat!\n123456\nlovecat\ndog123\nilovecats\nhouse1\ngivedog\nzzz\n";

    pub(crate) fn fixture_resources() -> Resources {
        let vocabulary = Arc::new(Vocabulary::from_entries([
            ("i", "ppis1", 50_000),
            ("love", "vv0", 9_000),
            ("dog", "nn1", 5_000),
            ("cat", "nn1", 4_000),
            ("cats", "nn2", 1_500),
            ("house", "nn1", 8_000),
            ("houses", "nn2", 2_000),
            ("give", "vv0", 7_000),
            ("gives", "vvz", 2_000),
            ("giving", "vvg", 2_000),
            ("gave", "vvd", 2_000),
        ]));
        let senses = Arc::new(SenseTable::from_entries([
            ("dog", WordClass::Noun, "dog.n.01"),
            ("cat", WordClass::Noun, "cat.n.01"),
            ("house", WordClass::Noun, "house.n.01"),
            ("love", WordClass::Verb, "love.v.01"),
            ("give", WordClass::Verb, "give.v.01"),
        ]));
        let nouns = Taxonomy::from_edges(
            WordClass::Noun,
            [
                ("animal.n.01", "entity.n.01"),
                ("artifact.n.01", "entity.n.01"),
                ("dog.n.01", "animal.n.01"),
                ("cat.n.01", "animal.n.01"),
                ("house.n.01", "artifact.n.01"),
            ],
        );
        let verbs = Taxonomy::from_edges(
            WordClass::Verb,
            [("love.v.01", "feel.v.01"), ("give.v.01", "transfer.v.01")],
        );
        let segmenter = UnigramSegmenter::from_counts(
            ["i", "love", "dog", "cat", "cats", "house", "give"]
                .iter()
                .map(|w| (w.to_string(), 1_000)),
        );
        Resources {
            chunker: Chunker::new(Arc::new(segmenter), Arc::new(DigitIdioms::builtin())),
            tagger: Arc::new(LexiconTagger::new(Arc::clone(&vocabulary))),
            blacklist: Some(PosBlacklist::new(vocabulary, 1000)),
            resolver: SemanticResolver::new(senses, Tagset::Claws7),
            noun_taxonomy: Some(Arc::new(nouns)),
            verb_taxonomy: Some(Arc::new(verbs)),
        }
    }

    fn train(workers: usize, config: TrainConfig) -> TrainedModel {
        TrainingPipeline::new(fixture_resources(), config)
            .with_workers(workers)
            .run(Cursor::new(CORPUS))
            .unwrap()
    }

    fn probe_segments() -> Vec<Vec<Segment>> {
        let noun = |t: &str, tag: &str, class: &str| {
            Segment::new(t, Some(tag.to_string()), Some(ClassId::from(class)))
        };
        vec![
            vec![Segment::new("dog", Some("nn1".into()), None), Segment::new("123", None, None)],
            vec![noun("dog", "nn1", "dog.n.01"), Segment::new("123", None, None)],
            vec![noun("dog", "nn1", "animal.n.01"), Segment::new("123", None, None)],
            vec![Segment::new("123456", None, None)],
        ]
    }

    #[test]
    fn test_training_is_independent_of_worker_count() {
        let config = TrainConfig {
            batch_size: 2,
            ..TrainConfig::default()
        };
        let baseline = train(1, config.clone());
        for workers in [2, 3, 8] {
            let model = train(workers, config.clone());
            assert_eq!(model.stats.examples, baseline.stats.examples);
            assert_eq!(model.stats.dropped, baseline.stats.dropped);
            assert_eq!(
                model.noun_model.as_ref().unwrap().cut(),
                baseline.noun_model.as_ref().unwrap().cut()
            );
            for segments in probe_segments() {
                let a = model.grammar.probability(&segments);
                let b = baseline.grammar.probability(&segments);
                assert!((a - b).abs() < 1e-12, "{} workers: {} vs {}", workers, a, b);
            }
        }
    }

    #[test]
    fn test_stats_account_for_every_password() {
        let model = train(2, TrainConfig::default());
        assert_eq!(model.stats.distinct, 9);
        assert_eq!(model.stats.occurrences, 10);
        assert!(model.stats.examples >= model.stats.distinct - model.stats.dropped);
        assert_eq!(model.stats.timings.len(), 4);
        assert!(model.stats.summary().contains("9 passwords"));
    }

    #[test]
    fn test_tag_only_training_skips_tree_cuts() {
        let config = TrainConfig {
            tagtype: TagType::Pos,
            ..TrainConfig::default()
        };
        let model = train(3, config);
        assert!(model.noun_model.is_none());
        assert_eq!(model.stats.timings.len(), 3);

        let dog123 = [Segment::new("dog", Some("nn1".into()), None), Segment::new("123", None, None)];
        assert!(model.grammar.probability(&dog123) > 0.0);
    }

    #[test]
    fn test_laplace_seeds_vocabulary() {
        let config = TrainConfig {
            estimator: Estimator::Laplace,
            ..TrainConfig::default()
        };
        let model = train(2, config);
        assert!(model.stats.vocabulary > 0);
    }

    #[test]
    fn test_save_writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let model = train(2, TrainConfig::default());
        model.save(dir.path()).unwrap();
        for file in ["grammar.json", NOUN_TREECUT_FILE, VERB_TREECUT_FILE] {
            assert!(dir.path().join(file).exists(), "{} missing", file);
        }

        let loaded = SemanticGrammar::load(dir.path()).unwrap();
        assert_eq!(loaded.len(), model.grammar.len());
    }
}
