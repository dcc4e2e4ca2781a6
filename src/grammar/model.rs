use super::{Estimator, Grammar, GrammarError, GrammarResult, TagType, GRAMMAR_FILE};
use crate::models::{base_structure, GrammarExample, Segment};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Base structure x terminal grammar.
///
/// `P(password) = P(base structure) * prod_i P(token_i | symbol_i)`. Base
/// structures are always estimated by maximum likelihood; terminals use
/// the configured estimator, Laplace smoothing over every token registered
/// for the symbol (observed or seeded through the vocabulary).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemanticGrammar {
    estimator: Estimator,
    tagtype: TagType,
    base_structures: FxHashMap<String, f64>,
    terminals: FxHashMap<String, FxHashMap<String, f64>>,
    #[serde(skip)]
    base_total: f64,
    #[serde(skip)]
    terminal_totals: FxHashMap<String, f64>,
}

/// Cumulative weights over a key-sorted table, for seeded draws.
struct Distribution<'a> {
    items: Vec<(&'a str, f64)>,
    cumulative: Vec<f64>,
}

impl<'a> Distribution<'a> {
    fn new(table: &'a FxHashMap<String, f64>, smoothing: f64) -> Self {
        let mut items: Vec<(&str, f64)> = table
            .iter()
            .map(|(k, &v)| (k.as_str(), v + smoothing))
            .filter(|(_, v)| *v > 0.0)
            .collect();
        items.sort_by(|a, b| a.0.cmp(b.0));

        let mut running = 0.0;
        let cumulative = items
            .iter()
            .map(|(_, w)| {
                running += w;
                running
            })
            .collect();
        Self { items, cumulative }
    }

    fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    fn draw(&self, rng: &mut ChaCha8Rng) -> Option<(&'a str, f64)> {
        let total = self.total();
        if total <= 0.0 {
            return None;
        }
        let target = rng.random::<f64>() * total;
        let idx = self
            .cumulative
            .partition_point(|&c| c <= target)
            .min(self.items.len() - 1);
        let (item, weight) = self.items[idx];
        Some((item, weight / total))
    }
}

impl SemanticGrammar {
    pub fn new(estimator: Estimator, tagtype: TagType) -> Self {
        Self {
            estimator,
            tagtype,
            ..Self::default()
        }
    }

    pub fn estimator(&self) -> Estimator {
        self.estimator
    }

    pub fn tagtype(&self) -> TagType {
        self.tagtype
    }

    /// Number of distinct base structures.
    pub fn len(&self) -> usize {
        self.base_structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base_structures.is_empty()
    }

    /// Number of tokens registered for a symbol.
    pub fn vocabulary_size(&self, symbol: &str) -> usize {
        self.terminals.get(symbol).map_or(0, FxHashMap::len)
    }

    fn smoothing(&self) -> f64 {
        match self.estimator {
            Estimator::Mle => 0.0,
            Estimator::Laplace => 1.0,
        }
    }

    fn base_probability(&self, structure: &str) -> f64 {
        if self.base_total <= 0.0 {
            return 0.0;
        }
        self.base_structures.get(structure).copied().unwrap_or(0.0) / self.base_total
    }

    fn terminal_probability(&self, symbol: &str, token: &str) -> f64 {
        let Some(table) = self.terminals.get(symbol) else {
            return 0.0;
        };
        let Some(&count) = table.get(token) else {
            return 0.0;
        };
        let total = self.terminal_totals.get(symbol).copied().unwrap_or(0.0);
        let smoothing = self.smoothing();
        let denominator = total + smoothing * table.len() as f64;
        if denominator <= 0.0 {
            return 0.0;
        }
        (count + smoothing) / denominator
    }

    fn refresh_totals(&mut self) {
        self.base_total = self.base_structures.values().sum();
        self.terminal_totals = self
            .terminals
            .iter()
            .map(|(symbol, table)| (symbol.clone(), table.values().sum()))
            .collect();
    }

    pub fn load(dir: &Path) -> GrammarResult<Self> {
        let path = dir.join(GRAMMAR_FILE);
        let file = File::open(&path).map_err(|source| GrammarError::Io {
            path: path.clone(),
            source,
        })?;
        let mut grammar: Self = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| GrammarError::Format { path: path.clone(), source })?;
        grammar.refresh_totals();
        info!(
            "Loaded grammar from {}: {} base structures, {} symbols",
            path.display(),
            grammar.base_structures.len(),
            grammar.terminals.len()
        );
        Ok(grammar)
    }
}

impl Grammar for SemanticGrammar {
    fn add_vocabulary(&mut self, entries: &[Segment]) {
        for entry in entries {
            self.terminals
                .entry(entry.symbol())
                .or_default()
                .entry(entry.token.clone())
                .or_insert(0.0);
        }
        debug!("Seeded grammar with {} vocabulary entries", entries.len());
    }

    fn fit(&mut self, examples: &[GrammarExample]) {
        for example in examples {
            *self
                .base_structures
                .entry(example.base_structure())
                .or_insert(0.0) += example.weight;
            for segment in &example.segments {
                *self
                    .terminals
                    .entry(segment.symbol())
                    .or_default()
                    .entry(segment.token.clone())
                    .or_insert(0.0) += example.weight;
            }
        }
        self.refresh_totals();
        info!(
            "Grammar fitted on {} examples: {} base structures, {} symbols",
            examples.len(),
            self.base_structures.len(),
            self.terminals.len()
        );
    }

    fn probability(&self, segments: &[Segment]) -> f64 {
        if segments.is_empty() {
            return 0.0;
        }
        let mut p = self.base_probability(&base_structure(segments));
        for segment in segments {
            if p == 0.0 {
                break;
            }
            p *= self.terminal_probability(&segment.symbol(), &segment.token);
        }
        p
    }

    fn sample(&self, n: usize, seed: u64) -> GrammarResult<Vec<(String, f64)>> {
        let bases = Distribution::new(&self.base_structures, 0.0);
        if bases.total() <= 0.0 {
            return Err(GrammarError::Empty);
        }
        let smoothing = self.smoothing();
        let terminals: FxHashMap<&str, Distribution> = self
            .terminals
            .iter()
            .map(|(symbol, table)| (symbol.as_str(), Distribution::new(table, smoothing)))
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut samples = Vec::with_capacity(n);
        let max_attempts = n.saturating_mul(100).max(1000);
        let mut attempts = 0usize;
        while samples.len() < n && attempts < max_attempts {
            attempts += 1;
            let Some((structure, mut p)) = bases.draw(&mut rng) else {
                break;
            };
            let mut password = String::new();
            for symbol in structure.split(' ') {
                match terminals.get(symbol).and_then(|d| d.draw(&mut rng)) {
                    Some((token, q)) => {
                        password.push_str(token);
                        p *= q;
                    }
                    None => {
                        p = 0.0;
                        break;
                    }
                }
            }
            if p > 0.0 {
                samples.push((password, p));
            } else {
                debug!("Skipping sample from structure without terminals: {}", structure);
            }
        }
        if samples.len() < n {
            warn!("Generated only {} of {} passwords", samples.len(), n);
        }
        Ok(samples)
    }

    fn save(&self, dir: &Path) -> GrammarResult<()> {
        std::fs::create_dir_all(dir).map_err(|source| GrammarError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(GRAMMAR_FILE);
        let file = File::create(&path).map_err(|source| GrammarError::Io {
            path: path.clone(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)
            .map_err(|source| GrammarError::Format { path: path.clone(), source })?;
        writer.flush().map_err(|source| GrammarError::Io {
            path: path.clone(),
            source,
        })?;
        info!("Grammar written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClassId;

    fn seg(token: &str, tag: Option<&str>, class: Option<&str>) -> Segment {
        Segment::new(token, tag.map(String::from), class.map(ClassId::from))
    }

    fn fitted(estimator: Estimator) -> SemanticGrammar {
        let mut g = SemanticGrammar::new(estimator, TagType::Backoff);
        g.fit(&[
            GrammarExample::new(vec![seg("dog", Some("nn1"), Some("animal")), seg("123", None, None)], 3.0),
            GrammarExample::new(vec![seg("cat", Some("nn1"), Some("animal")), seg("123", None, None)], 1.0),
            GrammarExample::new(vec![seg("love", Some("vv0"), None)], 4.0),
        ]);
        g
    }

    #[test]
    fn test_mle_probability() {
        let g = fitted(Estimator::Mle);
        let p = g.probability(&[seg("dog", Some("nn1"), Some("animal")), seg("123", None, None)]);
        // P(base) = 4/8, P(dog | nn1_animal) = 3/4, P(123 | digits3) = 1
        assert!((p - 0.375).abs() < 1e-12);
        assert_eq!(g.probability(&[seg("owl", Some("nn1"), Some("animal"))]), 0.0);
        assert_eq!(g.probability(&[]), 0.0);
    }

    #[test]
    fn test_laplace_gives_seeded_words_mass() {
        let mut g = SemanticGrammar::new(Estimator::Laplace, TagType::Backoff);
        g.add_vocabulary(&[seg("owl", Some("nn1"), Some("animal"))]);
        g.fit(&[GrammarExample::new(
            vec![seg("dog", Some("nn1"), Some("animal")), seg("123", None, None)],
            2.0,
        )]);
        assert_eq!(g.vocabulary_size("nn1_animal"), 2);

        let owl = g.probability(&[seg("owl", Some("nn1"), Some("animal")), seg("123", None, None)]);
        // (0 + 1) / (2 + 2) * (2 + 1) / (2 + 1)
        assert!((owl - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_sampling_is_seeded_and_consistent() {
        let g = fitted(Estimator::Mle);
        let a = g.sample(50, 7).unwrap();
        let b = g.sample(50, 7).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 50);

        let expected: FxHashMap<&str, f64> =
            [("dog123", 0.375), ("cat123", 0.125), ("love", 0.5)].into_iter().collect();
        for (password, p) in &a {
            assert!((expected[password.as_str()] - p).abs() < 1e-12, "{}", password);
        }
    }

    #[test]
    fn test_sampling_empty_grammar_fails() {
        let g = SemanticGrammar::new(Estimator::Mle, TagType::Pos);
        assert!(matches!(g.sample(3, 1), Err(GrammarError::Empty)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let g = fitted(Estimator::Laplace);
        g.save(dir.path()).unwrap();

        let loaded = SemanticGrammar::load(dir.path()).unwrap();
        assert_eq!(loaded.estimator(), Estimator::Laplace);
        assert_eq!(loaded.len(), 2);
        let query = [seg("love", Some("vv0"), None)];
        assert!((loaded.probability(&query) - g.probability(&query)).abs() < 1e-12);
    }
}
