//! The three parallel training stages
//!
//! Chunking and tagging cost varies a lot between passwords, so Stage 1
//! pulls fixed-size batches from a bounded channel. Stages 2 and 3 are
//! cheap per password and split the input into equal contiguous shares.
//!
//! ```text
//! Stage 1:  producer --[bounded(workers)]--> worker x N --> Mutex<results>
//! Stage 2:  [share 0 | share 1 | ... ] --> per-worker key tallies --> leaf counts
//! Stage 3:  [share 0 | share 1 | ... ] --> per-worker examples --> concat
//! ```

use crate::grammar::{expand, tag_only_example};
use crate::models::{GrammarExample, PasswordRecord, TaggedPassword, WordClass};
use crate::resources::Resources;
use crate::semantic::{Generalizer, LeafCounts, SemanticResolver, Taxonomy};
use crate::tag::pos_tag;
use anyhow::{anyhow, Context, Result};
use crossbeam_channel::bounded;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread::{self, ScopedJoinHandle};
use tracing::{debug, info};

/// Workers log their progress every this many passwords
pub const PROGRESS_INTERVAL: usize = 100_000;

/// Join every handle, then report the first failure.
///
/// All handles are joined before returning so that a panicking worker is
/// never left for the scope to re-raise.
fn join_all<T>(handles: Vec<ScopedJoinHandle<'_, Result<T>>>) -> Result<Vec<T>> {
    let joined: Vec<_> = handles.into_iter().map(|h| h.join()).collect();
    let mut results = Vec::with_capacity(joined.len());
    for (id, outcome) in joined.into_iter().enumerate() {
        match outcome {
            Ok(result) => results.push(result.with_context(|| format!("Worker {} failed", id))?),
            Err(_) => return Err(anyhow!("Worker {} panicked", id)),
        }
    }
    Ok(results)
}

/// Run `work` over `ceil(len / workers)`-sized contiguous shares of `items`,
/// returning the per-share results in share order.
pub fn partitioned<T, R, F>(items: &[T], workers: usize, work: F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(usize, &[T]) -> Result<R> + Sync,
{
    let share = items.len().div_ceil(workers.max(1)).max(1);
    thread::scope(|s| {
        let work = &work;
        let handles: Vec<_> = items
            .chunks(share)
            .enumerate()
            .map(|(id, part)| s.spawn(move || work(id, part)))
            .collect();
        debug!("Started {} workers on shares of {}", handles.len(), share);
        join_all(handles)
    })
}

/// Stage 1 output
#[derive(Debug, Default)]
pub struct TaggedCorpus {
    pub passwords: Vec<TaggedPassword>,
    /// Passwords that produced no chunks
    pub unchunkable: usize,
}

/// Stage 1: chunk and tag every password.
///
/// Batches are numbered so the output keeps input order no matter which
/// worker handled them. One empty batch per worker signals shutdown.
pub fn chunk_and_tag(
    records: Vec<PasswordRecord>,
    resources: &Resources,
    workers: usize,
    batch_size: usize,
) -> Result<TaggedCorpus> {
    let workers = workers.max(1);
    let batch_size = batch_size.max(1);
    let results: Mutex<Vec<(usize, Vec<TaggedPassword>)>> = Mutex::new(Vec::new());
    let unchunkable = AtomicUsize::new(0);

    thread::scope(|s| -> Result<()> {
        let (tx, rx) = bounded::<(usize, Vec<PasswordRecord>)>(workers);

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let rx = rx.clone();
            let results = &results;
            let unchunkable = &unchunkable;
            handles.push(s.spawn(move || -> Result<()> {
                let mut done = 0usize;
                while let Ok((index, batch)) = rx.recv() {
                    if batch.is_empty() {
                        break;
                    }
                    let mut out = Vec::with_capacity(batch.len());
                    for record in batch {
                        done += 1;
                        if done % PROGRESS_INTERVAL == 0 {
                            info!("Worker {}: {} passwords tagged", id, done);
                        }
                        let chunks = resources.chunker.chunk(&record.password);
                        if chunks.is_empty() {
                            unchunkable.fetch_add(1, Ordering::Relaxed);
                            continue;
                        }
                        let tagged = pos_tag(
                            &chunks,
                            resources.tagger.as_ref(),
                            resources.blacklist.as_ref(),
                        )
                        .with_context(|| format!("Failed to tag '{}'", record.password))?;
                        out.push(TaggedPassword {
                            chunks: tagged,
                            count: record.count,
                        });
                    }
                    results
                        .lock()
                        .map_err(|_| anyhow!("Result collection poisoned"))?
                        .push((index, out));
                }
                Ok(())
            }));
        }
        // Workers hold the only receivers; if they all stop, sends fail
        drop(rx);

        let mut records = records.into_iter();
        let mut index = 0;
        loop {
            let batch: Vec<PasswordRecord> = records.by_ref().take(batch_size).collect();
            if batch.is_empty() || tx.send((index, batch)).is_err() {
                break;
            }
            index += 1;
        }
        for _ in 0..workers {
            if tx.send((usize::MAX, Vec::new())).is_err() {
                break;
            }
        }
        drop(tx);
        debug!("Queued {} batches of up to {}", index, batch_size);

        join_all(handles).map(|_| ())
    })?;

    let mut batches = results
        .into_inner()
        .map_err(|_| anyhow!("Result collection poisoned"))?;
    batches.sort_by_key(|(index, _)| *index);

    Ok(TaggedCorpus {
        passwords: batches.into_iter().flat_map(|(_, b)| b).collect(),
        unchunkable: unchunkable.into_inner(),
    })
}

/// Exact occurrence totals per sense key for one share of passwords
#[derive(Debug, Default)]
struct SenseTally {
    nouns: FxHashMap<String, u64>,
    verbs: FxHashMap<String, u64>,
}

impl SenseTally {
    fn merge(&mut self, other: SenseTally) {
        for (key, n) in other.nouns {
            *self.nouns.entry(key).or_insert(0) += n;
        }
        for (key, n) in other.verbs {
            *self.verbs.entry(key).or_insert(0) += n;
        }
    }
}

/// Spread integer totals over the taxonomy, one increment per key in key
/// order, so the float sums never depend on how passwords were shared out.
fn spread(taxonomy: &Taxonomy, totals: FxHashMap<String, u64>) -> LeafCounts {
    let mut totals: Vec<_> = totals.into_iter().collect();
    totals.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    let mut counts = LeafCounts::zeros(taxonomy);
    for (key, n) in totals {
        counts.increment(taxonomy, &key, n as f64);
    }
    counts
}

/// Stage 2: weighted sense counts over the noun and verb taxonomies.
///
/// Workers only tally integer occurrences per sense key. The fractional
/// split over ambiguous nodes happens once on the coordinator, so the leaf
/// vectors are bit-identical for any worker count.
pub fn accumulate_senses(
    passwords: &[TaggedPassword],
    resolver: &SemanticResolver,
    nouns: &Taxonomy,
    verbs: &Taxonomy,
    workers: usize,
) -> Result<(LeafCounts, LeafCounts)> {
    let partials = partitioned(passwords, workers, |id, part| {
        let mut tally = SenseTally::default();
        for (i, password) in part.iter().enumerate() {
            if (i + 1) % PROGRESS_INTERVAL == 0 {
                info!("Worker {}: {} passwords counted", id, i + 1);
            }
            for chunk in &password.chunks {
                let Some(sense) = resolver.resolve(&chunk.text, chunk.tag.as_deref()) else {
                    continue;
                };
                let totals = match sense.class {
                    WordClass::Noun => &mut tally.nouns,
                    WordClass::Verb => &mut tally.verbs,
                    _ => continue,
                };
                *totals.entry(sense.key).or_insert(0) += password.count;
            }
        }
        Ok(tally)
    })?;

    let mut tally = SenseTally::default();
    for part in partials {
        tally.merge(part);
    }
    let noun_counts = spread(nouns, tally.nouns);
    let verb_counts = spread(verbs, tally.verbs);
    info!(
        "Sense mass: {:.1} nouns, {:.1} verbs",
        noun_counts.total(),
        verb_counts.total()
    );
    Ok((noun_counts, verb_counts))
}

/// Stage 3 output
#[derive(Debug, Default)]
pub struct ExampleSet {
    pub examples: Vec<GrammarExample>,
    /// Passwords that yielded no example
    pub dropped: usize,
}

/// Stage 3: expand every password into weighted grammar examples.
///
/// Without a generalizer every chunk gets a null class.
pub fn build_examples(
    passwords: &[TaggedPassword],
    generalizer: Option<&Generalizer>,
    workers: usize,
) -> Result<ExampleSet> {
    let partials = partitioned(passwords, workers, |id, part| {
        let mut set = ExampleSet::default();
        for (i, password) in part.iter().enumerate() {
            if (i + 1) % PROGRESS_INTERVAL == 0 {
                info!("Worker {}: {} passwords expanded", id, i + 1);
            }
            let count = password.count as f64;
            let before = set.examples.len();
            match generalizer {
                Some(g) => {
                    let candidates: Vec<_> = password.chunks.iter().map(|c| g.classes(c)).collect();
                    set.examples.extend(expand(&password.chunks, &candidates, count));
                }
                None => set.examples.extend(tag_only_example(&password.chunks, count)),
            }
            if set.examples.len() == before {
                set.dropped += 1;
            }
        }
        Ok(set)
    })?;

    let mut merged = ExampleSet::default();
    for part in partials {
        merged.examples.extend(part.examples);
        merged.dropped += part.dropped;
    }
    Ok(merged)
}
