//! Cross-product example builder
//!
//! Every chunk of a password may generalize to several classes. Each
//! combination is one interpretation of the password:
//!
//! ```text
//! chunks      = [dog, 123]
//! candidates  = [[animal, toy], [-]]
//! examples    = (dog/animal, 123/-) x C/2, (dog/toy, 123/-) x C/2
//! ```
//!
//! A password made of a single chunk gets one example per class at the full
//! count `C`, without the split.

use crate::models::{ClassId, GrammarExample, Segment, TaggedChunk};
use tracing::{debug, warn};

/// Most interpretations a single password may expand into
pub const MAX_INTERPRETATIONS: usize = 4096;

fn segment(chunk: &TaggedChunk, class: &Option<ClassId>) -> Segment {
    Segment::new(chunk.text.clone(), chunk.tag.clone(), class.clone())
}

/// Size of the cross product, or `None` past [`MAX_INTERPRETATIONS`].
fn variations(candidates: &[Vec<Option<ClassId>>]) -> Option<usize> {
    candidates.iter().try_fold(1usize, |acc, classes| {
        acc.checked_mul(classes.len())
            .filter(|&v| v <= MAX_INTERPRETATIONS)
    })
}

/// Odometer over the candidate lists, last chunk varying fastest.
///
/// Every candidate list must be non-empty.
fn cross_product(
    chunks: &[TaggedChunk],
    candidates: &[Vec<Option<ClassId>>],
    variations: usize,
) -> Vec<Vec<Segment>> {
    let mut out = Vec::with_capacity(variations);
    let mut index = vec![0usize; chunks.len()];
    loop {
        out.push(
            chunks
                .iter()
                .zip(candidates)
                .zip(&index)
                .map(|((chunk, classes), &i)| segment(chunk, &classes[i]))
                .collect(),
        );

        let mut digit = chunks.len();
        loop {
            if digit == 0 {
                return out;
            }
            digit -= 1;
            index[digit] += 1;
            if index[digit] < candidates[digit].len() {
                break;
            }
            index[digit] = 0;
        }
    }
}

fn password(chunks: &[TaggedChunk]) -> String {
    chunks.iter().map(|c| c.text.as_str()).collect()
}

/// Expand one password occurrence into its weighted interpretations.
///
/// `candidates[i]` holds the classes of `chunks[i]`.
pub fn expand(
    chunks: &[TaggedChunk],
    candidates: &[Vec<Option<ClassId>>],
    count: f64,
) -> Vec<GrammarExample> {
    if chunks.is_empty() {
        warn!("Unable to feed chunks to grammar: no chunks");
        return Vec::new();
    }
    debug_assert_eq!(chunks.len(), candidates.len());

    if let Some(pos) = candidates.iter().position(Vec::is_empty) {
        warn!(
            "Dropping password: chunk '{}' has a sense outside the tree cut",
            chunks[pos].text
        );
        return Vec::new();
    }

    let Some(variations) = variations(candidates) else {
        warn!(
            "Dropping password '{}': more than {} interpretations",
            password(chunks),
            MAX_INTERPRETATIONS
        );
        return Vec::new();
    };

    if let ([chunk], [classes]) = (chunks, candidates) {
        return classes
            .iter()
            .map(|class| GrammarExample::new(vec![segment(chunk, class)], count))
            .collect();
    }

    let weight = count / variations as f64;
    if variations > 1 {
        debug!("{} interpretations at weight {}", variations, weight);
    }
    cross_product(chunks, candidates, variations)
        .into_iter()
        .map(|segments| GrammarExample::new(segments, weight))
        .collect()
}

/// Unweighted interpretations of a password being scored.
///
/// Passwords `expand` would drop have none. Nothing is logged above debug
/// level, since scoring runs once per query line.
pub fn interpret(chunks: &[TaggedChunk], candidates: &[Vec<Option<ClassId>>]) -> Vec<Vec<Segment>> {
    if chunks.is_empty() || candidates.iter().any(Vec::is_empty) {
        return Vec::new();
    }
    match variations(candidates) {
        Some(variations) => cross_product(chunks, candidates, variations),
        None => {
            debug!("'{}' has too many interpretations to score", password(chunks));
            Vec::new()
        }
    }
}

/// The single class-free example of a password in tag-only mode.
pub fn tag_only_example(chunks: &[TaggedChunk], count: f64) -> Option<GrammarExample> {
    if chunks.is_empty() {
        warn!("Unable to feed chunks to grammar: no chunks");
        return None;
    }
    let segments = chunks.iter().map(|c| segment(c, &None)).collect();
    Some(GrammarExample::new(segments, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str) -> Option<ClassId> {
        Some(ClassId::from(name))
    }

    fn dog_123() -> Vec<TaggedChunk> {
        vec![
            TaggedChunk::new("dog", Some("nn1")),
            TaggedChunk::untagged("123"),
        ]
    }

    #[test]
    fn test_multi_chunk_weights_split_and_sum_to_count() {
        let chunks = vec![
            TaggedChunk::new("love", Some("vv0")),
            TaggedChunk::new("dog", Some("nn1")),
            TaggedChunk::untagged("123"),
        ];
        let candidates = vec![
            vec![class("feel"), class("like")],
            vec![class("animal"), class("toy"), class("person")],
            vec![None],
        ];
        let examples = expand(&chunks, &candidates, 12.0);

        assert_eq!(examples.len(), 6);
        for ex in &examples {
            assert!((ex.weight - 2.0).abs() < 1e-12);
            assert_eq!(ex.password(), "lovedog123");
        }
        let total: f64 = examples.iter().map(|e| e.weight).sum();
        assert!((total - 12.0).abs() < 1e-9);

        assert_eq!(examples[0].segments[0].class, class("feel"));
        assert_eq!(examples[0].segments[1].class, class("animal"));
        assert_eq!(examples[1].segments[1].class, class("toy"));
        assert_eq!(examples[5].segments[0].class, class("like"));
        assert_eq!(examples[5].segments[1].class, class("person"));
    }

    #[test]
    fn test_single_chunk_keeps_full_count_per_class() {
        // Single chunks are not split across their interpretations, unlike
        // multi-chunk passwords. This asymmetry is intentional.
        let chunks = vec![TaggedChunk::new("dog", Some("nn1"))];
        let candidates = vec![vec![class("animal"), class("toy")]];
        let examples = expand(&chunks, &candidates, 5.0);

        assert_eq!(examples.len(), 2);
        assert!(examples.iter().all(|e| e.weight == 5.0));

        let split = expand(&dog_123(), &[vec![class("animal"), class("toy")], vec![None]], 5.0);
        assert!(split.iter().all(|e| e.weight == 2.5));
    }

    #[test]
    fn test_round_trip_weight_is_count_over_variations() {
        let chunks = vec![
            TaggedChunk::new("pass", Some("nn1")),
            TaggedChunk::untagged("123"),
            TaggedChunk::new("word", Some("nn1")),
        ];
        let candidates = vec![vec![class("a"), class("b")], vec![None], vec![class("c")]];
        let examples = expand(&chunks, &candidates, 3.0);
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].weight, 1.5);
        assert_eq!(
            examples[0].segments.iter().map(|s| s.token.as_str()).collect::<Vec<_>>(),
            vec!["pass", "123", "word"]
        );
    }

    #[test]
    fn test_empty_inputs_are_dropped() {
        assert!(expand(&[], &[], 1.0).is_empty());
        assert!(expand(&dog_123(), &[vec![], vec![None]], 1.0).is_empty());
        assert!(tag_only_example(&[], 1.0).is_none());
    }

    #[test]
    fn test_tag_only_example_has_null_classes() {
        let ex = tag_only_example(&dog_123(), 4.0).unwrap();
        assert_eq!(ex.weight, 4.0);
        assert!(ex.segments.iter().all(|s| s.class.is_none()));
        assert_eq!(ex.base_structure(), "nn1 digits3");
    }

    #[test]
    fn test_oversized_cross_product_is_dropped() {
        // 2^13 interpretations is past the cap; 2^64 would overflow usize
        for n in [13, 64] {
            let chunks: Vec<_> = (0..n).map(|_| TaggedChunk::new("dog", Some("nn1"))).collect();
            let candidates = vec![vec![class("animal"), class("toy")]; n];
            assert!(expand(&chunks, &candidates, 1.0).is_empty(), "{} chunks", n);
            assert!(interpret(&chunks, &candidates).is_empty(), "{} chunks", n);
        }

        let chunks: Vec<_> = (0..12).map(|_| TaggedChunk::new("dog", Some("nn1"))).collect();
        let candidates = vec![vec![class("animal"), class("toy")]; 12];
        assert_eq!(expand(&chunks, &candidates, 1.0).len(), MAX_INTERPRETATIONS);
    }

    #[test]
    fn test_interpret_matches_expand() {
        let candidates = vec![vec![class("animal"), class("toy")], vec![None]];
        let expanded: Vec<_> = expand(&dog_123(), &candidates, 2.0)
            .into_iter()
            .map(|e| e.segments)
            .collect();
        assert_eq!(interpret(&dog_123(), &candidates), expanded);
        assert!(interpret(&dog_123(), &[vec![], vec![None]]).is_empty());
        assert!(interpret(&[], &[]).is_empty());
    }
}
