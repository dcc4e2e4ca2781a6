//! Part-of-speech tagging of password chunks
//!
//! Only runs of adjacent, plausible words are sent to the tagger. Digits,
//! symbols, blacklisted tokens and short isolated letter fragments are left
//! untagged, because they are more likely random than lexical.
//!
//! ```text
//! ["i", "love", "you", "2"] -> [("i", ppis1), ("love", vv0), ("you", ppy), ("2", -)]
//! ["123", "ab", "!!"]       -> [("123", -), ("ab", -), ("!!", -)]
//! ```

mod blacklist;
mod lexicon;
pub mod tagset;

pub use blacklist::PosBlacklist;
pub use lexicon::{LexiconTagger, Vocabulary};
pub use tagset::Tagset;

use crate::models::{Chunk, TaggedChunk};
use anyhow::{bail, Result};

/// Assigns one tag (or none) to every token of a contiguous word sequence.
pub trait PosTagger: Send + Sync {
    fn tag(&self, tokens: &[String]) -> Result<Vec<Option<String>>>;
}

/// Tag a buffered run and append it to `out`, checking the tagger kept the
/// token count.
fn flush(buffer: &mut Vec<String>, tagger: &dyn PosTagger, out: &mut Vec<TaggedChunk>) -> Result<()> {
    if buffer.is_empty() {
        return Ok(());
    }
    let tags = tagger.tag(buffer)?;
    if tags.len() != buffer.len() {
        bail!(
            "Tagger returned {} tags for {} tokens: {:?}",
            tags.len(),
            buffer.len(),
            buffer
        );
    }
    out.extend(
        buffer
            .drain(..)
            .zip(tags)
            .map(|(text, tag)| TaggedChunk { text, tag }),
    );
    Ok(())
}

/// Tag the chunks of one password.
///
/// The output has the same length and order as `chunks`.
pub fn pos_tag(
    chunks: &[Chunk],
    tagger: &dyn PosTagger,
    blacklist: Option<&PosBlacklist>,
) -> Result<Vec<TaggedChunk>> {
    let mut tagged = Vec::with_capacity(chunks.len());

    if let [only] = chunks {
        if only.is_alpha() {
            flush(&mut vec![only.text.clone()], tagger, &mut tagged)?;
        } else {
            tagged.push(TaggedChunk::untagged(only.text.clone()));
        }
        return Ok(tagged);
    }

    let alpha: Vec<bool> = chunks.iter().map(Chunk::is_alpha).collect();
    let mut buffer: Vec<String> = Vec::new();

    for (i, chunk) in chunks.iter().enumerate() {
        let noisy = blacklist.is_some_and(|b| b.is_bad(&chunk.text));
        if !alpha[i] || noisy {
            flush(&mut buffer, tagger, &mut tagged)?;
            tagged.push(TaggedChunk::untagged(chunk.text.clone()));
            continue;
        }

        let has_alpha_neighbour =
            alpha.get(i + 1).copied().unwrap_or(false) || (i > 0 && alpha[i - 1]);

        if has_alpha_neighbour || chunk.text.chars().count() > 2 {
            buffer.push(chunk.text.clone());
        } else {
            tagged.push(TaggedChunk::untagged(chunk.text.clone()));
        }
    }

    flush(&mut buffer, tagger, &mut tagged)?;
    Ok(tagged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn vocabulary() -> Arc<Vocabulary> {
        Arc::new(Vocabulary::from_entries([
            ("i", "ppis1", 50_000),
            ("love", "vv0", 9_000),
            ("love", "nn1", 7_000),
            ("you", "ppy", 40_000),
            ("ab", "nn1", 20),
            ("pass", "vv0", 3_000),
            ("word", "nn1", 6_000),
        ]))
    }

    fn chunks(texts: &[&str]) -> Vec<Chunk> {
        texts.iter().map(|t| Chunk::new(*t)).collect()
    }

    fn tags(tagged: &[TaggedChunk]) -> Vec<Option<&str>> {
        tagged.iter().map(|t| t.tag.as_deref()).collect()
    }

    #[test]
    fn test_adjacent_words_are_tagged_together() {
        let vocab = vocabulary();
        let tagger = LexiconTagger::new(Arc::clone(&vocab));
        let blacklist = PosBlacklist::new(vocab, 1000);

        let tagged = pos_tag(&chunks(&["i", "love", "you", "2"]), &tagger, Some(&blacklist)).unwrap();
        assert_eq!(
            tags(&tagged),
            vec![Some("ppis1"), Some("vv0"), Some("ppy"), None]
        );
    }

    #[test]
    fn test_short_isolated_fragment_is_untagged() {
        let tagger = LexiconTagger::new(vocabulary());
        let tagged = pos_tag(&chunks(&["123", "ab", "!!"]), &tagger, None).unwrap();
        assert_eq!(tags(&tagged), vec![None, None, None]);
    }

    #[test]
    fn test_isolated_long_word_is_tagged() {
        let tagger = LexiconTagger::new(vocabulary());
        let tagged = pos_tag(&chunks(&["pass", "123", "word"]), &tagger, None).unwrap();
        assert_eq!(tags(&tagged), vec![Some("vv0"), None, Some("nn1")]);
        assert_eq!(tagged[1].text, "123");
    }

    #[test]
    fn test_blacklisted_word_breaks_the_run() {
        let vocab = vocabulary();
        let tagger = LexiconTagger::new(Arc::clone(&vocab));
        let blacklist = PosBlacklist::new(vocab, 1000);

        // "ab" is rare and short, "zq" is unknown
        let tagged =
            pos_tag(&chunks(&["love", "ab", "zq", "you"]), &tagger, Some(&blacklist)).unwrap();
        assert_eq!(tags(&tagged), vec![Some("vv0"), None, None, Some("ppy")]);
    }

    #[test]
    fn test_single_chunk() {
        let tagger = LexiconTagger::new(vocabulary());
        let word = pos_tag(&chunks(&["love"]), &tagger, None).unwrap();
        assert_eq!(tags(&word), vec![Some("vv0")]);

        let digits = pos_tag(&chunks(&["2010"]), &tagger, None).unwrap();
        assert_eq!(tags(&digits), vec![None]);
    }

    struct BrokenTagger;

    impl PosTagger for BrokenTagger {
        fn tag(&self, _tokens: &[String]) -> Result<Vec<Option<String>>> {
            Ok(vec![])
        }
    }

    #[test]
    fn test_tag_count_mismatch_is_an_error() {
        let result = pos_tag(&chunks(&["love", "you"]), &BrokenTagger, None);
        assert!(result.is_err());
    }
}
