//! Vocabulary seeding for smoothed grammars
//!
//! Under Laplace smoothing every noun and verb lemma of the sense inventory
//! is registered with the grammar, in its inflected forms, under each class
//! its senses generalize to. Dictionary words never seen in training then
//! keep a small non-zero probability.
//!
//! Tags for the inflected forms are learned by tagging probe words (`house`,
//! `houses`, `give`, ...) so nothing assumes a particular tagset.

use crate::models::{ClassId, Segment, Sense, WordClass};
use crate::semantic::{base_forms, SenseInventory, TreeCutModel};
use crate::tag::PosTagger;
use anyhow::Result;
use rustc_hash::FxHashSet;
use tracing::{info, warn};

fn probe(tagger: &dyn PosTagger, word: &str) -> Result<Option<String>> {
    Ok(tagger.tag(&[word.to_string()])?.into_iter().next().flatten())
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// `-y` preceded by a consonant, as in `city` or `carry`
fn consonant_y(word: &str) -> Option<&str> {
    let stem = word.strip_suffix('y')?;
    stem.chars().last().filter(|c| !is_vowel(*c)).map(|_| stem)
}

/// Regular English plural, also used for third-person singular verbs.
pub fn pluralize(word: &str) -> String {
    if let Some(stem) = consonant_y(word) {
        return format!("{}ies", stem);
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| word.ends_with(s)) {
        return format!("{}es", word);
    }
    format!("{}s", word)
}

/// Regular inflections of a verb: base, third person, progressive, past.
pub fn conjugate(verb: &str) -> [String; 4] {
    let progressive = if let Some(stem) = verb.strip_suffix("ie") {
        format!("{}ying", stem)
    } else if verb.ends_with('e') && !verb.ends_with("ee") && verb.len() > 2 {
        format!("{}ing", &verb[..verb.len() - 1])
    } else {
        format!("{}ing", verb)
    };
    let past = if verb.ends_with('e') {
        format!("{}d", verb)
    } else if let Some(stem) = consonant_y(verb) {
        format!("{}ied", stem)
    } else {
        format!("{}ed", verb)
    };
    [verb.to_string(), pluralize(verb), progressive, past]
}

fn usable(lemma: &str, min_length: usize) -> bool {
    lemma.chars().count() >= min_length && !lemma.contains('_') && !lemma.contains(' ')
}

fn segment(token: &str, tag: &str, class: &Option<ClassId>) -> Segment {
    Segment::new(token, Some(tag.to_string()), class.clone())
}

/// Classes of a sense, or a single null class without a tree cut.
fn classes_of(model: Option<&dyn TreeCutModel>, sense: &Sense) -> Vec<Option<ClassId>> {
    match model {
        Some(model) => model.predict(sense).into_iter().map(Some).collect(),
        None => vec![None],
    }
}

/// Every noun lemma in singular and plural form, with the classes of its
/// senses.
pub fn noun_vocabulary(
    inventory: &dyn SenseInventory,
    model: Option<&dyn TreeCutModel>,
    tagger: &dyn PosTagger,
    min_length: usize,
) -> Result<Vec<Segment>> {
    let (Some(singular_tag), Some(plural_tag)) = (probe(tagger, "house")?, probe(tagger, "houses")?)
    else {
        warn!("Tagger does not know the noun probes; skipping noun vocabulary");
        return Ok(Vec::new());
    };

    let mut seen: FxHashSet<Segment> = FxHashSet::default();
    let mut entries = Vec::new();
    for lemma in inventory.lemmas(WordClass::Noun) {
        if !usable(&lemma, min_length) {
            continue;
        }
        // Only keep plurals that still lead back to a sense
        let plural = (!lemma.ends_with('s'))
            .then(|| pluralize(&lemma))
            .filter(|p| !inventory.senses(p, WordClass::Noun).is_empty());

        for sense in inventory.senses(&lemma, WordClass::Noun) {
            for class in classes_of(model, &sense) {
                let mut forms = vec![segment(&lemma, &singular_tag, &class)];
                if let Some(plural) = &plural {
                    forms.push(segment(plural, &plural_tag, &class));
                }
                for entry in forms {
                    if seen.insert(entry.clone()) {
                        entries.push(entry);
                    }
                }
            }
        }
    }

    info!("Noun vocabulary: {} entries", entries.len());
    Ok(entries)
}

/// Every verb lemma in its regular inflections, with the classes of its
/// senses. Forms that do not reduce back to the lemma are skipped.
pub fn verb_vocabulary(
    inventory: &dyn SenseInventory,
    model: Option<&dyn TreeCutModel>,
    tagger: &dyn PosTagger,
    min_length: usize,
) -> Result<Vec<Segment>> {
    let mut tenses = Vec::with_capacity(4);
    for word in ["give", "gives", "giving", "gave"] {
        tenses.push(probe(tagger, word)?);
    }

    let mut seen: FxHashSet<Segment> = FxHashSet::default();
    let mut entries = Vec::new();
    for lemma in inventory.lemmas(WordClass::Verb) {
        if !usable(&lemma, min_length) {
            continue;
        }

        let forms: Vec<(String, &str)> = conjugate(&lemma)
            .into_iter()
            .zip(&tenses)
            .filter_map(|(form, tag)| match tag.as_deref() {
                Some(tag) if !tag.starts_with('n') => Some((form, tag)),
                _ => None,
            })
            .filter(|(form, _)| base_forms(form, WordClass::Verb).contains(&lemma))
            .collect();

        let classes: Vec<Option<ClassId>> = inventory
            .senses(&lemma, WordClass::Verb)
            .iter()
            .flat_map(|sense| classes_of(model, sense))
            .collect();

        for class in &classes {
            for (form, tag) in &forms {
                let mut variants = vec![segment(form, tag, class)];
                if form.contains('\'') {
                    variants.push(segment(&form.replace('\'', ""), tag, class));
                }
                for entry in variants {
                    if seen.insert(entry.clone()) {
                        entries.push(entry);
                    }
                }
            }
        }
    }

    info!("Verb vocabulary: {} entries", entries.len());
    Ok(entries)
}
