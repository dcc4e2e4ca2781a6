//! Sample command

use anyhow::Result;
use passgrammar::grammar::{Grammar, SemanticGrammar};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Print `n` generated passwords as `password<TAB>probability`.
pub fn run(grammar_dir: &Path, n: usize, seed: Option<u64>) -> Result<()> {
    let grammar = SemanticGrammar::load(grammar_dir)?;
    let seed = seed.unwrap_or_else(rand::random);
    info!("Sampling {} passwords with seed {}", n, seed);

    let samples = grammar.sample(n, seed)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for (password, probability) in samples {
        writeln!(out, "{}\t{:e}", password, probability)?;
    }
    out.flush()?;
    Ok(())
}
