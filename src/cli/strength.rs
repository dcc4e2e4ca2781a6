//! Strength command

use super::is_stdin;
use anyhow::{Context, Result};
use passgrammar::config::ProjectConfig;
use passgrammar::grammar::Scorer;
use passgrammar::resources::Resources;
use passgrammar::strength::{parse_scored_line, read_sample, StrengthTable};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

pub struct StrengthOptions {
    pub zeroes: bool,
    pub dedupe: bool,
    pub multiplier: f64,
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

/// Print `password<TAB>strength` for every evaluated password.
pub fn run(
    sample: &Path,
    passwords: Option<&Path>,
    grammar: Option<&Path>,
    options: &StrengthOptions,
    config: &ProjectConfig,
) -> Result<()> {
    let rows = read_sample(open(sample)?)
        .with_context(|| format!("Failed to read sample {}", sample.display()))?;
    let table = StrengthTable::build(&rows, options.dedupe)?
        .with_multiplier(options.multiplier)
        .context("Invalid [strength] multiplier")?;

    let scorer = match grammar {
        Some(dir) => {
            let resources = Resources::load(&config.resources, &config.train, false)
                .context("Failed to load resources")?;
            Some(Scorer::load(dir, resources)?)
        }
        None => None,
    };

    let input: Box<dyn BufRead> = match passwords {
        Some(path) if !is_stdin(path) => Box::new(open(path)?),
        _ => Box::new(io::stdin().lock()),
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut evaluated = 0usize;
    let mut skipped = 0usize;

    for line in input.lines() {
        let line = line.context("Failed to read passwords")?;
        if line.trim().is_empty() {
            continue;
        }

        let scored = match &scorer {
            Some(scorer) => {
                let password = line.trim_end().to_lowercase();
                match scorer.score(&password) {
                    Ok(p) => Some((password, p)),
                    Err(e) => {
                        warn!("Failed to score '{}': {:#}", password, e);
                        None
                    }
                }
            }
            None => parse_scored_line(&line).map(|s| (s.password, s.probability)),
        };
        let Some((password, probability)) = scored else {
            skipped += 1;
            continue;
        };

        if probability == 0.0 {
            if options.zeroes {
                writeln!(out, "{}\t{:.2}", password, 0.0)?;
                evaluated += 1;
            } else {
                skipped += 1;
            }
            continue;
        }

        let strength = table.estimate(probability)?;
        writeln!(out, "{}\t{:.2}", password, strength)?;
        evaluated += 1;
    }
    out.flush()?;

    info!("Evaluated {} passwords, skipped {}", evaluated, skipped);
    Ok(())
}
