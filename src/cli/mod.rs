//! CLI command definitions and handlers

mod sample;
mod strength;
mod train;

use anyhow::Result;
use clap::{Parser, Subcommand};
use passgrammar::config::{load_config_file, load_project_config, ProjectConfig};
use passgrammar::grammar::{Estimator, TagType};
use std::path::{Path, PathBuf};

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if n == 0 {
        return Err("workers must be at least 1".to_string());
    }
    if n > 64 {
        return Err("workers cannot exceed 64".to_string());
    }
    Ok(n)
}

/// Parse a strictly positive float (specificity, multiplier)
fn parse_positive(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if !(v.is_finite() && v > 0.0) {
        return Err(format!("'{}' must be a positive number", s));
    }
    Ok(v)
}

/// Semantic password grammars and Monte Carlo strength estimation
#[derive(Parser, Debug)]
#[command(name = "passgrammar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Number of worker threads (1-64)
    #[arg(long, global = true, default_value = "2", value_parser = parse_workers)]
    pub workers: usize,

    /// Configuration file (default: passgrammar.toml or .passgrammarrc.json in the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a grammar from a password list
    Train {
        /// Password list, one per line ("-" for stdin)
        passwords: PathBuf,

        /// Directory to write the grammar and tree-cut models to
        output_dir: PathBuf,

        /// Probability estimator (mle, laplace)
        #[arg(short, long)]
        estimator: Option<Estimator>,

        /// Noun tree-cut specificity; higher values give finer classes
        #[arg(short = 'a', long = "abstraction", value_parser = parse_positive)]
        specificity: Option<f64>,

        /// Symbol scheme: semantic classes with POS backoff (backoff), or POS tags only (pos)
        #[arg(long)]
        tagtype: Option<TagType>,

        /// Passwords per tagging batch
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Generate passwords from a trained grammar
    Sample {
        /// Directory holding grammar.json
        grammar_dir: PathBuf,

        /// Number of passwords to generate
        n: usize,

        /// Random seed (default: random)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Estimate guess numbers for passwords
    Strength {
        /// Reference sample: password<TAB>probability per line
        sample: PathBuf,

        /// Passwords to evaluate ("-" or omitted for stdin). Without
        /// --grammar, lines are "password base-structure probability".
        passwords: Option<PathBuf>,

        /// Score raw passwords with the grammar in this directory
        #[arg(short, long)]
        grammar: Option<PathBuf>,

        /// Report passwords with probability 0 instead of skipping them
        #[arg(long)]
        zeroes: bool,

        /// Keep only the first sample row of each password
        #[arg(long)]
        dedupe: bool,

        /// Multiply every estimate, e.g. by the number of mangling rules
        #[arg(long, value_parser = parse_positive)]
        multiplier: Option<f64>,
    },
}

fn load_config(path: Option<&Path>) -> Result<ProjectConfig> {
    match path {
        Some(path) => load_config_file(path),
        None => Ok(load_project_config(Path::new("."))),
    }
}

/// True for the conventional stdin placeholder
pub(crate) fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Train {
            passwords,
            output_dir,
            estimator,
            specificity,
            tagtype,
            batch_size,
        } => {
            if let Some(estimator) = estimator {
                config.train.estimator = estimator;
            }
            if let Some(tagtype) = tagtype {
                config.train.tagtype = tagtype;
            }
            if specificity.is_some() {
                config.train.specificity = specificity;
            }
            if let Some(batch_size) = batch_size {
                config.train.batch_size = batch_size;
            }
            train::run(&passwords, &output_dir, &config, cli.workers)
        }
        Commands::Sample {
            grammar_dir,
            n,
            seed,
        } => sample::run(&grammar_dir, n, seed),
        Commands::Strength {
            sample,
            passwords,
            grammar,
            zeroes,
            dedupe,
            multiplier,
        } => {
            let options = strength::StrengthOptions {
                zeroes: zeroes || config.strength.zeroes,
                dedupe: dedupe || config.strength.dedupe,
                multiplier: multiplier.unwrap_or(config.strength.multiplier),
            };
            strength::run(
                &sample,
                passwords.as_deref(),
                grammar.as_deref(),
                &options,
                &config,
            )
        }
    }
}
