//! Train command

use super::is_stdin;
use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use passgrammar::config::ProjectConfig;
use passgrammar::pipeline::TrainingPipeline;
use passgrammar::resources::Resources;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::time::Duration;

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

pub fn run(passwords: &Path, output_dir: &Path, config: &ProjectConfig, workers: usize) -> Result<()> {
    let spinner = spinner();
    spinner.set_message("Loading resources...");

    let resources = Resources::load(
        &config.resources,
        &config.train,
        config.train.tagtype.is_semantic(),
    )
    .context("Failed to load resources")?;

    let observer = spinner.clone();
    let pipeline = TrainingPipeline::new(resources, config.train.clone())
        .with_workers(workers)
        .on_stage(move |stage| {
            let mut message = stage.to_string();
            if let Some(first) = message.get_mut(0..1) {
                first.make_ascii_uppercase();
            }
            observer.set_message(format!("{}...", message));
        });

    let trained = if is_stdin(passwords) {
        pipeline.run(io::stdin().lock())
    } else {
        let file = File::open(passwords)
            .with_context(|| format!("Failed to open {}", passwords.display()))?;
        pipeline.run(BufReader::new(file))
    };
    let trained = match trained {
        Ok(trained) => trained,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e);
        }
    };

    spinner.set_message("Writing model...");
    trained.save(output_dir)?;

    spinner.finish_with_message(format!(
        "{}Trained on {} in {:.1?}",
        style("✓ ").green(),
        trained.stats.summary(),
        trained.stats.elapsed()
    ));
    Ok(())
}
