//! Genmakefile command implementation.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use webpub_core::{Config, GraphBuilder};

pub struct GenerateOptions {
    pub copy_files: Vec<PathBuf>,
    pub output: PathBuf,
    pub stdout: bool,
    pub json: bool,
}

/// Build the rule graph for the project in the current directory and write it
pub fn generate_makefile(config_path: &Path, options: &GenerateOptions) -> Result<()> {
    tracing::info!("Loading config from {:?}", config_path);
    let config = Config::load_or_default(config_path).context("Failed to load configuration")?;

    let builder = GraphBuilder::new(config, ".").with_copy_files(options.copy_files.iter().cloned());
    let outcome = builder.build().context("Failed to build rule graph")?;

    if options.stdout {
        print!("{}", outcome.graph.render());
    } else {
        outcome
            .graph
            .write_to(&options.output)
            .with_context(|| format!("Failed to write {:?}", options.output))?;
        tracing::info!(
            "Wrote {:?} ({} documents)",
            options.output,
            outcome.documents.len()
        );
    }

    if options.json {
        let payload = serde_json::to_string_pretty(&outcome.documents)?;
        println!("{}", payload);
    }

    Ok(())
}
