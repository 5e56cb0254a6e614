//! Init command implementation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const CONFIG_NAME: &str = "web-publishing.yaml";

const DEFAULT_CONFIG: &str = r#"# Directory scanned for .tex documents
DocumentRoot: ./
# Intermediate output of pdflatex and make4ht
BuildDirectory: .pdflatex
# Site path the PDFs are published under
ServerPDFPath: pdf
ServerKeepPDFPath: false
# Site generator source tree
MiddlemanDirectory: source
minted: true
BuildExclude: []
# Per-document front matter, keyed by source path
PageData: {}
# Book main files and their members
Books: {}
BookRoot: ./
BookExclude: []
# Deploy target for `make deploy`
Host: ""
RemotePath: ""
"#;

/// Write a starter configuration into `path`
pub fn init_project(path: Option<&Path>) -> Result<()> {
    let root = path.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(root).with_context(|| format!("Failed to create {:?}", root))?;

    let config_path = root.join(CONFIG_NAME);
    if config_path.exists() {
        println!("{} already exists at {:?}", CONFIG_NAME, config_path);
        return Ok(());
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {:?}", config_path))?;
    println!("Created {:?}", config_path);
    println!("  - Run `webpub genmakefile` to generate the Makefile");
    Ok(())
}
