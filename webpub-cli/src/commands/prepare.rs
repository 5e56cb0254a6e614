//! Prepare command implementation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use webpub_render::{parse_page_data, prepare_template};

/// Convert one make4ht page into a page template
pub fn prepare_page(data: &str, input: &Path, css: &Path, output: &Path) -> Result<()> {
    let page_data = parse_page_data(data)?;
    let html = fs::read_to_string(input).with_context(|| format!("Failed to read {:?}", input))?;
    let style = fs::read_to_string(css).with_context(|| format!("Failed to read {:?}", css))?;

    let source_name = input.display().to_string();
    let page = prepare_template(&source_name, &html, &style, &page_data)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {:?}", parent))?;
    }
    fs::write(output, page).with_context(|| format!("Failed to write {:?}", output))?;

    tracing::debug!("Prepared {:?} -> {:?}", input, output);
    Ok(())
}
