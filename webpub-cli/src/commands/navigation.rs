//! Navigation command implementation.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use webpub_render::{extract_title, render_navigation, strip_leading_dir, RenderError};

/// Render the navigation partial for the given HTML pages
pub fn write_navigation(
    html_files: &[PathBuf],
    build_dir: &Path,
    book: Option<&str>,
    output: &Path,
) -> Result<()> {
    let mut pages = Vec::with_capacity(html_files.len());
    for file in html_files {
        let html = fs::read_to_string(file).with_context(|| format!("Failed to read {:?}", file))?;
        let title = extract_title(&html)
            .ok_or_else(|| RenderError::MissingTitle(file.display().to_string()))?;
        pages.push((strip_leading_dir(file, build_dir), title));
    }

    let markup = render_navigation(pages, book)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {:?}", parent))?;
    }
    fs::write(output, markup).with_context(|| format!("Failed to write {:?}", output))?;

    tracing::info!("Wrote navigation for {} pages to {:?}", html_files.len(), output);
    Ok(())
}
