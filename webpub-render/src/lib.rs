//! # webpub-render
//!
//! HTML post-processing for webpub.
//!
//! The generated Makefile calls back into these steps: turning make4ht output
//! into page-template stubs for the site generator, and rendering the site
//! navigation from the titles of every converted page.

pub mod navigation;
pub mod prepare;

use thiserror::Error;

pub use navigation::{
    group_folders, link_for, render_navigation, strip_leading_dir, NavEntry, NavFolder,
    NavigationTemplate,
};
pub use prepare::{extract_title, parse_page_data, prepare_template};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No title in the HTML head of {0}")]
    MissingTitle(String),

    #[error("Malformed page data entry: {0:?} (expected key=value)")]
    MalformedPageData(String),

    #[error("Too many layers of folders: {0}")]
    TooDeep(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Failed to serialize front matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),
}
