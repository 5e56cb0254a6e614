//! # webpub-core
//!
//! Core library for the webpub Makefile generator.
//!
//! This crate turns a tree of LaTeX documents and a configuration into a
//! Makefile rule graph: target paths are derived from source paths,
//! structural dependencies are discovered by scanning document text, and
//! every document registers its rules into one shared [`RuleGraph`].

pub mod builder;
pub mod config;
pub mod document;
pub mod error;
pub mod graph;
pub mod locator;
pub mod paths;
pub mod recipe;
pub mod scanner;

pub use builder::{BuildOutcome, GraphBuilder};
pub use config::{Config, ConfigError};
pub use document::{
    CopyPair, DerivedPaths, DocumentKind, DocumentSummary, DocumentUnit, SourceDocument,
};
pub use error::GraphError;
pub use graph::{NamedVariable, Rule, RuleEntry, RuleGraph};
pub use locator::Locator;
pub use paths::{derive_html_targets, derive_pdf_target, make_path, HtmlTargets, PathResolver};
pub use scanner::DependencyScanner;
