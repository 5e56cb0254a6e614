//! Per-document rule registration.
//!
//! A [`DocumentUnit`] is built from one [`SourceDocument`]: construction
//! derives its target paths and resolves its extra prerequisites, and
//! [`DocumentUnit::emit`] consumes it while registering its rules into the
//! shared [`RuleGraph`].

use crate::config::Config;
use crate::error::GraphError;
use crate::graph::RuleGraph;
use crate::paths::{
    clean_path, derive_html_targets, derive_pdf_target, make_path, HtmlTargets, PathResolver,
};
use crate::recipe::{
    pdflatex_flags, variable_ref, HtmlRule, PdfRule, TemplateRule, HTML_FILES, PDFLATEX_FLAGS,
    PDF_FILES, TEMPLATE_FILES, TEX4HT_CONFIG,
};
use crate::scanner::DependencyScanner;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Page-data key carrying the published PDF link
pub const PDF_LINK_KEY: &str = "pdfLink";

/// How a document is published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Web page plus PDF
    Page,
    /// Collected work: a single flat PDF, no page
    Book,
}

/// A source document, identified by its normalized project-relative path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    path: PathBuf,
}

impl SourceDocument {
    /// Fails when `path` is not a regular file or lies outside `root`
    pub fn new(path: &Path, root: &Path, resolver: &PathResolver) -> Result<Self, GraphError> {
        let path = resolver.normalize(path);
        if !resolver.resolve(&path).is_file() {
            return Err(GraphError::NotFound(path));
        }

        let root = resolver.normalize(root);
        let under_root = root == Path::new(".") || path.starts_with(&root);
        if !under_root {
            return Err(GraphError::Structure { path, root });
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without extension
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A file copied verbatim into the build directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyPair {
    pub source: PathBuf,
    pub target: PathBuf,
}

/// Every path a document's rules mention, derived once at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedPaths {
    /// Root-relative path without extension
    pub base: PathBuf,
    pub pdf: PathBuf,
    /// Absent for books
    pub html: Option<HtmlTargets>,
    /// Project files named by inclusion directives
    pub structural: Vec<CopyPair>,
    /// Contents of the document's extra sources directory
    pub extras: Vec<CopyPair>,
}

/// Shared, read-only inputs of every unit in a run
#[derive(Debug, Clone, Copy)]
pub struct UnitContext<'a> {
    pub config: &'a Config,
    pub resolver: &'a PathResolver,
    pub scanner: &'a DependencyScanner,
    /// A `tex4ht.cfg` exists in the project directory
    pub tex4ht_config: bool,
}

/// Machine-readable record of a registered document
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub source: String,
    pub kind: DocumentKind,
    pub web_index: bool,
    pub pdf: String,
    pub html: Option<String>,
    pub template: Option<String>,
    pub dependencies: Vec<String>,
    pub extras: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DocumentUnit {
    document: SourceDocument,
    kind: DocumentKind,
    web_index: bool,
    paths: DerivedPaths,
    page_data: Vec<(String, String)>,
    build_dir: PathBuf,
    minted: bool,
    tex4ht_config: bool,
}

impl DocumentUnit {
    pub fn new(
        document: SourceDocument,
        kind: DocumentKind,
        web_index: bool,
        ctx: UnitContext<'_>,
    ) -> Result<Self, GraphError> {
        let config = ctx.config;
        let build_dir = clean_path(&config.build_directory);

        let base = ctx
            .resolver
            .derive_base_name(document.path(), &config.document_root, web_index)?;

        let pdf = derive_pdf_target(&base, &config.server_pdf_path, config.server_keep_pdf_path);

        let html = match kind {
            DocumentKind::Page => Some(derive_html_targets(
                &base,
                &build_dir,
                &config.middleman_directory,
            )),
            DocumentKind::Book => None,
        };

        let structural = structural_dependencies(&document, &build_dir, ctx.scanner)?;
        let extras = extra_sources(
            &document,
            &base,
            &build_dir,
            &config.sources_prefix,
            ctx.resolver,
        );

        let mut page_data: Vec<(String, String)> = config
            .page_data_for(document.path())
            .map(|data| data.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        if !page_data.is_empty() {
            tracing::info!("{:?}: using page data {:?}", document.path(), page_data);
        }
        if !page_data.iter().any(|(key, _)| key == PDF_LINK_KEY) {
            page_data.push((PDF_LINK_KEY.to_string(), format!("/{}", make_path(&pdf))));
        }

        Ok(Self {
            document,
            kind,
            web_index,
            paths: DerivedPaths {
                base,
                pdf,
                html,
                structural,
                extras,
            },
            page_data,
            build_dir,
            minted: config.minted,
            tex4ht_config: ctx.tex4ht_config,
        })
    }

    pub fn document(&self) -> &SourceDocument {
        &self.document
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn paths(&self) -> &DerivedPaths {
        &self.paths
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            source: make_path(self.document.path()),
            kind: self.kind,
            web_index: self.web_index,
            pdf: make_path(&self.paths.pdf),
            html: self.paths.html.as_ref().map(|t| make_path(&t.html)),
            template: self.paths.html.as_ref().map(|t| make_path(&t.template)),
            dependencies: self
                .paths
                .structural
                .iter()
                .map(|pair| make_path(&pair.source))
                .collect(),
            extras: self
                .paths
                .extras
                .iter()
                .map(|pair| make_path(&pair.source))
                .collect(),
        }
    }

    /// Register this document's rules and variables into `graph`
    pub fn emit(self, graph: &mut RuleGraph) {
        let source = make_path(self.document.path());
        let build = make_path(&self.build_dir);
        let pdf = make_path(&self.paths.pdf);

        let extras = register_copies(graph, &self.paths.extras);
        let structural = register_copies(graph, &self.paths.structural);

        if let Some(targets) = &self.paths.html {
            let html = make_path(&targets.html);
            let template = make_path(&targets.template);

            graph.require_default_prerequisite(&variable_ref(TEMPLATE_FILES));
            graph.append_to_variable(TEMPLATE_FILES, template.clone());
            graph.require_default_prerequisite(&variable_ref(HTML_FILES));
            graph.append_to_variable(HTML_FILES, html.clone());

            graph.add_rule(
                TemplateRule {
                    target: template,
                    html: html.clone(),
                    page_data: self.page_data.clone(),
                }
                .into_entry(),
            );

            let mut html_extra = Vec::new();
            if self.tex4ht_config {
                let config_target = make_path(&self.build_dir.join(TEX4HT_CONFIG));
                graph.add_copy_rule(&config_target, TEX4HT_CONFIG);
                html_extra.push(config_target);
            }
            html_extra.extend(extras.iter().cloned());
            html_extra.extend(structural.iter().cloned());

            self.emit_pdf(graph, &source, &build, &pdf, &extras, &structural);
            graph.add_rule(
                HtmlRule {
                    target: html,
                    source,
                    build_dir: build,
                    tex4ht_config: self.tex4ht_config,
                    extra: html_extra,
                }
                .into_entry(),
            );
        } else {
            self.emit_pdf(graph, &source, &build, &pdf, &extras, &structural);
        }
    }

    fn emit_pdf(
        &self,
        graph: &mut RuleGraph,
        source: &str,
        build: &str,
        pdf: &str,
        extras: &[String],
        structural: &[String],
    ) {
        graph.require_default_prerequisite(&variable_ref(PDF_FILES));
        graph.append_to_variable(PDF_FILES, pdf);
        graph.set_variable_once(PDFLATEX_FLAGS, pdflatex_flags(self.minted));

        graph.add_rule(
            PdfRule {
                target: pdf.to_string(),
                source: source.to_string(),
                build_dir: build.to_string(),
                extra: structural.iter().chain(extras).cloned().collect(),
            }
            .into_entry(),
        );
    }
}

/// Copy rules for `pairs`, returning the copied targets in order
fn register_copies(graph: &mut RuleGraph, pairs: &[CopyPair]) -> Vec<String> {
    pairs
        .iter()
        .map(|pair| {
            let target = make_path(&pair.target);
            graph.add_copy_rule(&target, &make_path(&pair.source));
            target
        })
        .collect()
}

/// Every project file reachable from `document` through inclusion
/// directives, in discovery order.
///
/// Each dependency is scanned in turn, so a style file pulled in by a
/// `\subfile`'d section is found too.
fn structural_dependencies(
    document: &SourceDocument,
    build_dir: &Path,
    scanner: &DependencyScanner,
) -> Result<Vec<CopyPair>, GraphError> {
    let mut found = scanner
        .scan_file(document.path())
        .map_err(|source| GraphError::Io {
            path: document.path().to_path_buf(),
            source,
        })?;
    found.reverse();

    let mut visited: HashSet<PathBuf> = HashSet::new();
    visited.insert(document.path().to_path_buf());

    let mut pairs = Vec::new();
    while let Some(dependency) = found.pop() {
        let dependency = clean_path(&dependency);
        if !visited.insert(dependency.clone()) {
            continue;
        }
        let escapes = dependency
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir));
        if escapes {
            tracing::warn!(
                "{:?}: not copying dependency {:?}",
                document.path(),
                dependency
            );
            continue;
        }

        match scanner.scan_file(&dependency) {
            Ok(nested) => found.extend(nested.into_iter().rev()),
            Err(err) => tracing::warn!("Not scanning {:?}: {}", dependency, err),
        }

        pairs.push(CopyPair {
            target: build_dir.join(&dependency),
            source: dependency,
        });
    }
    Ok(pairs)
}

/// Files under `<parent>/<prefix><name>`, where `name` is the last component
/// of the base name, copied into `<build>/<prefix><name>/` with their
/// subdirectories kept
fn extra_sources(
    document: &SourceDocument,
    base: &Path,
    build_dir: &Path,
    prefix: &str,
    resolver: &PathResolver,
) -> Vec<CopyPair> {
    let name = base
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| document.stem());
    let dir_name = format!("{}{}", prefix, name);
    let parent = document.path().parent().unwrap_or_else(|| Path::new(""));
    let sources_dir = clean_path(&parent.join(&dir_name));
    let on_disk = resolver.resolve(&sources_dir);
    if !on_disk.is_dir() {
        return Vec::new();
    }

    tracing::info!("Copying sources dir {:?}", sources_dir);
    let target_dir = build_dir.join(&dir_name);
    WalkDir::new(&on_disk)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(&on_disk).ok()?.to_path_buf();
            Some(CopyPair {
                source: sources_dir.join(&relative),
                target: target_dir.join(&relative),
            })
        })
        .collect()
}
