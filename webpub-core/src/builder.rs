//! Makefile generation - discovers documents and drives them into one graph.

use crate::{
    config::Config,
    document::{DocumentKind, DocumentSummary, DocumentUnit, SourceDocument, UnitContext},
    error::GraphError,
    graph::RuleGraph,
    locator::Locator,
    paths::{clean_path, make_path, PathResolver},
    recipe::{
        default_recipe, DeployRule, DEFAULT_TARGET, HOST, REDIRECT_BLOCK, REMOTE_PATH,
        TEX4HT_CONFIG,
    },
    scanner::DependencyScanner,
};
use std::path::{Path, PathBuf};

/// Directory middleman renders the site into
const SITE_DIR: &str = "build";

/// Source file extension of documents
const DOCUMENT_EXTENSION: &str = "tex";

/// The finished graph and a record of every registered document
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub graph: RuleGraph,
    pub documents: Vec<DocumentSummary>,
}

/// Main Makefile builder
pub struct GraphBuilder {
    config: Config,
    resolver: PathResolver,
    copy_files: Vec<PathBuf>,
}

impl GraphBuilder {
    pub fn new(config: Config, project_dir: impl Into<PathBuf>) -> Self {
        let copy_files = config.copy_files.clone();
        Self {
            config,
            resolver: PathResolver::new(project_dir),
            copy_files,
        }
    }

    /// Copy these files into the build directory in addition to `CopyFiles`
    pub fn with_copy_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.copy_files.extend(files.into_iter().map(Into::into));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the entire rule graph.
    ///
    /// Documents are processed one at a time in discovery order; the first
    /// error aborts the run without a partial graph.
    pub fn build(&self) -> Result<BuildOutcome, GraphError> {
        let mut graph = self.setup()?;
        let documents = self.discover()?;

        tracing::info!("Found {} LaTeX files", documents.len());

        self.verify_books(&documents)?;
        if let Some(index) = &self.config.web_index {
            if !documents.iter().any(|d| self.config.is_web_index(d)) {
                tracing::warn!("WebIndex {:?} is not among the discovered documents", index);
            }
        }

        let scanner = DependencyScanner::new(self.resolver.project_dir());
        let ctx = UnitContext {
            config: &self.config,
            resolver: &self.resolver,
            scanner: &scanner,
            tex4ht_config: self.resolver.resolve(Path::new(TEX4HT_CONFIG)).is_file(),
        };

        let mut summaries = Vec::with_capacity(documents.len());
        for path in &documents {
            let kind = if self.config.is_book(path) {
                DocumentKind::Book
            } else {
                DocumentKind::Page
            };
            let web_index = self.config.is_web_index(path);

            let document = SourceDocument::new(path, &self.config.document_root, &self.resolver)?;
            let unit = DocumentUnit::new(document, kind, web_index, ctx)?;
            summaries.push(unit.summary());
            unit.emit(&mut graph);
        }

        tracing::info!("Built rule graph with {} rules", graph.rules().len());

        Ok(BuildOutcome {
            graph,
            documents: summaries,
        })
    }

    /// Shared infrastructure every run starts from
    pub fn setup(&self) -> Result<RuleGraph, GraphError> {
        let build_dir = make_path(&self.config.build_directory);
        let mut graph = RuleGraph::new();

        graph.set_default_rule(DEFAULT_TARGET, default_recipe(&build_dir));
        graph.set_variable_once(HOST, self.config.host.clone());
        graph.set_variable_once(REMOTE_PATH, self.config.remote_path.clone());
        graph.add_rule(
            DeployRule {
                site_dir: SITE_DIR.to_string(),
                pdf_dir: make_path(&self.config.server_pdf_path),
            }
            .into_entry(),
        );
        graph.add_raw(REDIRECT_BLOCK);

        for file in &self.copy_files {
            let file = self.resolver.normalize(file);
            if !self.resolver.resolve(&file).is_file() {
                return Err(GraphError::NotFound(file));
            }
            let target = make_path(&self.config.build_directory.join(&file));
            graph.add_copy_rule(&target, &make_path(&file));
        }

        Ok(graph)
    }

    /// Candidate documents under the document root, sorted.
    ///
    /// Documents inside the build directory and those listed in
    /// `BuildExclude` are skipped.
    pub fn discover(&self) -> Result<Vec<PathBuf>, GraphError> {
        let root = self.resolver.normalize(&self.config.document_root);
        if !self.resolver.resolve(&root).is_dir() {
            return Err(GraphError::Configuration(format!(
                "document root {} does not exist",
                root.display()
            )));
        }

        let in_build_dir = Locator::new(self.resolver.clone())
            .locate(&self.config.build_directory, DOCUMENT_EXTENSION);
        let locator = Locator::new(self.resolver.clone())
            .with_excludes(in_build_dir)
            .with_excludes(&self.config.build_exclude);

        Ok(locator.locate(&root, DOCUMENT_EXTENSION))
    }

    fn verify_books(&self, documents: &[PathBuf]) -> Result<(), GraphError> {
        for (main, members) in &self.config.books {
            let main = self.resolver.normalize(Path::new(main));
            let members = if members.is_empty() {
                self.default_book_members(documents, &main)
            } else {
                members.iter().map(|m| self.resolver.normalize(m)).collect()
            };

            for missing in self.verify_book(&main, &members)? {
                tracing::warn!(
                    "{:?} is not included in {:?} and not excluded in BookExclude",
                    missing,
                    main
                );
            }
        }
        Ok(())
    }

    /// Pages under `BookRoot` that are neither excluded nor books themselves
    fn default_book_members(&self, documents: &[PathBuf], main: &Path) -> Vec<PathBuf> {
        let book_root = self.resolver.normalize(&self.config.book_root);
        let excluded: Vec<PathBuf> = self
            .config
            .book_exclude
            .iter()
            .map(|p| self.resolver.normalize(p))
            .collect();

        documents
            .iter()
            .filter(|d| d.as_path() != main)
            .filter(|d| book_root == Path::new(".") || d.starts_with(&book_root))
            .filter(|d| !excluded.contains(*d))
            .filter(|d| !self.config.is_book(d))
            .cloned()
            .collect()
    }

    /// Members that `main` does not pull in with `\subfile{...}`
    pub fn verify_book(&self, main: &Path, members: &[PathBuf]) -> Result<Vec<PathBuf>, GraphError> {
        let on_disk = self.resolver.resolve(main);
        if !on_disk.is_file() {
            return Err(GraphError::NotFound(main.to_path_buf()));
        }
        let text = std::fs::read_to_string(&on_disk).map_err(|source| GraphError::Io {
            path: main.to_path_buf(),
            source,
        })?;

        let main_dir = main.parent().unwrap_or_else(|| Path::new(""));
        let missing = members
            .iter()
            .filter(|member| {
                let stem = clean_path(&member.with_extension(""));
                let mut spellings = vec![make_path(&stem)];
                if let Ok(relative) = stem.strip_prefix(main_dir) {
                    spellings.push(make_path(relative));
                }
                !spellings
                    .iter()
                    .any(|s| text.contains(&format!("\\subfile{{{}}}", s)))
            })
            .cloned()
            .collect();
        Ok(missing)
    }
}
