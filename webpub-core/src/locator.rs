//! Source file discovery.

use crate::paths::{clean_path, PathResolver};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursive file finder with an exact-path exclusion list
#[derive(Debug, Clone)]
pub struct Locator {
    resolver: PathResolver,
    excludes: Vec<PathBuf>,
}

impl Locator {
    pub fn new(resolver: PathResolver) -> Self {
        Self {
            resolver,
            excludes: Vec::new(),
        }
    }

    pub fn with_excludes<I, P>(mut self, excludes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.excludes.extend(
            excludes
                .into_iter()
                .map(|path| self.resolver.normalize(path.as_ref())),
        );
        self
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        let path = clean_path(path);
        self.excludes.iter().any(|excluded| *excluded == path)
    }

    /// Every file under `root` with `extension`, as sorted project-relative paths
    pub fn locate(&self, root: &Path, extension: &str) -> Vec<PathBuf> {
        let root = self.resolver.normalize(root);
        tracing::info!(
            "Recursively searching {:?} for .{} files...",
            root,
            extension
        );

        let mut files = Vec::new();
        for entry in WalkDir::new(self.resolver.resolve(&root))
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            if entry.path().extension() != Some(OsStr::new(extension)) {
                continue;
            }

            let relative = self.resolver.normalize(entry.path());
            if self.is_excluded(&relative) {
                tracing::info!("Excluding {:?}", relative);
                continue;
            }

            tracing::debug!("Adding {:?}", relative);
            files.push(relative);
        }

        files
    }
}
