//! Target path derivation.
//!
//! Every path emitted into the Makefile is relative to the project directory
//! (the directory holding the Makefile). [`PathResolver`] anchors the few
//! existence checks that derivation needs to that directory, while
//! [`derive_pdf_target`] and [`derive_html_targets`] are pure.

use crate::error::GraphError;
use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};

/// Token substituted for the last component of the web index document
pub const INDEX_NAME: &str = "index";

/// HTML intermediate and page-template stub derived from one base name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlTargets {
    pub html: PathBuf,
    pub template: PathBuf,
}

/// Resolves project-relative paths against the project directory
#[derive(Debug, Clone)]
pub struct PathResolver {
    project_dir: PathBuf,
}

impl PathResolver {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        let project_dir = project_dir.into();
        let project_dir = std::fs::canonicalize(&project_dir).unwrap_or(project_dir);
        Self { project_dir }
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// On-disk location of a project-relative path
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.project_dir.join(path)
    }

    /// Project-relative, lexically clean spelling of `path`.
    ///
    /// Absolute paths under the project directory lose that prefix. Relative
    /// paths have `.` dropped and `..` folded; one still climbing out of the
    /// project is resolved on disk, so `../<project>/doc` becomes `doc`.
    pub fn normalize(&self, path: &Path) -> PathBuf {
        if !path.is_absolute() {
            let cleaned = clean_path(path);
            let climbs = cleaned
                .components()
                .any(|c| matches!(c, Component::ParentDir));
            if !climbs {
                return cleaned;
            }
            return match std::fs::canonicalize(self.resolve(&cleaned)) {
                Ok(absolute) => self.strip_project_dir(absolute),
                Err(_) => cleaned,
            };
        }

        let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| clean_path(path));
        self.strip_project_dir(absolute)
    }

    fn strip_project_dir(&self, absolute: PathBuf) -> PathBuf {
        match absolute.strip_prefix(&self.project_dir) {
            Ok(relative) if relative.as_os_str().is_empty() => PathBuf::from("."),
            Ok(relative) => relative.to_path_buf(),
            Err(_) => absolute,
        }
    }

    /// Base name of `source`: extension stripped and the document root's
    /// leading components sliced off.
    ///
    /// The slice point is the root's component count; the components are not
    /// compared. With `flatten_to_index` the last remaining component becomes
    /// [`INDEX_NAME`].
    pub fn derive_base_name(
        &self,
        source: &Path,
        root: &Path,
        flatten_to_index: bool,
    ) -> Result<PathBuf, GraphError> {
        let root = self.normalize(root);
        if !self.resolve(&root).is_dir() {
            return Err(GraphError::Configuration(format!(
                "document root {} does not exist",
                root.display()
            )));
        }

        let source = self.normalize(source);
        let mut parts = path_components(&source.with_extension(""));
        let slice = path_components(&root).len();
        if slice >= parts.len() {
            return Err(GraphError::Structure {
                path: source,
                root,
            });
        }

        let mut remainder = parts.split_off(slice);
        if flatten_to_index {
            if let Some(last) = remainder.last_mut() {
                *last = OsString::from(INDEX_NAME);
            }
        }
        Ok(remainder.iter().collect())
    }
}

/// Published PDF path for a base name.
///
/// Without `keep_full_path` only the last component survives, so documents
/// sharing a file name in different directories map to the same target.
pub fn derive_pdf_target(base: &Path, server_pdf_prefix: &Path, keep_full_path: bool) -> PathBuf {
    let name = if keep_full_path {
        base.to_path_buf()
    } else {
        base.file_name().map(PathBuf::from).unwrap_or_default()
    };
    clean_path(&server_pdf_prefix.join(with_suffix(&name, ".pdf")))
}

/// HTML intermediate and template-source stub for a base name
pub fn derive_html_targets(
    base: &Path,
    build_directory: &Path,
    template_directory: &Path,
) -> HtmlTargets {
    HtmlTargets {
        html: clean_path(&build_directory.join(with_suffix(base, ".html"))),
        template: clean_path(&template_directory.join(with_suffix(base, ".html.erb"))),
    }
}

/// Append `suffix` to the final component without touching existing dots
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Lexically clean a path: drop `.` and fold `..` into a preceding component
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        PathBuf::from(".")
    } else {
        out.iter().collect()
    }
}

/// The named components of a cleaned relative path (`.` has none)
pub fn path_components(path: &Path) -> Vec<OsString> {
    clean_path(path)
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_os_string()),
            Component::ParentDir => Some(OsString::from("..")),
            _ => None,
        })
        .collect()
}

/// Spelling of a path inside the Makefile: `/`-separated, `.` when empty
pub fn make_path(path: &Path) -> String {
    let cleaned = clean_path(path);
    let absolute = cleaned.has_root();
    let joined = cleaned
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            Component::ParentDir => Some(OsStr::new("..")),
            Component::CurDir => Some(OsStr::new(".")),
            _ => None,
        })
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");

    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn project() -> (tempfile::TempDir, PathResolver) {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("doc/chapters")).unwrap();
        fs::write(dir.path().join("doc/chapters/intro.tex"), "").unwrap();
        let resolver = PathResolver::new(dir.path());
        (dir, resolver)
    }

    #[test]
    fn test_base_name_strips_root() {
        let (_dir, resolver) = project();
        let base = resolver
            .derive_base_name(Path::new("doc/chapters/intro.tex"), Path::new("doc"), false)
            .unwrap();
        assert_eq!(base, PathBuf::from("chapters/intro"));
    }

    #[test]
    fn test_base_name_ignores_path_spelling() {
        let (dir, resolver) = project();
        let expected = PathBuf::from("chapters/intro");
        let project_name = resolver.project_dir().file_name().unwrap().to_os_string();

        let spellings = [
            (PathBuf::from("./doc/chapters/intro.tex"), PathBuf::from("doc/")),
            (
                dir.path().join("doc/chapters/intro.tex"),
                PathBuf::from("./doc"),
            ),
            (PathBuf::from("doc/chapters/intro.tex"), dir.path().join("doc")),
            (
                PathBuf::from("doc/../doc/chapters/intro.tex"),
                PathBuf::from("doc/./"),
            ),
            (
                PathBuf::from("doc/chapters/intro.tex"),
                PathBuf::from("..").join(project_name).join("doc"),
            ),
        ];
        for (source, root) in spellings {
            let base = resolver.derive_base_name(&source, &root, false).unwrap();
            assert_eq!(base, expected, "{:?} under {:?}", source, root);
        }
    }

    #[test]
    fn test_current_directory_root_keeps_everything() {
        let (_dir, resolver) = project();
        let base = resolver
            .derive_base_name(Path::new("doc/chapters/intro.tex"), Path::new("./"), false)
            .unwrap();
        assert_eq!(base, PathBuf::from("doc/chapters/intro"));
    }

    #[test]
    fn test_flatten_to_index_replaces_only_last_component() {
        let (_dir, resolver) = project();
        let base = resolver
            .derive_base_name(Path::new("doc/chapters/intro.tex"), Path::new("doc"), true)
            .unwrap();
        assert_eq!(base, PathBuf::from("chapters/index"));

        let base = resolver
            .derive_base_name(Path::new("doc/chapters/intro.tex"), Path::new("./"), true)
            .unwrap();
        assert_eq!(base, PathBuf::from("doc/chapters/index"));
    }

    #[test]
    fn test_missing_root_is_configuration_error() {
        let (_dir, resolver) = project();
        let result =
            resolver.derive_base_name(Path::new("doc/chapters/intro.tex"), Path::new("nope"), false);
        assert!(matches!(result, Err(GraphError::Configuration(_))));
    }

    #[test]
    fn test_slicing_past_components_is_structure_error() {
        let (_dir, resolver) = project();
        let result = resolver.derive_base_name(
            Path::new("doc/intro.tex"),
            Path::new("doc/chapters"),
            false,
        );
        assert!(matches!(result, Err(GraphError::Structure { .. })));
    }

    #[test]
    fn test_pdf_target_flat_and_full() {
        let base = Path::new("chapters/intro");
        assert_eq!(
            derive_pdf_target(base, Path::new("pdf"), false),
            PathBuf::from("pdf/intro.pdf")
        );
        assert_eq!(
            derive_pdf_target(base, Path::new("pdf"), true),
            PathBuf::from("pdf/chapters/intro.pdf")
        );
    }

    #[test]
    fn test_pdf_target_keeps_dotted_names() {
        assert_eq!(
            derive_pdf_target(Path::new("notes/v1.2"), Path::new("./pdf"), false),
            PathBuf::from("pdf/v1.2.pdf")
        );
    }

    #[test]
    fn test_html_targets() {
        let targets = derive_html_targets(
            Path::new("chapters/intro"),
            Path::new(".pdflatex"),
            Path::new("source"),
        );
        assert_eq!(targets.html, PathBuf::from(".pdflatex/chapters/intro.html"));
        assert_eq!(
            targets.template,
            PathBuf::from("source/chapters/intro.html.erb")
        );
    }

    #[test]
    fn test_path_components() {
        assert!(path_components(Path::new(".")).is_empty());
        assert!(path_components(Path::new("./")).is_empty());
        assert_eq!(path_components(Path::new("a/./b/")).len(), 2);
        assert_eq!(path_components(Path::new("../a")).len(), 2);
    }

    #[test]
    fn test_make_path() {
        assert_eq!(make_path(Path::new("./.pdflatex/a.html")), ".pdflatex/a.html");
        assert_eq!(make_path(Path::new("./")), ".");
        assert_eq!(make_path(Path::new("a/../b")), "b");
    }
}
