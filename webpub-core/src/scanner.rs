//! Structural dependency discovery.
//!
//! Only four directive shapes matter to the Makefile:
//!
//! ```text
//! \documentclass{name}            -> name.cls
//! \documentclass[arg]{name}       -> arg, arg.tex, name.cls
//! \subfile{path}                  -> path.tex
//! \usepackage[opts]{a,b}          -> a.sty, b.sty   (also \RequirePackage)
//! ```
//!
//! A candidate is kept only when a file exists at that path under the
//! project directory. Anything else may resolve through the compiler's own
//! search path, so misses are not errors.

use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static DIRECTIVE_REGEX: OnceLock<Regex> = OnceLock::new();

fn directive_regex() -> &'static Regex {
    DIRECTIVE_REGEX.get_or_init(|| {
        Regex::new(
            r"\\(documentclass|subfile|usepackage|RequirePackage)\s*((?:\[[^\]\n]*\]\s*|\{[^}\n]*\}\s*)+)",
        )
        .unwrap()
    })
}

/// Delimiter that opened an argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Bracket,
    Brace,
}

/// One non-empty run between `{ } [ ]` delimiters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument<'a> {
    pub delimiter: Delimiter,
    pub text: &'a str,
}

/// Split a directive's argument tail into its arguments, left to right
pub fn tokenize_arguments(tail: &str) -> Vec<Argument<'_>> {
    let mut arguments = Vec::new();
    let mut delimiter = None;
    let mut start = 0;

    for (idx, ch) in tail.char_indices() {
        match ch {
            '[' | '{' | ']' | '}' => {
                if let Some(open) = delimiter {
                    let text = tail[start..idx].trim();
                    if !text.is_empty() {
                        arguments.push(Argument {
                            delimiter: open,
                            text,
                        });
                    }
                }
                delimiter = match ch {
                    '[' => Some(Delimiter::Bracket),
                    '{' => Some(Delimiter::Brace),
                    _ => None,
                };
                start = idx + ch.len_utf8();
            }
            _ => {}
        }
    }

    arguments
}

/// Drop everything after an unescaped `%`
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (idx, &byte) in bytes.iter().enumerate() {
        if byte == b'%' {
            let backslashes = bytes[..idx].iter().rev().take_while(|&&b| b == b'\\').count();
            if backslashes % 2 == 0 {
                return &line[..idx];
            }
        }
    }
    line
}

/// Candidate paths named by one directive, before the existence check
fn candidates(directive: &str, arguments: &[Argument<'_>]) -> Vec<String> {
    let mut out = Vec::new();
    match directive {
        "documentclass" => {
            for argument in arguments {
                match argument.delimiter {
                    Delimiter::Bracket => {
                        out.push(argument.text.to_string());
                        out.push(format!("{}.tex", argument.text));
                    }
                    Delimiter::Brace => out.push(format!("{}.cls", argument.text)),
                }
            }
        }
        "subfile" => {
            if let Some(argument) = arguments.iter().find(|a| a.delimiter == Delimiter::Brace) {
                out.push(format!("{}.tex", argument.text));
            }
        }
        "usepackage" | "RequirePackage" => {
            for argument in arguments.iter().filter(|a| a.delimiter == Delimiter::Brace) {
                for package in argument.text.split(',') {
                    let package = package.trim();
                    if !package.is_empty() {
                        out.push(format!("{}.sty", package));
                    }
                }
            }
        }
        _ => {}
    }
    out
}

/// Scans document text for project files it structurally depends on
#[derive(Debug, Clone)]
pub struct DependencyScanner {
    project_dir: PathBuf,
}

impl DependencyScanner {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
        }
    }

    /// Existing dependency files in order of first appearance
    pub fn scan(&self, text: &str) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for line in text.lines() {
            let line = strip_comment(line);
            for captures in directive_regex().captures_iter(line) {
                let directive = &captures[1];
                let arguments = tokenize_arguments(&captures[2]);
                for candidate in candidates(directive, &arguments) {
                    let path = PathBuf::from(candidate);
                    if seen.contains(&path) {
                        continue;
                    }
                    if self.exists(&path) {
                        tracing::debug!("Found structural dependency {:?}", path);
                        seen.insert(path.clone());
                        found.push(path);
                    }
                }
            }
        }

        found
    }

    /// Read and scan a document on disk
    pub fn scan_file(&self, document: &Path) -> std::io::Result<Vec<PathBuf>> {
        let text = std::fs::read_to_string(self.project_dir.join(document))?;
        Ok(self.scan(&text))
    }

    fn exists(&self, candidate: &Path) -> bool {
        self.project_dir.join(candidate).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_tokenize_mixed_delimiters() {
        let arguments = tokenize_arguments("[twocolumn]{article}");
        assert_eq!(
            arguments,
            vec![
                Argument {
                    delimiter: Delimiter::Bracket,
                    text: "twocolumn"
                },
                Argument {
                    delimiter: Delimiter::Brace,
                    text: "article"
                },
            ]
        );
    }

    #[test]
    fn test_tokenize_skips_empty_runs() {
        let arguments = tokenize_arguments("[]{report}");
        assert_eq!(arguments.len(), 1);
        assert_eq!(arguments[0].text, "report");
    }

    #[test]
    fn test_class_from_compiler_library_is_dropped() {
        let dir = tempdir().unwrap();
        let scanner = DependencyScanner::new(dir.path());
        assert!(scanner.scan(r"\documentclass[twocolumn]{article}").is_empty());
    }

    #[test]
    fn test_local_class_is_found() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("article.cls"), "").unwrap();
        let scanner = DependencyScanner::new(dir.path());
        assert_eq!(
            scanner.scan(r"\documentclass[twocolumn]{article}"),
            vec![PathBuf::from("article.cls")]
        );
    }

    #[test]
    fn test_subfile_is_found() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sections")).unwrap();
        fs::write(dir.path().join("sections/intro.tex"), "").unwrap();
        let scanner = DependencyScanner::new(dir.path());
        assert_eq!(
            scanner.scan(r"\subfile{sections/intro}"),
            vec![PathBuf::from("sections/intro.tex")]
        );
    }

    #[test]
    fn test_subfiles_main_document_argument() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("main.tex"), "").unwrap();
        fs::write(dir.path().join("book.tex"), "").unwrap();
        let scanner = DependencyScanner::new(dir.path());

        // Written with and without the extension
        assert_eq!(
            scanner.scan(r"\documentclass[main.tex]{subfiles}"),
            vec![PathBuf::from("main.tex")]
        );
        assert_eq!(
            scanner.scan(r"\documentclass[book]{subfiles}"),
            vec![PathBuf::from("book.tex")]
        );
    }

    #[test]
    fn test_both_class_arguments_local() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("base.tex"), "").unwrap();
        fs::write(dir.path().join("notes.cls"), "").unwrap();
        let scanner = DependencyScanner::new(dir.path());
        assert_eq!(
            scanner.scan(r"\documentclass[base]{notes}"),
            vec![PathBuf::from("base.tex"), PathBuf::from("notes.cls")]
        );
    }

    #[test]
    fn test_style_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("common.sty"), "").unwrap();
        let scanner = DependencyScanner::new(dir.path());
        let text = "\\usepackage[utf8]{inputenc}\n\\usepackage{amsmath, common}\n";
        assert_eq!(scanner.scan(text), vec![PathBuf::from("common.sty")]);
    }

    #[test]
    fn test_comments_and_duplicates() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("common.sty"), "").unwrap();
        fs::write(dir.path().join("old.sty"), "").unwrap();
        let scanner = DependencyScanner::new(dir.path());
        let text = "% \\usepackage{old}\n\\usepackage{common}\n\\RequirePackage{common}\n";
        assert_eq!(scanner.scan(text), vec![PathBuf::from("common.sty")]);
    }

    #[test]
    fn test_escaped_percent_is_not_a_comment() {
        assert_eq!(strip_comment(r"50\% \subfile{a}"), r"50\% \subfile{a}");
        assert_eq!(strip_comment(r"\subfile{a} % note"), r"\subfile{a} ");
    }
}
