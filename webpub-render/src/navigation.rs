//! Site navigation markup.

use crate::RenderError;
use askama::Template;
use std::path::{Component, Path, PathBuf};

/// Link target and page title of one navigation item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub link: String,
    pub title: String,
}

/// Pages sharing a top-level directory; `name` is `None` for top-level pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavFolder {
    pub name: Option<String>,
    pub entries: Vec<NavEntry>,
}

#[derive(Template)]
#[template(path = "navigation.html")]
pub struct NavigationTemplate {
    pub folders: Vec<NavFolder>,
    pub book_link: Option<String>,
}

/// Drop the first `dir`-many components of `path`
pub fn strip_leading_dir(path: &Path, dir: &Path) -> PathBuf {
    let skip = dir
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count();
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .skip(skip)
        .collect()
}

/// Site URL of a page from its build-relative HTML path
pub fn link_for(html_path: &Path) -> String {
    let parts: Vec<String> = html_path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    let joined = parts.join("/");
    if joined == "index.html" {
        return "/".to_string();
    }
    let stem = joined.strip_suffix(".html").unwrap_or(&joined);
    format!("/{}/", stem)
}

/// Group entries by their top-level directory, in first-seen order.
///
/// A later entry with the same link replaces the earlier one.
pub fn group_folders(entries: Vec<NavEntry>) -> Result<Vec<NavFolder>, RenderError> {
    let mut folders: Vec<NavFolder> = Vec::new();

    for entry in entries {
        let parts: Vec<&str> = entry.link.split('/').filter(|p| !p.is_empty()).collect();
        let name = match parts.len() {
            0 | 1 => None,
            2 => Some(parts[0].to_string()),
            _ => return Err(RenderError::TooDeep(entry.link)),
        };

        let idx = match folders.iter().position(|f| f.name == name) {
            Some(idx) => idx,
            None => {
                folders.push(NavFolder {
                    name,
                    entries: Vec::new(),
                });
                folders.len() - 1
            }
        };

        let folder = &mut folders[idx];
        match folder.entries.iter_mut().find(|e| e.link == entry.link) {
            Some(existing) => *existing = entry,
            None => folder.entries.push(entry),
        }
    }

    Ok(folders)
}

/// Navigation markup for `pages` (build-relative HTML path, title)
pub fn render_navigation(
    pages: Vec<(PathBuf, String)>,
    book: Option<&str>,
) -> Result<String, RenderError> {
    let entries = pages
        .into_iter()
        .map(|(path, title)| NavEntry {
            link: link_for(&path),
            title,
        })
        .collect();

    let folders = group_folders(entries)?;
    tracing::debug!("Rendering navigation with {} folders", folders.len());

    let template = NavigationTemplate {
        folders,
        book_link: book
            .filter(|b| !b.is_empty())
            .map(|b| format!("/{}", b.trim_start_matches('/'))),
    };
    Ok(template.render()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(link: &str, title: &str) -> NavEntry {
        NavEntry {
            link: link.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn test_link_for() {
        assert_eq!(link_for(Path::new("index.html")), "/");
        assert_eq!(link_for(Path::new("intro.html")), "/intro/");
        assert_eq!(link_for(Path::new("chapters/intro.html")), "/chapters/intro/");
    }

    #[test]
    fn test_strip_leading_dir() {
        assert_eq!(
            strip_leading_dir(Path::new(".pdflatex/chapters/a.html"), Path::new(".pdflatex")),
            PathBuf::from("chapters/a.html")
        );
        assert_eq!(
            strip_leading_dir(Path::new("a.html"), Path::new("")),
            PathBuf::from("a.html")
        );
    }

    #[test]
    fn test_group_folders() {
        let folders = group_folders(vec![
            entry("/", "Home"),
            entry("/chapters/one/", "One"),
            entry("/about/", "About"),
            entry("/chapters/two/", "Two"),
        ])
        .unwrap();

        assert_eq!(folders.len(), 2);
        assert_eq!(folders[0].name, None);
        assert_eq!(folders[0].entries.len(), 2);
        assert_eq!(folders[1].name.as_deref(), Some("chapters"));
        assert_eq!(
            folders[1].entries,
            vec![entry("/chapters/one/", "One"), entry("/chapters/two/", "Two")]
        );
    }

    #[test]
    fn test_group_folders_rejects_deep_nesting() {
        let result = group_folders(vec![entry("/a/b/c/", "Deep")]);
        assert!(matches!(result, Err(RenderError::TooDeep(_))));
    }

    #[test]
    fn test_render_navigation() {
        let nav = render_navigation(
            vec![
                (PathBuf::from("index.html"), "Home".to_string()),
                (PathBuf::from("chapters/one.html"), "One".to_string()),
            ],
            None,
        )
        .unwrap();

        insta::assert_snapshot!(nav, @r#"
        <nav>
          <div class="menu-wrap">
            <input class="toggler" name="" type="checkbox" value=""/>
            <div class="hamburger"><div></div></div>
            <div class="menu">
              <div>
                <ul>
                    <li class=""><a href="/">Home</a></li>
        <ul class="folder">
        <h5>chapters</h5>
                    <li class=""><a href="/chapters/one/">One</a></li>
        </ul>
                </ul>
              </div>
            </div>
          </div>
          <div class="brand"></div>
          <ul class="button-header">
            <li><a class="button" href="/">Home</a></li>
            <li><a class="button" href="<%= current_page.data.pdfLink %>"><div>
              <div id="downloadIcon"></div></div></a></li>
          </ul>
        </nav>
        "#);
    }

    #[test]
    fn test_render_navigation_book_link() {
        let nav = render_navigation(
            vec![(PathBuf::from("index.html"), "Home".to_string())],
            Some("pdf/book.pdf"),
        )
        .unwrap();
        assert!(nav.contains(r#"<a class="nav-book-link" href="/pdf/book.pdf">"#));
    }

    #[test]
    fn test_render_navigation_without_book() {
        let nav = render_navigation(vec![(PathBuf::from("a.html"), "A".to_string())], None).unwrap();
        assert!(!nav.contains("nav-book-link"));
        assert!(!nav.contains("<ul class=\"folder\">"));
    }
}
