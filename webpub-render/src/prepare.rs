//! Page-template preparation from converted HTML.

use crate::RenderError;
use askama::Template;
use regex::Regex;
use std::sync::OnceLock;

/// CSS rules carried over into the page; make4ht emits one per text color
const RELEVANT_STYLE_MARKER: &str = ".textcolor-";

static TITLE_REGEX: OnceLock<Regex> = OnceLock::new();
static BODY_REGEX: OnceLock<Regex> = OnceLock::new();

fn title_regex() -> &'static Regex {
    TITLE_REGEX.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap())
}

fn body_regex() -> &'static Regex {
    BODY_REGEX.get_or_init(|| Regex::new(r"(?is)<body[^>]*>(.*)</body>").unwrap())
}

/// Page-template stub: front matter, carried-over style, page body
#[derive(Template)]
#[template(path = "page.html.erb", escape = "none")]
pub struct PageTemplate<'a> {
    pub front_matter: &'a str,
    pub style: &'a str,
    pub body: &'a str,
}

/// Parse the `key=value,key=value` argument of the prepare step
pub fn parse_page_data(arg: &str) -> Result<Vec<(String, String)>, RenderError> {
    if arg.trim().is_empty() {
        return Ok(Vec::new());
    }

    arg.split(',')
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| RenderError::MalformedPageData(entry.to_string()))
        })
        .collect()
}

/// Text of the document's `<title>`, if present and non-empty
pub fn extract_title(html: &str) -> Option<String> {
    title_regex()
        .captures(html)
        .map(|captures| captures[1].split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|title| !title.is_empty())
}

/// Markup inside `<body>`, or the whole input when there is no body element
pub fn body_inner(html: &str) -> &str {
    body_regex()
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(html)
}

/// CSS lines worth keeping on the published page
pub fn relevant_style(css: &str) -> String {
    css.lines()
        .filter(|line| line.contains(RELEVANT_STYLE_MARKER))
        .map(|line| format!("{}\n", line))
        .collect()
}

/// YAML front matter block for `page_data`, in order
pub fn front_matter(page_data: &[(String, String)]) -> Result<String, RenderError> {
    let mut mapping = serde_yaml::Mapping::new();
    for (key, value) in page_data {
        mapping.insert(key.as_str().into(), value.as_str().into());
    }
    Ok(serde_yaml::to_string(&mapping)?)
}

/// Render the page-template stub for one converted document.
///
/// `source_name` only labels the missing-title error.
pub fn prepare_template(
    source_name: &str,
    html: &str,
    css: &str,
    page_data: &[(String, String)],
) -> Result<String, RenderError> {
    let title =
        extract_title(html).ok_or_else(|| RenderError::MissingTitle(source_name.to_string()))?;

    let mut data: Vec<(String, String)> = page_data
        .iter()
        .filter(|(key, _)| key != "title")
        .cloned()
        .collect();
    tracing::debug!("{}: title {:?}", source_name, title);
    data.push(("title".to_string(), title));

    let front_matter = front_matter(&data)?;
    let style = relevant_style(css);
    let page = PageTemplate {
        front_matter: &front_matter,
        style: &style,
        body: body_inner(html),
    };
    Ok(page.render()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>
  Linear Algebra Notes
</title><link rel="stylesheet" href="notes.css"></head>
<body>
<h2 class="titleHead">Linear Algebra Notes</h2>
<p>Vectors.</p>
</body>
</html>"#;

    const CSS: &str = ".textcolor-rgb0 { color: red; }\np.noindent { margin: 0; }\n";

    #[test]
    fn test_parse_page_data() {
        let data = parse_page_data("layout=chapter,pdfLink=/pdf/a.pdf").unwrap();
        assert_eq!(
            data,
            vec![
                ("layout".to_string(), "chapter".to_string()),
                ("pdfLink".to_string(), "/pdf/a.pdf".to_string()),
            ]
        );
        assert!(parse_page_data("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_page_data_rejects_bare_words() {
        assert!(matches!(
            parse_page_data("layout"),
            Err(RenderError::MalformedPageData(_))
        ));
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(extract_title(HTML).as_deref(), Some("Linear Algebra Notes"));
        assert_eq!(extract_title("<title> </title>"), None);
        assert_eq!(extract_title("<p>no head</p>"), None);
    }

    #[test]
    fn test_relevant_style() {
        assert_eq!(relevant_style(CSS), ".textcolor-rgb0 { color: red; }\n");
    }

    #[test]
    fn test_prepare_template() {
        let data = vec![("pdfLink".to_string(), "/pdf/notes.pdf".to_string())];
        let page = prepare_template("notes.html", HTML, CSS, &data).unwrap();

        assert!(page.starts_with("---\npdfLink: /pdf/notes.pdf\ntitle: Linear Algebra Notes\n---\n"));
        assert!(page.contains("<style>.textcolor-rgb0 { color: red; }\n</style>"));
        assert!(page.contains("<h2 class=\"titleHead\">Linear Algebra Notes</h2>"));
        assert!(!page.contains("<body>"));
        assert!(!page.contains("noindent"));
    }

    #[test]
    fn test_prepare_requires_title() {
        let result = prepare_template("empty.html", "<html><body></body></html>", "", &[]);
        assert!(matches!(result, Err(RenderError::MissingTitle(name)) if name == "empty.html"));
    }
}
