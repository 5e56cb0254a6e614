//! Configuration parsing and management.

use crate::paths::clean_path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Per-document data forwarded to the page-template front matter
pub type PageData = BTreeMap<String, String>;

/// Main configuration struct matching the web-publishing.yaml schema.
///
/// Every key is optional; missing keys take the values of [`Config::default`].
/// Unrecognized keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    #[serde(rename = "DocumentRoot")]
    pub document_root: PathBuf,

    #[serde(rename = "BuildDirectory")]
    pub build_directory: PathBuf,

    /// Prefix under which PDFs are published
    #[serde(rename = "ServerPDFPath")]
    pub server_pdf_path: PathBuf,

    /// Keep the document's relative directory in the PDF path
    #[serde(rename = "ServerKeepPDFPath")]
    pub server_keep_pdf_path: bool,

    #[serde(rename = "PageData")]
    pub page_data: BTreeMap<String, PageData>,

    /// Documents use minted, which needs `-shell-escape`
    pub minted: bool,

    #[serde(rename = "BuildExclude")]
    pub build_exclude: Vec<PathBuf>,

    /// Directory receiving the page-template stubs
    #[serde(rename = "MiddlemanDirectory")]
    pub middleman_directory: PathBuf,

    #[serde(rename = "Host")]
    pub host: String,

    #[serde(rename = "RemotePath")]
    pub remote_path: String,

    /// Book main document -> member documents
    #[serde(rename = "Books")]
    pub books: BTreeMap<String, Vec<PathBuf>>,

    #[serde(rename = "BookExclude")]
    pub book_exclude: Vec<PathBuf>,

    #[serde(rename = "WebIndex")]
    pub web_index: Option<PathBuf>,

    #[serde(rename = "BookRoot")]
    pub book_root: PathBuf,

    /// Files copied verbatim into the build directory
    #[serde(rename = "CopyFiles")]
    pub copy_files: Vec<PathBuf>,

    /// Prefix of the per-document extra sources directory
    #[serde(rename = "SourcesPrefix")]
    pub sources_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            document_root: PathBuf::from("./"),
            build_directory: PathBuf::from(".pdflatex"),
            server_pdf_path: PathBuf::from("pdf"),
            server_keep_pdf_path: false,
            page_data: BTreeMap::new(),
            minted: true,
            build_exclude: Vec::new(),
            middleman_directory: PathBuf::from("source"),
            host: String::new(),
            remote_path: String::new(),
            books: BTreeMap::new(),
            book_exclude: Vec::new(),
            web_index: None,
            book_root: PathBuf::from("./"),
            copy_files: Vec::new(),
            sources_prefix: String::from("sources-"),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// Parse configuration text, filling defaults for missing keys
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a mapping
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to the defaults when the file is absent
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match Self::from_file(path) {
            Ok(config) => {
                tracing::info!("Using configuration file {:?}", path);
                Ok(config)
            }
            Err(ConfigError::ReadError(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("{:?} not found, using default configuration", path);
                Ok(Self::default())
            }
            Err(err) => Err(err),
        }
    }

    /// Reject values that deserialize fine but cannot describe a build
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.build_directory.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("BuildDirectory must not be empty".into()));
        }
        if self.server_pdf_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("ServerPDFPath must not be empty".into()));
        }
        if self.middleman_directory.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "MiddlemanDirectory must not be empty".into(),
            ));
        }
        if self.sources_prefix.contains('/') || self.sources_prefix.contains('\\') {
            return Err(ConfigError::Invalid(format!(
                "SourcesPrefix must not contain a path separator: {}",
                self.sources_prefix
            )));
        }
        Ok(())
    }

    /// Page data configured for `document`, matched on the cleaned path
    pub fn page_data_for(&self, document: &Path) -> Option<&PageData> {
        let wanted = clean_path(document);
        self.page_data
            .iter()
            .find(|(key, _)| clean_path(Path::new(key.as_str())) == wanted)
            .map(|(_, data)| data)
    }

    /// Whether `document` is the main file of a configured book
    pub fn is_book(&self, document: &Path) -> bool {
        let wanted = clean_path(document);
        self.books
            .keys()
            .any(|key| clean_path(Path::new(key.as_str())) == wanted)
    }

    /// Whether `document` is the designated web index page
    pub fn is_web_index(&self, document: &Path) -> bool {
        self.web_index
            .as_deref()
            .is_some_and(|index| clean_path(index) == clean_path(document))
    }
}
