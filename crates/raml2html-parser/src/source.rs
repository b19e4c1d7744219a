//! RAML sources and where their includes are resolved from.

use std::fmt;
use std::path::{Path, PathBuf};

use reqwest::Url;
use serde_json::Value;

use crate::parser::ParseError;

/// Anything a RAML document can be loaded from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// A file on disk.
    Path(PathBuf),
    /// A document served over HTTP(S).
    Url(Url),
    /// Raw RAML text, including the `#%RAML` header.
    Text(String),
    /// An already-parsed document.
    Object(Value),
}

impl Source {
    /// Classify a string the way the command line does.
    ///
    /// `http://` and `https://` prefixes are URLs, existing files are paths,
    /// anything else is treated as raw RAML text.
    pub fn detect(input: &str) -> Self {
        if input.starts_with("http://") || input.starts_with("https://") {
            if let Ok(url) = Url::parse(input) {
                return Source::Url(url);
            }
        }

        if !input.contains('\n') && Path::new(input).is_file() {
            return Source::Path(PathBuf::from(input));
        }

        Source::Text(input.to_string())
    }

    /// Human readable description used in logs and errors.
    pub fn describe(&self) -> String {
        match self {
            Source::Path(path) => path.display().to_string(),
            Source::Url(url) => url.to_string(),
            Source::Text(_) => "<inline RAML>".to_string(),
            Source::Object(_) => "<pre-parsed object>".to_string(),
        }
    }
}

impl From<&str> for Source {
    fn from(input: &str) -> Self {
        Source::detect(input)
    }
}

impl From<String> for Source {
    fn from(input: String) -> Self {
        Source::detect(&input)
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Source::Path(path)
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Source::Path(path.to_path_buf())
    }
}

impl From<Url> for Source {
    fn from(url: Url) -> Self {
        Source::Url(url)
    }
}

impl From<Value> for Source {
    fn from(value: Value) -> Self {
        Source::Object(value)
    }
}

/// The document an `!include` is relative to.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Location {
    File(PathBuf),
    Url(Url),
    /// Raw text; includes resolve against the working directory.
    Inline,
}

impl Location {
    /// Resolve a reference found inside this document.
    pub(crate) fn join(&self, reference: &str) -> Result<Location, ParseError> {
        let reference = reference.trim();

        if reference.starts_with("http://") || reference.starts_with("https://") {
            return Url::parse(reference)
                .map(Location::Url)
                .map_err(|e| self.include_error(format!("{reference}: {e}")));
        }

        match self {
            Location::File(path) => {
                let parent = path.parent().unwrap_or(Path::new(""));
                Ok(Location::File(parent.join(reference)))
            }
            Location::Url(url) => url
                .join(reference)
                .map(Location::Url)
                .map_err(|e| self.include_error(format!("{reference}: {e}"))),
            Location::Inline => Ok(Location::File(PathBuf::from(reference))),
        }
    }

    /// Read the document behind this location.
    pub(crate) async fn read(&self, client: &reqwest::Client) -> Result<String, ParseError> {
        match self {
            Location::File(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| ParseError::Io {
                        path: path.clone(),
                        source,
                    })
            }
            Location::Url(url) => {
                tracing::info!("Fetching {}", url);

                let response = client
                    .get(url.clone())
                    .send()
                    .await
                    .map_err(|source| ParseError::Http {
                        url: url.to_string(),
                        source,
                    })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(ParseError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }

                response.text().await.map_err(|source| ParseError::Http {
                    url: url.to_string(),
                    source,
                })
            }
            Location::Inline => Err(self.include_error("inline text has no content to read")),
        }
    }

    /// Whether the included document is parsed as YAML rather than kept as text.
    pub(crate) fn is_yaml(&self) -> bool {
        let name = match self {
            Location::File(path) => path.to_string_lossy().to_string(),
            Location::Url(url) => url.path().to_string(),
            Location::Inline => return false,
        };

        let name = name.to_ascii_lowercase();
        name.ends_with(".raml") || name.ends_with(".yaml") || name.ends_with(".yml")
    }

    fn include_error(&self, message: impl Into<String>) -> ParseError {
        ParseError::Include {
            location: self.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::File(path) => write!(f, "{}", path.display()),
            Location::Url(url) => write!(f, "{}", url),
            Location::Inline => f.write_str("<inline RAML>"),
        }
    }
}
