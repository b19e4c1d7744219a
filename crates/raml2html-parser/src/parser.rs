//! RAML document loading.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::include::Resolver;
use crate::normalize::normalize;
use crate::object::RamlObject;
use crate::source::{Location, Source};

/// RAML versions this parser understands.
pub const SUPPORTED_VERSIONS: &[&str] = &["0.8", "1.0"];

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#%RAML\s+(\d+\.\d+)(?:\s+\w+)?\s*$").expect("valid RAML header pattern")
});

/// Errors that can occur when loading a RAML document.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to fetch {url}: HTTP status {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid YAML in {location}: {source}")]
    Yaml {
        location: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Missing #%RAML header in {0}")]
    MissingHeader(String),

    #[error("Unsupported RAML version {0}")]
    UnsupportedVersion(String),

    #[error("RAML document must be a mapping")]
    NotAMapping,

    #[error("Invalid !include in {location}: {message}")]
    Include { location: String, message: String },

    #[error("Includes nested deeper than {max} levels at {location}")]
    IncludeDepth { location: String, max: usize },

    #[error("Missing required property 'title'")]
    MissingTitle,

    #[error("Unknown trait '{0}'")]
    UnknownTrait(String),

    #[error("Unknown resource type '{0}'")]
    UnknownResourceType(String),

    #[error("Invalid RAML: {0}")]
    Invalid(String),
}

/// Parse a RAML document from any supported source into its normalized form.
///
/// Includes are resolved relative to the document they appear in; traits,
/// resource types and named schemas are applied before the object is returned.
pub async fn parse(source: impl Into<Source>) -> Result<RamlObject, ParseError> {
    let source = source.into();
    tracing::debug!("Parsing {}", source.describe());

    let resolver = Resolver::new();

    let (text, location) = match source {
        Source::Object(Value::Object(map)) => return normalize(map),
        Source::Object(_) => return Err(ParseError::NotAMapping),
        Source::Text(text) => (text, Location::Inline),
        Source::Path(path) => {
            let location = Location::File(path);
            (resolver.read(&location).await?, location)
        }
        Source::Url(url) => {
            let location = Location::Url(url);
            (resolver.read(&location).await?, location)
        }
    };

    let version = check_header(&text, &location)?;
    tracing::debug!("Detected RAML {} in {}", version, location);

    let document = parse_yaml(&text, &location)?;
    let value = resolver.resolve(document, &location, 0).await?;

    let Value::Object(mut map) = value else {
        return Err(ParseError::NotAMapping);
    };
    map.insert("ramlVersion".to_string(), Value::String(version));

    normalize(map)
}

/// Validate the `#%RAML` header and return the declared version.
fn check_header(text: &str, location: &Location) -> Result<String, ParseError> {
    let first_line = text
        .trim_start_matches('\u{feff}')
        .lines()
        .next()
        .unwrap_or("")
        .trim_end();

    let Some(captures) = HEADER.captures(first_line) else {
        return Err(ParseError::MissingHeader(location.to_string()));
    };

    let version = captures[1].to_string();
    if !SUPPORTED_VERSIONS.contains(&version.as_str()) {
        return Err(ParseError::UnsupportedVersion(version));
    }

    Ok(version)
}

pub(crate) fn parse_yaml(text: &str, location: &Location) -> Result<serde_yaml::Value, ParseError> {
    serde_yaml::from_str(text).map_err(|source| ParseError::Yaml {
        location: location.to_string(),
        source,
    })
}
