//! Pipeline configuration.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use raml2html_parser::RamlObject;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::render::Error;

/// A boxed, sendable future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Turns the parsed object into the rendered output.
pub type ProcessRamlObj = Arc<dyn Fn(RamlObject) -> BoxFuture<Result<Output, Error>> + Send + Sync>;

/// Transforms rendered HTML, e.g. by minifying it.
pub type PostProcessHtml = Arc<dyn Fn(String) -> BoxFuture<Result<String, Error>> + Send + Sync>;

/// What a render produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Rendered documentation.
    Html(String),
    /// The parsed object, when no renderer is configured.
    Raml(RamlObject),
}

impl Output {
    pub fn as_html(&self) -> Option<&str> {
        match self {
            Output::Html(html) => Some(html),
            Output::Raml(_) => None,
        }
    }

    pub fn into_html(self) -> Option<String> {
        match self {
            Output::Html(html) => Some(html),
            Output::Raml(_) => None,
        }
    }

    pub fn as_raml(&self) -> Option<&RamlObject> {
        match self {
            Output::Raml(raml) => Some(raml),
            Output::Html(_) => None,
        }
    }

    pub fn into_raml(self) -> Option<RamlObject> {
        match self {
            Output::Raml(raml) => Some(raml),
            Output::Html(_) => None,
        }
    }
}

impl From<String> for Output {
    fn from(html: String) -> Self {
        Output::Html(html)
    }
}

impl From<RamlObject> for Output {
    fn from(raml: RamlObject) -> Self {
        Output::Raml(raml)
    }
}

/// Render pipeline configuration.
///
/// Every field is optional:
/// - without `process_raml_obj` the parsed object is returned as-is;
/// - without `post_process_html` the renderer's output is returned unchanged.
///
/// `raml2html_version` is stamped by [`render`](crate::render) before use.
#[derive(Clone, Default)]
pub struct Config {
    pub process_raml_obj: Option<ProcessRamlObj>,
    pub post_process_html: Option<PostProcessHtml>,
    pub raml2html_version: Option<String>,
}

impl Config {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the step that renders the parsed object.
    pub fn with_process_raml_obj<F, Fut>(mut self, process: F) -> Self
    where
        F: Fn(RamlObject) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Output, Error>> + Send + 'static,
    {
        let process: ProcessRamlObj =
            Arc::new(move |raml: RamlObject| -> BoxFuture<Result<Output, Error>> { Box::pin(process(raml)) });
        self.process_raml_obj = Some(process);
        self
    }

    /// Set the step applied to rendered HTML.
    pub fn with_post_process_html<F, Fut>(mut self, post_process: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, Error>> + Send + 'static,
    {
        let post_process: PostProcessHtml =
            Arc::new(move |html: String| -> BoxFuture<Result<String, Error>> { Box::pin(post_process(html)) });
        self.post_process_html = Some(post_process);
        self
    }

    /// Remove the post-processing step.
    pub fn without_post_process_html(mut self) -> Self {
        self.post_process_html = None;
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("process_raml_obj", &self.process_raml_obj.is_some())
            .field("post_process_html", &self.post_process_html.is_some())
            .field("raml2html_version", &self.raml2html_version)
            .finish()
    }
}

/// Only the data part is visible to templates.
impl Serialize for Config {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = usize::from(self.raml2html_version.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(version) = &self.raml2html_version {
            map.serialize_entry("raml2HtmlVersion", version)?;
        }
        map.end()
    }
}
