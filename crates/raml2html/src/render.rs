//! The parse, render, post-process pipeline.

use raml2html_parser::{ParseError, Source};

use crate::config::{Config, Output};

/// Version stamped into every configuration.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors that can occur while rendering documentation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Failed to render template: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Failed to minify HTML: {0}")]
    Minify(String),

    #[error(transparent)]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap an error raised by a caller-supplied pipeline step.
    pub fn custom(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Custom(error.into())
    }
}

/// Parse `source` and run it through the configured pipeline.
///
/// Without a renderer the parsed object is returned. With a renderer its
/// output is returned, passed through the post-processor when one is set and
/// the renderer produced HTML. The first failing step ends the pipeline.
pub async fn render(source: impl Into<Source>, config: Option<Config>) -> Result<Output, Error> {
    let mut config = config.unwrap_or_default();
    config.raml2html_version = Some(VERSION.to_string());

    let mut raml = raml2html_parser::parse(source).await?;
    raml.insert(
        "config",
        serde_json::to_value(&config).map_err(Error::custom)?,
    );

    let Some(process) = config.process_raml_obj.clone() else {
        tracing::debug!("No renderer configured, returning the parsed object");
        return Ok(Output::Raml(raml));
    };

    tracing::debug!("Rendering {}", raml.title().unwrap_or("untitled API"));
    let output = process(raml).await?;

    match (output, config.post_process_html.as_ref()) {
        (Output::Html(html), Some(post_process)) => {
            tracing::debug!("Post-processing {} bytes of HTML", html.len());
            Ok(Output::Html(post_process(html).await?))
        }
        (output, _) => Ok(output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::tempdir;

    const RAML: &str = "#%RAML 0.8\ntitle: Pipeline\n/things:\n  get:\n";

    #[tokio::test]
    async fn returns_object_without_renderer() {
        let output = render(RAML, Some(Config::new())).await.unwrap();

        let raml = output.into_raml().unwrap();
        assert_eq!(raml.title(), Some("Pipeline"));
        assert_eq!(raml.get("config"), Some(&json!({ "raml2HtmlVersion": VERSION })));
    }

    #[tokio::test]
    async fn missing_config_behaves_like_empty() {
        let output = render(RAML, None).await.unwrap();

        assert_eq!(
            output.as_raml().and_then(|r| r.get("config")),
            Some(&json!({ "raml2HtmlVersion": VERSION }))
        );
    }

    #[tokio::test]
    async fn accepts_every_source_shape() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("api.raml");
        std::fs::write(&path, RAML).unwrap();

        let from_text = render(RAML, None).await.unwrap().into_raml().unwrap();
        let from_path = render(path, None).await.unwrap().into_raml().unwrap();
        let from_object = render(
            json!({ "title": "Pipeline", "/things": { "get": null } }),
            None,
        )
        .await
        .unwrap()
        .into_raml()
        .unwrap();

        assert_eq!(from_text.resources(), from_path.resources());
        assert_eq!(from_text.resources(), from_object.resources());
    }

    #[tokio::test]
    async fn accepts_url_sources() {
        use axum::routing::get;

        let app = axum::Router::new().route("/api.raml", get(|| async { RAML }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let from_url = render(format!("http://{addr}/api.raml"), None)
            .await
            .unwrap()
            .into_raml()
            .unwrap();
        let from_text = render(RAML, None).await.unwrap().into_raml().unwrap();

        assert_eq!(from_url.title(), Some("Pipeline"));
        assert_eq!(from_url.resources(), from_text.resources());
    }

    #[tokio::test]
    async fn returns_renderer_output() {
        let config = Config::new()
            .with_process_raml_obj(|_raml| async { Ok(Output::Html("<x>".to_string())) });

        let output = render(RAML, Some(config)).await.unwrap();

        assert_eq!(output, Output::Html("<x>".to_string()));
    }

    #[tokio::test]
    async fn pipes_renderer_output_through_post_processor() {
        let config = Config::new()
            .with_process_raml_obj(|_raml| async { Ok(Output::Html("<x>".to_string())) })
            .with_post_process_html(|html| async move { Ok(format!("<wrapped>{html}</wrapped>")) });

        let output = render(RAML, Some(config)).await.unwrap();

        assert_eq!(output.as_html(), Some("<wrapped><x></wrapped>"));
    }

    #[tokio::test]
    async fn renderer_sees_annotated_object() {
        let config = Config::new().with_process_raml_obj(|raml| async move {
            let version = raml.get("config").and_then(|c| c.get("raml2HtmlVersion")).cloned();
            Ok(Output::Html(version.unwrap_or_default().to_string()))
        });

        let output = render(RAML, Some(config)).await.unwrap();

        assert_eq!(output.as_html(), Some(format!("\"{VERSION}\"").as_str()));
    }

    #[tokio::test]
    async fn post_processor_skipped_for_objects() {
        let config = Config::new()
            .with_process_raml_obj(|raml| async move { Ok(Output::Raml(raml)) })
            .with_post_process_html(|_html| async { Err(Error::Minify("unreachable".to_string())) });

        let output = render(RAML, Some(config)).await.unwrap();

        assert!(output.as_raml().is_some());
    }

    #[tokio::test]
    async fn propagates_parse_errors_unchanged() {
        let result = render("not raml at all", None).await;

        assert!(matches!(result, Err(Error::Parse(ParseError::MissingHeader(_)))));
    }

    #[tokio::test]
    async fn propagates_renderer_errors() {
        let config = Config::new()
            .with_process_raml_obj(|_raml| async { Err(Error::custom("renderer exploded")) })
            .with_post_process_html(|html| async move { Ok(html) });

        let err = render(RAML, Some(config)).await.unwrap_err();

        assert!(matches!(err, Error::Custom(_)));
        assert_eq!(err.to_string(), "renderer exploded");
    }

    #[tokio::test]
    async fn propagates_post_processor_errors() {
        let config = Config::new()
            .with_process_raml_obj(|_raml| async { Ok(Output::Html("<x>".to_string())) })
            .with_post_process_html(|_html| async { Err(Error::custom("post failed")) });

        let err = render(RAML, Some(config)).await.unwrap_err();

        assert_eq!(err.to_string(), "post failed");
    }
}
