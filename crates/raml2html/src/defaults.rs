//! The default rendering configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use raml2html_parser::RamlObject;

use crate::config::{Config, Output};
use crate::expander::expand_json_schemas;
use crate::markdown;
use crate::minify::minify;
use crate::render::Error;
use crate::templates::{self, Templates};

/// Build a configuration that renders with minijinja templates and minifies
/// the result. Rendering runs on a blocking thread.
///
/// Without `main_template` the bundled theme is used and templates never
/// resolve against the working directory. With one, templates are loaded from
/// `templates_path`, or the working directory when that is `None`.
pub fn default_config(main_template: Option<&str>, templates_path: Option<&Path>) -> Config {
    let templates = match main_template {
        None => Templates::Bundled,
        Some(main) => Templates::Directory {
            path: templates_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
            main: main.to_string(),
        },
    };
    let templates = Arc::new(templates);

    Config::new()
        .with_process_raml_obj(move |raml| {
            let templates = Arc::clone(&templates);
            async move {
                match tokio::task::spawn_blocking(move || process_raml_obj(raml, &templates)).await {
                    Ok(rendered) => rendered.map(Output::Html),
                    Err(e) => Err(Error::custom(e)),
                }
            }
        })
        .with_post_process_html(minify)
}

/// Render `raml` with a fresh template environment.
pub fn process_raml_obj(raml: RamlObject, templates: &Templates) -> Result<String, Error> {
    let mut env = templates.environment()?;
    markdown::register(&mut env, markdown::to_html);

    let raml = expand_json_schemas(raml);
    let context = templates::context(&raml);

    tracing::debug!("Rendering template {}", templates.main());
    let html = env.get_template(templates.main())?.render(context)?;

    Ok(unescape_quotes(&html))
}

/// Restore literal quotes escaped by the template engine.
///
/// This also unescapes quotes that came from the document itself, so
/// attribute values built from untrusted input are not safe to rely on.
pub fn unescape_quotes(html: &str) -> String {
    html.replace("&quot;", "\"")
}
