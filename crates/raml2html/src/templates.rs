//! Template environments for rendering documentation.

use std::path::PathBuf;

use minijinja::{path_loader, AutoEscape, Environment, UndefinedBehavior, Value};
use raml2html_parser::RamlObject;

use crate::security;

/// Main template of the bundled theme.
pub const DEFAULT_TEMPLATE: &str = "template.html";

/// Templates shipped with the crate.
const BUNDLED: &[(&str, &str)] = &[
    ("template.html", include_str!("../templates/template.html")),
    ("resource.html", include_str!("../templates/resource.html")),
    ("item.html", include_str!("../templates/item.html")),
];

/// Where templates come from.
#[derive(Debug, Clone, PartialEq)]
pub enum Templates {
    /// The embedded default theme; never touches the filesystem.
    Bundled,
    /// A directory of custom templates with the main template's name.
    Directory { path: PathBuf, main: String },
}

impl Templates {
    /// Name of the template to render.
    pub fn main(&self) -> &str {
        match self {
            Templates::Bundled => DEFAULT_TEMPLATE,
            Templates::Directory { main, .. } => main,
        }
    }

    /// Build a fresh environment for a single render.
    ///
    /// Every template is HTML-escaped regardless of its extension and
    /// undefined attributes chain to undefined instead of failing.
    pub fn environment(&self) -> Result<Environment<'static>, minijinja::Error> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);

        match self {
            Templates::Bundled => {
                for &(name, source) in BUNDLED {
                    env.add_template(name, source)?;
                }
            }
            Templates::Directory { path, .. } => {
                env.set_loader(path_loader(path.clone()));
            }
        }

        Ok(env)
    }
}

/// Template context for `raml`: its fields plus the security helpers.
pub fn context(raml: &RamlObject) -> Value {
    let mut entries: Vec<(String, Value)> = raml
        .as_map()
        .iter()
        .map(|(key, value)| (key.clone(), Value::from_serialize(value)))
        .collect();

    entries.extend(
        security::functions(raml)
            .into_iter()
            .map(|(name, function)| (name.to_string(), function)),
    );

    Value::from_iter(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn bundled_templates_compile() {
        let env = Templates::Bundled.environment().unwrap();

        for (name, _) in BUNDLED {
            assert!(env.get_template(name).is_ok(), "{name} should compile");
        }
    }

    #[test]
    fn loads_templates_from_directory() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("custom.nunjucks"), "<h1>{{ title }}</h1>").unwrap();

        let templates = Templates::Directory {
            path: temp.path().to_path_buf(),
            main: "custom.nunjucks".to_string(),
        };
        let env = templates.environment().unwrap();

        let html = env
            .get_template(templates.main())
            .unwrap()
            .render(minijinja::context! { title => "A & B" })
            .unwrap();

        assert_eq!(html, "<h1>A &amp; B</h1>");
    }

    #[test]
    fn context_exposes_fields_and_helpers() {
        let raml: RamlObject = serde_json::from_value(json!({
            "title": "Context",
            "securitySchemes": [{ "basic": { "type": "Basic Authentication" } }]
        }))
        .unwrap();

        let env = Environment::new();
        let html = env
            .render_str(
                "{{ title }}: {{ securitySchemeWithName('basic').type }} {{ renderSecuredBy('basic') }}",
                context(&raml),
            )
            .unwrap();

        assert_eq!(html, "Context: Basic Authentication <b>basic</b>");
    }
}
