//! Security helpers exposed to templates.

use std::fmt::Write;

use minijinja::{Error, ErrorKind, Value};
use raml2html_parser::RamlObject;
use serde_json::Value as Json;

/// Name of the scheme lookup function in templates.
pub const SCHEME_WITH_NAME: &str = "securitySchemeWithName";

/// Name of the requirement renderer in templates.
pub const RENDER_SECURED_BY: &str = "renderSecuredBy";

/// Find the first declared scheme called `name`.
///
/// `schemes` is the normalized `securitySchemes` sequence of single-key
/// mappings; the scheme body is returned.
pub fn security_scheme_with_name<'a>(schemes: &'a [Json], name: &str) -> Option<&'a Json> {
    schemes
        .iter()
        .find_map(|entry| entry.get(name).filter(|scheme| !scheme.is_null()))
}

/// Render a `securedBy` requirement as an HTML fragment.
///
/// A mapping renders each scheme name in bold followed by its scopes, if any.
/// `null` means anonymous access and renders nothing; anything else renders
/// as bold text.
pub fn render_secured_by(requirement: &Json) -> String {
    let schemes = match requirement {
        Json::Object(schemes) => schemes,
        Json::Null => return String::new(),
        other => return format!("<b>{}</b>", scalar(other)),
    };

    let mut out = String::new();
    for (name, settings) in schemes {
        let _ = write!(out, "<b>{name}</b>");

        let scopes = settings
            .get("scopes")
            .and_then(Json::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        if !scopes.is_empty() {
            out.push_str(" with scopes:<ul>");
            for scope in scopes {
                let _ = write!(out, "<li>{}</li>", scalar(scope));
            }
            out.push_str("</ul>");
        }
    }
    out
}

fn scalar(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Template functions bound to `raml`.
///
/// The lookup closes over the object's security schemes, so the returned
/// values are only valid for the object they were created from.
pub fn functions(raml: &RamlObject) -> [(&'static str, Value); 2] {
    let schemes = raml.security_schemes().to_vec();

    let scheme_with_name = Value::from_function(move |name: String| -> Value {
        match security_scheme_with_name(&schemes, &name) {
            Some(scheme) => Value::from_serialize(scheme),
            None => Value::UNDEFINED,
        }
    });

    let secured_by = Value::from_function(|requirement: Value| -> Result<Value, Error> {
        let requirement = serde_json::to_value(&requirement).map_err(|e| {
            Error::new(ErrorKind::InvalidOperation, "securedBy requirement is not serializable")
                .with_source(e)
        })?;
        Ok(Value::from_safe_string(render_secured_by(&requirement)))
    });

    [(SCHEME_WITH_NAME, scheme_with_name), (RENDER_SECURED_BY, secured_by)]
}
