//! Normalization of a raw RAML mapping into the shape templates consume.
//!
//! Resources become an ordered tree under `resources`, methods become a
//! `methods` sequence, traits and resource types are merged in, and the
//! declaration sections are rewritten as sequences of single-key mappings.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::object::RamlObject;
use crate::parser::ParseError;

/// HTTP methods recognised as resource members.
pub const METHODS: &[&str] = &[
    "get", "post", "put", "patch", "delete", "head", "options", "trace", "connect",
];

/// Sections rewritten as `[{name: value}, ...]`.
const NAMED_SECTIONS: &[&str] = &["schemas", "securitySchemes", "traits", "resourceTypes"];

/// Resource types may extend each other at most this many times.
const MAX_TYPE_CHAIN: usize = 8;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<<\s*([A-Za-z_][A-Za-z0-9_]*)\s*(?:\|\s*!([A-Za-z]+)\s*)?>>")
        .expect("valid placeholder pattern")
});

static URI_PARAMETER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}/]+)\}").expect("valid URI parameter pattern"));

/// Normalize a raw RAML mapping.
pub(crate) fn normalize(root: Map<String, Value>) -> Result<RamlObject, ParseError> {
    if matches!(root.get("title"), None | Some(Value::Null)) {
        return Err(ParseError::MissingTitle);
    }

    let mut fields = Map::new();
    let mut resources = Vec::new();

    for (key, value) in root {
        if key.starts_with('/') {
            resources.push((key, value));
            continue;
        }

        let value = if NAMED_SECTIONS.contains(&key.as_str()) {
            Value::Array(named_list(&key, value)?)
        } else {
            value
        };
        fields.insert(key, value);
    }

    let declarations = Declarations::collect(&fields);

    if !resources.is_empty() {
        let mut built = Vec::with_capacity(resources.len());
        for (relative_uri, value) in resources {
            built.push(declarations.build_resource(&relative_uri, value, "")?);
        }

        // A pre-parsed object may already carry normalized resources.
        let existing = match fields.remove("resources") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };
        fields.insert(
            "resources".to_string(),
            Value::Array(existing.into_iter().chain(built).collect()),
        );
    }

    Ok(RamlObject::from_map(fields))
}

/// Rewrite a declaration section as a sequence of single-key mappings.
fn named_list(section: &str, value: Value) -> Result<Vec<Value>, ParseError> {
    let single = |name: String, value: Value| {
        let mut entry = Map::new();
        entry.insert(name, value);
        Value::Object(entry)
    };

    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => Ok(map.into_iter().map(|(k, v)| single(k, v)).collect()),
        Value::Array(items) => {
            let mut out = Vec::new();
            for item in items {
                match item {
                    Value::Null => {}
                    Value::Object(map) => out.extend(map.into_iter().map(|(k, v)| single(k, v))),
                    _ => {
                        return Err(ParseError::Invalid(format!(
                            "entries of '{section}' must be mappings"
                        )))
                    }
                }
            }
            Ok(out)
        }
        _ => Err(ParseError::Invalid(format!(
            "'{section}' must be a mapping or a sequence"
        ))),
    }
}

fn named_entries(fields: &Map<String, Value>, section: &str) -> HashMap<String, Value> {
    fields
        .get(section)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .flat_map(|entry| entry.iter().map(|(k, v)| (k.clone(), v.clone())))
        .collect()
}

/// Declarations referenced while building resources.
struct Declarations {
    traits: HashMap<String, Value>,
    resource_types: HashMap<String, Value>,
    schemas: HashMap<String, Value>,
    secured_by: Option<Value>,
}

impl Declarations {
    fn collect(fields: &Map<String, Value>) -> Self {
        Self {
            traits: named_entries(fields, "traits"),
            resource_types: named_entries(fields, "resourceTypes"),
            schemas: named_entries(fields, "schemas"),
            secured_by: fields.get("securedBy").filter(|v| !v.is_null()).cloned(),
        }
    }

    fn build_resource(
        &self,
        relative_uri: &str,
        value: Value,
        parent_url: &str,
    ) -> Result<Value, ParseError> {
        let mut body = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => {
                return Err(ParseError::Invalid(format!(
                    "resource '{relative_uri}' must be a mapping"
                )))
            }
        };

        let full_url = format!("{parent_url}{relative_uri}");

        for method in METHODS {
            if matches!(body.get(*method), Some(Value::Null)) {
                body.insert(method.to_string(), Value::Object(Map::new()));
            }
        }

        if let Some(reference) = body.get("type").cloned() {
            self.apply_resource_type(&mut body, &reference, &full_url, 0)?;
        }

        // Optional methods a resource type declared but the resource did not use.
        let body: Map<String, Value> = body.into_iter().filter(|(k, _)| !k.ends_with('?')).collect();

        let resource_traits = body.get("is").cloned();
        let resource_secured_by = body.get("securedBy").filter(|v| !v.is_null()).cloned();

        let mut out = Map::new();
        out.insert("relativeUri".to_string(), Value::String(relative_uri.to_string()));
        out.insert(
            "displayName".to_string(),
            body.get("displayName")
                .cloned()
                .unwrap_or_else(|| Value::String(relative_uri.to_string())),
        );

        let mut methods = Vec::new();
        let mut children = Vec::new();

        for (key, value) in body {
            if key.starts_with('/') {
                children.push((key, value));
            } else if METHODS.contains(&key.as_str()) {
                let secured_by = resource_secured_by.as_ref().or(self.secured_by.as_ref());
                methods.push(self.build_method(
                    &key,
                    value,
                    resource_traits.as_ref(),
                    secured_by,
                    &full_url,
                )?);
            } else if key != "displayName" {
                out.insert(key, value);
            }
        }

        let uri_parameters = implicit_uri_parameters(relative_uri, out.remove("uriParameters"));
        if !uri_parameters.is_empty() {
            out.insert("uriParameters".to_string(), Value::Object(uri_parameters));
        }

        out.insert("parentUrl".to_string(), Value::String(parent_url.to_string()));
        out.insert("uniqueId".to_string(), Value::String(unique_id(&full_url)));
        out.insert(
            "relativeUriPathSegments".to_string(),
            Value::Array(
                relative_uri
                    .split('/')
                    .filter(|s| !s.is_empty())
                    .map(|s| Value::String(s.to_string()))
                    .collect(),
            ),
        );

        if !methods.is_empty() {
            out.insert("methods".to_string(), Value::Array(methods));
        }

        if !children.is_empty() {
            let mut nested = Vec::with_capacity(children.len());
            for (child_uri, child) in children {
                nested.push(self.build_resource(&child_uri, child, &full_url)?);
            }
            out.insert("resources".to_string(), Value::Array(nested));
        }

        Ok(Value::Object(out))
    }

    fn build_method(
        &self,
        name: &str,
        value: Value,
        resource_traits: Option<&Value>,
        secured_by: Option<&Value>,
        full_url: &str,
    ) -> Result<Value, ParseError> {
        let mut method = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => {
                return Err(ParseError::Invalid(format!(
                    "method '{name}' of '{full_url}' must be a mapping"
                )))
            }
        };

        let references: Vec<Value> = [method.get("is"), resource_traits]
            .into_iter()
            .flatten()
            .flat_map(as_list)
            .collect();

        for reference in references {
            let (trait_name, mut params) = reference_parts(&reference)?;
            let declaration = self
                .traits
                .get(&trait_name)
                .ok_or_else(|| ParseError::UnknownTrait(trait_name.clone()))?;

            reserved_params(&mut params, full_url);
            params.insert("methodName".to_string(), name.to_string());

            if let Value::Object(mut applied) = substitute(declaration, &params) {
                applied.remove("usage");
                merge_defaults(&mut method, &applied);
            }
        }

        if !method.contains_key("securedBy") {
            if let Some(secured_by) = secured_by {
                method.insert("securedBy".to_string(), secured_by.clone());
            }
        }

        self.resolve_schemas(&mut method);

        let mut out = Map::new();
        out.insert("method".to_string(), Value::String(name.to_string()));
        out.extend(method);
        Ok(Value::Object(out))
    }

    fn apply_resource_type(
        &self,
        resource: &mut Map<String, Value>,
        reference: &Value,
        full_url: &str,
        depth: usize,
    ) -> Result<(), ParseError> {
        if depth >= MAX_TYPE_CHAIN {
            return Err(ParseError::Invalid(format!(
                "resource type chain of '{full_url}' is too deep"
            )));
        }

        let (type_name, mut params) = reference_parts(reference)?;
        let declaration = self
            .resource_types
            .get(&type_name)
            .ok_or_else(|| ParseError::UnknownResourceType(type_name.clone()))?;

        reserved_params(&mut params, full_url);

        let Value::Object(mut applied) = substitute(declaration, &params) else {
            return Ok(());
        };
        applied.remove("usage");

        for (key, value) in &mut applied {
            if METHODS.contains(&key.trim_end_matches('?')) && value.is_null() {
                *value = Value::Object(Map::new());
            }
        }

        if let Some(parent) = applied.remove("type") {
            self.apply_resource_type(&mut applied, &parent, full_url, depth + 1)?;
        }

        for (key, value) in applied {
            if let Some(method) = key.strip_suffix('?') {
                // A type extending another type keeps the optional marker.
                let slot = if resource.contains_key(&key) {
                    key.as_str()
                } else {
                    method
                };
                if let (Some(Value::Object(existing)), Value::Object(incoming)) =
                    (resource.get_mut(slot), &value)
                {
                    merge_defaults(existing, incoming);
                }
                continue;
            }

            let mut single = Map::new();
            single.insert(key, value);
            merge_defaults(resource, &single);
        }

        Ok(())
    }

    /// Replace body schemas that name a declared schema with its content.
    fn resolve_schemas(&self, method: &mut Map<String, Value>) {
        if self.schemas.is_empty() {
            return;
        }

        if let Some(body) = method.get_mut("body") {
            self.resolve_body(body);
        }

        if let Some(Value::Object(responses)) = method.get_mut("responses") {
            for response in responses.values_mut() {
                if let Some(body) = response.get_mut("body") {
                    self.resolve_body(body);
                }
            }
        }
    }

    /// Bodies without a media type hold `schema` directly.
    fn resolve_body(&self, body: &mut Value) {
        if body.get("schema").is_some() {
            self.resolve_schema(body);
            return;
        }

        if let Value::Object(media_types) = body {
            for media_type in media_types.values_mut() {
                self.resolve_schema(media_type);
            }
        }
    }

    fn resolve_schema(&self, entry: &mut Value) {
        if let Some(schema) = entry.get_mut("schema") {
            let named = schema.as_str().and_then(|name| self.schemas.get(name.trim()));
            if let Some(declared) = named {
                *schema = declared.clone();
            }
        }
    }
}

/// Fill missing values of `target` from `source`; values already in `target` win.
fn merge_defaults(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        match target.get_mut(key) {
            None | Some(Value::Null) => {
                target.insert(key.clone(), value.clone());
            }
            Some(Value::Object(existing)) => {
                if let Value::Object(incoming) = value {
                    merge_defaults(existing, incoming);
                }
            }
            Some(Value::Array(existing)) if key == "is" => {
                for item in as_list(value) {
                    if !existing.contains(&item) {
                        existing.push(item);
                    }
                }
            }
            Some(_) => {}
        }
    }
}

fn as_list(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.iter().filter(|v| !v.is_null()).cloned().collect(),
        Value::Null => Vec::new(),
        other => vec![other.clone()],
    }
}

/// Split `name` or `{name: {param: value}}` into the name and its parameters.
fn reference_parts(reference: &Value) -> Result<(String, HashMap<String, String>), ParseError> {
    match reference {
        Value::String(name) => Ok((name.clone(), HashMap::new())),
        Value::Object(map) if map.len() == 1 => {
            let mut entries = map.iter();
            match entries.next() {
                Some((name, params)) => {
                    let params = params
                        .as_object()
                        .into_iter()
                        .flatten()
                        .map(|(k, v)| (k.clone(), scalar_string(v)))
                        .collect();
                    Ok((name.clone(), params))
                }
                None => Err(ParseError::Invalid("empty reference".to_string())),
            }
        }
        other => Err(ParseError::Invalid(format!(
            "invalid trait or resource type reference: {other}"
        ))),
    }
}

fn reserved_params(params: &mut HashMap<String, String>, full_url: &str) {
    params.insert("resourcePath".to_string(), full_url.to_string());
    params.insert(
        "resourcePathName".to_string(),
        resource_path_name(full_url).to_string(),
    );
}

/// The rightmost path segment that is not a URI parameter.
fn resource_path_name(full_url: &str) -> &str {
    full_url
        .rsplit('/')
        .find(|segment| !segment.is_empty() && !segment.contains('{'))
        .unwrap_or("")
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Replace `<<param>>` placeholders in every key and string of `value`.
fn substitute(value: &Value, params: &HashMap<String, String>) -> Value {
    match value {
        Value::String(s) => Value::String(substitute_str(s, params)),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, params)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (substitute_str(k, params), substitute(v, params)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn substitute_str(text: &str, params: &HashMap<String, String>) -> String {
    if !text.contains("<<") {
        return text.to_string();
    }

    PLACEHOLDER
        .replace_all(text, |caps: &Captures| match params.get(&caps[1]) {
            Some(value) => match caps.get(2) {
                Some(function) => transform(value, function.as_str()),
                None => value.clone(),
            },
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn transform(value: &str, function: &str) -> String {
    match function {
        "uppercase" => value.to_uppercase(),
        "lowercase" => value.to_lowercase(),
        "singularize" => singularize(value),
        "pluralize" => pluralize(value),
        _ => value.to_string(),
    }
}

fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        format!("{stem}y")
    } else if word.ends_with("ss") {
        word.to_string()
    } else if let Some(stem) = word.strip_suffix('s') {
        stem.to_string()
    } else {
        word.to_string()
    }
}

fn pluralize(word: &str) -> String {
    let vowel_before_y = word
        .strip_suffix('y')
        .and_then(|stem| stem.chars().last())
        .is_some_and(|c| "aeiou".contains(c));

    if let (Some(stem), false) = (word.strip_suffix('y'), vowel_before_y) {
        format!("{stem}ies")
    } else if word.ends_with('s') || word.ends_with('x') || word.ends_with("ch") || word.ends_with("sh") {
        format!("{word}es")
    } else {
        format!("{word}s")
    }
}

/// Declared URI parameters plus an implicit string parameter for each
/// `{name}` in the relative URI.
fn implicit_uri_parameters(relative_uri: &str, declared: Option<Value>) -> Map<String, Value> {
    let mut parameters = match declared {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    for caps in URI_PARAMETER.captures_iter(relative_uri) {
        let name = caps[1].to_string();
        if parameters.contains_key(&name) {
            continue;
        }

        let mut parameter = Map::new();
        parameter.insert("displayName".to_string(), Value::String(name.clone()));
        parameter.insert("type".to_string(), Value::String("string".to_string()));
        parameter.insert("required".to_string(), Value::Bool(true));
        parameters.insert(name, Value::Object(parameter));
    }

    parameters
}

/// Anchor-safe identifier for a resource URL.
fn unique_id(full_url: &str) -> String {
    full_url
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
