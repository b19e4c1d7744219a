//! Inline `$ref` references in JSON body schemas.

use std::collections::HashMap;

use raml2html_parser::RamlObject;
use serde_json::{Map, Value};

/// Expand `$ref`s in every JSON body schema of `raml`.
///
/// A reference is replaced by the declared schema whose name matches it,
/// ignoring a trailing `#`, any path prefix and a `.json` extension. Unknown,
/// document-local and circular references are kept as written. Schemas that
/// are not JSON are left untouched.
pub fn expand_json_schemas(mut raml: RamlObject) -> RamlObject {
    let schemas = declared_schemas(&raml);
    if schemas.is_empty() {
        return raml;
    }

    if let Some(Value::Array(resources)) = raml.as_map_mut().get_mut("resources") {
        for resource in resources {
            expand_resource(resource, &schemas);
        }
    }

    raml
}

fn declared_schemas(raml: &RamlObject) -> HashMap<String, Value> {
    raml.schemas()
        .iter()
        .filter_map(Value::as_object)
        .flatten()
        .filter_map(|(name, schema)| {
            let parsed = serde_json::from_str::<Value>(schema.as_str()?).ok()?;
            parsed.is_object().then(|| (name.clone(), parsed))
        })
        .collect()
}

fn expand_resource(resource: &mut Value, schemas: &HashMap<String, Value>) {
    if let Some(Value::Array(methods)) = resource.get_mut("methods") {
        for method in methods {
            if let Some(body) = method.get_mut("body") {
                expand_body(body, schemas);
            }

            if let Some(Value::Object(responses)) = method.get_mut("responses") {
                for response in responses.values_mut() {
                    if let Some(body) = response.get_mut("body") {
                        expand_body(body, schemas);
                    }
                }
            }
        }
    }

    if let Some(Value::Array(children)) = resource.get_mut("resources") {
        for child in children {
            expand_resource(child, schemas);
        }
    }
}

/// A body is either keyed by media type or, without one, holds the schema
/// directly.
fn expand_body(body: &mut Value, schemas: &HashMap<String, Value>) {
    if body.get("schema").is_some() {
        expand_schema(body, schemas);
        return;
    }

    if let Value::Object(media_types) = body {
        for media_type in media_types.values_mut() {
            expand_schema(media_type, schemas);
        }
    }
}

fn expand_schema(entry: &mut Value, schemas: &HashMap<String, Value>) {
    let Some(schema) = entry.get_mut("schema") else {
        return;
    };

    let Some(parsed) = schema
        .as_str()
        .and_then(|text| serde_json::from_str::<Value>(text).ok())
    else {
        return;
    };

    if !has_ref(&parsed) {
        return;
    }

    let expanded = expand_refs(parsed, schemas, &mut Vec::new());
    if let Ok(text) = serde_json::to_string_pretty(&expanded) {
        *schema = Value::String(text);
    }
}

fn has_ref(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.contains_key("$ref") || map.values().any(has_ref),
        Value::Array(items) => items.iter().any(has_ref),
        _ => false,
    }
}

fn expand_refs(value: Value, schemas: &HashMap<String, Value>, stack: &mut Vec<String>) -> Value {
    match value {
        Value::Object(map) => {
            if let Some(name) = map
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|reference| schema_name(reference, schemas))
            {
                if stack.contains(&name) {
                    tracing::warn!("Leaving circular schema reference to '{}' unexpanded", name);
                } else if let Some(target) = schemas.get(&name) {
                    stack.push(name);
                    let expanded = expand_refs(target.clone(), schemas, stack);
                    stack.pop();
                    return expanded;
                }
            }

            Value::Object(
                map.into_iter()
                    .map(|(key, item)| (key, expand_refs(item, schemas, stack)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| expand_refs(item, schemas, stack))
                .collect(),
        ),
        other => other,
    }
}

/// Match a reference against declared schema names.
fn schema_name(reference: &str, schemas: &HashMap<String, Value>) -> Option<String> {
    if reference.starts_with('#') {
        return None;
    }

    let trimmed = reference.trim_end_matches('#');
    let file = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let stem = file.strip_suffix(".json").unwrap_or(file);

    [trimmed, file, stem]
        .into_iter()
        .find(|candidate| schemas.contains_key(*candidate))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn raml(value: Value) -> RamlObject {
        serde_json::from_value(value).unwrap()
    }

    fn body_schema(raml: &RamlObject) -> Value {
        let text = raml.resources()[0]["methods"][0]["body"]["application/json"]["schema"]
            .as_str()
            .unwrap()
            .to_string();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn expands_named_references() {
        let expanded = expand_json_schemas(raml(json!({
            "title": "Refs",
            "schemas": [
                { "address": "{\"type\": \"object\", \"properties\": {\"city\": {\"type\": \"string\"}}}" }
            ],
            "resources": [{
                "relativeUri": "/users",
                "methods": [{
                    "method": "post",
                    "body": { "application/json": {
                        "schema": "{\"type\": \"object\", \"properties\": {\"home\": {\"$ref\": \"address#\"}}}"
                    } }
                }]
            }]
        })));

        assert_eq!(
            body_schema(&expanded),
            json!({
                "type": "object",
                "properties": {
                    "home": { "type": "object", "properties": { "city": { "type": "string" } } }
                }
            })
        );
    }

    #[test]
    fn matches_file_style_references() {
        let schemas = HashMap::from([("user".to_string(), json!({}))]);

        assert_eq!(schema_name("schemas/user.json", &schemas), Some("user".to_string()));
        assert_eq!(schema_name("http://example.com/user.json#", &schemas), Some("user".to_string()));
        assert_eq!(schema_name("#/definitions/user", &schemas), None);
        assert_eq!(schema_name("group", &schemas), None);
    }

    #[test]
    fn leaves_circular_references() {
        let expanded = expand_json_schemas(raml(json!({
            "title": "Cycle",
            "schemas": [
                { "node": "{\"type\": \"object\", \"properties\": {\"next\": {\"$ref\": \"node\"}}}" }
            ],
            "resources": [{
                "relativeUri": "/nodes",
                "methods": [{
                    "method": "get",
                    "body": { "application/json": { "schema": "{\"$ref\": \"node\"}" } }
                }]
            }]
        })));

        assert_eq!(
            body_schema(&expanded),
            json!({
                "type": "object",
                "properties": { "next": { "$ref": "node" } }
            })
        );
    }

    #[test]
    fn expands_response_and_nested_bodies() {
        let expanded = expand_json_schemas(raml(json!({
            "title": "Nested",
            "schemas": [{ "id": "{\"type\": \"integer\"}" }],
            "resources": [{
                "relativeUri": "/a",
                "resources": [{
                    "relativeUri": "/b",
                    "methods": [{
                        "method": "get",
                        "responses": { "200": { "body": { "application/json": {
                            "schema": "{\"items\": [{\"$ref\": \"id\"}]}"
                        } } } }
                    }]
                }]
            }]
        })));

        let text = expanded.resources()[0]["resources"][0]["methods"][0]["responses"]["200"]["body"]
            ["application/json"]["schema"]
            .as_str()
            .unwrap()
            .to_string();
        assert_eq!(
            serde_json::from_str::<Value>(&text).unwrap(),
            json!({ "items": [{ "type": "integer" }] })
        );
    }

    #[test]
    fn expands_bodies_without_media_type() {
        let expanded = expand_json_schemas(raml(json!({
            "title": "Bare",
            "schemas": [{ "id": "{\"type\": \"integer\"}" }],
            "resources": [{
                "relativeUri": "/ids",
                "methods": [{
                    "method": "post",
                    "body": { "schema": "{\"items\": {\"$ref\": \"id\"}}" }
                }]
            }]
        })));

        let text = expanded.resources()[0]["methods"][0]["body"]["schema"]
            .as_str()
            .unwrap()
            .to_string();
        assert_eq!(
            serde_json::from_str::<Value>(&text).unwrap(),
            json!({ "items": { "type": "integer" } })
        );
    }

    #[test]
    fn ignores_non_json_schemas() {
        let source = raml(json!({
            "title": "Xml",
            "schemas": [{ "doc": "{\"type\": \"object\"}" }],
            "resources": [{
                "relativeUri": "/docs",
                "methods": [{
                    "method": "put",
                    "body": { "application/xml": { "schema": "<xs:schema/>" } }
                }]
            }]
        }));

        assert_eq!(expand_json_schemas(source.clone()), source);
    }
}
