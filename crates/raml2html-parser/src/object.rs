//! The normalized object handed to templates.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A parsed and normalized RAML document.
///
/// Wraps an ordered JSON mapping so templates see the same shape regardless
/// of whether the document came from a file, a URL, raw text or an
/// already-parsed value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RamlObject {
    fields: Map<String, Value>,
}

impl RamlObject {
    /// Create an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing mapping without normalizing it.
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// API title.
    pub fn title(&self) -> Option<&str> {
        self.fields.get("title").and_then(Value::as_str)
    }

    /// Look up a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Insert or replace a top-level field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(key.into(), value)
    }

    /// Remove a top-level field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Top-level resources, in declaration order.
    pub fn resources(&self) -> &[Value] {
        self.fields
            .get("resources")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Declared security schemes as a sequence of single-key mappings.
    pub fn security_schemes(&self) -> &[Value] {
        self.fields
            .get("securitySchemes")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Declared schemas as a sequence of single-key mappings.
    pub fn schemas(&self) -> &[Value] {
        self.fields
            .get("schemas")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl From<Map<String, Value>> for RamlObject {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_map(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> RamlObject {
        let Value::Object(map) = json!({
            "title": "Example",
            "securitySchemes": [{ "oauth2": { "type": "OAuth 2.0" } }],
            "resources": [{ "relativeUri": "/users" }]
        }) else {
            unreachable!()
        };
        RamlObject::from_map(map)
    }

    #[test]
    fn exposes_common_fields() {
        let obj = sample();

        assert_eq!(obj.title(), Some("Example"));
        assert_eq!(obj.resources().len(), 1);
        assert_eq!(obj.security_schemes().len(), 1);
        assert!(obj.schemas().is_empty());
    }

    #[test]
    fn serializes_transparently() {
        let mut obj = sample();
        obj.insert("version", json!("v1"));

        let value = serde_json::to_value(&obj).unwrap();

        assert_eq!(value["title"], "Example");
        assert_eq!(value["version"], "v1");
    }
}
