//! YAML to JSON conversion with `!include` resolution.

use std::future::Future;
use std::pin::Pin;

use serde_json::{Map, Number, Value};
use serde_yaml::Value as Yaml;

use crate::parser::{parse_yaml, ParseError};
use crate::source::Location;

/// Includes nested deeper than this are rejected.
pub const MAX_INCLUDE_DEPTH: usize = 16;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Resolves `!include` tags while converting a YAML tree.
pub(crate) struct Resolver {
    client: reqwest::Client,
}

impl Resolver {
    pub(crate) fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Read a top-level document.
    pub(crate) async fn read(&self, location: &Location) -> Result<String, ParseError> {
        location.read(&self.client).await
    }

    /// Convert `value`, loading every `!include` relative to `base`.
    pub(crate) fn resolve<'a>(
        &'a self,
        value: Yaml,
        base: &'a Location,
        depth: usize,
    ) -> BoxFuture<'a, Result<Value, ParseError>> {
        Box::pin(async move {
            match value {
                Yaml::Null => Ok(Value::Null),
                Yaml::Bool(b) => Ok(Value::Bool(b)),
                Yaml::Number(n) => Ok(number(&n)),
                Yaml::String(s) => Ok(Value::String(s)),
                Yaml::Sequence(items) => {
                    let mut out = Vec::with_capacity(items.len());
                    for item in items {
                        out.push(self.resolve(item, base, depth).await?);
                    }
                    Ok(Value::Array(out))
                }
                Yaml::Mapping(mapping) => {
                    let mut out = Map::new();
                    for (key, item) in mapping {
                        let key = key_string(&key, base)?;
                        out.insert(key, self.resolve(item, base, depth).await?);
                    }
                    Ok(Value::Object(out))
                }
                Yaml::Tagged(tagged) => {
                    if tagged.tag != "!include" {
                        // Other tags carry no meaning for documentation.
                        return self.resolve(tagged.value, base, depth).await;
                    }

                    let Yaml::String(reference) = tagged.value else {
                        return Err(ParseError::Include {
                            location: base.to_string(),
                            message: "!include expects a path".to_string(),
                        });
                    };

                    self.include(&reference, base, depth).await
                }
            }
        })
    }

    async fn include(
        &self,
        reference: &str,
        base: &Location,
        depth: usize,
    ) -> Result<Value, ParseError> {
        if depth >= MAX_INCLUDE_DEPTH {
            return Err(ParseError::IncludeDepth {
                location: base.to_string(),
                max: MAX_INCLUDE_DEPTH,
            });
        }

        let target = base.join(reference)?;
        tracing::debug!("Including {} from {}", target, base);

        let text = target.read(&self.client).await?;

        if !target.is_yaml() {
            return Ok(Value::String(text));
        }

        let document = parse_yaml(strip_header(&text), &target)?;
        self.resolve(document, &target, depth + 1).await
    }
}

/// Drop a leading `#%RAML` line so fragments parse as plain YAML.
pub(crate) fn strip_header(text: &str) -> &str {
    let trimmed = text.trim_start_matches('\u{feff}');
    if trimmed.starts_with("#%") {
        match trimmed.find('\n') {
            Some(pos) => &trimmed[pos + 1..],
            None => "",
        }
    } else {
        trimmed
    }
}

fn number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Response codes and similar keys are numbers in YAML but strings here.
fn key_string(key: &Yaml, base: &Location) -> Result<String, ParseError> {
    match key {
        Yaml::String(s) => Ok(s.clone()),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        Yaml::Tagged(tagged) => key_string(&tagged.value, base),
        Yaml::Sequence(_) | Yaml::Mapping(_) => Err(ParseError::Invalid(format!(
            "{base}: mapping keys must be scalars"
        ))),
    }
}
