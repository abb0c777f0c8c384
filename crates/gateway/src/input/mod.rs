//! Input validation for declared request parts.
//!
//! Routes declare schemas for the parts of the request they consume (route
//! parameters, query string, JSON body). Only declared parts are read: the
//! body in particular is read and parsed only when a body schema is
//! declared. All declared parts are validated together, and every violated
//! field across all parts is reported in one response.
//!
//! A body that is not parseable as JSON fails with a distinguished
//! `INVALID_JSON` error before any schema validation runs.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use jsonschema::{Draft, JSONSchema};
use serde_json::{Map, Value};

use atelier_core::schema::{InputSchema, Violation};

use crate::context::ValidatedInput;
use crate::error::{GatewayError, GatewayResult};

/// The schemas a route declares for its input parts.
#[derive(Clone, Default)]
pub struct DeclaredInput {
    /// Schema for route parameters.
    pub params: Option<Arc<dyn InputSchema>>,
    /// Schema for query parameters.
    pub query: Option<Arc<dyn InputSchema>>,
    /// Schema for the JSON body.
    pub body: Option<Arc<dyn InputSchema>>,
}

impl DeclaredInput {
    /// Creates a declaration with no parts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a route-parameter schema.
    pub fn params(mut self, schema: Arc<dyn InputSchema>) -> Self {
        self.params = Some(schema);
        self
    }

    /// Declares a query-parameter schema.
    pub fn query(mut self, schema: Arc<dyn InputSchema>) -> Self {
        self.query = Some(schema);
        self
    }

    /// Declares a body schema.
    pub fn body(mut self, schema: Arc<dyn InputSchema>) -> Self {
        self.body = Some(schema);
        self
    }

    /// Returns true if the body must be read and parsed.
    pub fn needs_body(&self) -> bool {
        self.body.is_some()
    }
}

/// A compiled JSON Schema.
///
/// The concrete [`InputSchema`] implementation used by route declarations.
/// Compiled once per route at startup and shared.
pub struct JsonSchema {
    compiled: JSONSchema,
}

impl JsonSchema {
    /// Compiles a schema document.
    ///
    /// Fails with a configuration error if the document itself is invalid;
    /// this is a programming error in the route declaration, surfaced at
    /// startup rather than per request.
    pub fn compile(schema: &Value) -> GatewayResult<Arc<Self>> {
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .should_validate_formats(true)
            .compile(schema)
            .map_err(|err| GatewayError::Configuration {
                message: format!("invalid input schema: {err}"),
            })?;
        Ok(Arc::new(Self { compiled }))
    }
}

impl InputSchema for JsonSchema {
    fn check(&self, value: &Value) -> Result<(), Vec<Violation>> {
        if let Err(errors) = self.compiled.validate(value) {
            let violations: Vec<Violation> = errors
                .map(|err| Violation::new(pointer_to_path(&err.instance_path.to_string()), err.to_string()))
                .collect();
            return Err(violations);
        }
        Ok(())
    }
}

/// Converts a JSON pointer (`/title`) into a dotted path (`title`).
fn pointer_to_path(pointer: &str) -> String {
    pointer.trim_start_matches('/').replace('/', ".")
}

/// Validates the declared parts of a request.
///
/// `body` must be `Some` exactly when [`DeclaredInput::needs_body`] is true;
/// the orchestrator reads it beforehand. Violations from every part are
/// aggregated into a single error.
pub fn validate(
    declared: &DeclaredInput,
    path_params: &HashMap<String, String>,
    query: Option<&str>,
    body: Option<&Bytes>,
) -> GatewayResult<ValidatedInput> {
    let mut validated = ValidatedInput::default();
    let mut violations: Vec<Violation> = Vec::new();

    if let Some(schema) = &declared.params {
        let value = params_value(path_params);
        collect(schema.as_ref(), &value, "params", &mut violations);
        validated.params = Some(value);
    }

    if let Some(schema) = &declared.query {
        let value = query_value(query.unwrap_or(""));
        collect(schema.as_ref(), &value, "query", &mut violations);
        validated.query = Some(value);
    }

    if let Some(schema) = &declared.body {
        let raw = body.map(|b| b.as_ref()).unwrap_or(&[]);
        // Malformed JSON is its own failure, raised before schema checks.
        let value: Value =
            serde_json::from_slice(raw).map_err(|err| GatewayError::InvalidJson {
                message: err.to_string(),
            })?;
        collect(schema.as_ref(), &value, "body", &mut violations);
        validated.body = Some(value);
    }

    if !violations.is_empty() {
        return Err(GatewayError::Validation {
            message: "Invalid input".to_string(),
            details: violations,
        });
    }

    Ok(validated)
}

/// Runs one schema, prefixing each violation path with the part name.
fn collect(schema: &dyn InputSchema, value: &Value, part: &str, out: &mut Vec<Violation>) {
    if let Err(violations) = schema.check(value) {
        out.extend(violations.iter().map(|v| v.prefixed(part)));
    }
}

/// Builds a JSON object from the route parameters.
fn params_value(path_params: &HashMap<String, String>) -> Value {
    let map: Map<String, Value> = path_params
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    Value::Object(map)
}

/// Builds a JSON object from the raw query string. Repeated keys keep the
/// last value.
fn query_value(query: &str) -> Value {
    let mut map = Map::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        map.insert(key.into_owned(), Value::String(value.into_owned()));
    }
    Value::Object(map)
}
