//! Kubernetes structural schema to JSON Schema conversion
//!
//! Resource definitions carry OpenAPI v3.0 schemas with Kubernetes
//! extensions. The validator compiles JSON Schema (draft 7), so each
//! schema node is rewritten:
//!
//! - `nullable: true` widens `type` (and `enum`) to accept `null`
//! - `x-kubernetes-int-or-string: true` becomes `anyOf: [integer, string]`
//! - boolean `exclusiveMinimum` / `exclusiveMaximum` take the numeric form
//! - Kubernetes format names are normalized, and formats outside the
//!   Kubernetes-supported set are stripped
//! - `x-kubernetes-*` keys, `id` and `$schema` are dropped

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::JSONSchemaProps;
use serde_json::{Map, Value, json};

use crate::error::Result;

/// Formats Kubernetes accepts in structural schemas, in normalized form
const KUBERNETES_FORMATS: &[&str] = &[
    "bsonobjectid",
    "uri",
    "email",
    "hostname",
    "ipv4",
    "ipv6",
    "cidr",
    "mac",
    "uuid",
    "uuid3",
    "uuid4",
    "uuid5",
    "isbn",
    "isbn10",
    "isbn13",
    "creditcard",
    "ssn",
    "hexcolor",
    "rgbcolor",
    "byte",
    "password",
    "date",
    "duration",
    "datetime",
];

/// Keys whose values are schemas
const SCHEMA_KEYS: &[&str] = &["items", "additionalProperties", "additionalItems", "not"];

/// Keys whose values are maps of schemas
const SCHEMA_MAP_KEYS: &[&str] = &["properties", "patternProperties", "definitions"];

/// Keys whose values are lists of schemas
const SCHEMA_LIST_KEYS: &[&str] = &["allOf", "anyOf", "oneOf"];

const INT_OR_STRING: &str = "x-kubernetes-int-or-string";

/// Convert a structural schema into a JSON Schema document
pub fn to_json_schema(props: &JSONSchemaProps) -> Result<Value> {
    let mut schema = serde_json::to_value(props)?;
    convert_node(&mut schema);
    Ok(schema)
}

/// Rewrite one schema node and everything below it
pub fn convert_node(node: &mut Value) {
    match node {
        Value::Object(map) => convert_map(map),
        // `items` may hold a list of schemas
        Value::Array(items) => items.iter_mut().for_each(convert_node),
        _ => {}
    }
}

fn convert_map(map: &mut Map<String, Value>) {
    for key in SCHEMA_KEYS {
        if let Some(child) = map.get_mut(*key) {
            convert_node(child);
        }
    }
    for key in SCHEMA_MAP_KEYS {
        if let Some(Value::Object(children)) = map.get_mut(*key) {
            children.values_mut().for_each(convert_node);
        }
    }
    for key in SCHEMA_LIST_KEYS {
        if let Some(Value::Array(children)) = map.get_mut(*key) {
            children.iter_mut().for_each(convert_node);
        }
    }

    if map.get(INT_OR_STRING) == Some(&Value::Bool(true))
        && !map.contains_key("type")
        && !map.contains_key("anyOf")
    {
        map.insert(
            "anyOf".to_string(),
            json!([{ "type": "integer" }, { "type": "string" }]),
        );
    }

    convert_exclusive(map, "exclusiveMinimum", "minimum");
    convert_exclusive(map, "exclusiveMaximum", "maximum");

    if let Some(format) = map.get("format").and_then(Value::as_str).map(String::from) {
        match supported_format(&format) {
            Some(checked) if checked != format => {
                map.insert("format".to_string(), Value::String(checked));
            }
            Some(_) => {}
            None => {
                map.remove("format");
            }
        }
    }

    if map.remove("nullable") == Some(Value::Bool(true)) {
        widen_nullable(map);
    }

    map.retain(|key, _| !key.starts_with("x-kubernetes-") && key != "id" && key != "$schema");
}

/// OpenAPI v3.0 `exclusiveMinimum: true` + `minimum: n` is `exclusiveMinimum: n`
fn convert_exclusive(map: &mut Map<String, Value>, exclusive: &str, bound: &str) {
    match map.get(exclusive) {
        Some(Value::Bool(true)) => {
            if let Some(limit) = map.remove(bound) {
                map.insert(exclusive.to_string(), limit);
            } else {
                map.remove(exclusive);
            }
        }
        Some(Value::Bool(false)) => {
            map.remove(exclusive);
        }
        _ => {}
    }
}

fn widen_nullable(map: &mut Map<String, Value>) {
    match map.get("type").cloned() {
        Some(Value::String(t)) => {
            map.insert("type".to_string(), json!([t, "null"]));
        }
        Some(Value::Array(mut types)) if !types.contains(&json!("null")) => {
            types.push(json!("null"));
            map.insert("type".to_string(), Value::Array(types));
        }
        _ => {}
    }

    if let Some(Value::Array(values)) = map.get_mut("enum") {
        if !values.contains(&Value::Null) {
            values.push(Value::Null);
        }
    }
}

/// Map a format to the name the validator knows, or `None` to strip it
///
/// Kubernetes normalizes format names by dropping `-` and `_`; the one
/// exception is `date-time`, which keeps its JSON Schema spelling.
fn supported_format(format: &str) -> Option<String> {
    let normalized: String = format
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .collect::<String>()
        .to_ascii_lowercase();

    match normalized.as_str() {
        "datetime" => Some("date-time".to_string()),
        known if KUBERNETES_FORMATS.contains(&known) => Some(normalized),
        _ => None,
    }
}
