// ABOUTME: Input schema normalization for tools advertised through tools/list
// ABOUTME: Falls back to an open object schema when a stored schema is missing or unusable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use serde_json::{json, Value};

/// Open schema accepting any object
pub fn open_object_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

/// Normalize a stored input schema for advertisement
///
/// Non-object schemas are replaced with [`open_object_schema`]. Object
/// schemas without a `type` gain `"type": "object"`; object-typed schemas
/// without `properties` gain an empty map.
pub fn normalize_input_schema(schema: Option<&Value>) -> Value {
    let Some(Value::Object(schema)) = schema else {
        return open_object_schema();
    };

    let mut schema = schema.clone();
    schema
        .entry("type")
        .or_insert_with(|| Value::String("object".to_owned()));
    if schema.get("type").and_then(Value::as_str) == Some("object") {
        schema
            .entry("properties")
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }
    Value::Object(schema)
}
