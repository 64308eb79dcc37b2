//! Check tool call arguments against a tool's JSON Schema before execution.

use serde_json::Value;

/// Validate tool arguments against a JSON Schema.
///
/// Top-level only: schema type, required fields, property types and `enum`
/// membership. An explicit `null` for an optional property counts as absent.
/// Returns the first violation found.
pub fn validate_arguments(args: &Value, schema: &Value) -> Result<(), String> {
    if schema.get("type").and_then(Value::as_str) == Some("object") && !args.is_object() {
        return Err(format!("expected object arguments, got {}", json_type_name(args)));
    }

    let Some(obj) = args.as_object() else {
        return Ok(());
    };

    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    for name in &required {
        if !obj.contains_key(*name) {
            return Err(format!("missing required field '{name}'"));
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };

    for (key, value) in obj {
        let Some(prop_schema) = properties.get(key) else {
            continue;
        };
        if value.is_null() && !required.contains(&key.as_str()) {
            continue;
        }
        if let Some(expected) = prop_schema.get("type").and_then(Value::as_str) {
            if !value_matches_type(value, expected) {
                return Err(format!(
                    "field '{key}' expected type '{expected}', got {}",
                    json_type_name(value)
                ));
            }
        }
        if let Some(allowed) = prop_schema.get("enum").and_then(Value::as_array) {
            if !allowed.contains(value) {
                let choices = allowed
                    .iter()
                    .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(format!("field '{key}' must be one of [{choices}], got {value}"));
            }
        }
    }

    Ok(())
}

fn value_matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn clipboard_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "operation": { "type": "string", "enum": ["copy", "paste"] },
                "text": { "type": "string" },
            },
            "required": ["operation"],
        })
    }

    #[test]
    fn rejects_non_object_args() {
        let err = validate_arguments(&json!("{not json"), &clipboard_schema()).unwrap_err();

        assert_eq!(err, "expected object arguments, got string");
    }

    #[test]
    fn rejects_missing_required_field() {
        let err = validate_arguments(&json!({ "text": "hi" }), &clipboard_schema()).unwrap_err();

        assert_eq!(err, "missing required field 'operation'");
    }

    #[test]
    fn rejects_wrong_property_type() {
        let err = validate_arguments(&json!({ "operation": "copy", "text": 7 }), &clipboard_schema())
            .unwrap_err();

        assert!(err.contains("field 'text'"));
        assert!(err.contains("expected type 'string'"));
    }

    #[test]
    fn rejects_value_outside_enum() {
        let err = validate_arguments(&json!({ "operation": "cut" }), &clipboard_schema()).unwrap_err();

        assert_eq!(err, r#"field 'operation' must be one of [copy, paste], got "cut""#);
    }

    #[test]
    fn optional_field_may_be_absent() {
        assert!(validate_arguments(&json!({ "operation": "copy" }), &clipboard_schema()).is_ok());
        assert!(validate_arguments(&json!({ "operation": "paste" }), &clipboard_schema()).is_ok());
    }

    #[test]
    fn null_counts_as_absent_only_for_optional_fields() {
        assert!(validate_arguments(&json!({ "operation": "copy", "text": null }), &clipboard_schema()).is_ok());

        let err = validate_arguments(&json!({ "operation": null }), &clipboard_schema()).unwrap_err();
        assert_eq!(err, "field 'operation' expected type 'string', got null");
    }

    #[test]
    fn extra_fields_are_accepted() {
        let args = json!({ "operation": "paste", "verbose": true });

        assert!(validate_arguments(&args, &clipboard_schema()).is_ok());
    }

    #[test]
    fn untyped_schema_accepts_anything() {
        assert!(validate_arguments(&Value::Null, &json!({})).is_ok());
        assert!(validate_arguments(&json!({ "n": 1 }), &json!({})).is_ok());
    }

    #[test]
    fn integer_and_boolean_types() {
        let schema = json!({
            "type": "object",
            "properties": { "count": { "type": "integer" }, "flag": { "type": "boolean" } },
        });

        assert!(validate_arguments(&json!({ "count": 3, "flag": false }), &schema).is_ok());
        assert!(validate_arguments(&json!({ "count": 1.5 }), &schema).is_err());
        assert!(validate_arguments(&json!({ "flag": "yes" }), &schema).is_err());
    }
}
