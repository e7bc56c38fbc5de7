use crate::tools::as_integer;
use serde_json::Value;

/// Checks call arguments against the subset of JSON schema tools declare:
/// an object with `properties` (each with a `type`) and `required`.
/// Properties the schema does not mention are passed through unchecked.
pub fn validate_arguments(schema: &Value, args: &Value) -> Result<(), String> {
    let Some(args) = args.as_object() else {
        return Err(format!(
            "expected an object of named arguments, got {}",
            type_name(args)
        ));
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            if !args.contains_key(name) {
                return Err(format!("missing required parameter '{}'", name));
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };

    for (name, value) in args {
        let expected = properties
            .get(name)
            .and_then(|p| p.get("type"))
            .and_then(Value::as_str);
        if let Some(expected) = expected {
            if !matches_type(expected, value) {
                return Err(format!(
                    "parameter '{}' must be {}, got {}",
                    name,
                    expected,
                    type_name(value)
                ));
            }
        }
    }

    Ok(())
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => as_integer(value).is_some(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
