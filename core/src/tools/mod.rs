use serde_json::Value;

pub mod math;
pub mod schema;
pub mod search;
pub mod weather;

pub use math::{BmiTool, MultiplyTool};
pub use schema::validate_arguments;
pub use search::SearchTool;
pub use weather::WeatherTool;

pub fn extract_string_arg(args: &Value, key: &str) -> anyhow::Result<String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' parameter", key))
        .map(|s| s.to_string())
}

pub fn extract_f64_arg(args: &Value, key: &str) -> anyhow::Result<f64> {
    args.get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| anyhow::anyhow!("Missing numeric '{}' parameter", key))
}

/// Reads a JSON number as an `i64`. Integral floats (`55.0`) count, since
/// some models encode every number as a double.
pub(crate) fn as_integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(f as i64),
        _ => None,
    }
}

pub fn extract_i64_arg(args: &Value, key: &str) -> anyhow::Result<i64> {
    let value = args
        .get(key)
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' parameter", key))?;
    as_integer(value).ok_or_else(|| anyhow::anyhow!("Parameter '{}' must be an integer", key))
}
