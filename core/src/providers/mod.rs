pub mod factory;
pub mod gemini;
pub mod openai;

pub use factory::create_provider;
pub use gemini::GeminiProvider;
pub use openai::OpenAIProvider;

use serde_json::{Map, Value};

/// Calls to a tool without parameters may arrive with the arguments omitted,
/// `null` or blank. They all mean an empty object.
pub(crate) fn normalize_arguments(arguments: Value) -> Value {
    match arguments {
        Value::Null => Value::Object(Map::new()),
        Value::String(s) if s.trim().is_empty() => Value::Object(Map::new()),
        other => other,
    }
}
