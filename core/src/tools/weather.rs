use crate::tools::extract_string_arg;
use crate::traits::Tool;
use async_trait::async_trait;
use serde_json::{Value, json};

/// Canned weather table for demos and tests.
const FORECASTS: &[(&str, &str, &str)] = &[
    ("london", "15C", "Cloudy"),
    ("tokyo", "12C", "Rainy"),
    ("san francisco", "20C", "Sunny"),
    ("nagpur", "32C", "Hot"),
];

const FALLBACK: (&str, &str) = ("25C", "Clear");

#[derive(Debug, Default)]
pub struct WeatherTool;

impl WeatherTool {
    pub fn new() -> Self {
        Self
    }

    pub fn forecast(city: &str) -> Value {
        let city = city.trim().to_lowercase();
        let (temp, condition) = FORECASTS
            .iter()
            .find(|(name, _, _)| city.contains(name))
            .map(|(_, temp, condition)| (*temp, *condition))
            .unwrap_or(FALLBACK);
        json!({ "temp": temp, "condition": condition })
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get the current weather for a specific city. Returns temperature and condition."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "The name of the city (e.g. \"London\", \"New York\")"
                }
            },
            "required": ["city"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let city = extract_string_arg(&args, "city")?;
        Ok(Self::forecast(&city))
    }
}
