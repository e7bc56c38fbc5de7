use crate::tools::{extract_f64_arg, extract_i64_arg};
use crate::traits::Tool;
use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::{Value, json};

#[derive(Debug, Default)]
pub struct MultiplyTool;

#[async_trait]
impl Tool for MultiplyTool {
    fn name(&self) -> &str {
        "multiply"
    }

    fn description(&self) -> &str {
        "Multiply two integers and return the product"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "a": { "type": "integer", "description": "First factor" },
                "b": { "type": "integer", "description": "Second factor" }
            },
            "required": ["a", "b"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let a = extract_i64_arg(&args, "a")?;
        let b = extract_i64_arg(&args, "b")?;
        let product = a
            .checked_mul(b)
            .ok_or_else(|| anyhow!("{} * {} overflows a 64-bit integer", a, b))?;
        Ok(json!(product))
    }
}

#[derive(Debug, Default)]
pub struct BmiTool;

#[async_trait]
impl Tool for BmiTool {
    fn name(&self) -> &str {
        "calc_bmi"
    }

    fn description(&self) -> &str {
        "Calculate the Body Mass Index: weight (kg) / height (m)^2"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "weight_kg": { "type": "number", "description": "Body weight in kilograms" },
                "height_m": { "type": "number", "description": "Height in meters" }
            },
            "required": ["weight_kg", "height_m"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let weight = extract_f64_arg(&args, "weight_kg")?;
        let height = extract_f64_arg(&args, "height_m")?;
        if height <= 0.0 {
            return Err(anyhow!("division by zero: height_m must be greater than zero"));
        }
        let bmi = weight / (height * height);
        Ok(Value::String(format!("{:.2}", bmi)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn multiplies() {
        let result = MultiplyTool.execute(json!({"a": 55, "b": 10})).await.unwrap();
        assert_eq!(result, json!(550));
    }

    #[tokio::test]
    async fn multiply_overflow_is_an_error() {
        let err = MultiplyTool
            .execute(json!({"a": i64::MAX, "b": 2}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("overflows"));
    }

    #[tokio::test]
    async fn bmi_is_formatted_to_two_decimals() {
        let result = BmiTool
            .execute(json!({"weight_kg": 70, "height_m": 1.75}))
            .await
            .unwrap();
        assert_eq!(result, json!("22.86"));
    }

    #[tokio::test]
    async fn bmi_rejects_zero_height() {
        let err = BmiTool
            .execute(json!({"weight_kg": 70, "height_m": 0}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("division by zero"));
    }
}
