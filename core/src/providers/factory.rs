use crate::config::Config;
use crate::providers::{GeminiProvider, OpenAIProvider};
use crate::traits::Provider;
use anyhow::{Result, anyhow};
use std::sync::Arc;

pub fn create_provider(config: &Config) -> Result<Arc<dyn Provider>> {
    match config.provider.to_lowercase().as_str() {
        "gemini" | "google" => {
            let api_key = resolve_api_key_with_fallback(
                &["GEMINI_API_KEY", "GOOGLE_API_KEY", "ORBIT_GEMINI_API_KEY"],
                &config.api_key,
            )?;
            let mut provider = GeminiProvider::new(api_key)
                .with_model(config.model.clone())
                .with_temperature(config.temperature);
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Arc::new(provider))
        }
        "openai" => {
            let api_key = resolve_api_key_with_fallback(
                &["OPENAI_API_KEY", "ORBIT_OPENAI_API_KEY"],
                &config.api_key,
            )?;
            let mut provider = OpenAIProvider::new(api_key)
                .with_model(config.model.clone())
                .with_temperature(config.temperature);
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Arc::new(provider))
        }
        _ => Err(anyhow!(
            "Unknown provider: {}. Available: gemini, openai",
            config.provider
        )),
    }
}

fn resolve_api_key_with_fallback(env_vars: &[&str], config_key: &str) -> Result<String> {
    for var_name in env_vars {
        if let Ok(key) = std::env::var(var_name)
            && !key.trim().is_empty()
        {
            return Ok(key);
        }
    }
    if !config_key.is_empty() {
        Ok(config_key.to_string())
    } else {
        Err(anyhow!(
            "No API key found. Set {} or run 'orbit onboard'.",
            env_vars.join(" / ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_is_rejected() {
        let config = Config {
            provider: "ollama".into(),
            api_key: "key".into(),
            ..Default::default()
        };
        let err = create_provider(&config).err().unwrap();
        assert!(err.to_string().contains("Available: gemini, openai"));
    }

    #[test]
    fn config_key_is_used_as_fallback() {
        for provider in ["gemini", "OpenAI"] {
            let config = Config {
                provider: provider.into(),
                api_key: "key".into(),
                ..Default::default()
            };
            let created = create_provider(&config).unwrap();
            assert_eq!(created.name(), provider.to_lowercase());
        }
    }

    #[test]
    fn missing_key_names_the_variables() {
        let err = resolve_api_key_with_fallback(&["ORBIT_TEST_UNSET_KEY"], "").unwrap_err();
        assert!(err.to_string().contains("ORBIT_TEST_UNSET_KEY"));
    }
}
