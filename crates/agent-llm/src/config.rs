use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

pub const ENV_API_KEY: &str = "AGENT_LLM_API_KEY";
pub const ENV_BASE_URL: &str = "AGENT_LLM_BASE_URL";
pub const ENV_MODEL: &str = "AGENT_LLM_MODEL";
pub const ENV_TEMPERATURE: &str = "AGENT_LLM_TEMPERATURE";

/// Connection settings for an OpenAI-compatible endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl LLMConfig {
    /// Defaults overlaid with the `AGENT_LLM_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(api_key) = non_empty(ENV_API_KEY) {
            config.api_key = api_key;
        }
        if let Some(base_url) = non_empty(ENV_BASE_URL) {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(model) = non_empty(ENV_MODEL) {
            config.model = model;
        }
        if let Some(raw) = non_empty(ENV_TEMPERATURE) {
            match raw.trim().parse::<f32>() {
                Ok(temperature) => config.temperature = temperature,
                Err(_) => log::warn!(
                    "Ignoring {}='{}': not a number, keeping {}",
                    ENV_TEMPERATURE,
                    raw,
                    config.temperature
                ),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_openai() {
        let config = LLMConfig::default();
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.temperature, 0.7);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = LLMConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "sk-test"),
            (ENV_BASE_URL, "http://localhost:8080/v1/"),
            (ENV_MODEL, "local-model"),
            (ENV_TEMPERATURE, "0.2"),
        ]));

        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.model, "local-model");
        assert_eq!(config.temperature, 0.2);
    }

    #[test]
    fn blank_or_invalid_values_are_ignored() {
        let config = LLMConfig::from_lookup(lookup(&[
            (ENV_MODEL, "  "),
            (ENV_TEMPERATURE, "warm"),
        ]));

        assert_eq!(config, LLMConfig::default());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: LLMConfig = serde_json::from_str(r#"{"model":"gpt-4o"}"#).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }
}
