use std::collections::HashMap;

use secrecy::SecretString;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Process-wide, immutable configuration read once at startup.
///
/// No hot reload, no file-based layer: the variable set is small enough
/// that a dedicated config-file crate would be over-engineering here.
#[derive(Clone)]
pub struct Config {
    pub openai_api_key: Option<SecretString>,
    pub openai_base_url: String,
    pub openai_default_model: Option<String>,
    pub model_map: ModelMap,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok().map(SecretString::from);

        let openai_base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let openai_default_model = std::env::var("OPENAI_DEFAULT_MODEL").ok();

        let model_map = match std::env::var("MODEL_MAP_JSON") {
            Ok(raw) => ModelMap::parse(&raw)?,
            Err(_) => ModelMap::default(),
        };

        Ok(Self {
            openai_api_key,
            openai_base_url,
            openai_default_model,
            model_map,
        })
    }
}

/// Client model name → upstream model name. Accepted on the wire either as
/// a flat `{name: name}` object or wrapped as `{"models": {...}}`.
#[derive(Debug, Clone, Default)]
pub struct ModelMap(pub HashMap<String, String>);

impl ModelMap {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Wrapped { models: HashMap<String, String> },
            Flat(HashMap<String, String>),
        }

        let wire: Wire = serde_json::from_str(raw)?;
        let map = match wire {
            Wire::Wrapped { models } => models,
            Wire::Flat(map) => map,
        };

        // Keys are normalized the same way `resolve_model` normalizes its
        // input, so exact/prefix matching against a mixed-case or padded
        // configured key still hits.
        let normalized = map
            .into_iter()
            .map(|(key, value)| (key.trim().to_lowercase(), value))
            .collect();

        Ok(Self(normalized))
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn parses_flat_map() {
        let map = ModelMap::parse(r#"{"foo-a": "gpt-4o"}"#).unwrap();
        assert_eq!(map.0.get("foo-a"), Some(&"gpt-4o".to_string()));
    }

    #[test]
    fn parses_wrapped_map() {
        let raw = indoc! {r#"
            {
              "models": {
                "foo-a": "gpt-4o",
                "foo-b": "gpt-4o-mini"
              }
            }
        "#};
        let map = ModelMap::parse(raw).unwrap();
        assert_eq!(map.0.get("foo-a"), Some(&"gpt-4o".to_string()));
        assert_eq!(map.0.get("foo-b"), Some(&"gpt-4o-mini".to_string()));
    }

    #[test]
    fn normalizes_mixed_case_and_padded_keys() {
        let map = ModelMap::parse(r#"{" Claude-3-5-Sonnet ": "gpt-4o"}"#).unwrap();
        assert_eq!(map.0.get("claude-3-5-sonnet"), Some(&"gpt-4o".to_string()));
    }
}
