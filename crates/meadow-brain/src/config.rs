//! LLM oracle configuration.
//!
//! Loaded from environment variables, separately from the simulation's
//! YAML file, so API keys never land in a checked-in config. When
//! `LLM_API_URL` is unset there is no LLM configuration at all and the
//! engine falls back to the mock oracle.

use std::str::FromStr;

use crate::error::BrainError;

/// Model used when `LLM_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "openai/gpt-oss-20b";

/// Connection and sampling settings for an OpenAI-compatible endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// Base API URL (e.g. `http://localhost:1234/v1`). Requests go to
    /// `{api_url}/chat/completions`.
    pub api_url: String,
    /// Bearer token, if the endpoint needs one.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Completion token limit.
    pub max_tokens: u32,
    /// How many past decisions and past observations to keep per agent.
    pub memory_limit: usize,
    /// Directory holding `system.j2` and `user.j2` overrides. The built-in
    /// templates are used when unset.
    pub templates_dir: Option<String>,
}

impl LlmConfig {
    /// A configuration for `api_url` with every other setting defaulted.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_owned(),
            api_key: None,
            model: DEFAULT_MODEL.to_owned(),
            temperature: 0.7,
            max_tokens: 500,
            memory_limit: 10,
            templates_dir: None,
        }
    }

    /// Load configuration from the process environment.
    ///
    /// Variables:
    /// - `LLM_API_URL` -- base API URL; when unset, returns `Ok(None)`
    /// - `LLM_API_KEY` -- bearer token (optional)
    /// - `LLM_MODEL` -- model name (default `openai/gpt-oss-20b`)
    /// - `LLM_TEMPERATURE` -- sampling temperature (default 0.7)
    /// - `LLM_MAX_TOKENS` -- completion token limit (default 500)
    /// - `LLM_MEMORY_LIMIT` -- per-agent memory size (default 10)
    /// - `LLM_TEMPLATES_DIR` -- prompt template overrides (optional)
    pub fn from_env() -> Result<Option<Self>, BrainError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup` instead of the real environment.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, BrainError> {
        let Some(api_url) = lookup("LLM_API_URL").filter(|url| !url.trim().is_empty()) else {
            return Ok(None);
        };
        let mut config = Self::new(api_url.trim());

        config.api_key = lookup("LLM_API_KEY").filter(|key| !key.is_empty());
        if let Some(model) = lookup("LLM_MODEL").filter(|m| !m.trim().is_empty()) {
            config.model = model.trim().to_owned();
        }
        config.templates_dir = lookup("LLM_TEMPLATES_DIR").filter(|dir| !dir.trim().is_empty());
        if let Some(temperature) = parse_var(&lookup, "LLM_TEMPERATURE")? {
            config.temperature = temperature;
        }
        if let Some(max_tokens) = parse_var(&lookup, "LLM_MAX_TOKENS")? {
            config.max_tokens = max_tokens;
        }
        if let Some(memory_limit) = parse_var(&lookup, "LLM_MEMORY_LIMIT")? {
            config.memory_limit = memory_limit;
        }

        if !(0.0..=2.0).contains(&config.temperature) {
            return Err(BrainError::Config(format!(
                "LLM_TEMPERATURE must be between 0 and 2, got {}",
                config.temperature
            )));
        }
        if config.max_tokens == 0 {
            return Err(BrainError::Config(String::from(
                "LLM_MAX_TOKENS must be positive",
            )));
        }

        Ok(Some(config))
    }
}

/// Parse an optional variable, failing only when it is set but malformed.
fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, BrainError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| BrainError::Config(format!("invalid {name}: {e}")))
        })
        .transpose()
}
