//! OpenAI-compatible chat completions client.
//!
//! Sends the rendered prompt together with the four decision tools and
//! forces the model to call one (`tool_choice: "required"`). Works with any
//! server that speaks the chat completions protocol (`OpenAI`, LM Studio,
//! Ollama, vLLM). The runner's decision timeout bounds every call, so the
//! client itself sets none.

use meadow_core::OracleError;
use meadow_types::Decision;
use serde_json::{Value, json};

use crate::config::LlmConfig;
use crate::error::BrainError;
use crate::parse::decision_from_response;
use crate::prompt::RenderedPrompt;

/// Longest error body kept in [`OracleError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// HTTP client for one configured endpoint.
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Create a client for `config`.
    pub fn new(config: LlmConfig) -> Result<Self, BrainError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, config })
    }

    /// The endpoint configuration.
    pub const fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Send `prompt` and turn the model's answer into a decision.
    ///
    /// # Errors
    ///
    /// [`OracleError::Transport`] if the request fails to send,
    /// [`OracleError::Status`] on a non-success response, and
    /// [`OracleError::Parse`] if no decision can be extracted.
    pub async fn complete(&self, prompt: &RenderedPrompt) -> Result<Decision, OracleError> {
        let url = format!("{}/chat/completions", self.config.api_url);
        let body = self.request_body(prompt);

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| OracleError::Transport(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let mut error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            truncate_on_char_boundary(&mut error_body, MAX_ERROR_BODY);
            return Err(OracleError::Status {
                status: status.as_u16(),
                body: error_body,
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| OracleError::Parse(format!("response is not JSON: {e}")))?;

        decision_from_response(&json)
    }

    /// Build the chat completions request body.
    fn request_body(&self, prompt: &RenderedPrompt) -> Value {
        json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user}
            ],
            "tools": tool_definitions(),
            "tool_choice": "required",
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens
        })
    }
}

/// The four tools offered to the model, one per decision kind.
pub fn tool_definitions() -> Value {
    json!([
        {
            "type": "function",
            "function": {
                "name": "move_to",
                "description": "Move to a specific position in the world",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "x": {"type": "number", "description": "X coordinate (between -4 and 4)"},
                        "z": {"type": "number", "description": "Z coordinate (between -4 and 4)"}
                    },
                    "required": ["x", "z"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "say_to",
                "description": "Say something to another agent",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "agent": {
                            "type": "string",
                            "description": "Name of the agent to speak to (e.g. 'Alice', 'Bob')"
                        },
                        "utterance": {
                            "type": "string",
                            "description": "What to say (keep under 40 words)"
                        }
                    },
                    "required": ["agent", "utterance"]
                }
            }
        },
        {
            "type": "function",
            "function": {
                "name": "idle",
                "description": "Rest, think, and observe for a few seconds",
                "parameters": {"type": "object", "properties": {}, "required": []}
            }
        },
        {
            "type": "function",
            "function": {
                "name": "observe",
                "description": "Take a fresh look at the environment and nearby agents",
                "parameters": {"type": "object", "properties": {}, "required": []}
            }
        }
    ])
}

fn truncate_on_char_boundary(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let cut = (0..=max)
        .rev()
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(0);
    text.truncate(cut);
}
