//! LLM response parsing into typed decisions.
//!
//! The model is asked to call one of four tools. Its first tool call is
//! converted into a [`Decision`]. Models that ignore the tools and answer
//! with plain content get a second chance: the content is cleaned of code
//! fences, `<|...|>` control tokens, and trailing commas, then parsed as
//! decision JSON.

use meadow_core::OracleError;
use meadow_types::Decision;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Arguments of the `move_to` tool.
#[derive(Debug, Deserialize)]
struct MoveArgs {
    x: f64,
    z: f64,
}

/// Arguments of the `say_to` tool.
#[derive(Debug, Deserialize)]
struct SayArgs {
    agent: String,
    utterance: String,
}

/// Extract a decision from an OpenAI-compatible chat completions response.
pub fn decision_from_response(json: &Value) -> Result<Decision, OracleError> {
    let message = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| {
            OracleError::Parse(String::from("response missing choices[0].message"))
        })?;

    if let Some(call) = message
        .get("tool_calls")
        .and_then(|calls| calls.get(0))
        .and_then(|call| call.get("function"))
    {
        let name = call
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| OracleError::Parse(String::from("tool call without a name")))?;
        let arguments = call.get("arguments").cloned().unwrap_or(Value::Null);
        debug!(tool = name, arguments = %arguments, "tool call received");
        return decision_from_tool_call(name, arguments);
    }

    match message.get("content").and_then(Value::as_str) {
        Some(content) if !content.trim().is_empty() => decision_from_content(content),
        _ => Err(OracleError::Parse(String::from(
            "response has neither a tool call nor content",
        ))),
    }
}

/// Convert one tool call into a decision.
///
/// `arguments` is usually a JSON-encoded string, but some servers send the
/// object itself; both are accepted.
pub fn decision_from_tool_call(name: &str, arguments: Value) -> Result<Decision, OracleError> {
    let arguments = match arguments {
        Value::String(raw) if raw.trim().is_empty() => Value::Object(serde_json::Map::new()),
        Value::String(raw) => serde_json::from_str(&raw)
            .map_err(|e| OracleError::Parse(format!("invalid {name} arguments: {e}")))?,
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };

    match name {
        "move_to" => {
            let MoveArgs { x, z } = serde_json::from_value(arguments)
                .map_err(|e| OracleError::Parse(format!("invalid move_to arguments: {e}")))?;
            Ok(Decision::move_to(x, z))
        }
        "say_to" => {
            let SayArgs { agent, utterance } = serde_json::from_value(arguments)
                .map_err(|e| OracleError::Parse(format!("invalid say_to arguments: {e}")))?;
            Ok(Decision::text(agent, utterance))
        }
        "idle" => Ok(Decision::idle()),
        "observe" => Ok(Decision::observe()),
        other => Err(OracleError::Parse(format!("unknown tool: {other}"))),
    }
}

/// Parse free-form content as decision JSON.
pub fn decision_from_content(raw: &str) -> Result<Decision, OracleError> {
    let trimmed = raw.trim();
    let unfenced = extract_json_from_codeblock(trimmed).unwrap_or(trimmed);
    let cleaned = strip_trailing_commas(&strip_control_tokens(unfenced));

    serde_json::from_str::<Decision>(cleaned.trim())
        .map_err(|e| OracleError::Parse(format!("content is not a decision ({e}): {trimmed}")))
}

/// Return the body of the first fenced code block, if any.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = text.get(open.checked_add(3)?..)?;
    // Skip the info string (`json`) up to the end of the fence line.
    let body = after_fence
        .find('\n')
        .and_then(|nl| after_fence.get(nl.checked_add(1)?..))
        .unwrap_or_else(|| after_fence.trim_start_matches("json"));
    let end = body.find("```")?;
    body.get(..end).map(str::trim)
}

/// Remove `<|...|>` control tokens and any text that follows each one up
/// to the next `{`, e.g. `<|channel|>final <|message|>{...}`.
fn strip_control_tokens(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("<|") {
        result.push_str(rest.get(..start).unwrap_or_default());
        let after = rest.get(start..).unwrap_or_default();
        let Some(close) = after.find("|>") else {
            rest = after;
            break;
        };
        let tail = after.get(close.saturating_add(2)..).unwrap_or_default();
        rest = match (tail.find('{'), tail.find("<|")) {
            (Some(brace), Some(token)) if token < brace => tail.get(token..).unwrap_or_default(),
            (Some(brace), _) => tail.get(brace..).unwrap_or_default(),
            (None, Some(token)) => tail.get(token..).unwrap_or_default(),
            (None, None) => "",
        };
    }
    result.push_str(rest);
    result
}

/// Drop commas that directly precede a closing `}` or `]`.
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for (i, c) in text.char_indices() {
        if c == ',' {
            let next = text
                .get(i.saturating_add(1)..)
                .and_then(|after| after.chars().find(|ch| !ch.is_whitespace()));
            if matches!(next, Some('}' | ']')) {
                continue;
            }
        }
        result.push(c);
    }

    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use meadow_types::{DecisionAction, DecisionTarget};
    use serde_json::json;

    use super::*;

    fn tool_response(name: &str, arguments: &str) -> Value {
        json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": name, "arguments": arguments}
                    }]
                }
            }]
        })
    }

    fn content_response(content: &str) -> Value {
        json!({"choices": [{"message": {"content": content}}]})
    }

    #[test]
    fn move_tool_becomes_move_decision() {
        let decision =
            decision_from_response(&tool_response("move_to", r#"{"x": 1.5, "z": -2}"#)).unwrap();
        assert_eq!(decision, Decision::move_to(1.5, -2.0));
    }

    #[test]
    fn say_tool_becomes_text_decision() {
        let decision = decision_from_response(&tool_response(
            "say_to",
            r#"{"agent": "Bob", "utterance": "Over here!"}"#,
        ))
        .unwrap();
        assert_eq!(decision, Decision::text("Bob", "Over here!"));
    }

    #[test]
    fn argumentless_tools() {
        assert_eq!(
            decision_from_response(&tool_response("idle", "{}")).unwrap(),
            Decision::idle()
        );
        assert_eq!(
            decision_from_response(&tool_response("observe", "")).unwrap(),
            Decision::observe()
        );
    }

    #[test]
    fn object_arguments_are_accepted() {
        let decision = decision_from_tool_call("move_to", json!({"x": 0.0, "z": 3.0})).unwrap();
        assert_eq!(decision, Decision::move_to(0.0, 3.0));
    }

    #[test]
    fn unknown_tool_is_a_parse_error() {
        let result = decision_from_response(&tool_response("dance", "{}"));
        assert!(matches!(result, Err(OracleError::Parse(_))));
    }

    #[test]
    fn bad_arguments_are_a_parse_error() {
        let result = decision_from_response(&tool_response("move_to", r#"{"x": "left"}"#));
        assert!(matches!(result, Err(OracleError::Parse(_))));
    }

    #[test]
    fn fenced_content_is_parsed() {
        let content = "```json\n{\"action\": \"say\", \"target\": {\"agent\": \"Alice\"}, \"utterance\": \"hi\"}\n```";
        let decision = decision_from_response(&content_response(content)).unwrap();
        assert_eq!(decision.action, DecisionAction::Text);
        assert_eq!(
            decision.target,
            Some(DecisionTarget::Agent {
                agent: String::from("Alice")
            })
        );
    }

    #[test]
    fn control_tokens_are_stripped() {
        let content =
            "<|channel|>final <|constrain|>JSON<|message|>{\"action\": \"idle\", \"target\": null}";
        let decision = decision_from_content(content).unwrap();
        assert_eq!(decision, Decision::idle());
    }

    #[test]
    fn trailing_commas_are_tolerated() {
        let content = "{\"action\": \"move\", \"target\": {\"x\": 1.0, \"z\": 2.0,},}";
        let decision = decision_from_content(content).unwrap();
        assert_eq!(decision, Decision::move_to(1.0, 2.0));
    }

    #[test]
    fn garbage_content_is_a_parse_error() {
        let result = decision_from_response(&content_response("I think I will go north."));
        assert!(matches!(result, Err(OracleError::Parse(_))));
    }

    #[test]
    fn empty_response_is_a_parse_error() {
        assert!(decision_from_response(&json!({"error": "rate_limit"})).is_err());
        assert!(decision_from_response(&content_response("  ")).is_err());
    }

    #[test]
    fn commas_inside_values_survive() {
        assert_eq!(strip_trailing_commas("[1, 2, ]"), "[1, 2 ]");
        assert_eq!(strip_trailing_commas("\"a, b\""), "\"a, b\"");
    }
}
