use serde_json::Value;

use crate::{Error, Result};

/// Runs one non-streaming chat completion and returns the first choice's text.
pub async fn complete(cfg: &cafe_config::LlmProviderConfig, messages: &[Value]) -> Result<String> {
	let client = crate::client(cfg.timeout_ms)?;
	let res = client
		.post(crate::endpoint(&cfg.api_base, &cfg.path))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&crate::chat_body(cfg, messages, false))
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion_content(&json)
}

fn parse_completion_content(json: &Value) -> Result<String> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.map(str::to_string)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Chat completion response is missing message content.".to_string(),
		})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn returns_first_choice_content_verbatim() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "```json\n{\"diet\": []}\n```" } },
				{ "message": { "content": "ignored" } }
			]
		});

		assert_eq!(
			parse_completion_content(&json).expect("parse failed"),
			"```json\n{\"diet\": []}\n```"
		);
	}

	#[test]
	fn missing_content_is_invalid() {
		let json = serde_json::json!({ "choices": [{ "message": { "content": null } }] });

		assert!(matches!(parse_completion_content(&json), Err(Error::InvalidResponse { .. })));
	}
}
