//! Streaming chat completions over server-sent events.

use std::{collections::VecDeque, pin::Pin};

use futures_util::{Stream, StreamExt, stream};
use serde_json::Value;

use crate::{Error, Result};

pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
	Delta(String),
	Error(String),
	Done,
}

/// Incremental decoder for `data:` lines. Bytes are buffered until a full line arrives, so
/// multi-byte characters split across network chunks decode intact.
#[derive(Debug, Default)]
pub struct SseDecoder {
	buffer: Vec<u8>,
}
impl SseDecoder {
	pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
		self.buffer.extend_from_slice(chunk);

		let mut events = Vec::new();

		while let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
			let line: Vec<u8> = self.buffer.drain(..=pos).collect();

			if let Some(event) = parse_line(&String::from_utf8_lossy(&line)) {
				events.push(event);
			}
		}

		events
	}

	/// Decodes whatever is left once the body ends without a trailing newline.
	pub fn finish(&mut self) -> Option<SseEvent> {
		let line = std::mem::take(&mut self.buffer);

		parse_line(&String::from_utf8_lossy(&line))
	}
}

/// Opens a streaming completion and yields content deltas in arrival order.
///
/// Connection and status failures return `Err` before any fragment; later transport failures
/// and in-band error events arrive as a final `Err` item. `timeout_ms` bounds the wait for each
/// chunk rather than the whole answer.
pub async fn stream_chat(
	cfg: &cafe_config::LlmProviderConfig,
	messages: &[Value],
) -> Result<FragmentStream> {
	let client = crate::stream_client(cfg.timeout_ms)?;
	let res = client
		.post(crate::endpoint(&cfg.api_base, &cfg.path))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&crate::chat_body(cfg, messages, true))
		.send()
		.await?
		.error_for_status()?;
	let state = DecodeState {
		bytes: Box::pin(res.bytes_stream()),
		decoder: SseDecoder::default(),
		pending: VecDeque::new(),
		done: false,
	};

	Ok(Box::pin(stream::unfold(state, next_fragment)))
}

struct DecodeState<S> {
	bytes: S,
	decoder: SseDecoder,
	pending: VecDeque<Result<String>>,
	done: bool,
}
impl<S> DecodeState<S> {
	fn enqueue(&mut self, events: impl IntoIterator<Item = SseEvent>) {
		for event in events {
			if self.done {
				return;
			}

			match event {
				SseEvent::Delta(text) => self.pending.push_back(Ok(text)),
				SseEvent::Error(message) => {
					self.pending.push_back(Err(Error::Stream { message }));
					self.done = true;
				},
				SseEvent::Done => self.done = true,
			}
		}
	}
}

async fn next_fragment<S, B>(mut state: DecodeState<S>) -> Option<(Result<String>, DecodeState<S>)>
where
	S: Stream<Item = reqwest::Result<B>> + Unpin,
	B: AsRef<[u8]>,
{
	loop {
		if let Some(item) = state.pending.pop_front() {
			return Some((item, state));
		}
		if state.done {
			return None;
		}

		match state.bytes.next().await {
			Some(Ok(chunk)) => {
				let events = state.decoder.push(chunk.as_ref());

				state.enqueue(events);
			},
			Some(Err(err)) => {
				state.done = true;
				state.pending.push_back(Err(Error::from(err)));
			},
			None => {
				let tail = state.decoder.finish();

				state.enqueue(tail);
				state.done = true;
			},
		}
	}
}

fn parse_line(line: &str) -> Option<SseEvent> {
	let payload = line.trim_end_matches(['\r', '\n']).strip_prefix("data:")?.trim_start();

	if payload.is_empty() {
		return None;
	}
	if payload == "[DONE]" {
		return Some(SseEvent::Done);
	}

	let json: Value = serde_json::from_str(payload).ok()?;

	if let Some(error) = json.get("error") {
		let message = error
			.get("message")
			.and_then(|m| m.as_str())
			.map(str::to_string)
			.unwrap_or_else(|| error.to_string());

		return Some(SseEvent::Error(message));
	}

	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("delta"))
		.and_then(|delta| delta.get("content"))
		.and_then(|c| c.as_str())
		.filter(|text| !text.is_empty())
		.map(|text| SseEvent::Delta(text.to_string()))
}
