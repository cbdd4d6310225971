use std::{
	fmt,
	pin::Pin,
	sync::Arc,
	task::{Context, Poll},
};

use futures_util::{Stream, StreamExt};
use serde::Serialize;
use tokio::{sync::mpsc, task::JoinHandle};

use cafe_domain::{
	constraint::Constraint,
	conversation::{self, ConversationTurn},
	grounding,
	menu::SearchResult,
};

use crate::{CafeService, Fragments, Result, SearchOptions, extractor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
	Idle,
	Extracting,
	Retrieving,
	Generating,
	Finalizing,
}
impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			Self::Idle => "idle",
			Self::Extracting => "extracting",
			Self::Retrieving => "retrieving",
			Self::Generating => "generating",
			Self::Finalizing => "finalizing",
		};

		f.write_str(label)
	}
}

/// What one exchange did, available once its stream has ended.
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeOutcome {
	pub session_id: String,
	pub constraint: Constraint,
	pub items: Vec<SearchResult>,
	/// Concatenation of every fragment delivered to the consumer.
	pub answer: String,
	pub grounded: bool,
	/// Assistant text committed to the session: the answer, or the fallback when ungrounded.
	pub recorded: String,
	/// False when the consumer left before generation finished.
	pub completed: bool,
}

/// Non-streaming reply: the answer a client should show, plus the context it came from.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
	pub session_id: String,
	pub answer: String,
	pub grounded: bool,
	pub constraint: Constraint,
	pub items: Vec<SearchResult>,
}

/// Fragments of one exchange as they are produced.
///
/// Dropping the stream or calling [`ChatStream::close`] abandons generation; the partial answer
/// is still validated and committed to the session.
pub struct ChatStream {
	rx: mpsc::Receiver<String>,
	task: JoinHandle<Result<ExchangeOutcome>>,
}
impl ChatStream {
	pub fn close(&mut self) {
		self.rx.close();
	}

	/// Waits for the exchange to finish and its turns to be committed.
	///
	/// Unread fragments are discarded, so call this after draining to keep the full answer.
	pub async fn outcome(self) -> Result<ExchangeOutcome> {
		let Self { rx, task } = self;

		drop(rx);

		task.await?
	}
}
impl Stream for ChatStream {
	type Item = String;

	fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		self.rx.poll_recv(cx)
	}
}

impl CafeService {
	/// Runs one exchange on its own task and streams the answer.
	pub fn chat_stream(self: &Arc<Self>, message: &str, session_id: &str) -> ChatStream {
		let (tx, rx) = mpsc::channel(self.cfg.conversation.stream_buffer.max(1));
		let service = Arc::clone(self);
		let message = message.to_string();
		let session_id = session_id.to_string();
		let task = tokio::spawn(async move { service.run_exchange(message, session_id, tx).await });

		ChatStream { rx, task }
	}

	/// Runs one exchange to completion. Ungrounded answers are replaced by the fallback list.
	pub async fn chat(self: &Arc<Self>, message: &str, session_id: &str) -> Result<ChatReply> {
		let mut stream = self.chat_stream(message, session_id);

		while stream.next().await.is_some() {}

		let outcome = stream.outcome().await?;

		Ok(ChatReply {
			session_id: outcome.session_id,
			answer: outcome.recorded,
			grounded: outcome.grounded,
			constraint: outcome.constraint,
			items: outcome.items,
		})
	}

	pub async fn clear(&self, session_id: &str) -> Result<()> {
		let guard = self.session_guard(session_id).await;

		self.sessions.clear(session_id).await?;

		drop(guard);
		self.locks.forget(session_id);

		tracing::debug!(session_id, "Session cleared.");

		Ok(())
	}

	pub async fn history(&self, session_id: &str) -> Result<Vec<ConversationTurn>> {
		self.sessions.history(session_id).await
	}

	async fn session_guard(&self, session_id: &str) -> Option<tokio::sync::OwnedMutexGuard<()>> {
		if self.cfg.conversation.serialize_sessions {
			Some(self.locks.acquire(session_id).await)
		} else {
			None
		}
	}

	async fn run_exchange(
		&self,
		message: String,
		session_id: String,
		tx: mpsc::Sender<String>,
	) -> Result<ExchangeOutcome> {
		let _guard = self.session_guard(&session_id).await;
		let conversation_cfg = &self.cfg.conversation;
		let history = self.sessions.history(&session_id).await?;

		tracing::debug!(session_id = %session_id, stage = %Stage::Extracting, "Exchange stage.");

		let constraint = extractor::extract_constraint(
			&self.providers,
			&self.cfg.providers.llm_extractor,
			&message,
			conversation::trailing(&history, conversation_cfg.extractor_window),
		)
		.await;

		tracing::debug!(
			session_id = %session_id,
			stage = %Stage::Retrieving,
			?constraint,
			"Exchange stage."
		);

		let query = constraint.category_hint.as_deref().unwrap_or(&message);
		let options = SearchOptions::for_constraint(&self.cfg.retrieval, &constraint);
		let items = match self.retriever.search(&self.providers, &self.cfg, query, &options).await {
			Ok(items) => items,
			Err(err) => {
				tracing::warn!(
					session_id = %session_id,
					error = %err,
					"Retrieval failed. Answering with no items."
				);

				Vec::new()
			},
		};

		tracing::debug!(
			session_id = %session_id,
			stage = %Stage::Generating,
			items = items.len(),
			"Exchange stage."
		);

		let mut answer = String::new();
		let mut completed = false;

		if tx.is_closed() {
			tracing::debug!(session_id = %session_id, "Consumer left before generation.");
		} else {
			let mut fragments = Fragments::start(
				self.providers.generator.clone(),
				&self.cfg.providers.llm_generator,
				&message,
				&constraint,
				&items,
				conversation::trailing(&history, conversation_cfg.generator_window),
				conversation_cfg.stream_buffer,
			);

			completed = forward(&mut fragments, &tx, &mut answer).await;

			if !completed {
				fragments.close();
				tracing::debug!(
					session_id = %session_id,
					"Consumer disconnected during generation."
				);
			}
		}

		tracing::debug!(session_id = %session_id, stage = %Stage::Finalizing, "Exchange stage.");

		let report = grounding::check(&answer, &items);
		let grounded = report.is_grounded();
		let recorded = if grounded {
			answer.clone()
		} else {
			tracing::warn!(
				session_id = %session_id,
				unknown_prices = ?report.unknown_prices,
				"Answer cites prices outside the retrieved items. Recording fallback."
			);

			grounding::fallback_answer(&items)
		};

		self.sessions
			.append(
				&session_id,
				vec![ConversationTurn::user(message), ConversationTurn::assistant(recorded.clone())],
				conversation_cfg.max_turns,
			)
			.await?;

		tracing::debug!(
			session_id = %session_id,
			stage = %Stage::Idle,
			completed,
			grounded,
			"Exchange stage."
		);

		Ok(ExchangeOutcome {
			session_id,
			constraint,
			items,
			answer,
			grounded,
			recorded,
			completed,
		})
	}
}

/// Relays fragments until the source ends or the consumer leaves. Returns whether the source
/// ended. `answer` holds exactly the delivered fragments.
async fn forward(
	fragments: &mut Fragments,
	tx: &mpsc::Sender<String>,
	answer: &mut String,
) -> bool {
	loop {
		let next = tokio::select! {
			_ = tx.closed() => return false,
			next = fragments.next() => next,
		};
		let Some(fragment) = next else {
			return true;
		};
		let delivered = answer.len();

		answer.push_str(&fragment);

		if tx.send(fragment).await.is_err() {
			answer.truncate(delivered);

			return false;
		}
	}
}
