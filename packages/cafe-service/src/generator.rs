use std::{
	pin::Pin,
	sync::Arc,
	task::{Context, Poll},
};

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;

use cafe_config::LlmProviderConfig;
use cafe_domain::{
	constraint::Constraint,
	conversation::ConversationTurn,
	menu::{NO_MATCHES_MESSAGE, SearchResult},
};

use crate::{GenerationProvider, prompt};

/// Answer text for one generation call, fed by its own producer task.
///
/// Dropping the value, or calling [`Fragments::close`], stops the producer and releases the
/// model stream.
pub struct Fragments {
	rx: mpsc::Receiver<String>,
}
impl Fragments {
	/// Starts generation for `query` over `items`, passing along the soft preferences of
	/// `constraint`. Must be called inside a tokio runtime.
	///
	/// With no items the model is never called and the only fragment is the apology. A model
	/// failure ends the stream with a single `[Connection Error: ...]` fragment.
	pub fn start(
		provider: Arc<dyn GenerationProvider>,
		cfg: &LlmProviderConfig,
		query: &str,
		constraint: &Constraint,
		items: &[SearchResult],
		history: &[ConversationTurn],
		buffer: usize,
	) -> Self {
		let (tx, rx) = mpsc::channel(buffer.max(1));

		if items.is_empty() {
			tokio::spawn(async move {
				let _ = tx.send(NO_MATCHES_MESSAGE.to_string()).await;
			});

			return Self { rx };
		}

		let messages = prompt::generator_messages(query, constraint, items, history);
		let cfg = cfg.clone();

		tokio::spawn(async move {
			tokio::select! {
				_ = tx.closed() => {
					tracing::debug!("Fragment consumer left before the model answered.");
				},
				_ = produce(provider.as_ref(), &cfg, &messages, &tx) => {},
			}
		});

		Self { rx }
	}

	/// Stops the producer. Fragments already buffered can still be read.
	pub fn close(&mut self) {
		self.rx.close();
	}
}
impl Stream for Fragments {
	type Item = String;

	fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		self.rx.poll_recv(cx)
	}
}

async fn produce(
	provider: &dyn GenerationProvider,
	cfg: &LlmProviderConfig,
	messages: &[serde_json::Value],
	tx: &mpsc::Sender<String>,
) {
	let mut stream = match provider.stream(cfg, messages).await {
		Ok(stream) => stream,
		Err(err) => {
			tracing::warn!(error = %err, "Generation request failed.");

			let _ = tx.send(connection_error(&err)).await;

			return;
		},
	};

	while let Some(item) = stream.next().await {
		match item {
			Ok(fragment) => {
				if tx.send(fragment).await.is_err() {
					return;
				}
			},
			Err(err) => {
				tracing::warn!(error = %err, "Generation stream failed.");

				let _ = tx.send(connection_error(&err)).await;

				return;
			},
		}
	}
}

fn connection_error(err: &crate::Error) -> String {
	format!("[Connection Error: {err}]")
}
