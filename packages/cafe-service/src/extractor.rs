use std::time::Duration;

use cafe_config::LlmProviderConfig;
use cafe_domain::{
	constraint::Constraint,
	conversation::ConversationTurn,
	extraction::{ExtractionFailure, ExtractionOutcome},
};

use crate::{Providers, prompt};

/// Asks the extractor model for filters. Never fails: every failure becomes the default.
pub async fn extract_constraint(
	providers: &Providers,
	cfg: &LlmProviderConfig,
	message: &str,
	history: &[ConversationTurn],
) -> Constraint {
	let outcome = run_extraction(providers, cfg, message, history).await;

	if let ExtractionOutcome::Failed(failure) = &outcome {
		tracing::warn!(%failure, "Constraint extraction failed. Using default constraint.");
	}

	outcome.into_constraint()
}

pub async fn run_extraction(
	providers: &Providers,
	cfg: &LlmProviderConfig,
	message: &str,
	history: &[ConversationTurn],
) -> ExtractionOutcome {
	let messages = prompt::extractor_messages(message, history);
	let call = providers.extractor.extract(cfg, &messages);

	match tokio::time::timeout(Duration::from_millis(cfg.timeout_ms), call).await {
		Ok(Ok(text)) => ExtractionOutcome::from_model_output(&text),
		Ok(Err(err)) => ExtractionOutcome::Failed(ExtractionFailure::Provider(err.to_string())),
		Err(_) => ExtractionOutcome::Failed(ExtractionFailure::Timeout),
	}
}
