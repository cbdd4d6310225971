mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Conversation, DEFAULT_DESCRIPTOR_FILE, DEFAULT_INDEX_FILE, DEFAULT_METADATA_FILE,
	EmbeddingProviderConfig, LlmProviderConfig, Providers, Retrieval, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw =
		fs::read_to_string(path).map_err(|err| Error::Read { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::Parse { source, .. } => Error::Parse { path: path.to_path_buf(), source },
		other => other,
	})
}

/// Parses, normalizes, and validates a config document held in memory.
pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config =
		toml::from_str(raw).map_err(|err| Error::Parse { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation { message: "service.log_level must be non-empty.".to_string() });
	}
	if cfg.storage.index_dir.as_os_str().is_empty() {
		return Err(Error::Validation { message: "storage.index_dir must be non-empty.".to_string() });
	}

	let embedding = &cfg.providers.embedding;

	if embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if embedding.model.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.model must be non-empty.".to_string(),
		});
	}
	if embedding.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
		});
	}

	for (label, llm) in
		[("llm_extractor", &cfg.providers.llm_extractor), ("llm_generator", &cfg.providers.llm_generator)]
	{
		if llm.model.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("providers.{label}.model must be non-empty."),
			});
		}
		if !llm.temperature.is_finite() || !(0.0..=2.0).contains(&llm.temperature) {
			return Err(Error::Validation {
				message: format!("providers.{label}.temperature must be in the range 0.0-2.0."),
			});
		}
		if llm.max_tokens == 0 {
			return Err(Error::Validation {
				message: format!("providers.{label}.max_tokens must be greater than zero."),
			});
		}
		if llm.timeout_ms == 0 {
			return Err(Error::Validation {
				message: format!("providers.{label}.timeout_ms must be greater than zero."),
			});
		}
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("llm_extractor", &cfg.providers.llm_extractor.api_key),
		("llm_generator", &cfg.providers.llm_generator.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if cfg.retrieval.top_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.top_k must be greater than zero.".to_string(),
		});
	}

	let conversation = &cfg.conversation;

	for (label, value) in [
		("conversation.max_turns", conversation.max_turns),
		("conversation.extractor_window", conversation.extractor_window),
		("conversation.generator_window", conversation.generator_window),
		("conversation.stream_buffer", conversation.stream_buffer),
	] {
		if value == 0 {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let storage = &mut cfg.storage;

	if storage.index_file.trim().is_empty() {
		storage.index_file = DEFAULT_INDEX_FILE.to_string();
	}
	if storage.metadata_file.trim().is_empty() {
		storage.metadata_file = DEFAULT_METADATA_FILE.to_string();
	}
	if storage.descriptor_file.trim().is_empty() {
		storage.descriptor_file = DEFAULT_DESCRIPTOR_FILE.to_string();
	}

	cfg.providers.embedding.model = cfg.providers.embedding.model.trim().to_string();
}
