use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

pub const DEFAULT_INDEX_FILE: &str = "index.bin";
pub const DEFAULT_METADATA_FILE: &str = "metadata.jsonl";
pub const DEFAULT_DESCRIPTOR_FILE: &str = "config.json";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub conversation: Conversation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub log_level: String,
}

/// Location of the read-only artifacts produced by the offline index build.
#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub index_dir: PathBuf,
	#[serde(default = "default_index_file")]
	pub index_file: String,
	#[serde(default = "default_metadata_file")]
	pub metadata_file: String,
	#[serde(default = "default_descriptor_file")]
	pub descriptor_file: String,
}
impl Storage {
	pub fn index_path(&self) -> PathBuf {
		self.index_dir.join(&self.index_file)
	}

	pub fn metadata_path(&self) -> PathBuf {
		self.index_dir.join(&self.metadata_file)
	}

	pub fn descriptor_path(&self) -> PathBuf {
		self.index_dir.join(&self.descriptor_file)
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm_extractor: LlmProviderConfig,
	pub llm_generator: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	/// Must name the model the index artifacts were built with.
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub max_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub top_k: u32,
	pub require_in_stock: bool,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self { top_k: 50, require_in_stock: true }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Conversation {
	/// Raw turn entries kept per session after each completed exchange.
	pub max_turns: usize,
	/// Trailing turns shown to the constraint extractor.
	pub extractor_window: usize,
	/// Trailing turns shown to the response generator.
	pub generator_window: usize,
	/// Run exchanges on the same session one at a time.
	pub serialize_sessions: bool,
	/// Fragments buffered between the pipeline task and its consumer.
	pub stream_buffer: usize,
}
impl Default for Conversation {
	fn default() -> Self {
		Self {
			max_turns: 20,
			extractor_window: 4,
			generator_window: 6,
			serialize_sessions: true,
			stream_buffer: 32,
		}
	}
}

fn default_index_file() -> String {
	DEFAULT_INDEX_FILE.to_string()
}

fn default_metadata_file() -> String {
	DEFAULT_METADATA_FILE.to_string()
}

fn default_descriptor_file() -> String {
	DEFAULT_DESCRIPTOR_FILE.to_string()
}
