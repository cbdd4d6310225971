use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use cafe_config::{Config, Error};

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

static NEXT_FILE_ID: AtomicU64 = AtomicU64::new(0);

fn sample_with(section: &[&str], key: &str, value: Value) -> String {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let mut table = root.as_table_mut().expect("Sample config must be a table.");

	for name in section {
		table = table
			.get_mut(*name)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Sample config must include [{name}]."));
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render sample config.")
}

fn sample_without(section: &str) -> String {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");

	root.as_table_mut().expect("Sample config must be a table.").remove(section);

	toml::to_string(&root).expect("Failed to render sample config.")
}

fn validation_message(raw: &str) -> String {
	match cafe_config::parse(raw) {
		Err(Error::Validation { message }) => message,
		Err(other) => panic!("Expected a validation error, got {other:?}."),
		Ok(_) => panic!("Expected a validation error, got a valid config."),
	}
}

fn write_temp_config(raw: &str) -> PathBuf {
	let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
	let id = NEXT_FILE_ID.fetch_add(1, Ordering::SeqCst);
	let path = env::temp_dir().join(format!("cafe_config_{nanos}_{id}.toml"));

	fs::write(&path, raw).expect("Failed to write temp config.");

	path
}

#[test]
fn sample_config_is_valid() {
	let cfg: Config = cafe_config::parse(SAMPLE_CONFIG_TOML).expect("Sample config must be valid.");

	assert_eq!(cfg.providers.embedding.dimensions, 384);
	assert_eq!(cfg.retrieval.top_k, 50);
	assert!(cfg.retrieval.require_in_stock);
	assert_eq!(cfg.conversation.max_turns, 20);
	assert_eq!(cfg.storage.index_path(), PathBuf::from("storage/cafe_index/index.bin"));
	assert_eq!(cfg.storage.metadata_path(), PathBuf::from("storage/cafe_index/metadata.jsonl"));
	assert_eq!(cfg.storage.descriptor_path(), PathBuf::from("storage/cafe_index/config.json"));
}

#[test]
fn retrieval_and_conversation_sections_default_when_absent() {
	let raw = sample_without("retrieval");
	let raw = {
		let mut root: Value = toml::from_str(&raw).expect("Failed to parse config.");

		root.as_table_mut().expect("Config must be a table.").remove("conversation");

		toml::to_string(&root).expect("Failed to render config.")
	};
	let cfg = cafe_config::parse(&raw).expect("Config without optional sections must be valid.");

	assert_eq!(cfg.retrieval.top_k, 50);
	assert!(cfg.retrieval.require_in_stock);
	assert_eq!(cfg.conversation.max_turns, 20);
	assert_eq!(cfg.conversation.extractor_window, 4);
	assert_eq!(cfg.conversation.generator_window, 6);
	assert!(cfg.conversation.serialize_sessions);
}

#[test]
fn blank_artifact_names_normalize_to_defaults() {
	let raw = sample_with(&["storage"], "metadata_file", Value::String("  ".to_string()));
	let cfg = cafe_config::parse(&raw).expect("Config must be valid.");

	assert_eq!(cfg.storage.metadata_file, cafe_config::DEFAULT_METADATA_FILE);
}

#[test]
fn rejects_zero_embedding_dimensions() {
	let raw = sample_with(&["providers", "embedding"], "dimensions", Value::Integer(0));

	assert_eq!(
		validation_message(&raw),
		"providers.embedding.dimensions must be greater than zero."
	);
}

#[test]
fn rejects_empty_api_key() {
	let raw = sample_with(&["providers", "llm_generator"], "api_key", Value::String(" ".to_string()));

	assert_eq!(validation_message(&raw), "Provider llm_generator api_key must be non-empty.");
}

#[test]
fn rejects_out_of_range_temperature() {
	let raw = sample_with(&["providers", "llm_extractor"], "temperature", Value::Float(3.5));

	assert_eq!(
		validation_message(&raw),
		"providers.llm_extractor.temperature must be in the range 0.0-2.0."
	);
}

#[test]
fn rejects_zero_top_k() {
	let raw = sample_with(&["retrieval"], "top_k", Value::Integer(0));

	assert_eq!(validation_message(&raw), "retrieval.top_k must be greater than zero.");
}

#[test]
fn rejects_zero_session_retention() {
	let raw = sample_with(&["conversation"], "max_turns", Value::Integer(0));

	assert_eq!(validation_message(&raw), "conversation.max_turns must be greater than zero.");
}

#[test]
fn load_reports_missing_file() {
	let path = env::temp_dir().join("cafe_config_does_not_exist.toml");
	let err = cafe_config::load(&path).expect_err("Missing config must fail.");

	assert!(matches!(err, Error::Read { .. }));
}

#[test]
fn load_reports_parse_errors_with_path() {
	let path = write_temp_config("[service\nlog_level = 1");
	let err = cafe_config::load(&path).expect_err("Broken config must fail.");

	match err {
		Error::Parse { path: reported, .. } => assert_eq!(reported, path),
		other => panic!("Expected a parse error, got {other:?}."),
	}

	let _ = fs::remove_file(path);
}

#[test]
fn load_reads_valid_file() {
	let path = write_temp_config(SAMPLE_CONFIG_TOML);
	let cfg = cafe_config::load(&path).expect("Sample config must load.");

	assert_eq!(cfg.providers.llm_generator.max_tokens, 2048);

	let _ = fs::remove_file(path);
}
