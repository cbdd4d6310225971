use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const FLAT_INNER_PRODUCT: &str = "flat_ip";

/// Build-time facts about the index, written next to it by the offline build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
	pub embedding_model: String,
	pub dimension: u32,
	#[serde(default = "default_index_type")]
	pub index_type: String,
	#[serde(default)]
	pub menu_version: String,
	#[serde(default)]
	pub created_at: String,
	#[serde(default)]
	pub num_items: u64,
}

pub fn load(path: &Path) -> Result<IndexDescriptor> {
	let raw = fs::read_to_string(path)
		.map_err(|source| Error::Io { path: path.to_path_buf(), source })?;

	serde_json::from_str(&raw)
		.map_err(|source| Error::Json { path: path.to_path_buf(), line: 1, source })
}

pub fn write(path: &Path, descriptor: &IndexDescriptor) -> Result<()> {
	let raw = serde_json::to_string_pretty(descriptor)
		.map_err(|source| Error::Json { path: path.to_path_buf(), line: 0, source })?;

	fs::write(path, raw).map_err(|source| Error::Io { path: path.to_path_buf(), source })
}

fn default_index_type() -> String {
	FLAT_INNER_PRODUCT.to_string()
}
