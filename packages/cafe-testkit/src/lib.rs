mod error;

pub use error::{Error, Result};

use std::{
	env, fs,
	path::{Path, PathBuf},
};

use serde_json::Map;
use uuid::Uuid;

use cafe_config::{
	Config, Conversation, EmbeddingProviderConfig, LlmProviderConfig, Providers, Retrieval,
	Service, Storage,
};
use cafe_domain::menu::MenuItem;
use cafe_storage::{
	descriptor::{FLAT_INNER_PRODUCT, IndexDescriptor},
	flat::FlatIndex,
	menu_index::ArtifactPaths,
	writer::MenuArtifacts,
};

pub const TEST_EMBEDDING_MODEL: &str = "test-embedding";
pub const TEST_MENU_VERSION: &str = "test-menu";

/// Artifact directory under the system temp dir, removed on drop.
pub struct MenuFixture {
	dir: PathBuf,
	paths: ArtifactPaths,
	dimension: u32,
}
impl MenuFixture {
	/// Writes `artifacts` as-is, without cross-artifact checks.
	pub fn write(artifacts: &MenuArtifacts) -> Result<Self> {
		let dir = env::temp_dir().join(format!("cafe_test_{}", Uuid::new_v4().simple()));
		let paths = artifacts.write_to_dir(&dir)?;

		Ok(Self { dir, paths, dimension: artifacts.descriptor.dimension })
	}

	/// Builds a consistent artifact set from `(item, embedding)` rows. Vector ids follow row order.
	pub fn from_rows(dimension: u32, rows: Vec<(MenuItem, Vec<f32>)>) -> Result<Self> {
		let mut vectors = FlatIndex::new(dimension)?;
		let mut items = Vec::with_capacity(rows.len());

		for (mut item, embedding) in rows {
			item.vector_id = vectors.push(&embedding)?;

			items.push(item);
		}

		let descriptor = descriptor(dimension, items.len() as u64);

		Self::write(&MenuArtifacts { descriptor, vectors, items })
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	pub fn paths(&self) -> &ArtifactPaths {
		&self.paths
	}

	/// A valid config whose storage and embedding settings match this fixture.
	pub fn config(&self) -> Config {
		test_config(&self.dir, self.dimension)
	}
}
impl Drop for MenuFixture {
	fn drop(&mut self) {
		if let Err(err) = fs::remove_dir_all(&self.dir) {
			eprintln!("Test fixture cleanup failed for {:?}: {err}.", self.dir);
		}
	}
}

pub fn descriptor(dimension: u32, num_items: u64) -> IndexDescriptor {
	IndexDescriptor {
		embedding_model: TEST_EMBEDDING_MODEL.to_string(),
		dimension,
		index_type: FLAT_INNER_PRODUCT.to_string(),
		menu_version: TEST_MENU_VERSION.to_string(),
		created_at: "2026-01-01T00:00:00+00:00".to_string(),
		num_items,
	}
}

pub fn menu_item(name: &str, price: Option<i64>, group_id: &str) -> MenuItem {
	MenuItem {
		vector_id: 0,
		item_id: name.to_lowercase().replace(' ', "-"),
		name: name.to_string(),
		price,
		in_stock: true,
		category_id: Some("beverages".to_string()),
		sub_category_id: None,
		group_id: Some(group_id.to_string()),
	}
}

/// Unit vector pointing mostly along `axis`, tilted by `tilt` toward the next axis.
pub fn tilted_vector(dimension: u32, axis: usize, tilt: f32) -> Vec<f32> {
	let dim = dimension as usize;
	let mut vector = vec![0.0; dim];

	vector[axis % dim] = 1.0;
	vector[(axis + 1) % dim] += tilt;

	let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();

	vector.iter().map(|x| x / norm).collect()
}

pub fn test_config(index_dir: &Path, dimension: u32) -> Config {
	Config {
		service: Service { log_level: "debug".to_string() },
		storage: Storage {
			index_dir: index_dir.to_path_buf(),
			index_file: cafe_config::DEFAULT_INDEX_FILE.to_string(),
			metadata_file: cafe_config::DEFAULT_METADATA_FILE.to_string(),
			descriptor_file: cafe_config::DEFAULT_DESCRIPTOR_FILE.to_string(),
		},
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:9".to_string(),
				api_key: "test-key".to_string(),
				path: "/embeddings".to_string(),
				model: TEST_EMBEDDING_MODEL.to_string(),
				dimensions: dimension,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			llm_extractor: llm_provider(0.0, 1_000),
			llm_generator: llm_provider(0.2, 2_048),
		},
		retrieval: Retrieval::default(),
		conversation: Conversation::default(),
	}
}

fn llm_provider(temperature: f32, max_tokens: u32) -> LlmProviderConfig {
	LlmProviderConfig {
		provider_id: "test".to_string(),
		api_base: "http://127.0.0.1:9".to_string(),
		api_key: "test-key".to_string(),
		path: "/chat/completions".to_string(),
		model: "test-llm".to_string(),
		temperature,
		max_tokens,
		timeout_ms: 1_000,
		default_headers: Map::new(),
	}
}
