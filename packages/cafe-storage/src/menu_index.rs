use std::{
	collections::HashSet,
	path::{Path, PathBuf},
};

use cafe_config::Storage;
use cafe_domain::menu::{MenuItem, SearchResult};

use crate::{
	Error, Result,
	descriptor::{self, IndexDescriptor},
	flat::FlatIndex,
	ledger,
};

/// Locations of the three artifacts produced by the offline index build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
	pub index: PathBuf,
	pub metadata: PathBuf,
	pub descriptor: PathBuf,
}
impl ArtifactPaths {
	pub fn from_config(storage: &Storage) -> Self {
		Self {
			index: storage.index_path(),
			metadata: storage.metadata_path(),
			descriptor: storage.descriptor_path(),
		}
	}

	pub fn in_dir(dir: &Path) -> Self {
		Self {
			index: dir.join(cafe_config::DEFAULT_INDEX_FILE),
			metadata: dir.join(cafe_config::DEFAULT_METADATA_FILE),
			descriptor: dir.join(cafe_config::DEFAULT_DESCRIPTOR_FILE),
		}
	}
}

/// Read-only menu index: vectors, item records by vector id, and the build descriptor.
#[derive(Debug, Clone)]
pub struct MenuIndex {
	descriptor: IndexDescriptor,
	vectors: FlatIndex,
	items: Vec<MenuItem>,
}
impl MenuIndex {
	/// Loads all artifacts and checks them against each other. Any failure is fatal.
	pub fn open(paths: &ArtifactPaths) -> Result<Self> {
		require(&paths.index, "vector index")?;
		require(&paths.metadata, "metadata ledger")?;
		require(&paths.descriptor, "config descriptor")?;

		let descriptor = descriptor::load(&paths.descriptor)?;
		let vectors = FlatIndex::open(&paths.index)?;
		let records = ledger::load(&paths.metadata)?;
		let index = Self::assemble(descriptor, vectors, records)?;

		tracing::info!(
			menu_version = %index.descriptor.menu_version,
			items = index.len(),
			dimension = index.dimension(),
			embedding_model = %index.descriptor.embedding_model,
			"Menu index loaded."
		);

		Ok(index)
	}

	/// Checks cross-artifact invariants and orders records by vector id.
	pub fn assemble(
		descriptor: IndexDescriptor,
		vectors: FlatIndex,
		records: Vec<MenuItem>,
	) -> Result<Self> {
		if descriptor.dimension != vectors.dimension() {
			return Err(Error::DimensionMismatch {
				descriptor: descriptor.dimension,
				index: vectors.dimension(),
			});
		}

		let count = vectors.len();

		if records.len() != count {
			return Err(Error::CountMismatch { ledger: records.len(), index: count });
		}
		if descriptor.num_items != count as u64 {
			tracing::warn!(
				declared = descriptor.num_items,
				actual = count,
				"Descriptor item count differs from the index."
			);
		}

		let mut seen = HashSet::with_capacity(count);

		for record in &records {
			if record.vector_id >= count as u64 {
				return Err(Error::UnknownVectorId { vector_id: record.vector_id, count });
			}
			if !seen.insert(record.vector_id) {
				return Err(Error::DuplicateVectorId(record.vector_id));
			}
		}

		let mut items = records;

		items.sort_by_key(|item| item.vector_id);

		Ok(Self { descriptor, vectors, items })
	}

	pub fn descriptor(&self) -> &IndexDescriptor {
		&self.descriptor
	}

	pub fn dimension(&self) -> u32 {
		self.vectors.dimension()
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn item(&self, vector_id: u64) -> Option<&MenuItem> {
		self.items.get(vector_id as usize)
	}

	/// Nearest neighbours of a normalized query, highest score first.
	pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
		let hits = self.vectors.search(query, top_k)?;
		let mut results = Vec::with_capacity(hits.len());

		for hit in hits {
			let item = self
				.item(hit.vector_id)
				.ok_or(Error::UnknownVectorId { vector_id: hit.vector_id, count: self.len() })?;

			results.push(SearchResult { item: item.clone(), score: hit.score });
		}

		Ok(results)
	}
}

fn require(path: &Path, kind: &'static str) -> Result<()> {
	if path.is_file() { Ok(()) } else { Err(Error::MissingArtifact { kind, path: path.to_path_buf() }) }
}
