use std::{fs, path::Path};

use cafe_domain::menu::MenuItem;

use crate::{
	Error, Result,
	descriptor::{self, IndexDescriptor},
	flat::FlatIndex,
	ledger,
	menu_index::ArtifactPaths,
};

/// Everything one index build emits, ready to be written to a storage directory.
#[derive(Debug, Clone)]
pub struct MenuArtifacts {
	pub descriptor: IndexDescriptor,
	pub vectors: FlatIndex,
	pub items: Vec<MenuItem>,
}
impl MenuArtifacts {
	/// Writes the three artifacts under their default names and returns their paths.
	///
	/// No cross-artifact checks run here, so fixtures can produce deliberately broken sets.
	pub fn write_to_dir(&self, dir: &Path) -> Result<ArtifactPaths> {
		fs::create_dir_all(dir).map_err(|source| Error::Io { path: dir.to_path_buf(), source })?;

		let paths = ArtifactPaths::in_dir(dir);

		self.vectors.save(&paths.index)?;
		ledger::write(&paths.metadata, &self.items)?;
		descriptor::write(&paths.descriptor, &self.descriptor)?;

		Ok(paths)
	}
}
