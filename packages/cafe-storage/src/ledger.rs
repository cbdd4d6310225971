use std::{
	fs,
	io::{BufWriter, Write},
	path::Path,
};

use cafe_domain::menu::MenuItem;

use crate::{Error, Result};

/// Reads one menu record per line. Blank lines are skipped; line numbers in errors are 1-based.
pub fn load(path: &Path) -> Result<Vec<MenuItem>> {
	let raw = fs::read_to_string(path)
		.map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
	let mut items = Vec::new();

	for (idx, line) in raw.lines().enumerate() {
		let line = line.trim();

		if line.is_empty() {
			continue;
		}

		let item = serde_json::from_str(line)
			.map_err(|source| Error::Json { path: path.to_path_buf(), line: idx + 1, source })?;

		items.push(item);
	}

	Ok(items)
}

pub fn write(path: &Path, items: &[MenuItem]) -> Result<()> {
	let io_err = |source| Error::Io { path: path.to_path_buf(), source };
	let file = fs::File::create(path).map_err(io_err)?;
	let mut writer = BufWriter::new(file);

	for (idx, item) in items.iter().enumerate() {
		let line = serde_json::to_string(item)
			.map_err(|source| Error::Json { path: path.to_path_buf(), line: idx + 1, source })?;

		writeln!(writer, "{line}").map_err(io_err)?;
	}

	writer.flush().map_err(io_err)
}
