//! Flat inner-product vector index.
//!
//! Layout, little-endian: magic `CAFV`, version `u16`, dimension `u32`, count `u32`, then
//! `count * dimension` `f32` components. Row `i` stores the embedding for vector id `i`.

use std::{
	fs,
	io::{BufReader, BufWriter, Read, Write},
	path::Path,
};

use crate::{Error, Result};

pub const MAGIC: [u8; 4] = *b"CAFV";
pub const VERSION: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
	pub vector_id: u64,
	pub score: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
	dimension: u32,
	vectors: Vec<f32>,
}
impl FlatIndex {
	pub fn new(dimension: u32) -> Result<Self> {
		if dimension == 0 {
			return Err(Error::Format("dimension must be greater than zero".to_string()));
		}

		Ok(Self { dimension, vectors: Vec::new() })
	}

	pub fn from_rows(dimension: u32, rows: &[Vec<f32>]) -> Result<Self> {
		let mut index = Self::new(dimension)?;

		for row in rows {
			index.push(row)?;
		}

		Ok(index)
	}

	pub fn dimension(&self) -> u32 {
		self.dimension
	}

	pub fn len(&self) -> usize {
		self.vectors.len() / self.dimension as usize
	}

	pub fn is_empty(&self) -> bool {
		self.vectors.is_empty()
	}

	/// Appends a row; its vector id is the previous length.
	pub fn push(&mut self, row: &[f32]) -> Result<u64> {
		if row.len() != self.dimension as usize {
			return Err(Error::Format(format!(
				"row has {} components, expected {}",
				row.len(),
				self.dimension
			)));
		}

		let vector_id = self.len() as u64;

		self.vectors.extend_from_slice(row);

		Ok(vector_id)
	}

	/// Scores every row against `query` and returns the best `k`, highest score first.
	///
	/// Equal scores order by ascending vector id.
	pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>> {
		let dim = self.dimension as usize;

		if query.len() != dim {
			return Err(Error::QueryDimension { expected: dim, actual: query.len() });
		}
		if k == 0 {
			return Ok(Vec::new());
		}

		let mut hits: Vec<Hit> = self
			.vectors
			.chunks_exact(dim)
			.enumerate()
			.map(|(idx, row)| Hit { vector_id: idx as u64, score: dot(row, query) })
			.collect();

		hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.vector_id.cmp(&b.vector_id)));
		hits.truncate(k);

		Ok(hits)
	}

	pub fn open(path: &Path) -> Result<Self> {
		let file = fs::File::open(path)
			.map_err(|source| Error::Io { path: path.to_path_buf(), source })?;

		Self::read_from(BufReader::new(file))
	}

	pub fn save(&self, path: &Path) -> Result<()> {
		let io_err = |source| Error::Io { path: path.to_path_buf(), source };
		let file = fs::File::create(path).map_err(io_err)?;
		let mut writer = BufWriter::new(file);

		self.write_to(&mut writer).map_err(io_err)?;

		writer.flush().map_err(io_err)
	}

	pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
		let magic: [u8; 4] = read_array(&mut reader, "magic")?;

		if magic != MAGIC {
			return Err(Error::Format(format!("unexpected magic {magic:?}")));
		}

		let version = u16::from_le_bytes(read_array(&mut reader, "version")?);

		if version != VERSION {
			return Err(Error::Format(format!("unsupported version {version}")));
		}

		let dimension = u32::from_le_bytes(read_array(&mut reader, "dimension")?);
		let count = u32::from_le_bytes(read_array(&mut reader, "count")?);
		let mut index = Self::new(dimension)?;
		let total = (count as usize)
			.checked_mul(dimension as usize)
			.ok_or_else(|| Error::Format("vector payload size overflows".to_string()))?;
		let mut payload = Vec::new();

		reader
			.read_to_end(&mut payload)
			.map_err(|err| Error::Format(format!("cannot read vectors: {err}")))?;

		if payload.len() != total * 4 {
			return Err(Error::Format(format!(
				"header declares {count} vectors of dimension {dimension} but payload holds {} bytes",
				payload.len()
			)));
		}

		index.vectors = payload
			.chunks_exact(4)
			.map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
			.collect();

		Ok(index)
	}

	pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
		writer.write_all(&MAGIC)?;
		writer.write_all(&VERSION.to_le_bytes())?;
		writer.write_all(&self.dimension.to_le_bytes())?;
		writer.write_all(&(self.len() as u32).to_le_bytes())?;

		for component in &self.vectors {
			writer.write_all(&component.to_le_bytes())?;
		}

		Ok(())
	}
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
	a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn read_array<const N: usize, R: Read>(reader: &mut R, field: &str) -> Result<[u8; N]> {
	let mut buf = [0_u8; N];

	reader
		.read_exact(&mut buf)
		.map_err(|err| Error::Format(format!("cannot read {field}: {err}")))?;

	Ok(buf)
}
