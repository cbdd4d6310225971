use std::{io, path::PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Missing {kind} artifact at {path:?}.")]
	MissingArtifact { kind: &'static str, path: PathBuf },
	#[error("Cannot access {path:?}.")]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("Invalid JSON in {path:?} at line {line}.")]
	Json {
		path: PathBuf,
		line: usize,
		#[source]
		source: serde_json::Error,
	},
	#[error("Invalid vector index format: {0}.")]
	Format(String),
	#[error("Descriptor dimension {descriptor} does not match index dimension {index}.")]
	DimensionMismatch { descriptor: u32, index: u32 },
	#[error("Metadata ledger holds {ledger} records but the index holds {index} vectors.")]
	CountMismatch { ledger: usize, index: usize },
	#[error("Vector id {0} appears more than once in the metadata ledger.")]
	DuplicateVectorId(u64),
	#[error("Vector id {vector_id} is outside the index range of {count} vectors.")]
	UnknownVectorId { vector_id: u64, count: usize },
	#[error("Query has dimension {actual} but the index expects {expected}.")]
	QueryDimension { expected: usize, actual: usize },
}
