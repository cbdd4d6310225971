pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Cannot read cafe config at {path:?}.")]
	Read { path: std::path::PathBuf, source: std::io::Error },
	#[error("Cannot parse cafe config at {path:?}: {source}")]
	Parse { path: std::path::PathBuf, source: toml::de::Error },
	#[error("{message}")]
	Validation { message: String },
}
