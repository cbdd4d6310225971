pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Storage integrity error: {message}")]
	StorageIntegrity { message: String },
	#[error("Retrieval error: {message}")]
	Retrieval { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Session store error: {message}")]
	Session { message: String },
	#[error("Menu index is still loading.")]
	NotReady,
	#[error("Internal error: {message}")]
	Internal { message: String },
}
impl From<cafe_storage::Error> for Error {
	fn from(err: cafe_storage::Error) -> Self {
		Self::StorageIntegrity { message: err.to_string() }
	}
}

impl From<cafe_providers::Error> for Error {
	fn from(err: cafe_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<tokio::task::JoinError> for Error {
	fn from(err: tokio::task::JoinError) -> Self {
		Self::Internal { message: err.to_string() }
	}
}
