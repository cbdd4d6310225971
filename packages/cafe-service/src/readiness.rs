use std::sync::{Arc, Mutex};

use time::OffsetDateTime;
use tokio::{sync::OnceCell, task::JoinHandle};

use cafe_config::Config;

use crate::{CafeService, Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readiness {
	pub ready: bool,
	pub menu_version: Option<String>,
	pub num_items: Option<usize>,
	pub loaded_at: Option<OffsetDateTime>,
	/// Load error, when the last attempt failed.
	pub error: Option<String>,
}

/// Holds the service once its menu index has loaded, so transports can answer readiness probes
/// while loading is still in progress.
#[derive(Clone, Default)]
pub struct ServiceSlot {
	cell: Arc<OnceCell<Arc<CafeService>>>,
	failure: Arc<Mutex<Option<String>>>,
}
impl ServiceSlot {
	pub fn new() -> Self {
		Self::default()
	}

	/// Loads the service on the blocking pool and fills the slot on success.
	pub fn spawn_load(&self, cfg: Config) -> JoinHandle<Result<()>> {
		let slot = self.clone();

		tokio::spawn(async move {
			let loaded = tokio::task::spawn_blocking(move || CafeService::load(cfg)).await?;

			match loaded {
				Ok(service) => {
					slot.set(Arc::new(service))?;

					Ok(())
				},
				Err(err) => {
					tracing::error!(error = %err, "Menu index failed to load.");

					*slot.failure.lock().unwrap_or_else(|err| err.into_inner()) =
						Some(err.to_string());

					Err(err)
				},
			}
		})
	}

	pub fn set(&self, service: Arc<CafeService>) -> Result<()> {
		self.cell.set(service).map_err(|_| Error::Internal {
			message: "Service slot is already filled.".to_string(),
		})
	}

	pub fn get(&self) -> Option<Arc<CafeService>> {
		self.cell.get().cloned()
	}

	pub fn require(&self) -> Result<Arc<CafeService>> {
		self.get().ok_or(Error::NotReady)
	}

	pub fn status(&self) -> Readiness {
		let error = self.failure.lock().unwrap_or_else(|err| err.into_inner()).clone();

		match self.cell.get() {
			Some(service) => Readiness {
				ready: true,
				menu_version: Some(service.retriever.descriptor().menu_version.clone()),
				num_items: Some(service.retriever.len()),
				loaded_at: Some(service.loaded_at),
				error,
			},
			None => Readiness { ready: false, menu_version: None, num_items: None, loaded_at: None, error },
		}
	}
}
