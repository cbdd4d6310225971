pub mod extractor;
pub mod generator;
pub mod pipeline;
pub mod prompt;
pub mod readiness;
pub mod retriever;
pub mod session;

mod error;

pub use error::{Error, Result};
pub use generator::Fragments;
pub use pipeline::{ChatReply, ChatStream, ExchangeOutcome, Stage};
pub use readiness::{Readiness, ServiceSlot};
pub use retriever::{Retriever, SearchOptions};
pub use session::{MemorySessionStore, SessionLocks, SessionStore};

use std::{future::Future, pin::Pin, sync::Arc};

use futures_util::{Stream, StreamExt};
use serde_json::Value;
use time::OffsetDateTime;

use cafe_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use cafe_providers::{chat, embedding, stream};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Model output fragments in arrival order. An `Err` item ends the stream.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait ExtractorProvider
where
	Self: Send + Sync,
{
	/// Returns the model's raw text; parsing happens in the caller.
	fn extract<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<String>>;
}

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn stream<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<FragmentStream>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub extractor: Arc<dyn ExtractorProvider>,
	pub generator: Arc<dyn GenerationProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		extractor: Arc<dyn ExtractorProvider>,
		generator: Arc<dyn GenerationProvider>,
	) -> Self {
		Self { embedding, extractor, generator }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), extractor: provider.clone(), generator: provider }
	}
}

/// Everything one process needs to answer menu questions.
pub struct CafeService {
	pub cfg: Config,
	pub retriever: Retriever,
	pub providers: Providers,
	pub sessions: Arc<dyn SessionStore>,
	pub locks: SessionLocks,
	pub loaded_at: OffsetDateTime,
}
impl CafeService {
	/// Loads the menu index with the HTTP providers and an in-memory session store.
	pub fn load(cfg: Config) -> Result<Self> {
		Self::load_with(cfg, Providers::default(), Arc::new(MemorySessionStore::default()))
	}

	pub fn load_with(
		cfg: Config,
		providers: Providers,
		sessions: Arc<dyn SessionStore>,
	) -> Result<Self> {
		let retriever = Retriever::load(&cfg)?;

		Ok(Self::with_parts(cfg, retriever, providers, sessions))
	}

	pub fn with_parts(
		cfg: Config,
		retriever: Retriever,
		providers: Providers,
		sessions: Arc<dyn SessionStore>,
	) -> Self {
		Self {
			cfg,
			retriever,
			providers,
			sessions,
			locks: SessionLocks::default(),
			loaded_at: OffsetDateTime::now_utc(),
		}
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}

impl ExtractorProvider for DefaultProviders {
	fn extract<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move { Ok(chat::complete(cfg, messages).await?) })
	}
}

impl GenerationProvider for DefaultProviders {
	fn stream<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, Result<FragmentStream>> {
		Box::pin(async move {
			let fragments = stream::stream_chat(cfg, messages).await?;
			let fragments: FragmentStream =
				Box::pin(fragments.map(|item| item.map_err(Error::from)));

			Ok(fragments)
		})
	}
}
