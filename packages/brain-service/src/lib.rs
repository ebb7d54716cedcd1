pub mod cache;
pub mod mutation;
pub mod notify;
pub mod poller;
pub mod search;
pub mod store;

mod error;

pub use cache::{ResultCache, SearchCacheEntry, SearchOutcome, normalize_query};
pub use error::{Error, Result};
pub use mutation::{MutationEngine, PendingOperation, Speculative};
pub use notify::{Notifier, NotifyKind, TracingNotifier};
pub use poller::Poller;
pub use search::{
	SearchCoordinator, SearchFailure, SearchPhase, SearchSettings, SearchStatus, SearchView,
};
pub use store::ContentStore;

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use brain_config::Config;
use brain_domain::{Content, ContentId, ContentPatch, NewContent, ProjectedContent};
use brain_providers::ContentClient;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Remote retrieval and summarization.
pub trait SearchApi
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, brain_providers::Result<Vec<Content>>>;

	fn summarize<'a>(
		&'a self,
		query: &'a str,
		context: &'a [ProjectedContent],
	) -> BoxFuture<'a, brain_providers::Result<String>>;
}

/// Remote content listing and CRUD.
pub trait ContentApi
where
	Self: Send + Sync,
{
	fn list_content(&self) -> BoxFuture<'_, brain_providers::Result<Vec<Content>>>;

	fn create_content<'a>(
		&'a self,
		new: &'a NewContent,
	) -> BoxFuture<'a, brain_providers::Result<Content>>;

	fn update_content<'a>(
		&'a self,
		id: &'a ContentId,
		patch: &'a ContentPatch,
	) -> BoxFuture<'a, brain_providers::Result<Content>>;

	fn delete_content<'a>(&'a self, id: &'a ContentId) -> BoxFuture<'a, brain_providers::Result<()>>;
}

impl SearchApi for ContentClient {
	fn search<'a>(
		&'a self,
		query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, brain_providers::Result<Vec<Content>>> {
		Box::pin(ContentClient::search(self, query, limit))
	}

	fn summarize<'a>(
		&'a self,
		query: &'a str,
		context: &'a [ProjectedContent],
	) -> BoxFuture<'a, brain_providers::Result<String>> {
		Box::pin(ContentClient::summarize(self, query, context))
	}
}

impl ContentApi for ContentClient {
	fn list_content(&self) -> BoxFuture<'_, brain_providers::Result<Vec<Content>>> {
		Box::pin(ContentClient::list_content(self))
	}

	fn create_content<'a>(
		&'a self,
		new: &'a NewContent,
	) -> BoxFuture<'a, brain_providers::Result<Content>> {
		Box::pin(ContentClient::create_content(self, new))
	}

	fn update_content<'a>(
		&'a self,
		id: &'a ContentId,
		patch: &'a ContentPatch,
	) -> BoxFuture<'a, brain_providers::Result<Content>> {
		Box::pin(ContentClient::update_content(self, id, patch))
	}

	fn delete_content<'a>(&'a self, id: &'a ContentId) -> BoxFuture<'a, brain_providers::Result<()>> {
		Box::pin(ContentClient::delete_content(self, id))
	}
}

/// Collaborators the service is assembled from.
#[derive(Clone)]
pub struct Collaborators {
	pub search: Arc<dyn SearchApi>,
	pub content: Arc<dyn ContentApi>,
	pub notifier: Arc<dyn Notifier>,
}
impl Collaborators {
	pub fn new(
		search: Arc<dyn SearchApi>,
		content: Arc<dyn ContentApi>,
		notifier: Arc<dyn Notifier>,
	) -> Self {
		Self { search, content, notifier }
	}
}

/// Owns the store, cache, coordinator, mutation engine, and optional poller for one session.
pub struct BrainService {
	pub store: ContentStore,
	pub cache: Arc<ResultCache>,
	pub search: SearchCoordinator,
	pub mutations: MutationEngine,
	content_api: Arc<dyn ContentApi>,
	poll_interval: Duration,
	poller: Option<Poller>,
}
impl BrainService {
	pub fn new(cfg: &Config, collaborators: Collaborators) -> Self {
		let store = ContentStore::new();
		let cache = Arc::new(ResultCache::from_config(&cfg.search.cache));
		let search = SearchCoordinator::new(
			collaborators.search,
			cache.clone(),
			collaborators.notifier.clone(),
			SearchSettings::from_config(&cfg.search),
		);
		let invalidate = cfg.search.cache.invalidate_on_mutation.then(|| cache.clone());
		let mutations = MutationEngine::new(
			store.clone(),
			collaborators.content.clone(),
			collaborators.notifier,
			invalidate,
		);

		Self {
			store,
			cache,
			search,
			mutations,
			content_api: collaborators.content,
			poll_interval: Duration::from_millis(cfg.poller.interval_ms),
			poller: None,
		}
	}

	/// Builds the service against the configured HTTP API.
	pub fn connect(cfg: &Config) -> Result<Self> {
		let client = Arc::new(ContentClient::new(&cfg.api)?);
		let collaborators =
			Collaborators::new(client.clone(), client, Arc::new(TracingNotifier));

		Ok(Self::new(cfg, collaborators))
	}

	/// Initial load of the content store.
	pub async fn load(&self) -> Result<usize> {
		self.store.refresh(self.content_api.as_ref()).await
	}

	/// Starts background refreshes while content is still processing. Idempotent.
	pub fn start_poller(&mut self) {
		if self.poller.is_some() {
			return;
		}

		self.poller =
			Some(Poller::spawn(self.store.clone(), self.content_api.clone(), self.poll_interval));
	}

	pub fn is_polling(&self) -> bool {
		self.poller.is_some()
	}

	pub async fn shutdown(&mut self) {
		self.search.cancel();

		if let Some(poller) = self.poller.take() {
			poller.shutdown().await;
		}
	}
}
