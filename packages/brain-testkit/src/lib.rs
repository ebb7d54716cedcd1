//! In-memory collaborators for exercising the service without a network.

use std::{
	collections::{HashMap, VecDeque},
	sync::{
		Mutex, MutexGuard,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use serde_json::Map;
use time::{OffsetDateTime, macros::datetime};

use brain_config::{Api, ApiPaths, Config};
use brain_domain::{
	Content, ContentId, ContentKind, ContentPatch, NewContent, ProcessingStatus, ProjectedContent,
	Tags,
};
use brain_service::{BoxFuture, ContentApi, Notifier, NotifyKind, SearchApi, normalize_query};

/// Timestamp the fake server stamps on everything it writes.
pub const SERVER_TIME: OffsetDateTime = datetime!(2026-02-01 12:00 UTC);

/// Configuration pointing at an unreachable base URL, for tests that inject collaborators.
pub fn test_config() -> Config {
	Config {
		service: Default::default(),
		api: Api {
			api_base: "http://127.0.0.1:9".to_string(),
			api_key: Some("test-key".to_string()),
			timeout_ms: 1_000,
			default_headers: Map::new(),
			paths: ApiPaths::default(),
		},
		search: Default::default(),
		poller: Default::default(),
	}
}

pub fn content(id: &str, title: &str, status: ProcessingStatus) -> Content {
	Content {
		id: ContentId::new(id),
		kind: ContentKind::Note,
		title: title.to_string(),
		body: format!("Body of {title}."),
		summary: None,
		tags: Tags::default(),
		link: None,
		status,
		created_at: datetime!(2026-01-01 00:00 UTC),
		updated_at: datetime!(2026-01-01 00:00 UTC),
		score: None,
	}
}

pub fn scored(id: &str, score: f64) -> Content {
	Content { score: Some(score), ..content(id, id, ProcessingStatus::Completed) }
}

pub fn note(title: &str) -> NewContent {
	NewContent {
		kind: ContentKind::Note,
		title: title.to_string(),
		body: String::new(),
		tags: Tags::default(),
		link: None,
	}
}

/// Scripted failure modes. Each maps onto the provider error the real client would return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
	Overloaded,
	Unavailable,
	Network,
}
impl Failure {
	pub fn to_error(self) -> brain_providers::Error {
		match self {
			Self::Overloaded => brain_providers::Error::Overloaded {
				status: 503,
				message: "The model is overloaded.".to_string(),
			},
			Self::Unavailable => brain_providers::Error::Status {
				status: 500,
				message: "Internal error.".to_string(),
			},
			Self::Network => brain_providers::Error::Status {
				status: 502,
				message: "Bad gateway.".to_string(),
			},
		}
	}
}

#[derive(Clone)]
struct ScriptedSearch {
	delay: Duration,
	outcome: Result<Vec<Content>, Failure>,
}

#[derive(Default)]
struct FakeState {
	searches: HashMap<String, ScriptedSearch>,
	search_delay: Duration,
	summary_delay: Duration,
	summary_failure: Option<Failure>,
	mutation_delay: Duration,
	create_failure: Option<Failure>,
	update_failure: Option<Failure>,
	delete_failure: Option<Failure>,
	list_queue: VecDeque<Result<Vec<Content>, Failure>>,
	server: Vec<Content>,
	next_server_id: u64,
	queries: Vec<String>,
	summarized: Vec<Vec<ProjectedContent>>,
}

/// Fake remote API. Search answers are scripted per normalized query, and content calls
/// operate on an in-memory server-side collection.
#[derive(Default)]
pub struct FakeApi {
	state: Mutex<FakeState>,
	search_calls: AtomicUsize,
	summarize_calls: AtomicUsize,
	list_calls: AtomicUsize,
	create_calls: AtomicUsize,
	update_calls: AtomicUsize,
	delete_calls: AtomicUsize,
}
impl FakeApi {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_search(self, query: &str, results: Vec<Content>) -> Self {
		let delay = self.lock().search_delay;

		self.script_search(query, delay, Ok(results));

		self
	}

	pub fn with_delayed_search(self, query: &str, delay: Duration, results: Vec<Content>) -> Self {
		self.script_search(query, delay, Ok(results));

		self
	}

	pub fn with_failing_search(self, query: &str, failure: Failure) -> Self {
		let delay = self.lock().search_delay;

		self.script_search(query, delay, Err(failure));

		self
	}

	/// Delay for queries scripted after this call and for unscripted ones.
	pub fn with_search_delay(self, delay: Duration) -> Self {
		self.lock().search_delay = delay;

		self
	}

	pub fn with_summary_delay(self, delay: Duration) -> Self {
		self.lock().summary_delay = delay;

		self
	}

	pub fn with_summary_failure(self, failure: Failure) -> Self {
		self.lock().summary_failure = Some(failure);

		self
	}

	pub fn with_mutation_delay(self, delay: Duration) -> Self {
		self.lock().mutation_delay = delay;

		self
	}

	pub fn with_server_content(self, items: Vec<Content>) -> Self {
		self.lock().server = items;

		self
	}

	pub fn fail_creates(&self, failure: Option<Failure>) {
		self.lock().create_failure = failure;
	}

	pub fn fail_updates(&self, failure: Option<Failure>) {
		self.lock().update_failure = failure;
	}

	pub fn fail_deletes(&self, failure: Option<Failure>) {
		self.lock().delete_failure = failure;
	}

	/// Queues a one-shot listing answer. Once the queue is empty, listings mirror the server.
	pub fn push_list(&self, response: Result<Vec<Content>, Failure>) {
		self.lock().list_queue.push_back(response);
	}

	/// Overwrites the server-side copy of one item, as background processing would.
	pub fn set_server_status(&self, id: &str, status: ProcessingStatus) {
		let mut state = self.lock();

		if let Some(item) = state.server.iter_mut().find(|item| item.id.as_str() == id) {
			item.status = status;
			item.updated_at = SERVER_TIME;
		}
	}

	pub fn server_content(&self) -> Vec<Content> {
		self.lock().server.clone()
	}

	pub fn queries(&self) -> Vec<String> {
		self.lock().queries.clone()
	}

	pub fn summarized_contexts(&self) -> Vec<Vec<ProjectedContent>> {
		self.lock().summarized.clone()
	}

	pub fn search_calls(&self) -> usize {
		self.search_calls.load(Ordering::SeqCst)
	}

	pub fn summarize_calls(&self) -> usize {
		self.summarize_calls.load(Ordering::SeqCst)
	}

	pub fn list_calls(&self) -> usize {
		self.list_calls.load(Ordering::SeqCst)
	}

	pub fn create_calls(&self) -> usize {
		self.create_calls.load(Ordering::SeqCst)
	}

	pub fn update_calls(&self) -> usize {
		self.update_calls.load(Ordering::SeqCst)
	}

	pub fn delete_calls(&self) -> usize {
		self.delete_calls.load(Ordering::SeqCst)
	}

	fn lock(&self) -> MutexGuard<'_, FakeState> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn script_search(&self, query: &str, delay: Duration, outcome: Result<Vec<Content>, Failure>) {
		self.lock().searches.insert(normalize_query(query), ScriptedSearch { delay, outcome });
	}
}

impl SearchApi for FakeApi {
	fn search<'a>(
		&'a self,
		query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, brain_providers::Result<Vec<Content>>> {
		Box::pin(async move {
			self.search_calls.fetch_add(1, Ordering::SeqCst);

			let scripted = {
				let mut state = self.lock();

				state.queries.push(query.to_string());
				state.searches.get(&normalize_query(query)).cloned().unwrap_or(ScriptedSearch {
					delay: state.search_delay,
					outcome: Ok(Vec::new()),
				})
			};

			tokio::time::sleep(scripted.delay).await;

			match scripted.outcome {
				Ok(mut results) => {
					results.truncate(limit as usize);

					Ok(results)
				},
				Err(failure) => Err(failure.to_error()),
			}
		})
	}

	fn summarize<'a>(
		&'a self,
		query: &'a str,
		context: &'a [ProjectedContent],
	) -> BoxFuture<'a, brain_providers::Result<String>> {
		Box::pin(async move {
			self.summarize_calls.fetch_add(1, Ordering::SeqCst);

			let (delay, failure) = {
				let mut state = self.lock();

				state.summarized.push(context.to_vec());

				(state.summary_delay, state.summary_failure)
			};

			tokio::time::sleep(delay).await;

			match failure {
				Some(failure) => Err(failure.to_error()),
				None => Ok(format!("Summary of {} items for {}.", context.len(), query.trim())),
			}
		})
	}
}

impl ContentApi for FakeApi {
	fn list_content(&self) -> BoxFuture<'_, brain_providers::Result<Vec<Content>>> {
		Box::pin(async move {
			self.list_calls.fetch_add(1, Ordering::SeqCst);

			let mut state = self.lock();

			match state.list_queue.pop_front() {
				Some(Ok(items)) => Ok(items),
				Some(Err(failure)) => Err(failure.to_error()),
				None => Ok(state.server.clone()),
			}
		})
	}

	fn create_content<'a>(
		&'a self,
		new: &'a NewContent,
	) -> BoxFuture<'a, brain_providers::Result<Content>> {
		Box::pin(async move {
			self.create_calls.fetch_add(1, Ordering::SeqCst);

			let delay = self.lock().mutation_delay;

			tokio::time::sleep(delay).await;

			let mut state = self.lock();

			if let Some(failure) = state.create_failure {
				return Err(failure.to_error());
			}

			state.next_server_id += 1;

			let id = ContentId::new(format!("srv-{}", state.next_server_id));
			let created = Content::draft(id, new, SERVER_TIME);

			state.server.insert(0, created.clone());

			Ok(created)
		})
	}

	fn update_content<'a>(
		&'a self,
		id: &'a ContentId,
		patch: &'a ContentPatch,
	) -> BoxFuture<'a, brain_providers::Result<Content>> {
		Box::pin(async move {
			self.update_calls.fetch_add(1, Ordering::SeqCst);

			let delay = self.lock().mutation_delay;

			tokio::time::sleep(delay).await;

			let mut state = self.lock();

			if let Some(failure) = state.update_failure {
				return Err(failure.to_error());
			}

			let Some(item) = state.server.iter_mut().find(|item| &item.id == id) else {
				return Err(not_found());
			};

			*item = item.apply(patch, SERVER_TIME);

			Ok(item.clone())
		})
	}

	fn delete_content<'a>(&'a self, id: &'a ContentId) -> BoxFuture<'a, brain_providers::Result<()>> {
		Box::pin(async move {
			self.delete_calls.fetch_add(1, Ordering::SeqCst);

			let delay = self.lock().mutation_delay;

			tokio::time::sleep(delay).await;

			let mut state = self.lock();

			if let Some(failure) = state.delete_failure {
				return Err(failure.to_error());
			}

			let before = state.server.len();

			state.server.retain(|item| &item.id != id);

			if state.server.len() == before {
				return Err(not_found());
			}

			Ok(())
		})
	}
}

fn not_found() -> brain_providers::Error {
	brain_providers::Error::Status { status: 404, message: "Content not found.".to_string() }
}

/// Notifier that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingNotifier {
	events: Mutex<Vec<(NotifyKind, String)>>,
}
impl RecordingNotifier {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn events(&self) -> Vec<(NotifyKind, String)> {
		self.events.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn messages(&self, kind: NotifyKind) -> Vec<String> {
		self.events()
			.into_iter()
			.filter(|(event_kind, _)| *event_kind == kind)
			.map(|(_, message)| message)
			.collect()
	}

	pub fn count(&self, kind: NotifyKind) -> usize {
		self.messages(kind).len()
	}

	pub fn last(&self) -> Option<(NotifyKind, String)> {
		self.events().pop()
	}
}

impl Notifier for RecordingNotifier {
	fn notify(&self, kind: NotifyKind, message: &str) {
		self.events.lock().unwrap_or_else(|err| err.into_inner()).push((kind, message.to_string()));
	}
}
