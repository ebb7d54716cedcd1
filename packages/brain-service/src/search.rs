//! Turns query input into at most one live search pipeline.
//!
//! Every pipeline owns a [`CancellationToken`]. Dispatching a new pipeline cancels the previous
//! token, and a pipeline re-checks its token under the coordinator lock before it writes the
//! cache or the view, so a superseded pipeline never becomes visible even if its response
//! arrives last. Display is additionally guarded by an epoch that cache hits and cleared input
//! advance without touching any token.

use std::{
	sync::{Arc, Mutex, MutexGuard},
	time::Duration,
};

use tokio::{sync::watch, time::Instant};
use tokio_util::sync::CancellationToken;

use brain_domain::{Content, ProjectedContent, RelevancePolicy};

use crate::{
	Error, Notifier, NotifyKind, Result, SearchApi,
	cache::{ResultCache, SearchOutcome, normalize_query},
};

const SEARCH_FAILED_MESSAGE: &str = "Search failed. Check your connection and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
	Idle,
	Debouncing,
	Retrieving,
	Summarizing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFailure {
	/// Retrieval failed; the outcome is empty.
	Network,
	/// Results are shown but the summary backend was overloaded.
	SummaryOverloaded,
	/// Results are shown but the summary could not be produced.
	SummaryUnavailable,
}

/// Snapshot of what the search surface should display.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchView {
	pub phase: SearchPhase,
	pub query: String,
	pub outcome: Option<SearchOutcome>,
	pub failure: Option<SearchFailure>,
}
impl Default for SearchView {
	fn default() -> Self {
		Self { phase: SearchPhase::Idle, query: String::new(), outcome: None, failure: None }
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchStatus {
	Completed(SearchOutcome),
	Cached(SearchOutcome),
	/// Superseded or torn down before it could settle. Nothing was written.
	Cancelled,
}
impl SearchStatus {
	pub fn outcome(&self) -> Option<&SearchOutcome> {
		match self {
			Self::Completed(outcome) | Self::Cached(outcome) => Some(outcome),
			Self::Cancelled => None,
		}
	}
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
	pub debounce: Duration,
	pub result_limit: u32,
	pub relevance: RelevancePolicy,
	pub overloaded_message: String,
	pub unavailable_message: String,
	pub empty_message: String,
}
impl SearchSettings {
	pub fn from_config(cfg: &brain_config::Search) -> Self {
		Self {
			debounce: Duration::from_millis(cfg.debounce_ms),
			result_limit: cfg.result_limit,
			relevance: RelevancePolicy::from(&cfg.relevance),
			overloaded_message: cfg.overloaded_message.clone(),
			unavailable_message: cfg.unavailable_message.clone(),
			empty_message: cfg.empty_message.clone(),
		}
	}
}

impl Default for SearchSettings {
	fn default() -> Self {
		Self::from_config(&brain_config::Search::default())
	}
}

/// Debounces input, consults the [`ResultCache`], and runs retrieval then summarization.
///
/// Dropping the coordinator cancels the armed debounce timer and any in-flight pipeline.
pub struct SearchCoordinator {
	inner: Arc<Coordinator>,
}

struct Coordinator {
	api: Arc<dyn SearchApi>,
	cache: Arc<ResultCache>,
	notifier: Arc<dyn Notifier>,
	settings: SearchSettings,
	state: Mutex<PipelineState>,
	view: watch::Sender<SearchView>,
}

#[derive(Default)]
struct PipelineState {
	next_id: u64,
	epoch: u64,
	active: Option<ActivePipeline>,
	debounce: Option<CancellationToken>,
}

struct ActivePipeline {
	id: u64,
	token: CancellationToken,
}

struct Ticket {
	id: u64,
	epoch: u64,
	token: CancellationToken,
}

enum Summary {
	Generated(String),
	Degraded(String, SearchFailure),
}

impl SearchCoordinator {
	pub fn new(
		api: Arc<dyn SearchApi>,
		cache: Arc<ResultCache>,
		notifier: Arc<dyn Notifier>,
		settings: SearchSettings,
	) -> Self {
		let (view, _) = watch::channel(SearchView::default());
		let inner = Coordinator {
			api,
			cache,
			notifier,
			settings,
			state: Mutex::new(PipelineState::default()),
			view,
		};

		Self { inner: Arc::new(inner) }
	}

	/// Content-change event. Re-arms the debounce timer; the search runs with the latest
	/// value once input has been quiet for the debounce interval.
	///
	/// Must be called from within a Tokio runtime.
	pub fn on_input(&self, raw: &str) {
		let query = raw.trim().to_string();
		let timer = {
			let mut state = self.inner.lock();

			if let Some(previous) = state.debounce.take() {
				previous.cancel();
			}
			if query.is_empty() {
				state.epoch += 1;
				self.inner.view.send_modify(|view| *view = SearchView::default());

				return;
			}

			let timer = CancellationToken::new();

			state.debounce = Some(timer.clone());
			self.inner.view.send_modify(|view| {
				view.phase = SearchPhase::Debouncing;
				view.query = query.clone();
			});

			timer
		};
		let inner = self.inner.clone();
		let delay = self.inner.settings.debounce;

		tokio::spawn(async move {
			tokio::select! {
				biased;
				_ = timer.cancelled() => return,
				_ = tokio::time::sleep(delay) => {},
			}

			{
				let mut state = inner.lock();

				if timer.is_cancelled() {
					return;
				}

				state.debounce = None;
			}

			if let Err(err) = inner.run(&query).await {
				tracing::debug!(error = %err, "Debounced search did not complete.");
			}
		});
	}

	/// Explicit search. Skips the debounce interval and disarms any armed timer. An empty query
	/// that disarms a timer returns the view to idle before it is rejected.
	pub async fn submit(&self, raw: &str) -> Result<SearchStatus> {
		{
			let mut state = self.inner.lock();

			if let Some(previous) = state.debounce.take() {
				previous.cancel();

				if raw.trim().is_empty() {
					self.inner.view.send_if_modified(|view| {
						let debouncing = view.phase == SearchPhase::Debouncing;

						if debouncing {
							view.phase = SearchPhase::Idle;
						}

						debouncing
					});
				}
			}
		}

		self.inner.run(raw).await
	}

	/// Cancels the armed timer and the in-flight pipeline without side effects.
	pub fn cancel(&self) {
		self.inner.cancel_all();
	}

	pub fn subscribe(&self) -> watch::Receiver<SearchView> {
		self.inner.view.subscribe()
	}

	pub fn view(&self) -> SearchView {
		self.inner.view.borrow().clone()
	}

	pub fn cache(&self) -> &Arc<ResultCache> {
		&self.inner.cache
	}

	pub fn is_searching(&self) -> bool {
		self.inner.lock().active.is_some()
	}
}

impl Drop for SearchCoordinator {
	fn drop(&mut self) {
		self.inner.cancel_all();
	}
}

impl Coordinator {
	fn lock(&self) -> MutexGuard<'_, PipelineState> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn cancel_all(&self) {
		let mut state = self.lock();

		if let Some(timer) = state.debounce.take() {
			timer.cancel();
		}
		if let Some(active) = state.active.take() {
			active.token.cancel();
		}

		state.epoch += 1;
		self.view.send_modify(|view| view.phase = SearchPhase::Idle);
	}

	async fn run(&self, raw: &str) -> Result<SearchStatus> {
		let query = raw.trim().to_string();
		let key = normalize_query(&query);

		if key.is_empty() {
			return Err(Error::EmptyQuery);
		}
		if let Some(hit) = self.cache.get(&key) {
			let mut state = self.lock();

			state.epoch += 1;
			self.view.send_modify(|view| {
				view.phase = SearchPhase::Idle;
				view.query = query.clone();
				view.outcome = Some(hit.clone());
				view.failure = None;
			});

			tracing::debug!(query = %key, "Search served from cache.");

			return Ok(SearchStatus::Cached(hit));
		}

		let ticket = self.dispatch(&query);

		self.notifier.notify(NotifyKind::Loading, "Searching your content...");

		let started = Instant::now();
		let retrieved = tokio::select! {
			biased;
			_ = ticket.token.cancelled() => return Ok(self.superseded(&key)),
			res = self.api.search(&query, self.settings.result_limit) => res,
		};
		let candidates = match retrieved {
			Ok(candidates) => candidates,
			Err(err) => return self.fail_retrieval(&ticket, &key, err),
		};
		let results = self.settings.relevance.filter(candidates);
		let summary = if results.is_empty() {
			Summary::Generated(self.settings.empty_message.clone())
		} else {
			self.publish_if_current(&ticket, |view| view.phase = SearchPhase::Summarizing);

			let context: Vec<ProjectedContent> =
				results.iter().map(ProjectedContent::from_content).collect();

			tokio::select! {
				biased;
				_ = ticket.token.cancelled() => return Ok(self.superseded(&key)),
				res = self.api.summarize(&query, &context) => self.classify_summary(res),
			}
		};
		let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

		self.complete(ticket, &query, results, summary, latency_ms)
	}

	fn dispatch(&self, query: &str) -> Ticket {
		let mut state = self.lock();

		if let Some(previous) = state.active.take() {
			previous.token.cancel();
		}

		state.next_id += 1;
		state.epoch += 1;

		let token = CancellationToken::new();
		let ticket = Ticket { id: state.next_id, epoch: state.epoch, token: token.clone() };

		state.active = Some(ActivePipeline { id: ticket.id, token });
		self.view.send_modify(|view| {
			view.phase = SearchPhase::Retrieving;
			view.query = query.to_string();
			view.outcome = None;
			view.failure = None;
		});

		ticket
	}

	fn publish_if_current(&self, ticket: &Ticket, update: impl FnOnce(&mut SearchView)) -> bool {
		let state = self.lock();

		if ticket.token.is_cancelled() || state.epoch != ticket.epoch {
			return false;
		}

		self.view.send_modify(update);

		true
	}

	fn release(state: &mut PipelineState, ticket: &Ticket) {
		if state.active.as_ref().is_some_and(|active| active.id == ticket.id) {
			state.active = None;
		}
	}

	fn superseded(&self, key: &str) -> SearchStatus {
		tracing::debug!(query = %key, "Search pipeline cancelled.");

		SearchStatus::Cancelled
	}

	fn classify_summary(&self, res: brain_providers::Result<String>) -> Summary {
		match res {
			Ok(text) => Summary::Generated(text),
			Err(err) if err.is_overloaded() => {
				tracing::warn!(error = %err, "Summary service overloaded.");

				Summary::Degraded(
					self.settings.overloaded_message.clone(),
					SearchFailure::SummaryOverloaded,
				)
			},
			Err(err) => {
				tracing::warn!(error = %err, "Summary request failed.");

				Summary::Degraded(
					self.settings.unavailable_message.clone(),
					SearchFailure::SummaryUnavailable,
				)
			},
		}
	}

	fn fail_retrieval(
		&self,
		ticket: &Ticket,
		key: &str,
		err: brain_providers::Error,
	) -> Result<SearchStatus> {
		let visible = {
			let mut state = self.lock();

			if ticket.token.is_cancelled() {
				return Ok(self.superseded(key));
			}

			Self::release(&mut state, ticket);

			let visible = state.epoch == ticket.epoch;

			if visible {
				self.view.send_modify(|view| {
					view.phase = SearchPhase::Idle;
					view.outcome = Some(SearchOutcome::empty());
					view.failure = Some(SearchFailure::Network);
				});
			}

			visible
		};

		tracing::warn!(query = %key, error = %err, "Search retrieval failed.");

		if visible {
			self.notifier.notify(NotifyKind::Error, SEARCH_FAILED_MESSAGE);
		}

		Err(Error::Api(err))
	}

	fn complete(
		&self,
		ticket: Ticket,
		query: &str,
		results: Vec<Content>,
		summary: Summary,
		latency_ms: u64,
	) -> Result<SearchStatus> {
		let (summary, failure) = match summary {
			Summary::Generated(text) => (text, None),
			Summary::Degraded(text, failure) => (text, Some(failure)),
		};
		let outcome =
			SearchOutcome { result_count: results.len(), results, summary, latency_ms };
		let visible = {
			let mut state = self.lock();

			if ticket.token.is_cancelled() {
				return Ok(self.superseded(&normalize_query(query)));
			}

			Self::release(&mut state, &ticket);

			if failure.is_none() {
				self.cache.insert(query, outcome.clone());
			}

			let visible = state.epoch == ticket.epoch;

			if visible {
				self.view.send_modify(|view| {
					view.phase = SearchPhase::Idle;
					view.outcome = Some(outcome.clone());
					view.failure = failure;
				});
			}

			visible
		};

		tracing::info!(
			query = %normalize_query(query),
			result_count = outcome.result_count,
			latency_ms,
			degraded = failure.is_some(),
			"Search completed."
		);

		if visible {
			let message = match outcome.result_count {
				1 => "Found 1 matching item.".to_string(),
				count => format!("Found {count} matching items."),
			};

			self.notifier.notify(NotifyKind::Success, &message);
		}

		Ok(SearchStatus::Completed(outcome))
	}
}
