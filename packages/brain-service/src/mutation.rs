//! Optimistic create, update, and delete.
//!
//! Each operation registers a speculative overlay for its key before the remote call starts.
//! Readers see the overlay while it is pending and the store value otherwise. Settlement
//! writes the server's answer into the store (success) or leaves the store untouched
//! (failure), then drops the overlay. Both steps happen under the pending lock, so a reader
//! observes either the overlay or the settled store value and nothing in between.
//!
//! An operation whose future is dropped before the remote call returns discards its overlay
//! and leaves the store untouched, exactly like a failure without the notification.
//!
//! Overlapping operations on one key are not serialized. The newest overlay is displayed, and
//! whichever remote call settles last decides the stored value.

use std::{
	collections::HashMap,
	sync::{Arc, Mutex, MutexGuard},
};

use time::OffsetDateTime;

use brain_domain::{Content, ContentId, ContentPatch, NewContent, ProcessingStatus};

use crate::{ContentApi, ContentStore, Error, Notifier, NotifyKind, ResultCache, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Speculative {
	Value(Content),
	Deleted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingOperation {
	pub ticket: u64,
	pub speculative: Speculative,
}

#[derive(Default)]
struct PendingSet {
	next_ticket: u64,
	operations: HashMap<ContentId, PendingOperation>,
}

/// Owns one registered overlay until settlement. Dropping it unsettled discards the overlay
/// if no newer operation has replaced it.
struct PendingGuard<'a> {
	pending: &'a Mutex<PendingSet>,
	id: ContentId,
	ticket: u64,
	armed: bool,
}
impl PendingGuard<'_> {
	fn release(mut self, pending: &mut PendingSet) {
		self.armed = false;

		pending.discard(&self.id, self.ticket);
	}
}

impl Drop for PendingGuard<'_> {
	fn drop(&mut self) {
		if !self.armed {
			return;
		}

		lock_pending(self.pending).discard(&self.id, self.ticket);

		tracing::debug!(id = %self.id, "Mutation abandoned before settling; overlay discarded.");
	}
}

impl PendingSet {
	fn discard(&mut self, id: &ContentId, ticket: u64) {
		if self.operations.get(id).is_some_and(|op| op.ticket == ticket) {
			self.operations.remove(id);
		}
	}
}

struct Messages {
	loading: &'static str,
	success: &'static str,
	failure: &'static str,
}

const CREATE_MESSAGES: Messages = Messages {
	loading: "Saving new content...",
	success: "Content saved.",
	failure: "Could not save the new content.",
};
const UPDATE_MESSAGES: Messages = Messages {
	loading: "Saving changes...",
	success: "Changes saved.",
	failure: "Could not save your changes.",
};
const DELETE_MESSAGES: Messages = Messages {
	loading: "Deleting content...",
	success: "Content deleted.",
	failure: "Could not delete the content.",
};

#[derive(Clone)]
pub struct MutationEngine {
	store: ContentStore,
	api: Arc<dyn ContentApi>,
	notifier: Arc<dyn Notifier>,
	invalidate: Option<Arc<ResultCache>>,
	pending: Arc<Mutex<PendingSet>>,
}
impl MutationEngine {
	/// `invalidate` is cleared after every successful mutation when given.
	pub fn new(
		store: ContentStore,
		api: Arc<dyn ContentApi>,
		notifier: Arc<dyn Notifier>,
		invalidate: Option<Arc<ResultCache>>,
	) -> Self {
		Self { store, api, notifier, invalidate, pending: Arc::new(Mutex::new(PendingSet::default())) }
	}

	pub fn is_pending(&self, id: &ContentId) -> bool {
		self.lock().operations.contains_key(id)
	}

	pub fn pending_count(&self) -> usize {
		self.lock().operations.len()
	}

	pub fn pending_operation(&self, id: &ContentId) -> Option<PendingOperation> {
		self.lock().operations.get(id).cloned()
	}

	/// Overlay value if the key is pending, otherwise the store value.
	pub fn effective(&self, id: &ContentId) -> Option<Content> {
		let pending = self.lock();

		match pending.operations.get(id) {
			Some(PendingOperation { speculative: Speculative::Value(value), .. }) =>
				Some(value.clone()),
			Some(PendingOperation { speculative: Speculative::Deleted, .. }) => None,
			None => self.store.get(id),
		}
	}

	/// Store snapshot with every pending overlay applied. Unacknowledged creations come first,
	/// newest first.
	pub fn effective_snapshot(&self) -> Vec<Content> {
		let pending = self.lock();
		let items = self.store.snapshot();
		let mut creations: Vec<(u64, Content)> = pending
			.operations
			.iter()
			.filter(|(id, _)| !items.iter().any(|item| &item.id == *id))
			.filter_map(|(_, op)| match &op.speculative {
				Speculative::Value(value) => Some((op.ticket, value.clone())),
				Speculative::Deleted => None,
			})
			.collect();

		creations.sort_by(|a, b| b.0.cmp(&a.0));

		let mut out: Vec<Content> = creations.into_iter().map(|(_, value)| value).collect();

		for item in items {
			match pending.operations.get(&item.id).map(|op| &op.speculative) {
				Some(Speculative::Value(value)) => out.push(value.clone()),
				Some(Speculative::Deleted) => {},
				None => out.push(item),
			}
		}

		out
	}

	/// Creates content under `temp_id` until the server assigns the real id.
	pub async fn create(&self, temp_id: ContentId, new: NewContent) -> Result<Content> {
		let draft = Content::draft(temp_id.clone(), &new, OffsetDateTime::now_utc());
		let guard = self.register(&temp_id, Speculative::Value(draft), &CREATE_MESSAGES);
		let res = self.api.create_content(&new).await;

		self.settle(guard, res, &CREATE_MESSAGES, |store, created| {
			store.upsert(created.clone())
		})
	}

	pub async fn update(&self, id: &ContentId, patch: ContentPatch) -> Result<Content> {
		let base = self.effective(id).ok_or_else(|| Error::NotFound { id: id.clone() })?;

		if let Some(next) = patch.status
			&& !base.status.can_transition_to(next)
		{
			return Err(Error::InvalidTransition { id: id.clone(), from: base.status, to: next });
		}

		let speculative = base.apply(&patch, OffsetDateTime::now_utc());
		let guard = self.register(id, Speculative::Value(speculative), &UPDATE_MESSAGES);
		let res = self.api.update_content(id, &patch).await;

		self.settle(guard, res, &UPDATE_MESSAGES, |store, updated| {
			store.upsert(updated.clone())
		})
	}

	pub async fn delete(&self, id: &ContentId) -> Result<()> {
		if self.effective(id).is_none() {
			return Err(Error::NotFound { id: id.clone() });
		}

		let guard = self.register(id, Speculative::Deleted, &DELETE_MESSAGES);
		let res = self.api.delete_content(id).await;

		self.settle(guard, res, &DELETE_MESSAGES, |store, _| {
			store.remove(id);
		})
	}

	/// Sends a failed item back to pending so the server processes it again.
	pub async fn retry(&self, id: &ContentId) -> Result<Content> {
		let base = self.effective(id).ok_or_else(|| Error::NotFound { id: id.clone() })?;

		if base.status != ProcessingStatus::Failed {
			return Err(Error::InvalidTransition {
				id: id.clone(),
				from: base.status,
				to: ProcessingStatus::Pending,
			});
		}

		self.update(id, ContentPatch::status(ProcessingStatus::Pending)).await
	}

	fn lock(&self) -> MutexGuard<'_, PendingSet> {
		lock_pending(&self.pending)
	}

	fn register(
		&self,
		id: &ContentId,
		speculative: Speculative,
		messages: &Messages,
	) -> PendingGuard<'_> {
		let ticket = {
			let mut pending = self.lock();

			pending.next_ticket += 1;

			let ticket = pending.next_ticket;

			if pending
				.operations
				.insert(id.clone(), PendingOperation { ticket, speculative })
				.is_some()
			{
				tracing::debug!(id = %id, "Replacing pending overlay for key.");
			}

			ticket
		};

		self.notifier.notify(NotifyKind::Loading, messages.loading);

		PendingGuard { pending: &self.pending, id: id.clone(), ticket, armed: true }
	}

	fn settle<T>(
		&self,
		guard: PendingGuard<'_>,
		res: brain_providers::Result<T>,
		messages: &Messages,
		apply: impl FnOnce(&ContentStore, &T),
	) -> Result<T> {
		let id = guard.id.clone();

		{
			let mut pending = self.lock();

			if let Ok(value) = &res {
				apply(&self.store, value);
			}

			guard.release(&mut pending);
		}

		match res {
			Ok(value) => {
				if let Some(cache) = &self.invalidate {
					cache.clear();
				}

				tracing::info!(id = %id, "Mutation settled.");
				self.notifier.notify(NotifyKind::Success, messages.success);

				Ok(value)
			},
			Err(err) => {
				tracing::warn!(id = %id, error = %err, "Mutation failed; overlay discarded.");
				self.notifier.notify(NotifyKind::Error, messages.failure);

				Err(Error::Api(err))
			},
		}
	}
}

fn lock_pending(pending: &Mutex<PendingSet>) -> MutexGuard<'_, PendingSet> {
	pending.lock().unwrap_or_else(|err| err.into_inner())
}
