use std::sync::{Arc, RwLock};

use tokio::sync::watch;

use brain_domain::{Content, ContentId};

use crate::{ContentApi, Result};

/// Authoritative in-memory collection of the user's content.
///
/// Handles are cheap to clone and share one collection. Writes are limited to this crate so
/// that only refreshes and mutation reconciliation can change it.
#[derive(Clone)]
pub struct ContentStore {
	inner: Arc<StoreInner>,
}

struct StoreInner {
	items: RwLock<Vec<Content>>,
	changes: watch::Sender<u64>,
}

impl ContentStore {
	pub fn new() -> Self {
		let (changes, _) = watch::channel(0);

		Self { inner: Arc::new(StoreInner { items: RwLock::new(Vec::new()), changes }) }
	}

	pub fn get(&self, id: &ContentId) -> Option<Content> {
		let items = self.inner.items.read().unwrap_or_else(|err| err.into_inner());

		items.iter().find(|item| &item.id == id).cloned()
	}

	pub fn snapshot(&self) -> Vec<Content> {
		self.inner.items.read().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn len(&self) -> usize {
		self.inner.items.read().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// True while any item is still pending or processing server-side.
	pub fn has_transient(&self) -> bool {
		let items = self.inner.items.read().unwrap_or_else(|err| err.into_inner());

		items.iter().any(|item| item.status.is_transient())
	}

	/// Change counter, bumped after every write.
	pub fn subscribe(&self) -> watch::Receiver<u64> {
		self.inner.changes.subscribe()
	}

	pub fn version(&self) -> u64 {
		*self.inner.changes.borrow()
	}

	/// Replaces the collection with a full listing from the API.
	pub async fn refresh(&self, api: &dyn ContentApi) -> Result<usize> {
		let items = api.list_content().await?;
		let count = items.len();

		self.replace_all(items);

		tracing::debug!(count, "Content store refreshed.");

		Ok(count)
	}

	pub(crate) fn replace_all(&self, items: Vec<Content>) {
		{
			let mut guard = self.inner.items.write().unwrap_or_else(|err| err.into_inner());

			*guard = items;
		}

		self.bump();
	}

	/// Replaces the item with the same id in place, otherwise inserts it first.
	pub(crate) fn upsert(&self, item: Content) {
		{
			let mut guard = self.inner.items.write().unwrap_or_else(|err| err.into_inner());

			match guard.iter_mut().find(|existing| existing.id == item.id) {
				Some(existing) => *existing = item,
				None => guard.insert(0, item),
			}
		}

		self.bump();
	}

	pub(crate) fn remove(&self, id: &ContentId) -> Option<Content> {
		let removed = {
			let mut guard = self.inner.items.write().unwrap_or_else(|err| err.into_inner());
			let index = guard.iter().position(|item| &item.id == id)?;

			guard.remove(index)
		};

		self.bump();

		Some(removed)
	}

	fn bump(&self) {
		self.inner.changes.send_modify(|version| *version += 1);
	}
}

impl Default for ContentStore {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use brain_domain::{ContentKind, ProcessingStatus, Tags};

	use super::*;

	fn item(id: &str, status: ProcessingStatus) -> Content {
		Content {
			id: ContentId::new(id),
			kind: ContentKind::Note,
			title: id.to_string(),
			body: String::new(),
			summary: None,
			tags: Tags::default(),
			link: None,
			status,
			created_at: datetime!(2026-01-01 00:00 UTC),
			updated_at: datetime!(2026-01-01 00:00 UTC),
			score: None,
		}
	}

	#[test]
	fn upsert_replaces_in_place_and_prepends_new() {
		let store = ContentStore::new();

		store.replace_all(vec![item("a", ProcessingStatus::Completed)]);
		store.upsert(item("b", ProcessingStatus::Completed));

		let mut updated = item("a", ProcessingStatus::Completed);

		updated.title = "renamed".to_string();
		store.upsert(updated);

		let ids: Vec<_> = store.snapshot().into_iter().map(|item| item.id).collect();

		assert_eq!(ids, vec![ContentId::new("b"), ContentId::new("a")]);
		assert_eq!(store.get(&ContentId::new("a")).map(|item| item.title).as_deref(), Some("renamed"));
	}

	#[test]
	fn writes_bump_the_change_counter() {
		let store = ContentStore::new();
		let before = store.version();

		store.upsert(item("a", ProcessingStatus::Pending));

		assert!(store.has_transient());
		assert!(store.remove(&ContentId::new("a")).is_some());
		assert!(store.remove(&ContentId::new("a")).is_none());
		assert_eq!(store.version(), before + 2);
		assert!(!store.has_transient());
	}
}
