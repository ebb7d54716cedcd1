use std::{collections::HashMap, sync::Mutex, time::Duration};

use serde::Serialize;
use tokio::time::Instant;

use brain_domain::Content;

/// What a completed search pipeline hands to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
	pub results: Vec<Content>,
	pub summary: String,
	pub latency_ms: u64,
	pub result_count: usize,
}
impl SearchOutcome {
	pub fn empty() -> Self {
		Self { results: Vec::new(), summary: String::new(), latency_ms: 0, result_count: 0 }
	}
}

#[derive(Debug, Clone)]
pub struct SearchCacheEntry {
	pub outcome: SearchOutcome,
	pub created_at: Instant,
}
impl SearchCacheEntry {
	fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
		now.saturating_duration_since(self.created_at) < ttl
	}
}

/// Cache key for a query: trimmed and lower-cased.
pub fn normalize_query(query: &str) -> String {
	query.trim().to_lowercase()
}

/// Time-bounded memo of search outcomes keyed by normalized query.
///
/// Expired entries are never served. They are dropped when looked up, by
/// [`ResultCache::prune_expired`], or when the table is full.
pub struct ResultCache {
	enabled: bool,
	ttl: Duration,
	max_entries: usize,
	entries: Mutex<HashMap<String, SearchCacheEntry>>,
}
impl ResultCache {
	pub fn new(ttl: Duration, max_entries: usize) -> Self {
		Self { enabled: true, ttl, max_entries: max_entries.max(1), entries: Mutex::new(HashMap::new()) }
	}

	/// A cache that stores nothing.
	pub fn disabled() -> Self {
		Self { enabled: false, ttl: Duration::ZERO, max_entries: 1, entries: Mutex::new(HashMap::new()) }
	}

	pub fn from_config(cfg: &brain_config::SearchCache) -> Self {
		if !cfg.enabled {
			return Self::disabled();
		}

		Self::new(Duration::from_millis(cfg.ttl_ms), cfg.max_entries as usize)
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	pub fn get(&self, query: &str) -> Option<SearchOutcome> {
		if !self.enabled {
			return None;
		}

		let key = normalize_query(query);
		let now = Instant::now();
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
		let entry = entries.get(&key)?;

		if entry.is_fresh(self.ttl, now) {
			return Some(entry.outcome.clone());
		}

		entries.remove(&key);

		None
	}

	pub fn insert(&self, query: &str, outcome: SearchOutcome) {
		if !self.enabled {
			return;
		}

		let key = normalize_query(query);
		let now = Instant::now();
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		if !entries.contains_key(&key) && entries.len() >= self.max_entries {
			entries.retain(|_, entry| entry.is_fresh(self.ttl, now));

			if entries.len() >= self.max_entries {
				let oldest = entries
					.iter()
					.min_by_key(|(_, entry)| entry.created_at)
					.map(|(key, _)| key.clone());

				if let Some(oldest) = oldest {
					entries.remove(&oldest);
				}
			}
		}

		entries.insert(key, SearchCacheEntry { outcome, created_at: now });
	}

	/// Drops every expired entry and returns how many were removed.
	pub fn prune_expired(&self) -> usize {
		let now = Instant::now();
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
		let before = entries.len();

		entries.retain(|_, entry| entry.is_fresh(self.ttl, now));

		before - entries.len()
	}

	pub fn invalidate(&self, query: &str) -> bool {
		let key = normalize_query(query);

		self.entries.lock().unwrap_or_else(|err| err.into_inner()).remove(&key).is_some()
	}

	pub fn clear(&self) {
		self.entries.lock().unwrap_or_else(|err| err.into_inner()).clear();
	}

	/// Number of stored entries, including expired ones not yet evicted.
	pub fn len(&self) -> usize {
		self.entries.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
