use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub service: Service,
	pub api: Api,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub poller: Poller,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Service {
	pub log_level: String,
}
impl Default for Service {
	fn default() -> Self {
		Self { log_level: "info".to_string() }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
	pub api_base: String,
	/// Bearer credential attached to every call. Calls fail without one.
	pub api_key: Option<String>,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
	#[serde(default)]
	pub paths: ApiPaths,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiPaths {
	pub search: String,
	pub summarize: String,
	pub content: String,
}
impl Default for ApiPaths {
	fn default() -> Self {
		Self {
			search: "/api/v1/search".to_string(),
			summarize: "/api/v1/search/summarize".to_string(),
			content: "/api/v1/content".to_string(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Search {
	pub debounce_ms: u64,
	pub result_limit: u32,
	/// Summary shown when the summarization backend reports overload.
	pub overloaded_message: String,
	/// Summary shown for any other summarization failure.
	pub unavailable_message: String,
	/// Summary shown when retrieval returns nothing.
	pub empty_message: String,
	pub relevance: SearchRelevance,
	pub cache: SearchCache,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			debounce_ms: 350,
			result_limit: 3,
			overloaded_message:
				"The summary service is overloaded right now. Showing matching content only."
					.to_string(),
			unavailable_message: "A summary could not be generated for this search.".to_string(),
			empty_message: "No matching content found.".to_string(),
			relevance: SearchRelevance::default(),
			cache: SearchCache::default(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchRelevance {
	pub dominance_gap: f64,
	pub min_second_score: f64,
	pub max_results: u32,
}
impl Default for SearchRelevance {
	fn default() -> Self {
		Self { dominance_gap: 0.10, min_second_score: 0.75, max_results: 3 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchCache {
	pub enabled: bool,
	pub ttl_ms: u64,
	pub max_entries: u32,
	pub invalidate_on_mutation: bool,
}
impl Default for SearchCache {
	fn default() -> Self {
		Self { enabled: true, ttl_ms: 300_000, max_entries: 256, invalidate_on_mutation: true }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Poller {
	pub interval_ms: u64,
}
impl Default for Poller {
	fn default() -> Self {
		Self { interval_ms: 3_000 }
	}
}

fn default_timeout_ms() -> u64 {
	30_000
}
