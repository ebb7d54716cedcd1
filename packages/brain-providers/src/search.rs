use serde_json::Value;

use brain_domain::{Content, ProjectedContent};

use crate::{ContentClient, Error, Result};

impl ContentClient {
	/// Retrieval call. Results come back ordered by descending score.
	pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<Content>> {
		let url = self.url(&self.paths().search);
		let body = serde_json::json!({ "query": query, "limit": limit });

		tracing::debug!(%url, limit, "Sending search request.");

		let json = self.send_json(self.http().post(url).json(&body)).await?;

		parse_search_response(json)
	}

	pub async fn summarize(&self, query: &str, context: &[ProjectedContent]) -> Result<String> {
		let url = self.url(&self.paths().summarize);
		let body = serde_json::json!({ "query": query, "context": context });

		tracing::debug!(%url, items = context.len(), "Sending summarize request.");

		let json = self.send_json(self.http().post(url).json(&body)).await?;

		parse_summary_response(json)
	}
}

fn parse_search_response(json: Value) -> Result<Vec<Content>> {
	let results = json
		.get("results")
		.or_else(|| json.get("data"))
		.cloned()
		.ok_or_else(|| Error::InvalidResponse {
			message: "Search response is missing results array.".to_string(),
		})?;

	if !results.is_array() {
		return Err(Error::InvalidResponse {
			message: "Search results must be an array.".to_string(),
		});
	}

	Ok(serde_json::from_value(results)?)
}

fn parse_summary_response(json: Value) -> Result<String> {
	json.get("response")
		.or_else(|| json.get("summary"))
		.and_then(|v| v.as_str())
		.map(str::to_string)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Summarize response is missing response text.".to_string(),
		})
}
