use reqwest::Url;
use serde_json::Value;

use brain_domain::{Content, ContentId, ContentPatch, NewContent};

use crate::{ContentClient, Error, Result};

impl ContentClient {
	pub async fn list_content(&self) -> Result<Vec<Content>> {
		let url = self.url(&self.paths().content);
		let json = self.send_json(self.http().get(url)).await?;

		parse_content_list(json)
	}

	pub async fn create_content(&self, new: &NewContent) -> Result<Content> {
		let url = self.url(&self.paths().content);
		let json = self.send_json(self.http().post(url).json(new)).await?;

		parse_single_content(json)
	}

	pub async fn update_content(&self, id: &ContentId, patch: &ContentPatch) -> Result<Content> {
		let url = self.item_url(id)?;
		let json = self.send_json(self.http().put(url).json(patch)).await?;

		parse_single_content(json)
	}

	pub async fn delete_content(&self, id: &ContentId) -> Result<()> {
		let url = self.item_url(id)?;

		self.send(self.http().delete(url)).await?;

		Ok(())
	}

	/// The id is appended as one percent-encoded path segment.
	fn item_url(&self, id: &ContentId) -> Result<Url> {
		let base = self.url(&self.paths().content);
		let mut url = Url::parse(&base).map_err(|err| Error::InvalidConfig {
			message: format!("Content URL {base} is invalid: {err}."),
		})?;

		url.path_segments_mut()
			.map_err(|_| Error::InvalidConfig {
				message: format!("Content URL {base} cannot carry path segments."),
			})?
			.pop_if_empty()
			.push(id.as_str());

		Ok(url)
	}
}

fn parse_content_list(json: Value) -> Result<Vec<Content>> {
	let items = match json {
		Value::Array(_) => json,
		Value::Object(mut map) => map
			.remove("content")
			.or_else(|| map.remove("items"))
			.filter(Value::is_array)
			.ok_or_else(|| Error::InvalidResponse {
				message: "Content listing is missing content array.".to_string(),
			})?,
		_ => {
			return Err(Error::InvalidResponse {
				message: "Content listing must be an array or object.".to_string(),
			});
		},
	};

	Ok(serde_json::from_value(items)?)
}

fn parse_single_content(json: Value) -> Result<Content> {
	let item = match json {
		Value::Object(mut map) => match map.remove("content") {
			Some(inner @ Value::Object(_)) => inner,
			Some(other) => {
				map.insert("content".to_string(), other);

				Value::Object(map)
			},
			None => Value::Object(map),
		},
		_ => {
			return Err(Error::InvalidResponse {
				message: "Content response must be an object.".to_string(),
			});
		},
	};

	Ok(serde_json::from_value(item)?)
}
