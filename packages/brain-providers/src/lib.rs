pub mod content;
pub mod search;

mod error;

pub use error::{Error, Result};

use std::{sync::Arc, time::Duration};

use reqwest::{
	Client, RequestBuilder, Response, StatusCode,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde_json::{Map, Value};

const MAX_ERROR_MESSAGE_CHARS: usize = 512;

/// Source of the bearer credential attached to every request.
pub trait Credentials
where
	Self: Send + Sync,
{
	fn bearer(&self) -> Option<String>;
}

pub struct StaticCredentials(Option<String>);
impl StaticCredentials {
	pub fn new(token: Option<String>) -> Self {
		Self(token)
	}
}
impl Credentials for StaticCredentials {
	fn bearer(&self) -> Option<String> {
		self.0.clone()
	}
}

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// HTTP client for the remote content and search API.
#[derive(Clone)]
pub struct ContentClient {
	http: Client,
	api: brain_config::Api,
	credentials: Arc<dyn Credentials>,
}
impl ContentClient {
	pub fn new(api: &brain_config::Api) -> Result<Self> {
		let credentials = Arc::new(StaticCredentials::new(api.api_key.clone()));

		Self::with_credentials(api, credentials)
	}

	pub fn with_credentials(
		api: &brain_config::Api,
		credentials: Arc<dyn Credentials>,
	) -> Result<Self> {
		let http = Client::builder().timeout(Duration::from_millis(api.timeout_ms)).build()?;

		Ok(Self { http, api: api.clone(), credentials })
	}

	pub(crate) fn url(&self, path: &str) -> String {
		format!("{}{}", self.api.api_base, path)
	}

	pub(crate) fn paths(&self) -> &brain_config::ApiPaths {
		&self.api.paths
	}

	pub(crate) fn http(&self) -> &Client {
		&self.http
	}

	pub(crate) fn headers(&self) -> Result<HeaderMap> {
		let token = self
			.credentials
			.bearer()
			.filter(|token| !token.trim().is_empty())
			.ok_or(Error::MissingCredential)?;

		auth_headers(&token, &self.api.default_headers)
	}

	pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response> {
		let res = request.headers(self.headers()?).send().await?;

		check_status(res).await
	}

	pub(crate) async fn send_json(&self, request: RequestBuilder) -> Result<Value> {
		let res = self.send(request).await?;

		Ok(res.json().await?)
	}
}

async fn check_status(res: Response) -> Result<Response> {
	let status = res.status();

	if status.is_success() {
		return Ok(res);
	}
	if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
		return Err(Error::Unauthorized { status: status.as_u16() });
	}

	let body = res.text().await.unwrap_or_default();

	Err(classify_failure(status, &body))
}

fn classify_failure(status: StatusCode, body: &str) -> Error {
	let message = error_message(body);
	let overloaded = matches!(status, StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE)
		|| message.to_ascii_lowercase().contains("overload");

	if overloaded {
		Error::Overloaded { status: status.as_u16(), message }
	} else {
		Error::Status { status: status.as_u16(), message }
	}
}

fn error_message(body: &str) -> String {
	let from_json = serde_json::from_str::<Value>(body).ok().and_then(|json| {
		json.get("error")
			.or_else(|| json.get("message"))
			.and_then(|value| value.as_str().map(str::to_string))
	});
	let mut message = from_json.unwrap_or_else(|| body.trim().to_string());

	if message.chars().count() > MAX_ERROR_MESSAGE_CHARS {
		message = message.chars().take(MAX_ERROR_MESSAGE_CHARS).collect();
		message.push_str("...");
	}

	message
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn service_unavailable_is_overloaded() {
		let err = classify_failure(StatusCode::SERVICE_UNAVAILABLE, "");

		assert!(err.is_overloaded());
	}

	#[test]
	fn overload_message_is_detected_on_generic_status() {
		let err = classify_failure(
			StatusCode::INTERNAL_SERVER_ERROR,
			r#"{"error":"The model is overloaded. Please try again later."}"#,
		);

		assert!(err.is_overloaded());
	}

	#[test]
	fn other_failures_keep_status_and_message() {
		let err = classify_failure(StatusCode::BAD_GATEWAY, r#"{"message":"upstream down"}"#);

		match err {
			Error::Status { status, message } => {
				assert_eq!(status, 502);
				assert_eq!(message, "upstream down");
			},
			other => panic!("Unexpected error: {other}"),
		}
	}

	#[test]
	fn long_error_bodies_are_truncated() {
		let body = "x".repeat(MAX_ERROR_MESSAGE_CHARS * 2);

		assert_eq!(error_message(&body).chars().count(), MAX_ERROR_MESSAGE_CHARS + 3);
	}
}
