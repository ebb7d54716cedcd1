use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{ProcessingStatus, Tags};

const TEMPORARY_ID_PREFIX: &str = "tmp-";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);
impl ContentId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Placeholder key for a creation that has not been acknowledged by the server yet.
	pub fn temporary() -> Self {
		Self(format!("{TEMPORARY_ID_PREFIX}{}", Uuid::new_v4().simple()))
	}

	pub fn is_temporary(&self) -> bool {
		self.0.starts_with(TEMPORARY_ID_PREFIX)
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for ContentId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for ContentId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
	Link,
	Note,
	Bookmark,
}
impl ContentKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Link => "link",
			Self::Note => "note",
			Self::Bookmark => "bookmark",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
	#[serde(alias = "_id")]
	pub id: ContentId,
	#[serde(rename = "type")]
	pub kind: ContentKind,
	pub title: String,
	#[serde(default)]
	pub body: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub summary: Option<String>,
	#[serde(default)]
	pub tags: Tags,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub link: Option<String>,
	#[serde(default)]
	pub status: ProcessingStatus,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
	/// Retrieval score in `[0, 1]`. Only present on search results.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub score: Option<f64>,
}
impl Content {
	/// Speculative value shown for a creation before the server answers.
	pub fn draft(id: ContentId, new: &NewContent, now: OffsetDateTime) -> Self {
		Self {
			id,
			kind: new.kind,
			title: new.title.clone(),
			body: new.body.clone(),
			summary: None,
			tags: new.tags.clone(),
			link: new.link.clone(),
			status: ProcessingStatus::Pending,
			created_at: now,
			updated_at: now,
			score: None,
		}
	}

	/// Returns a copy with every present patch field applied. The kind is never touched.
	pub fn apply(&self, patch: &ContentPatch, now: OffsetDateTime) -> Self {
		let mut next = self.clone();

		if let Some(title) = &patch.title {
			next.title = title.clone();
		}
		if let Some(body) = &patch.body {
			next.body = body.clone();
		}
		if let Some(summary) = &patch.summary {
			next.summary = Some(summary.clone());
		}
		if let Some(tags) = &patch.tags {
			next.tags = tags.clone();
		}
		if let Some(link) = &patch.link {
			next.link = Some(link.clone());
		}
		if let Some(status) = patch.status {
			next.status = status;
		}

		next.updated_at = now;

		next
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContent {
	#[serde(rename = "type")]
	pub kind: ContentKind,
	pub title: String,
	#[serde(default)]
	pub body: String,
	#[serde(default)]
	pub tags: Tags,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPatch {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub body: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub summary: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tags: Option<Tags>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub link: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<ProcessingStatus>,
}
impl ContentPatch {
	pub fn status(status: ProcessingStatus) -> Self {
		Self { status: Some(status), ..Self::default() }
	}

	pub fn is_empty(&self) -> bool {
		self == &Self::default()
	}
}
