use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use unicode_segmentation::UnicodeSegmentation;

use crate::{Content, ContentId, ContentKind};

/// Upper bound on body characters forwarded to the summarizer per item.
pub const MAX_CONTEXT_CHARS: usize = 5_000;

/// Trimmed view of a search result sent as summarization context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedContent {
	pub id: ContentId,
	#[serde(rename = "type")]
	pub kind: ContentKind,
	pub title: String,
	pub body: String,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub link: Option<String>,
}
impl ProjectedContent {
	pub fn from_content(content: &Content) -> Self {
		Self {
			id: content.id.clone(),
			kind: content.kind,
			title: content.title.clone(),
			body: truncate_chars(&content.body, MAX_CONTEXT_CHARS),
			created_at: content.created_at,
			updated_at: content.updated_at,
			link: content.link.clone(),
		}
	}
}

/// Keeps at most `max_chars` characters without splitting a grapheme cluster.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
	let mut out = String::new();
	let mut count = 0;

	for grapheme in text.graphemes(true) {
		let len = grapheme.chars().count();

		if count + len > max_chars {
			break;
		}

		out.push_str(grapheme);
		count += len;
	}

	out
}
