use serde::{Deserialize, Serialize};

/// Ordered set of tags. Entries are trimmed, blanks are dropped, and the first occurrence of a
/// duplicate wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Tags(Vec<String>);
impl Tags {
	pub fn new<I, S>(tags: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut out: Vec<String> = Vec::new();

		for tag in tags {
			let tag = tag.as_ref().trim();

			if tag.is_empty() || out.iter().any(|existing| existing == tag) {
				continue;
			}

			out.push(tag.to_string());
		}

		Self(out)
	}

	pub fn insert(&mut self, tag: &str) -> bool {
		let tag = tag.trim();

		if tag.is_empty() || self.contains(tag) {
			return false;
		}

		self.0.push(tag.to_string());

		true
	}

	pub fn contains(&self, tag: &str) -> bool {
		self.0.iter().any(|existing| existing == tag)
	}

	pub fn as_slice(&self) -> &[String] {
		&self.0
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<Vec<String>> for Tags {
	fn from(tags: Vec<String>) -> Self {
		Self::new(tags)
	}
}

impl From<Tags> for Vec<String> {
	fn from(tags: Tags) -> Self {
		tags.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn drops_duplicates_and_blanks_in_order() {
		let tags = Tags::new(["rust", " async ", "", "rust", "async", "tokio"]);

		assert_eq!(tags.as_slice(), ["rust", "async", "tokio"]);
	}

	#[test]
	fn insert_rejects_existing_tag() {
		let mut tags = Tags::new(["rust"]);

		assert!(!tags.insert(" rust"));
		assert!(tags.insert("serde"));
		assert_eq!(tags.len(), 2);
	}
}
