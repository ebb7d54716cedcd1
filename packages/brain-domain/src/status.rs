use serde::{Deserialize, Serialize};

/// Server-side enrichment state of a content item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
	Pending,
	Processing,
	#[default]
	Completed,
	Failed,
}
impl ProcessingStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::Processing => "processing",
			Self::Completed => "completed",
			Self::Failed => "failed",
		}
	}

	/// Pending and processing items are still being enriched and will change server-side.
	pub fn is_transient(self) -> bool {
		matches!(self, Self::Pending | Self::Processing)
	}

	/// Status only moves forward, except that a failed item may be retried back to pending.
	pub fn can_transition_to(self, next: Self) -> bool {
		if self == next {
			return true;
		}

		match (self, next) {
			(Self::Failed, Self::Pending) => true,
			(Self::Pending, _) => true,
			(Self::Processing, Self::Completed | Self::Failed) => true,
			_ => false,
		}
	}
}

impl std::fmt::Display for ProcessingStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
