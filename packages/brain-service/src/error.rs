use brain_domain::{ContentId, ProcessingStatus};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Search query must be non-empty.")]
	EmptyQuery,
	#[error("Content {id} was not found.")]
	NotFound { id: ContentId },
	#[error("Content {id} cannot move from {from} to {to}.")]
	InvalidTransition { id: ContentId, from: ProcessingStatus, to: ProcessingStatus },
	#[error(transparent)]
	Api(#[from] brain_providers::Error),
}
impl Error {
	pub fn is_overloaded(&self) -> bool {
		matches!(self, Self::Api(err) if err.is_overloaded())
	}
}
