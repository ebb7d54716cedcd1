pub mod content;
pub mod projection;
pub mod relevance;
pub mod status;
pub mod tags;
pub mod time_serde;

pub use content::{Content, ContentId, ContentKind, ContentPatch, NewContent};
pub use projection::{MAX_CONTEXT_CHARS, ProjectedContent};
pub use relevance::{RelevancePolicy, Scored};
pub use status::ProcessingStatus;
pub use tags::Tags;
