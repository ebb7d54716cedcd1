pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("No API credential is available.")]
	MissingCredential,
	#[error("API rejected the credential with status {status}.")]
	Unauthorized { status: u16 },
	#[error("Service overloaded ({status}): {message}")]
	Overloaded { status: u16, message: String },
	#[error("API request failed with status {status}: {message}")]
	Status { status: u16, message: String },
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
}
impl Error {
	/// True when the backend signalled that it is temporarily over capacity.
	pub fn is_overloaded(&self) -> bool {
		matches!(self, Self::Overloaded { .. })
	}

	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Reqwest(err) if err.is_timeout())
	}
}
