use thiserror::Error;

/// Errors surfaced by the chain engine and its stores.
///
/// Nothing is retried internally; every variant reaches the caller as-is.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChainError {
	/// Transport or connection failure while talking to the store.
	#[error("Store unavailable: {0}")]
	StoreUnavailable(String),

	/// A token cannot be turned into a key part.
	#[error("Invalid token: {0}")]
	InvalidToken(String),

	/// A window passed by the caller does not match the chain order.
	#[error("Invalid window: expected {expected} tokens, got {actual}")]
	InvalidWindow { expected: usize, actual: usize },

	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),

	/// A stored field or key could not be parsed back into a token.
	#[error("Cannot decode stored value: {0}")]
	Decode(String),

	#[error("Snapshot error: {0}")]
	Snapshot(String),

	#[error("IO error: {0}")]
	Io(String),
}

pub type Result<T> = std::result::Result<T, ChainError>;

impl From<std::io::Error> for ChainError {
	fn from(err: std::io::Error) -> Self {
		ChainError::Io(err.to_string())
	}
}

impl From<postcard::Error> for ChainError {
	fn from(err: postcard::Error) -> Self {
		ChainError::Snapshot(err.to_string())
	}
}

impl From<toml::de::Error> for ChainError {
	fn from(err: toml::de::Error) -> Self {
		ChainError::InvalidConfig(err.to_string())
	}
}
