//! Error types for featurekv
//!
//! Every failure the online store can surface is one variant of [`Error`].
//! We use the `thiserror` crate to keep the definitions short.
//!
//! ## Taxonomy
//!
//! - Configuration problems are caught before any I/O happens
//! - Encoding problems come from serializing entity keys or feature values
//! - Substrate problems come from the key-value backend (network, timeout, cluster)
//! - Decode problems mean stored bytes are corrupt, which is different from absent

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors that can occur in featurekv
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration does not select a supported backend or mode
    ///
    /// Raised at store construction, before any connection is attempted.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Entity key or feature value could not be serialized
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// A point read or write against the key-value substrate failed
    ///
    /// The backend client error is wrapped to preserve context.
    /// Not retried by this crate.
    #[error("Substrate error: {0}")]
    SubstrateError(#[from] anyhow::Error),

    /// Bytes read back from the substrate did not parse
    ///
    /// A missing or zero-length value is NOT a decode error; it decodes to
    /// the type's default.
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Invalid input from the caller (empty feature map, reserved feature name)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Creates a ConfigError from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Creates an EncodingError from a string
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::EncodingError(msg.into())
    }

    /// Creates a DecodeError from a string
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeError(msg.into())
    }

    /// Wraps a backend client error as a SubstrateError
    pub fn substrate<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::SubstrateError(anyhow::Error::new(err))
    }

    /// Creates an InvalidInput error from a string
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
