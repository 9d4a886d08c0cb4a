//! Error types shared by the transport, the HTTP client and the loader.

use thiserror::Error;

/// Opaque error value produced by a transport.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure half of a normalized HTTP result.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The transport reported an error; the original value is kept as-is.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The transport delivered neither an error nor a payload with an HTTP
    /// response.
    #[error("transport delivered unexpected arguments")]
    UnexpectedArguments,

    /// The completion handler was dropped without ever being called.
    #[error("transport dropped the completion handler")]
    Dropped,
}

impl ClientError {
    /// Returns the transport error downcast to `E`, if this is a
    /// [`ClientError::Transport`] holding an `E`.
    pub fn transport_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            ClientError::Transport(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// Errors raised while building the production session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no tokio runtime is available on this thread")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    #[error("failed to build HTTP client")]
    Build(#[from] reqwest::Error),

    #[error("invalid default header name '{name}'")]
    InvalidHeaderName {
        name: String,
        #[source]
        source: reqwest::header::InvalidHeaderName,
    },

    #[error("invalid value for default header '{name}'")]
    InvalidHeaderValue {
        name: String,
        #[source]
        source: reqwest::header::InvalidHeaderValue,
    },
}

/// A payload could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to decode image")]
    Image(#[from] image::ImageError),

    /// Failure reported by a decoder other than [`crate::loader::ImageDecoder`].
    #[error("failed to decode payload")]
    Other(#[source] BoxError),
}

impl DecodeError {
    pub fn other(err: impl Into<BoxError>) -> Self {
        DecodeError::Other(err.into())
    }
}
