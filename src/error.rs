//! Error types for session token handling.

use thiserror::Error;

/// Reasons a session token yields no usable claims.
///
/// These never leave the access gate: every variant collapses into an
/// unresolved session.
#[derive(Error, Debug)]
pub enum TokenError {
    /// The token has no second (payload) segment.
    #[error("token has no payload segment")]
    MissingPayload,

    /// The payload segment is not valid base64.
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded payload is not valid JSON, or its fields have the wrong shape.
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The decoded payload is JSON, but not an object.
    #[error("payload is not a JSON object")]
    NotAnObject,

    /// Signature verification was requested and failed.
    #[error("signature verification failed: {0}")]
    Signature(#[from] jsonwebtoken::errors::Error),
}

/// Result type alias for token decoding.
pub type Result<T> = std::result::Result<T, TokenError>;
