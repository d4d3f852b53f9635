use std::time::Duration;

use thiserror::Error;

/// Errors raised while verifying a signed token.
///
/// Every variant maps to `401 Unauthorized`.
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    /// The request path carried no token
    #[error("Missing token")]
    Missing,

    /// Token is not a compact JWS (three base64url segments of JSON)
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// The header names an algorithm other than HS256, HS384 or HS512
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The header carries a `crit` parameter we do not understand
    #[error("Unsupported critical header parameter")]
    CriticalHeader,

    /// Signature does not match the payload
    #[error("Invalid signature")]
    InvalidSignature,

    /// The `exp` claim is in the past
    #[error("Token expired at {expired_at} (current time: {current_time})")]
    Expired { expired_at: f64, current_time: u64 },

    /// The `nbf` claim is in the future
    #[error("Token not valid before {not_before} (current time: {current_time})")]
    NotYetValid { not_before: f64, current_time: u64 },

    /// A registered time claim has the wrong type
    #[error("Invalid {claim} claim: {message}")]
    InvalidClaim {
        claim: &'static str,
        message: String,
    },
}

/// Errors raised when a verified payload does not carry usable claims.
///
/// Every variant maps to `400 Bad Request`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimsError {
    #[error("Missing title claim")]
    MissingTitle,

    #[error("Title claim must be a string")]
    InvalidTitle,

    #[error("Title claim must not be empty")]
    EmptyTitle,

    #[error("Description claim must be a string")]
    InvalidDescription,
}

/// Errors from the image cache store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Error from S3 or S3-compatible storage
    #[error("S3 error: {0}")]
    S3(String),

    /// Network or connection error while streaming an object
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Errors raised while rendering a page screenshot.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// Could not open a browser session
    #[error("Failed to open browser session: {0}")]
    Session(String),

    /// Could not apply emulation settings (viewport, color scheme)
    #[error("Failed to configure page: {0}")]
    Configure(String),

    /// Navigation to the target page failed
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// The page never reached network idle
    #[error("Network idle wait failed: {0}")]
    NetworkIdle(String),

    /// Screenshot capture failed
    #[error("Screenshot capture failed: {0}")]
    Capture(String),

    /// The whole render exceeded its time budget
    #[error("Render timed out after {0:?}")]
    Timeout(Duration),
}
