//! Token authentication for image requests.
//!
//! The token is the first path segment of the request:
//!
//! ```text
//! GET /eyJhbGciOiJIUzI1NiJ9.eyJ0aXRsZSI6IkhlbGxvIn0.3q2-7w...
//! ```
//!
//! [`VerifiedClaims`] extracts it, verifies it with the shared [`TokenAuth`]
//! and validates the claims before the handler runs:
//!
//! - verification failure → `401 Unauthorized`
//! - claims failure → `400 Bad Request`
//!
//! Response bodies are the bare status reason; the underlying error is only
//! logged.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::error::{ClaimsError, TokenError};
use crate::token::{Claims, TokenAuth};

// =============================================================================
// Rejection
// =============================================================================

/// Why a request's token was refused.
#[derive(Debug, Clone)]
pub enum TokenRejection {
    /// Token missing, malformed, forged or outside its validity window
    Unauthorized(TokenError),

    /// Token verified but its claims are unusable
    BadRequest(ClaimsError),
}

impl IntoResponse for TokenRejection {
    fn into_response(self) -> Response {
        match self {
            TokenRejection::Unauthorized(err) => {
                // A bad signature on a well-formed token could be an attack
                match &err {
                    TokenError::InvalidSignature | TokenError::UnsupportedAlgorithm(_) => {
                        warn!(status = 401, "Authentication failed: {}", err)
                    }
                    _ => debug!(status = 401, "Authentication failed: {}", err),
                }
                (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
            }
            TokenRejection::BadRequest(err) => {
                debug!(status = 400, "Invalid claims: {}", err);
                (StatusCode::BAD_REQUEST, "Bad Request").into_response()
            }
        }
    }
}

// =============================================================================
// Extractor
// =============================================================================

/// Claims of a verified request token.
#[derive(Debug, Clone)]
pub struct VerifiedClaims(pub Claims);

impl<S> FromRequestParts<S> for VerifiedClaims
where
    TokenAuth: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = TokenRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = TokenAuth::from_ref(state);
        let token = token_from_path(parts.uri.path());

        let payload = auth.verify(token).map_err(TokenRejection::Unauthorized)?;
        let claims = Claims::from_payload(&payload).map_err(TokenRejection::BadRequest)?;

        Ok(VerifiedClaims(claims))
    }
}

/// The substring between the first and second `/` of a path.
///
/// The segment is not percent-decoded; JWTs only use URL-safe characters.
pub fn token_from_path(path: &str) -> &str {
    path.split('/').nth(1).unwrap_or("")
}

// =============================================================================
// Tests
// =============================================================================
