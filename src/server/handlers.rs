//! HTTP request handlers for the image API.
//!
//! # Endpoints
//!
//! - `ANY /{token}` - Serve the card image for a signed token (router fallback)
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{FromRef, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::error::RenderError;
use crate::image::ImageService;
use crate::render::Browser;
use crate::store::ImageStore;
use crate::token::TokenAuth;

use super::auth::VerifiedClaims;

/// Default Cache-Control max-age in seconds (4 hours).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 14_400;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<S: ImageStore, B: Browser> {
    /// The image service for lookups and renders
    pub image_service: Arc<ImageService<S, B>>,

    /// Token verifier for the request path
    pub auth: TokenAuth,

    /// Cache-Control max-age in seconds for image responses
    pub cache_max_age: u32,
}

impl<S: ImageStore, B: Browser> AppState<S, B> {
    /// Create a new application state with the default cache max-age.
    pub fn new(image_service: ImageService<S, B>, auth: TokenAuth) -> Self {
        Self {
            image_service: Arc::new(image_service),
            auth,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
        }
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, cache_max_age: u32) -> Self {
        self.cache_max_age = cache_max_age;
        self
    }
}

impl<S: ImageStore, B: Browser> Clone for AppState<S, B> {
    fn clone(&self) -> Self {
        Self {
            image_service: Arc::clone(&self.image_service),
            auth: self.auth.clone(),
            cache_max_age: self.cache_max_age,
        }
    }
}

impl<S: ImageStore, B: Browser> FromRef<AppState<S, B>> for TokenAuth {
    fn from_ref(state: &AppState<S, B>) -> Self {
        state.auth.clone()
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert RenderError to HTTP response.
///
/// Render failures are upstream failures: the browser or the card page
/// misbehaved. Timeouts map to 504, everything else to 502.
impl IntoResponse for RenderError {
    fn into_response(self) -> Response {
        let (status, error_type, body) = match &self {
            RenderError::Timeout(_) => (
                StatusCode::GATEWAY_TIMEOUT,
                "render_timeout",
                "Gateway Timeout",
            ),
            RenderError::Session(_) => (StatusCode::BAD_GATEWAY, "browser_session", "Bad Gateway"),
            RenderError::Configure(_) => (StatusCode::BAD_GATEWAY, "page_configure", "Bad Gateway"),
            RenderError::Navigation(_) => (StatusCode::BAD_GATEWAY, "navigation", "Bad Gateway"),
            RenderError::NetworkIdle(_) => (StatusCode::BAD_GATEWAY, "network_idle", "Bad Gateway"),
            RenderError::Capture(_) => (StatusCode::BAD_GATEWAY, "capture", "Bad Gateway"),
        };

        error!(
            error_type = error_type,
            status = status.as_u16(),
            "Render failed: {}",
            self
        );

        (status, body).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle image requests.
///
/// # Endpoint
///
/// `ANY /{token}[/...]`: every path not claimed by another route
///
/// # Response
///
/// - `200 OK`: PNG image
/// - `400 Bad Request`: token verified but claims are invalid (body `Bad Request`)
/// - `401 Unauthorized`: token missing or failed verification (body `Unauthorized`)
/// - `502 Bad Gateway`: rendering failed
/// - `504 Gateway Timeout`: rendering timed out
///
/// # Headers
///
/// - `Content-Type: image/png`
/// - `Cache-Control: public, max-age={cache_max_age}`
/// - `X-Image-Cache-Hit: true|false`
pub async fn image_handler<S, B>(
    State(state): State<AppState<S, B>>,
    VerifiedClaims(claims): VerifiedClaims,
) -> Result<Response, RenderError>
where
    S: ImageStore + 'static,
    B: Browser + 'static,
{
    let response = state.image_service.get_or_render(&claims).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (
                header::CACHE_CONTROL,
                format!("public, max-age={}", state.cache_max_age),
            ),
            (
                header::HeaderName::from_static("x-image-cache-hit"),
                response.cache_hit.to_string(),
            ),
        ],
        response.data,
    )
        .into_response())
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
