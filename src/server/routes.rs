//! Router configuration for the image server.
//!
//! # Route Structure
//!
//! ```text
//! GET /health    - Health check (public; other methods fall through)
//! /{token}[/…]   - Card image (token-authenticated, router fallback, any method)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use og_image_server::image::ImageService;
//! use og_image_server::server::{create_router, RouterConfig};
//!
//! let service = ImageService::new(store, renderer);
//! let config = RouterConfig::new("my-secret-key")
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(service, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{routing::get, Router};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{health_handler, image_handler, AppState, DEFAULT_CACHE_MAX_AGE};
use crate::image::ImageService;
use crate::render::Browser;
use crate::store::ImageStore;
use crate::token::TokenAuth;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Shared secret for token verification
    pub token_secret: String,

    /// Clock tolerance for token `exp` / `nbf`
    pub token_leeway: Duration,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a new router configuration with the given token secret.
    ///
    /// By default:
    /// - No clock leeway
    /// - CORS allows any origin
    /// - Cache max-age is 4 hours (14400 seconds)
    /// - Tracing is enabled
    pub fn new(token_secret: impl Into<String>) -> Self {
        Self {
            token_secret: token_secret.into(),
            token_leeway: Duration::ZERO,
            cors_origins: None,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            enable_tracing: true,
        }
    }

    /// Set the clock tolerance for token expiry checks.
    pub fn with_token_leeway(mut self, leeway: Duration) -> Self {
        self.token_leeway = leeway;
        self
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// The image handler is installed as the fallback, so every request other
/// than `GET /health` is treated as `/{token}`, including other methods on
/// `/health`.
pub fn create_router<S, B>(image_service: ImageService<S, B>, config: RouterConfig) -> Router
where
    S: ImageStore + 'static,
    B: Browser + 'static,
{
    let auth = TokenAuth::new(&config.token_secret).with_leeway(config.token_leeway);
    let app_state =
        AppState::new(image_service, auth).with_cache_max_age(config.cache_max_age);

    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route(
            "/health",
            get(health_handler).fallback(image_handler::<S, B>),
        )
        .fallback(image_handler::<S, B>)
        .with_state(app_state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
