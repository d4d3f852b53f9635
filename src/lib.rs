//! # OG Image Server
//!
//! An HTTP service that turns signed tokens into Open Graph card images.
//!
//! A request path carries a JWT (`GET /{token}`) whose claims hold the card's
//! `title` and optional `description`. The server verifies the token, derives
//! a deterministic cache key from the claims and either returns the cached
//! PNG or renders the card page in headless Chrome, stores the screenshot
//! and returns it.
//!
//! ## Features
//!
//! - **Signed requests**: HS256/HS384/HS512 JWT verification with `exp`/`nbf` checks
//! - **Render-once caching**: PNGs are stored in S3 (or memory) under a key derived from the claims
//! - **Headless rendering**: 1200×630 light-mode screenshots via the Chrome DevTools protocol
//! - **Bounded renders**: per-attempt deadlines, optional retries, guaranteed session cleanup
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`token`] - JWT verification, signing and claim validation
//! - [`image`] - Cache keys and the lookup-or-render service
//! - [`store`] - Image storage backends (S3, memory)
//! - [`render`] - Browser abstraction, Chrome backend and page renderer
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use og_image_server::{
//!     create_router, ChromeBrowser, ImageService, MemoryImageStore, PageRenderer, RouterConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let page_url = url::Url::parse("https://example.com/og-image").unwrap();
//!     let renderer = PageRenderer::new(ChromeBrowser::new("ws://localhost:3001"), page_url);
//!     let service = ImageService::new(MemoryImageStore::new(), renderer);
//!
//!     let router = create_router(service, RouterConfig::new("my-secret-key"));
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod image;
pub mod render;
pub mod server;
pub mod store;
pub mod token;

// Re-export commonly used types
pub use config::{Cli, Command, ServeConfig, SignConfig, SignOutputFormat};
pub use error::{ClaimsError, RenderError, StoreError, TokenError};
pub use image::{sanitize, CacheKey, ImageResponse, ImageService};
pub use render::{
    Browser, BrowserSession, ChromeBrowser, ChromeSession, ColorScheme, PageRenderer, Viewport,
    DEFAULT_RENDER_ATTEMPTS, DEFAULT_RENDER_TIMEOUT,
};
pub use server::{
    create_router, health_handler, image_handler, token_from_path, AppState, HealthResponse,
    RouterConfig, TokenRejection, VerifiedClaims, DEFAULT_CACHE_MAX_AGE,
};
pub use store::{create_s3_client, ImageStore, MemoryImageStore, S3ImageStore};
pub use token::{Algorithm, Claims, TokenAuth};
