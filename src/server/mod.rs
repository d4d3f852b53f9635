//! HTTP server layer for the image service.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │                    ANY /{token}  ·  GET /health                 │
//! │                                                                 │
//! │  ┌─────────────┐  ┌──────────────────┐  ┌──────────────────┐    │
//! │  │  handlers   │  │      auth        │  │      routes      │    │
//! │  │ (image,     │  │ (token → claims  │  │ (router config,  │    │
//! │  │  health)    │  │  extractor)      │  │  CORS, tracing)  │    │
//! │  └─────────────┘  └──────────────────┘  └──────────────────┘    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::{token_from_path, TokenRejection, VerifiedClaims};
pub use handlers::{
    health_handler, image_handler, AppState, HealthResponse, DEFAULT_CACHE_MAX_AGE,
};
pub use routes::{create_router, RouterConfig};
