//! Image service layer.
//!
//! The image service sits between the HTTP layer and the store/renderer:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │ Claims
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              ImageService               │
//! │   CacheKey → ImageStore → PageRenderer  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`ImageService`]: lookup, render on miss, write back
//! - [`CacheKey`]: sanitized key derived from the claims
//! - [`ImageResponse`]: image bytes plus cache metadata

mod key;
mod service;

pub use key::{sanitize, CacheKey};
pub use service::{ImageResponse, ImageService};
