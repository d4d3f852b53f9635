//! Page rendering via a headless browser.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              PageRenderer               │
//! │  (target URL, timeout, retries,         │
//! │   guaranteed session release)           │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │     Browser / BrowserSession traits     │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │             ChromeBrowser               │
//! │   (remote Chrome over DevTools/CDP)     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! A session is exclusively owned by one render. [`PageRenderer`] always
//! closes it, whether the render succeeds, fails or times out.

mod chrome;
mod page;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::error::RenderError;

pub use chrome::{ChromeBrowser, ChromeSession};
pub use page::{PageRenderer, DEFAULT_RENDER_ATTEMPTS, DEFAULT_RENDER_TIMEOUT};

// =============================================================================
// Render Settings
// =============================================================================

/// Viewport size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
}

impl Viewport {
    /// The Open Graph card size: 1200×630 at scale factor 1.
    pub const OPEN_GRAPH: Viewport = Viewport {
        width: 1200,
        height: 630,
        device_scale_factor: 1.0,
    };
}

/// Value for the `prefers-color-scheme` media feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    Light,
}

impl ColorScheme {
    /// The media feature value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorScheme::Light => "light",
        }
    }
}

// =============================================================================
// Browser Traits
// =============================================================================

/// A source of browser sessions.
#[async_trait]
pub trait Browser: Send + Sync {
    /// The session type this browser hands out.
    type Session: BrowserSession + 'static;

    /// Acquire a fresh session with a single blank page.
    async fn open_session(&self) -> Result<Self::Session, RenderError>;
}

/// One page in a browser, used for a single render.
///
/// Methods are called in declaration order. `close` releases the session and
/// must be safe to call more than once.
#[async_trait]
pub trait BrowserSession: Send {
    async fn emulate_color_scheme(&mut self, scheme: ColorScheme) -> Result<(), RenderError>;

    async fn set_viewport(&mut self, viewport: Viewport) -> Result<(), RenderError>;

    /// Navigate to `url` and wait for its load event.
    async fn navigate(&mut self, url: &Url) -> Result<(), RenderError>;

    /// Wait until the page has had no network activity for a quiet period.
    async fn wait_for_network_idle(&mut self) -> Result<(), RenderError>;

    /// Capture the viewport as PNG.
    async fn screenshot_png(&mut self) -> Result<Bytes, RenderError>;

    async fn close(&mut self) -> Result<(), RenderError>;
}
