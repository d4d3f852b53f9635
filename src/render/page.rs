//! Rendering of card pages into PNG screenshots.

use std::time::Duration;

use bytes::Bytes;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, warn};
use url::Url;

use super::{Browser, BrowserSession, ColorScheme, Viewport};
use crate::error::RenderError;
use crate::token::Claims;

/// Default time budget for one render attempt, including session setup.
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of render attempts (1 = no retry).
pub const DEFAULT_RENDER_ATTEMPTS: u32 = 1;

/// Upper bound on releasing a session after a render.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Renders the card page for a set of claims.
///
/// Each attempt runs in its own session:
///
/// ```text
/// open_session → light color scheme → 1200×630 viewport → navigate
///              → network idle → screenshot → close
/// ```
///
/// `close` runs on every exit path of an attempt, including errors and
/// timeouts.
pub struct PageRenderer<B: Browser> {
    browser: B,

    /// Base URL of the card page; claims are appended as query parameters
    page_url: Url,

    /// Time budget per attempt
    timeout: Duration,

    /// Whole-render attempts before giving up
    attempts: u32,
}

impl<B: Browser> PageRenderer<B> {
    /// Create a renderer with the default timeout and no retries.
    pub fn new(browser: B, page_url: Url) -> Self {
        Self {
            browser,
            page_url,
            timeout: DEFAULT_RENDER_TIMEOUT,
            attempts: DEFAULT_RENDER_ATTEMPTS,
        }
    }

    /// Set the time budget for each attempt.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the number of attempts. Values below 1 are treated as 1.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// The page URL for `claims`.
    ///
    /// `title` is always appended; `description` only when non-empty. Values
    /// are form-urlencoded.
    pub fn target_url(&self, claims: &Claims) -> Url {
        let mut url = self.page_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("title", &claims.title);
            if let Some(description) = claims.effective_description() {
                query.append_pair("description", description);
            }
        }
        url
    }

    /// Render the card for `claims` and return the PNG bytes.
    pub async fn capture(&self, claims: &Claims) -> Result<Bytes, RenderError> {
        let url = self.target_url(claims);
        let mut attempt = 1;

        loop {
            match self.capture_once(&url).await {
                Ok(png) => {
                    debug!(url = %url, attempt = attempt, bytes = png.len(), "Rendered page");
                    return Ok(png);
                }
                Err(e) if attempt < self.attempts => {
                    warn!(url = %url, attempt = attempt, "Render failed, retrying: {}", e);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn capture_once(&self, url: &Url) -> Result<Bytes, RenderError> {
        let deadline = Instant::now() + self.timeout;

        let mut session = timeout_at(deadline, self.browser.open_session())
            .await
            .map_err(|_| RenderError::Timeout(self.timeout))??;

        let result = match timeout_at(deadline, drive(&mut session, url)).await {
            Ok(result) => result,
            Err(_) => Err(RenderError::Timeout(self.timeout)),
        };

        match timeout(CLOSE_TIMEOUT, session.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed to close browser session: {}", e),
            Err(_) => warn!("Timed out closing browser session"),
        }

        result
    }
}

async fn drive<S: BrowserSession>(session: &mut S, url: &Url) -> Result<Bytes, RenderError> {
    session.emulate_color_scheme(ColorScheme::Light).await?;
    session.set_viewport(Viewport::OPEN_GRAPH).await?;
    session.navigate(url).await?;
    session.wait_for_network_idle().await?;
    session.screenshot_png().await
}

// =============================================================================
// Tests
// =============================================================================
