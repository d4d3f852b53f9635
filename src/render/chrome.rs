//! Chrome DevTools Protocol backend.
//!
//! Sessions connect to a remote Chrome (a browserless container, or
//! `chrome --headless --remote-debugging-port=9222`) over its DevTools
//! WebSocket. Each session owns its own connection, a browser context created
//! with `disposeOnDetach`, and one page in that context.
//!
//! The connection lives exactly as long as the session's [`HandlerTask`]:
//! dropping the session at any point (closed, timed out, or cancelled
//! mid-setup) aborts the task, which closes the socket, and Chrome then
//! disposes the context together with its page.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chromiumoxide::browser::Browser as CdpBrowser;
use chromiumoxide::cdp::browser_protocol::emulation::{
    MediaFeature, SetDeviceMetricsOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, EventLifecycleEvent, FrameId, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;
use url::Url;

use super::{Browser, BrowserSession, ColorScheme, Viewport};
use crate::error::RenderError;

/// Lifecycle event Chrome emits once a document has had no network
/// connections for 500ms.
const NETWORK_IDLE_EVENT: &str = "networkIdle";

/// Lifecycle event marking the start of a new document.
const DOCUMENT_INIT_EVENT: &str = "init";

// =============================================================================
// Chrome Browser
// =============================================================================

/// A remote Chrome reachable over the DevTools protocol.
#[derive(Debug, Clone)]
pub struct ChromeBrowser {
    /// DevTools endpoint (`ws://…/devtools/browser/…` or `http://host:9222`)
    endpoint: String,
}

impl ChromeBrowser {
    /// Create a browser handle for the given DevTools endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// Get the DevTools endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Browser for ChromeBrowser {
    type Session = ChromeSession;

    async fn open_session(&self) -> Result<ChromeSession, RenderError> {
        let (browser, mut handler) = CdpBrowser::connect(self.endpoint.clone())
            .await
            .map_err(|e| RenderError::Session(e.to_string()))?;

        // Owned from here on: if this future is dropped before the session
        // is built, the connection goes with it.
        let handler_task = HandlerTask(tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("DevTools handler error: {}", e);
                }
            }
        }));

        let context_id = browser
            .execute(
                CreateBrowserContextParams::builder()
                    .dispose_on_detach(true)
                    .build(),
            )
            .await
            .map_err(|e| RenderError::Session(e.to_string()))?
            .result
            .browser_context_id;

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(RenderError::Session)?;

        let page = browser
            .new_page(target)
            .await
            .map_err(|e| RenderError::Session(e.to_string()))?;

        debug!(endpoint = %self.endpoint, "Opened browser session");

        Ok(ChromeSession {
            page: Some(page),
            context_id,
            lifecycle: None,
            main_frame: None,
            browser,
            _handler_task: handler_task,
        })
    }
}

// =============================================================================
// Chrome Session
// =============================================================================

/// The task polling a session's DevTools connection. Aborted on drop.
struct HandlerTask(JoinHandle<()>);

impl Drop for HandlerTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A single page in a dedicated browser context on a dedicated connection.
///
/// `close` disposes the context explicitly. A session dropped without `close`
/// (for example because the request future was cancelled mid-render) drops
/// its connection, and Chrome disposes the context on detach.
pub struct ChromeSession {
    page: Option<Page>,
    context_id: BrowserContextId,

    /// Lifecycle events, subscribed before navigation
    lifecycle: Option<BoxStream<'static, Arc<EventLifecycleEvent>>>,

    /// Main frame of the navigated document
    main_frame: Option<FrameId>,

    browser: CdpBrowser,

    // Declared last so the connection outlives the handles above.
    _handler_task: HandlerTask,
}

impl ChromeSession {
    fn page(&self) -> Result<Page, RenderError> {
        self.page
            .clone()
            .ok_or_else(|| RenderError::Session("session is closed".to_string()))
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn emulate_color_scheme(&mut self, scheme: ColorScheme) -> Result<(), RenderError> {
        self.page()?
            .emulate_media_features(vec![MediaFeature::new(
                "prefers-color-scheme",
                scheme.as_str(),
            )])
            .await
            .map_err(|e| RenderError::Configure(e.to_string()))?;
        Ok(())
    }

    async fn set_viewport(&mut self, viewport: Viewport) -> Result<(), RenderError> {
        let params = SetDeviceMetricsOverrideParams::new(
            i64::from(viewport.width),
            i64::from(viewport.height),
            viewport.device_scale_factor,
            false,
        );

        self.page()?
            .execute(params)
            .await
            .map_err(|e| RenderError::Configure(e.to_string()))?;
        Ok(())
    }

    async fn navigate(&mut self, url: &Url) -> Result<(), RenderError> {
        let page = self.page()?;

        page.execute(SetLifecycleEventsEnabledParams::new(true))
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        // Subscribe first so no event of the new document is missed
        let events = page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;
        self.lifecycle = Some(events.boxed());

        page.goto(url.as_str())
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        self.main_frame = page
            .mainframe()
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        Ok(())
    }

    async fn wait_for_network_idle(&mut self) -> Result<(), RenderError> {
        let events = self
            .lifecycle
            .as_mut()
            .ok_or_else(|| RenderError::NetworkIdle("page was never navigated".to_string()))?;

        let mut document_started = false;
        while let Some(event) = events.next().await {
            if let Some(main_frame) = &self.main_frame {
                if &event.frame_id != main_frame {
                    continue;
                }
            }

            match event.name.as_str() {
                DOCUMENT_INIT_EVENT => document_started = true,
                NETWORK_IDLE_EVENT if document_started => return Ok(()),
                _ => {}
            }
        }

        Err(RenderError::NetworkIdle(
            "browser connection closed".to_string(),
        ))
    }

    async fn screenshot_png(&mut self) -> Result<Bytes, RenderError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();

        let png = self
            .page()?
            .screenshot(params)
            .await
            .map_err(|e| RenderError::Capture(e.to_string()))?;

        Ok(Bytes::from(png))
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.lifecycle = None;

        // Disposing the context closes its page
        if self.page.take().is_none() {
            return Ok(());
        }

        self.browser
            .execute(DisposeBrowserContextParams::new(self.context_id.clone()))
            .await
            .map_err(|e| RenderError::Session(e.to_string()))?;

        Ok(())
    }
}
