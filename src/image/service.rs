//! Image Service for serving cached or freshly rendered cards.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       ImageService                          │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │                  get_or_render()                      │  │
//! │  │  1. Derive cache key    3. Render on miss             │  │
//! │  │  2. Check store         4. Store & return             │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! │           │                                 │               │
//! │           ▼                                 ▼               │
//! │    ┌────────────┐                   ┌──────────────┐        │
//! │    │ ImageStore │                   │ PageRenderer │        │
//! │    └────────────┘                   └──────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use bytes::Bytes;
use tracing::{debug, error, info, warn};

use crate::error::RenderError;
use crate::render::{Browser, PageRenderer};
use crate::store::ImageStore;
use crate::token::Claims;

use super::key::CacheKey;

/// Response from the image service.
#[derive(Debug, Clone)]
pub struct ImageResponse {
    /// PNG bytes
    pub data: Bytes,

    /// Whether the image was served from the store
    pub cache_hit: bool,

    /// Key the image is stored under
    pub key: CacheKey,
}

/// Service that returns the card image for a set of claims.
///
/// Store failures never fail a request: a read error is treated as a miss and
/// a write error is logged while the rendered image is still returned. Render
/// failures propagate to the caller.
///
/// # Example
///
/// ```ignore
/// use og_image_server::image::ImageService;
/// use og_image_server::render::{ChromeBrowser, PageRenderer};
/// use og_image_server::store::MemoryImageStore;
///
/// let renderer = PageRenderer::new(ChromeBrowser::new("ws://localhost:3001"), page_url);
/// let service = ImageService::new(MemoryImageStore::new(), renderer);
///
/// let response = service.get_or_render(&Claims::new("Hello")).await?;
/// println!("{} bytes, cache hit: {}", response.data.len(), response.cache_hit);
/// ```
pub struct ImageService<S: ImageStore, B: Browser> {
    store: S,
    renderer: PageRenderer<B>,
}

impl<S: ImageStore, B: Browser> ImageService<S, B> {
    /// Create a new image service.
    pub fn new(store: S, renderer: PageRenderer<B>) -> Self {
        Self { store, renderer }
    }

    /// Get the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the renderer.
    pub fn renderer(&self) -> &PageRenderer<B> {
        &self.renderer
    }

    /// Return the stored image for `claims`, rendering and storing it on a miss.
    ///
    /// The store write completes before this returns.
    pub async fn get_or_render(&self, claims: &Claims) -> Result<ImageResponse, RenderError> {
        let key = CacheKey::from_claims(claims);

        match self.store.get(key.as_str()).await {
            Ok(Some(data)) => {
                debug!(key = %key, bytes = data.len(), "Cache hit");
                return Ok(ImageResponse {
                    data,
                    cache_hit: true,
                    key,
                });
            }
            Ok(None) => debug!(key = %key, "Cache miss"),
            Err(e) => warn!(key = %key, "Cache read failed, rendering instead: {}", e),
        }

        let data = self.renderer.capture(claims).await?;

        match self.store.put(key.as_str(), data.clone()).await {
            Ok(()) => info!(key = %key, bytes = data.len(), "Rendered and stored image"),
            Err(e) => error!(key = %key, "Failed to store rendered image: {}", e),
        }

        Ok(ImageResponse {
            data,
            cache_hit: false,
            key,
        })
    }
}
