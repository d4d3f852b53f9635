//! Render failure integration tests.
//!
//! Tests verify:
//! - Render failures map to 502 and timeouts to 504
//! - Failed renders store nothing
//! - Retries recover from transient failures
//! - Every opened browser session is closed

use std::time::Duration;

use axum::http::StatusCode;
use http_body_util::BodyExt;
use tower::ServiceExt;

use og_image_server::render::PageRenderer;
use og_image_server::token::Claims;

use super::test_utils::{
    image_request, sign_claims, test_page_url, test_router, test_router_with_renderer,
    MockBehavior, MockBrowser, TrackingStore,
};

#[tokio::test]
async fn test_render_failure_is_bad_gateway() {
    let store = TrackingStore::new();
    let browser = MockBrowser::with_behavior(MockBehavior::FailNavigation(usize::MAX));
    let router = test_router(store.clone(), browser.clone());

    let token = sign_claims(&Claims::new("Hello"));
    let response = router.oneshot(image_request(&token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"Bad Gateway");

    // Nothing stored, session still released
    assert_eq!(store.put_count(), 0);
    assert_eq!(browser.render_count(), 1);
    assert_eq!(browser.close_count(), 1);
}

#[tokio::test]
async fn test_render_timeout_is_gateway_timeout() {
    let store = TrackingStore::new();
    let browser = MockBrowser::with_behavior(MockBehavior::HangOnScreenshot);
    let renderer =
        PageRenderer::new(browser.clone(), test_page_url()).with_timeout(Duration::from_millis(50));
    let router = test_router_with_renderer(store.clone(), renderer);

    let token = sign_claims(&Claims::new("Hello"));
    let response = router.oneshot(image_request(&token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"Gateway Timeout");

    assert_eq!(store.put_count(), 0);
    assert_eq!(browser.close_count(), 1);
}

#[tokio::test]
async fn test_retry_recovers_from_transient_failure() {
    let store = TrackingStore::new();
    let browser = MockBrowser::with_behavior(MockBehavior::FailNavigation(1));
    let renderer = PageRenderer::new(browser.clone(), test_page_url()).with_attempts(3);
    let router = test_router_with_renderer(store.clone(), renderer);

    let token = sign_claims(&Claims::new("Hello"));
    let response = router.oneshot(image_request(&token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // One failed attempt, one successful attempt
    assert_eq!(browser.render_count(), 2);
    assert_eq!(browser.close_count(), 2);
    assert_eq!(store.put_count(), 1);
}

#[tokio::test]
async fn test_retries_exhausted() {
    let store = TrackingStore::new();
    let browser = MockBrowser::with_behavior(MockBehavior::FailNavigation(usize::MAX));
    let renderer = PageRenderer::new(browser.clone(), test_page_url()).with_attempts(2);
    let router = test_router_with_renderer(store, renderer);

    let token = sign_claims(&Claims::new("Hello"));
    let response = router.oneshot(image_request(&token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    assert_eq!(browser.render_count(), 2);
    assert_eq!(browser.close_count(), 2);
}

#[tokio::test]
async fn test_sessions_closed_across_mixed_requests() {
    let store = TrackingStore::new();
    let browser = MockBrowser::with_behavior(MockBehavior::FailNavigation(2));
    let router = test_router(store, browser.clone());

    for title in ["One", "Two", "Three", "Four"] {
        let token = sign_claims(&Claims::new(title));
        let _ = router.clone().oneshot(image_request(&token)).await.unwrap();
    }

    assert_eq!(browser.render_count(), 4);
    assert_eq!(browser.close_count(), browser.render_count());
}
