//! Cache behavior integration tests.
//!
//! Tests verify:
//! - A miss renders once and stores the image under the derived key
//! - A hit is served from the store without rendering
//! - Store outages degrade to rendering rather than failing requests

use axum::http::StatusCode;
use http_body_util::BodyExt;
use tower::ServiceExt;

use og_image_server::token::Claims;

use super::test_utils::{
    image_request, is_png, sign_claims, test_router, MockBrowser, TrackingStore,
};

// =============================================================================
// Miss and Hit
// =============================================================================

#[tokio::test]
async fn test_miss_renders_and_stores() {
    let store = TrackingStore::new();
    let browser = MockBrowser::new();
    let router = test_router(store.clone(), browser.clone());

    let token = sign_claims(&Claims::new("Hello World!"));
    let response = router.oneshot(image_request(&token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-image-cache-hit").unwrap(), "false");
    let body = response.into_body().collect().await.unwrap().to_bytes();

    assert_eq!(browser.render_count(), 1);
    assert_eq!(store.put_count(), 1);

    // Stored before the response was returned, under the sanitized key
    let stored = store.stored("Hello-World-.png").await.unwrap();
    assert_eq!(stored, body);
}

#[tokio::test]
async fn test_second_request_is_cache_hit() {
    let store = TrackingStore::new();
    let browser = MockBrowser::new();
    let router = test_router(store.clone(), browser.clone());

    let token = sign_claims(&Claims::new("Hello"));

    let first = router.clone().oneshot(image_request(&token)).await.unwrap();
    assert_eq!(first.headers().get("x-image-cache-hit").unwrap(), "false");

    let second = router.oneshot(image_request(&token)).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.headers().get("x-image-cache-hit").unwrap(), "true");
    assert_eq!(
        second.headers().get("cache-control").unwrap(),
        "public, max-age=14400"
    );

    // Only the first request rendered
    assert_eq!(browser.render_count(), 1);
    assert_eq!(store.put_count(), 1);
    assert_eq!(store.get_count(), 2);
}

#[tokio::test]
async fn test_seeded_entry_never_renders() {
    let store = TrackingStore::new();
    store.seed("Hello___World.png", b"\x89PNGseeded").await;

    let browser = MockBrowser::new();
    let router = test_router(store.clone(), browser.clone());

    let token = sign_claims(&Claims::new("Hello").with_description("World"));
    let response = router.oneshot(image_request(&token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-image-cache-hit").unwrap(), "true");

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"\x89PNGseeded");

    assert_eq!(browser.render_count(), 0);
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_colliding_claims_share_an_entry() {
    let store = TrackingStore::new();
    let browser = MockBrowser::new();
    let router = test_router(store.clone(), browser.clone());

    // Both sanitize to "a-b.png"
    let first = sign_claims(&Claims::new("a b"));
    let second = sign_claims(&Claims::new("a!b"));

    let response = router.clone().oneshot(image_request(&first)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router.oneshot(image_request(&second)).await.unwrap();
    assert_eq!(response.headers().get("x-image-cache-hit").unwrap(), "true");
    assert_eq!(browser.render_count(), 1);
}

#[tokio::test]
async fn test_empty_description_shares_title_only_entry() {
    let store = TrackingStore::new();
    let browser = MockBrowser::new();
    let router = test_router(store.clone(), browser.clone());

    let bare = sign_claims(&Claims::new("Hello"));
    let empty = sign_claims(&Claims::new("Hello").with_description(""));

    router.clone().oneshot(image_request(&bare)).await.unwrap();
    let response = router.oneshot(image_request(&empty)).await.unwrap();

    assert_eq!(response.headers().get("x-image-cache-hit").unwrap(), "true");
    assert!(store.contains("Hello.png").await);
    assert!(!store.contains("Hello___.png").await);
    assert_eq!(browser.render_count(), 1);
}

#[tokio::test]
async fn test_distinct_descriptions_render_separately() {
    let store = TrackingStore::new();
    let browser = MockBrowser::new();
    let router = test_router(store.clone(), browser.clone());

    let a = sign_claims(&Claims::new("Post").with_description("Part 1"));
    let b = sign_claims(&Claims::new("Post").with_description("Part 2"));

    let body_a = router
        .clone()
        .oneshot(image_request(&a))
        .await
        .unwrap()
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes();
    let body_b = router
        .oneshot(image_request(&b))
        .await
        .unwrap()
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes();

    assert_ne!(body_a, body_b);
    assert!(store.contains("Post___Part-1.png").await);
    assert!(store.contains("Post___Part-2.png").await);
    assert_eq!(browser.render_count(), 2);
}

// =============================================================================
// Store Outages
// =============================================================================

#[tokio::test]
async fn test_read_failure_falls_back_to_render() {
    let store = TrackingStore::new().failing_reads();
    let browser = MockBrowser::new();
    let router = test_router(store.clone(), browser.clone());

    let token = sign_claims(&Claims::new("Hello"));
    let response = router.oneshot(image_request(&token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-image-cache-hit").unwrap(), "false");

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(is_png(&body));

    assert_eq!(browser.render_count(), 1);
    assert_eq!(store.put_count(), 1);
}

#[tokio::test]
async fn test_write_failure_still_returns_image() {
    let store = TrackingStore::new().failing_writes();
    let browser = MockBrowser::new();
    let router = test_router(store.clone(), browser.clone());

    let token = sign_claims(&Claims::new("Hello"));

    let response = router.clone().oneshot(image_request(&token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(is_png(&body));

    assert_eq!(store.put_count(), 1);
    assert!(!store.contains("Hello.png").await);

    // Nothing was stored, so the next request renders again
    let response = router.oneshot(image_request(&token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(browser.render_count(), 2);
}
