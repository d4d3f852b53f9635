//! Authentication and claim validation integration tests.
//!
//! Tests verify:
//! - Valid tokens are accepted
//! - Forged, malformed, missing and expired tokens get 401
//! - Verified tokens with unusable claims get 400
//! - Rejected requests never touch the store or the browser

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use og_image_server::token::{Algorithm, Claims, TokenAuth};

use super::test_utils::{
    image_request, sign_claims, sign_json, test_router, MockBrowser, TrackingStore,
};

/// Assert a rejection's status and exact plain-text body.
async fn assert_rejected(response: Response, status: StatusCode, body: &str) {
    assert_eq!(response.status(), status);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(std::str::from_utf8(&bytes).unwrap(), body);
}

// =============================================================================
// Valid Tokens
// =============================================================================

#[tokio::test]
async fn test_valid_token_all_algorithms() {
    let store = TrackingStore::new();
    let browser = MockBrowser::new();
    let router = test_router(store, browser);

    let auth = TokenAuth::new(super::test_utils::TEST_SECRET);
    for alg in [Algorithm::Hs256, Algorithm::Hs384, Algorithm::Hs512] {
        let payload = json!({ "title": format!("Card {}", alg.name()) });
        let token = auth.sign_payload(payload.as_object().unwrap(), alg);

        let response = router.clone().oneshot(image_request(&token)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "alg: {}", alg.name());
    }
}

#[tokio::test]
async fn test_unexpired_token_accepted() {
    let store = TrackingStore::new();
    let browser = MockBrowser::new();
    let router = test_router(store, browser);

    let token = TokenAuth::new(super::test_utils::TEST_SECRET).sign(
        &Claims::new("Hello"),
        Some(std::time::Duration::from_secs(3600)),
    );

    let response = router.oneshot(image_request(&token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Unauthorized
// =============================================================================

#[tokio::test]
async fn test_wrong_secret_rejected() {
    let store = TrackingStore::new();
    let browser = MockBrowser::new();
    let router = test_router(store.clone(), browser.clone());

    let token = TokenAuth::new("some-other-secret").sign(&Claims::new("Hello"), None);

    let response = router.oneshot(image_request(&token)).await.unwrap();
    assert_rejected(response, StatusCode::UNAUTHORIZED, "Unauthorized").await;

    // Rejected before any lookup or render
    assert_eq!(store.get_count(), 0);
    assert_eq!(browser.render_count(), 0);
}

#[tokio::test]
async fn test_missing_token_rejected() {
    let store = TrackingStore::new();
    let browser = MockBrowser::new();
    let router = test_router(store.clone(), browser.clone());

    for uri in ["/", "//", "/?title=Hello"] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_rejected(response, StatusCode::UNAUTHORIZED, "Unauthorized").await;
    }

    assert_eq!(store.get_count(), 0);
    assert_eq!(browser.render_count(), 0);
}

#[tokio::test]
async fn test_malformed_token_rejected() {
    let store = TrackingStore::new();
    let browser = MockBrowser::new();
    let router = test_router(store, browser);

    for token in ["not-a-token", "a.b", "a.b.c", "....", "eyJhbGciOiJIUzI1NiJ9.e30."] {
        let response = router.clone().oneshot(image_request(token)).await.unwrap();
        assert_rejected(response, StatusCode::UNAUTHORIZED, "Unauthorized").await;
    }
}

#[tokio::test]
async fn test_tampered_payload_rejected() {
    let store = TrackingStore::new();
    let browser = MockBrowser::new();
    let router = test_router(store, browser.clone());

    let genuine = sign_claims(&Claims::new("Hello"));
    let forged = sign_claims(&Claims::new("Goodbye"));

    // Genuine header and signature around another token's payload
    let genuine_parts: Vec<&str> = genuine.split('.').collect();
    let forged_parts: Vec<&str> = forged.split('.').collect();
    let tampered = format!(
        "{}.{}.{}",
        genuine_parts[0], forged_parts[1], genuine_parts[2]
    );

    let response = router.oneshot(image_request(&tampered)).await.unwrap();
    assert_rejected(response, StatusCode::UNAUTHORIZED, "Unauthorized").await;
    assert_eq!(browser.render_count(), 0);
}

#[tokio::test]
async fn test_unsigned_token_rejected() {
    let store = TrackingStore::new();
    let browser = MockBrowser::new();
    let router = test_router(store, browser);

    // {"alg":"none","typ":"JWT"} . {"title":"Hello"} . (empty)
    let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.eyJ0aXRsZSI6IkhlbGxvIn0.";

    let response = router.oneshot(image_request(token)).await.unwrap();
    assert_rejected(response, StatusCode::UNAUTHORIZED, "Unauthorized").await;
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let store = TrackingStore::new();
    let browser = MockBrowser::new();
    let router = test_router(store.clone(), browser.clone());

    let token = sign_json(json!({ "title": "Hello", "exp": 1_000_000_000 }));

    let response = router.oneshot(image_request(&token)).await.unwrap();
    assert_rejected(response, StatusCode::UNAUTHORIZED, "Unauthorized").await;

    assert_eq!(store.get_count(), 0);
    assert_eq!(browser.render_count(), 0);
}

#[tokio::test]
async fn test_not_yet_valid_token_rejected() {
    let store = TrackingStore::new();
    let browser = MockBrowser::new();
    let router = test_router(store, browser);

    let token = sign_json(json!({ "title": "Hello", "nbf": 32_503_680_000u64 }));

    let response = router.oneshot(image_request(&token)).await.unwrap();
    assert_rejected(response, StatusCode::UNAUTHORIZED, "Unauthorized").await;
}

// =============================================================================
// Bad Request
// =============================================================================

#[tokio::test]
async fn test_invalid_claims_rejected() {
    let store = TrackingStore::new();
    let browser = MockBrowser::new();
    let router = test_router(store.clone(), browser.clone());

    let payloads = [
        json!({}),
        json!({ "description": "no title" }),
        json!({ "title": 42 }),
        json!({ "title": null }),
        json!({ "title": ["Hello"] }),
        json!({ "title": "" }),
        json!({ "title": "Hello", "description": 7 }),
        json!({ "title": "Hello", "description": null }),
        json!({ "title": "Hello", "description": { "text": "nested" } }),
    ];

    for payload in payloads {
        let token = sign_json(payload.clone());
        let response = router.clone().oneshot(image_request(&token)).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "payload: {}",
            payload
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"Bad Request");
    }

    // Rejected before any lookup or render
    assert_eq!(store.get_count(), 0);
    assert_eq!(browser.render_count(), 0);
}

#[tokio::test]
async fn test_extra_claims_ignored() {
    let store = TrackingStore::new();
    let browser = MockBrowser::new();
    let router = test_router(store.clone(), browser);

    let token = sign_json(json!({
        "title": "Hello",
        "sub": "user-1",
        "theme": "dark",
    }));

    let response = router.oneshot(image_request(&token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(store.contains("Hello.png").await);
}
