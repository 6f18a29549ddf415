//! Retry behavior tests against a real loopback HTTP server.
//!
//! Each test binds an ephemeral-port axum server whose handlers count
//! attempts and script failures, then points a `ResilientClient` at it.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use client::{ClientError, ClientOptions, ResilientClient};
use common::IdempotencyKey;
use serde_json::{Value, json};

async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Backoff tuned down so retry tests finish quickly.
fn fast_options(max_retries: u32) -> ClientOptions {
    ClientOptions {
        timeout: Duration::from_secs(2),
        max_retries,
        backoff_base: Duration::from_millis(1),
        backoff_jitter_max: Duration::ZERO,
    }
}

#[tokio::test]
async fn test_success_decodes_json_body() {
    let app = Router::new().route(
        "/payments/confirm",
        post(|| async { Json(json!({"status": "captured", "reference": "pay_1"})) }),
    );
    let base = spawn_server(app).await;
    let client = ResilientClient::new(base, fast_options(3));

    let body: Value = client
        .post("/payments/confirm", &json!({"reference": "pay_1"}), None)
        .await
        .unwrap();

    assert_eq!(body["status"], "captured");
}

#[tokio::test]
async fn test_transient_statuses_are_retried_until_success() {
    let calls = Arc::new(AtomicU32::new(0));
    let handler_calls = calls.clone();

    let app = Router::new().route(
        "/vehicles/v1/reserve",
        post(move || {
            let calls = handler_calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        Json(json!({"error": "warming up"})),
                    )
                } else {
                    (StatusCode::OK, Json(json!({"reserved": true})))
                }
            }
        }),
    );
    let base = spawn_server(app).await;
    let client = ResilientClient::new(base, fast_options(3));

    let body: Value = client
        .post("/vehicles/v1/reserve", &json!({"booking_id": "b1"}), None)
        .await
        .unwrap();

    assert_eq!(body["reserved"], true);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_exhausted_retries_surface_unavailable_with_attempt_count() {
    let calls = Arc::new(AtomicU32::new(0));
    let handler_calls = calls.clone();

    let app = Router::new().route(
        "/payments/confirm",
        post(move || {
            let calls = handler_calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                (StatusCode::BAD_GATEWAY, Json(json!({"error": "down"})))
            }
        }),
    );
    let base = spawn_server(app).await;
    let client = ResilientClient::new(base, fast_options(2));

    let err = client
        .post::<Value>("/payments/confirm", &json!({}), None)
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    match err {
        ClientError::Unavailable { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("expected Unavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_client_rejection_short_circuits_without_retry() {
    let calls = Arc::new(AtomicU32::new(0));
    let handler_calls = calls.clone();

    let app = Router::new().route(
        "/payments/confirm",
        post(move || {
            let calls = handler_calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "card declined"})),
                )
            }
        }),
    );
    let base = spawn_server(app).await;
    let client = ResilientClient::new(base, fast_options(3));

    let err = client
        .post::<Value>("/payments/confirm", &json!({}), None)
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    match err {
        ClientError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "card declined");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_not_found_and_auth_short_circuit() {
    let calls = Arc::new(AtomicU32::new(0));
    let missing_calls = calls.clone();
    let auth_calls = calls.clone();

    let app = Router::new()
        .route(
            "/missing",
            post(move || {
                let calls = missing_calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::NOT_FOUND, Json(json!({"error": "no route"})))
                }
            }),
        )
        .route(
            "/secure",
            post(move || {
                let calls = auth_calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::FORBIDDEN, Json(json!({"error": "no token"})))
                }
            }),
        );
    let base = spawn_server(app).await;
    let client = ResilientClient::new(base, fast_options(3));

    let missing = client.post::<Value>("/missing", &json!({}), None).await;
    let auth = client.post::<Value>("/secure", &json!({}), None).await;

    assert!(matches!(missing, Err(ClientError::NotFound { .. })));
    assert!(matches!(
        auth,
        Err(ClientError::Auth { status: 403, .. })
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_idempotency_key_is_forwarded_verbatim() {
    let seen = Arc::new(Mutex::new(None::<String>));
    let handler_seen = seen.clone();

    let app = Router::new().route(
        "/vehicles/v1/reserve",
        post(move |headers: HeaderMap| {
            let seen = handler_seen.clone();
            async move {
                let key = headers
                    .get("Idempotency-Key")
                    .and_then(|v| v.to_str().ok())
                    .map(String::from);
                *seen.lock().unwrap() = key;
                Json(json!({"reserved": true}))
            }
        }),
    );
    let base = spawn_server(app).await;
    let client = ResilientClient::new(base, fast_options(0));
    let key = IdempotencyKey::from("confirm-7f3a");

    client
        .post::<Value>("/vehicles/v1/reserve", &json!({}), Some(&key))
        .await
        .unwrap();

    assert_eq!(seen.lock().unwrap().as_deref(), Some("confirm-7f3a"));
}

#[tokio::test]
async fn test_timeout_is_retried_then_surfaced() {
    let calls = Arc::new(AtomicU32::new(0));
    let handler_calls = calls.clone();

    let app = Router::new().route(
        "/slow",
        post(move || {
            let calls = handler_calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(500)).await;
                Json(json!({"too": "late"}))
            }
        }),
    );
    let base = spawn_server(app).await;
    let client = ResilientClient::new(
        base,
        ClientOptions {
            timeout: Duration::from_millis(50),
            max_retries: 1,
            backoff_base: Duration::from_millis(1),
            backoff_jitter_max: Duration::ZERO,
        },
    );

    let err = client.post::<Value>("/slow", &json!({}), None).await.unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    match err {
        ClientError::Timeout { attempts, .. } => assert_eq!(attempts, 2),
        other => panic!("expected Timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_undecodable_success_body_is_invalid_response() {
    #[derive(serde::Deserialize, Debug)]
    #[allow(dead_code)]
    struct Reserved {
        reserved: bool,
    }

    let app = Router::new().route(
        "/vehicles/v1/reserve",
        post(|| async { (StatusCode::OK, "definitely not json") }),
    );
    let base = spawn_server(app).await;
    let client = ResilientClient::new(base, fast_options(0));

    let err = client
        .post::<Reserved>("/vehicles/v1/reserve", &json!({}), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_connection_refused_counts_as_unavailable() {
    // Port 1 is never listening on loopback.
    let client = ResilientClient::new("http://127.0.0.1:1", fast_options(1));

    let err = client.post::<Value>("/any", &json!({}), None).await.unwrap_err();

    match err {
        ClientError::Unavailable { attempts, .. } => assert_eq!(attempts, 2),
        other => panic!("expected Unavailable, got {other:?}"),
    }
}
