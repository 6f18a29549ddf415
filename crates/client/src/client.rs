use std::time::Duration;

use common::IdempotencyKey;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::backoff::retry_delay;
use crate::error::ClientError;

/// Header under which the caller's idempotency key is forwarded verbatim.
/// Deduplication is the downstream service's job; we only relay the key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// HTTP status codes worth retrying: the gateway-flavored 5xx family that
/// usually signals a temporarily unreachable or overloaded upstream.
fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 502 | 503 | 504)
}

/// Tuning knobs for one integration's [`ResilientClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Deadline for each individual attempt, not for the whole call.
    pub timeout: Duration,
    /// Retries after the first attempt; a call makes at most
    /// `max_retries + 1` attempts.
    pub max_retries: u32,
    /// First-retry backoff; doubles on every further retry.
    pub backoff_base: Duration,
    /// Upper bound of the uniform jitter added to every backoff sleep.
    pub backoff_jitter_max: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 3,
            backoff_base: Duration::from_millis(200),
            backoff_jitter_max: Duration::from_millis(100),
        }
    }
}

/// JSON-over-HTTP client for one downstream service.
///
/// One instance per integration, constructed from that integration's base
/// URL and options. Transient failures (retryable 5xx, timeout, network)
/// are retried with exponential backoff; all other failures classify into
/// a [`ClientError`] and return on the first response. When retries run
/// out, the last remembered transient error is returned.
#[derive(Debug, Clone)]
pub struct ResilientClient {
    http: reqwest::Client,
    base_url: String,
    options: ClientOptions,
}

impl ResilientClient {
    pub fn new(base_url: impl Into<String>, options: ClientOptions) -> Self {
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .expect("failed to build reqwest HTTP client");

        Self {
            http,
            base_url: base_url.into(),
            options,
        }
    }

    /// Issues a JSON request and decodes the 2xx response body into `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        idempotency_key: Option<&IdempotencyKey>,
    ) -> Result<T, ClientError> {
        let url = self.url_for(path);
        let mut last_transient: Option<ClientError> = None;
        metrics::counter!("resilient_client_requests_total").increment(1);

        for attempt in 0..=self.options.max_retries {
            if attempt > 0 {
                let delay = retry_delay(
                    attempt - 1,
                    self.options.backoff_base,
                    self.options.backoff_jitter_max,
                );
                metrics::counter!("resilient_client_retries_total").increment(1);
                warn!(
                    url = %url,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retrying downstream call"
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = self.http.request(method.clone(), &url);
            if let Some(body) = body {
                request = request.json(body);
            }
            if let Some(key) = idempotency_key {
                request = request.header(IDEMPOTENCY_KEY_HEADER, key.as_str());
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .json::<T>()
                            .await
                            .map_err(|e| ClientError::InvalidResponse(e.to_string()));
                    }
                    if is_retryable_status(status) {
                        last_transient = Some(ClientError::Unavailable {
                            url: url.clone(),
                            attempts: attempt + 1,
                            message: format!("HTTP {}", status.as_u16()),
                        });
                        continue;
                    }
                    let body_text = response.text().await.unwrap_or_default();
                    return Err(classify_status(&url, status, &body_text));
                }
                Err(e) if e.is_timeout() => {
                    last_transient = Some(ClientError::Timeout {
                        url: url.clone(),
                        attempts: attempt + 1,
                    });
                }
                Err(e) => {
                    last_transient = Some(ClientError::Unavailable {
                        url: url.clone(),
                        attempts: attempt + 1,
                        message: e.to_string(),
                    });
                }
            }
        }

        metrics::counter!("resilient_client_exhausted_total").increment(1);
        Err(last_transient.unwrap_or(ClientError::Unavailable {
            url,
            attempts: self.options.max_retries + 1,
            message: "retries exhausted".to_string(),
        }))
    }

    /// JSON POST, the shape every downstream integration here uses.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
        idempotency_key: Option<&IdempotencyKey>,
    ) -> Result<T, ClientError> {
        self.request(Method::POST, path, Some(body), idempotency_key)
            .await
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Maps a non-retryable error status onto the taxonomy. Retryable statuses
/// never reach this point.
fn classify_status(url: &str, status: StatusCode, body: &str) -> ClientError {
    match status.as_u16() {
        401 | 403 => ClientError::Auth {
            url: url.to_string(),
            status: status.as_u16(),
        },
        404 => ClientError::NotFound {
            url: url.to_string(),
        },
        s if status.is_client_error() => ClientError::Rejected {
            status: s,
            message: error_message(body),
        },
        s => ClientError::Unavailable {
            url: url.to_string(),
            attempts: 1,
            message: format!("HTTP {s}"),
        },
    }
}

/// Pulls a human-readable message out of a downstream error body. Tries the
/// conventional JSON fields first, then falls back to the raw text.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message", "detail"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "request rejected".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}
