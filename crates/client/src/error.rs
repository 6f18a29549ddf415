use thiserror::Error;

/// Classified outcome of a failed downstream call.
///
/// Only [`ClientError::Timeout`] and [`ClientError::Unavailable`] come out
/// of the retry loop; the remaining variants short-circuit on the first
/// response because repeating the request cannot change the answer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Every allowed attempt exceeded the per-attempt deadline.
    #[error("request to {url} timed out after {attempts} attempt(s)")]
    Timeout { url: String, attempts: u32 },

    /// Downstream rejected our credentials (401 or 403).
    #[error("downstream {url} rejected authorization (HTTP {status})")]
    Auth { url: String, status: u16 },

    /// Downstream has no such resource (404).
    #[error("downstream resource not found: {url}")]
    NotFound { url: String },

    /// Downstream judged the request invalid (4xx other than auth or 404).
    /// Carries the downstream message so callers can surface it verbatim.
    #[error("downstream rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Downstream unreachable or persistently failing: network errors and
    /// retryable 5xx with retries exhausted, or a non-retryable 5xx.
    #[error("downstream {url} unavailable after {attempts} attempt(s): {message}")]
    Unavailable {
        url: String,
        attempts: u32,
        message: String,
    },

    /// 2xx response whose body did not decode into the expected shape.
    #[error("undecodable downstream response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// True for failures that a later, identical request might not hit.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::Timeout { .. } | ClientError::Unavailable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let timeout = ClientError::Timeout {
            url: "http://fleet".to_string(),
            attempts: 4,
        };
        let rejected = ClientError::Rejected {
            status: 400,
            message: "card declined".to_string(),
        };

        assert!(timeout.is_transient());
        assert!(!rejected.is_transient());
    }

    #[test]
    fn test_rejected_display_carries_downstream_message() {
        let err = ClientError::Rejected {
            status: 400,
            message: "card declined".to_string(),
        };

        assert!(err.to_string().contains("card declined"));
        assert!(err.to_string().contains("400"));
    }

    #[test]
    fn test_unavailable_display_reports_attempts() {
        let err = ClientError::Unavailable {
            url: "http://payments/confirm".to_string(),
            attempts: 4,
            message: "HTTP 503".to_string(),
        };

        assert!(err.to_string().contains("4 attempt(s)"));
    }
}
