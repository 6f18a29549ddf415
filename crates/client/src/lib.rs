//! Outbound HTTP plumbing shared by every downstream integration.
//!
//! [`ResilientClient`] wraps `reqwest` with a bounded retry loop: transient
//! failures (HTTP 502/503/504, timeouts, network errors) are retried with
//! exponential backoff and jitter, everything else is classified into
//! [`ClientError`] and returned on the first attempt.

pub mod backoff;
pub mod client;
pub mod error;

pub use backoff::retry_delay;
pub use client::{ClientOptions, ResilientClient, IDEMPOTENCY_KEY_HEADER};
pub use error::ClientError;
