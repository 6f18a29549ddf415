//! Shared types used across the booking backend crates.

pub mod types;

pub use types::{BookingId, IdempotencyKey};
