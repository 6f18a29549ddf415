//! Booking persistence.
//!
//! [`BookingStore`] is the single seam between the saga and storage. The
//! PostgreSQL implementation backs the exclusive row lease with
//! `SELECT ... FOR UPDATE NOWAIT`; the in-memory implementation mirrors the
//! same semantics with per-row async mutexes for tests and local runs.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryBookingStore;
pub use postgres::PostgresBookingStore;
pub use store::{BookingLease, BookingStore};
