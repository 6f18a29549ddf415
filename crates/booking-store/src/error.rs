use common::BookingId;
use thiserror::Error;

/// Errors that can occur when interacting with the booking store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No booking row exists for the id.
    #[error("Booking not found: {0}")]
    BookingNotFound(BookingId),

    /// Another transaction holds the row lease for this booking right now.
    #[error("Booking row is locked by a concurrent confirmation: {0}")]
    RowLocked(BookingId),

    /// A stored value could not be mapped back into a domain type.
    #[error("Invalid stored booking data: {0}")]
    InvalidRow(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for booking store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
