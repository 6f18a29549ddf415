//! Error types for the confirmation saga and the creation guard.

use booking_store::StoreError;
use client::ClientError;
use common::BookingId;
use domain::booking::{BookingError, BookingStatus};
use lock::LockError;
use thiserror::Error;

/// Errors that can occur while orchestrating a booking.
#[derive(Debug, Error)]
pub enum SagaError {
    /// No booking row exists for the given ID.
    #[error("Booking not found: {0}")]
    BookingNotFound(BookingId),

    /// The booking is not in a status that allows confirmation.
    #[error("Booking {id} cannot be confirmed from {status} status")]
    NotConfirmable { id: BookingId, status: BookingStatus },

    /// Another confirmation currently holds the row lease.
    #[error("A confirmation for booking {0} is already in progress")]
    ConfirmationInProgress(BookingId),

    /// The booking or the request payload failed validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] BookingError),

    /// The vehicle reservation step failed.
    #[error("Vehicle reservation failed: {0}")]
    Reservation(ClientError),

    /// The payment confirmation step failed.
    #[error("Payment confirmation failed: {0}")]
    Payment(ClientError),

    /// Another creation currently holds the slot lock.
    #[error("Another booking is already being created for this customer and date")]
    SlotContended,

    /// An active booking already occupies the slot.
    #[error("An active booking already exists for this customer and date")]
    SlotTaken,

    /// The lock backend could not be reached or answered abnormally.
    #[error("Lock backend error: {0}")]
    Lock(#[from] LockError),

    /// The booking store failed.
    #[error("Booking store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for saga operations.
pub type Result<T> = std::result::Result<T, SagaError>;
