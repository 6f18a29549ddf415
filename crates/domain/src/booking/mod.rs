//! Booking record and related types.

mod record;
mod requests;
mod state;
mod value_objects;

pub use record::Booking;
pub use requests::{ConfirmBooking, CreateBooking};
pub use state::{BookingStatus, PaymentStatus};
pub use value_objects::{Currency, CustomerId, DriverId, VehicleId};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during booking validation.
#[derive(Debug, Error)]
pub enum BookingError {
    /// Booking is not in the expected status.
    #[error("Invalid state transition: cannot {action} from {current_status} status")]
    InvalidStateTransition {
        current_status: BookingStatus,
        action: &'static str,
    },

    /// Rental period is empty or inverted.
    #[error("Invalid rental period: start {start} is not before end {end}")]
    InvalidPeriod {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Price must be positive.
    #[error("Invalid total price: {price} (must be greater than 0)")]
    InvalidPrice { price: Decimal },

    /// Currency code is not a three-letter alphabetic code.
    #[error("Invalid currency code: {value:?}")]
    InvalidCurrency { value: String },

    /// Customer email is missing or malformed.
    #[error("Invalid customer email: {email:?}")]
    InvalidEmail { email: String },

    /// Confirmation requires a payment reference.
    #[error("Payment reference is required")]
    PaymentReferenceRequired,

    /// A status string does not name a known state.
    #[error("Unknown status value: {value:?}")]
    UnknownStatus { value: String },
}
