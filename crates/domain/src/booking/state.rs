//! Booking and payment state machines.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::booking::BookingError;

/// The status of a booking in its lifecycle.
///
/// Status transitions:
/// ```text
/// Pending ──┬──► Confirmed ──┬──► Cancelled ──► Refunded
///           │                └──► Refunded
///           ├──► Cancelled
///           └──► Expired
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BookingStatus {
    /// Booking has been created and awaits confirmation.
    #[default]
    Pending,

    /// Vehicle reserved and payment settled.
    Confirmed,

    /// Booking was cancelled by the customer or the operator.
    Cancelled,

    /// Money has been returned to the customer (terminal state).
    Refunded,

    /// Booking was never confirmed before its start date (terminal state).
    Expired,
}

impl BookingStatus {
    /// Returns true if the booking can be confirmed from this status.
    pub fn can_confirm(&self) -> bool {
        matches!(self, BookingStatus::Pending)
    }

    /// Returns true if the booking can be cancelled from this status.
    pub fn can_cancel(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Returns true if the booking can be refunded from this status.
    pub fn can_refund(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Cancelled)
    }

    /// Returns true if the booking can expire from this status.
    pub fn can_expire(&self) -> bool {
        matches!(self, BookingStatus::Pending)
    }

    /// Returns true if the booking still occupies its customer/slot.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Refunded | BookingStatus::Expired)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Refunded => "Refunded",
            BookingStatus::Expired => "Expired",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(BookingStatus::Pending),
            "Confirmed" => Ok(BookingStatus::Confirmed),
            "Cancelled" => Ok(BookingStatus::Cancelled),
            "Refunded" => Ok(BookingStatus::Refunded),
            "Expired" => Ok(BookingStatus::Expired),
            other => Err(BookingError::UnknownStatus {
                value: other.to_string(),
            }),
        }
    }
}

/// The settlement state of a booking's payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    /// No money has been collected yet.
    #[default]
    Pending,

    /// A deposit or partial amount has been collected.
    Partial,

    /// The full amount has been captured.
    Paid,

    /// A previously collected amount has been returned.
    Refunded,

    /// The last collection attempt was rejected.
    Failed,
}

impl PaymentStatus {
    /// Returns true if a capture attempt is allowed from this status.
    pub fn can_settle(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Pending | PaymentStatus::Partial | PaymentStatus::Failed
        )
    }

    /// Returns true if collected money can be returned from this status.
    pub fn can_refund(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Partial)
    }

    /// Returns true if the full amount has been captured.
    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Partial => "Partial",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Refunded => "Refunded",
            PaymentStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(PaymentStatus::Pending),
            "Partial" => Ok(PaymentStatus::Partial),
            "Paid" => Ok(PaymentStatus::Paid),
            "Refunded" => Ok(PaymentStatus::Refunded),
            "Failed" => Ok(PaymentStatus::Failed),
            other => Err(BookingError::UnknownStatus {
                value: other.to_string(),
            }),
        }
    }
}
