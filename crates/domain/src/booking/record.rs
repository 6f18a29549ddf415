//! Booking record implementation.

use chrono::{DateTime, NaiveDate, Utc};
use common::BookingId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
    BookingError, BookingStatus, CreateBooking, Currency, CustomerId, DriverId, PaymentStatus,
    VehicleId,
};

/// A vehicle booking.
///
/// Created in `Pending` status with no vehicle or driver assigned; the
/// confirmation flow assigns both exactly once while flipping the booking
/// to `Confirmed` and the payment to `Paid` in a single update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique booking identifier.
    pub id: BookingId,

    /// Customer who placed the booking.
    pub customer_id: CustomerId,

    /// Recipient for booking notifications.
    pub customer_email: String,

    /// Vehicle assigned at confirmation.
    pub vehicle_id: Option<VehicleId>,

    /// Driver assigned at confirmation.
    pub driver_id: Option<DriverId>,

    /// Start of the rental period.
    pub start_time: DateTime<Utc>,

    /// End of the rental period.
    pub end_time: DateTime<Utc>,

    /// Total price for the period, scoped to `currency`.
    pub total_price: Decimal,

    /// Currency of `total_price`.
    pub currency: Currency,

    /// Current booking status.
    pub status: BookingStatus,

    /// Current payment settlement status.
    pub payment_status: PaymentStatus,

    /// Set exactly when the booking becomes Confirmed.
    pub confirmed_at: Option<DateTime<Utc>>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Builds a fresh Pending booking from a creation request.
    pub fn pending(request: CreateBooking, now: DateTime<Utc>) -> Self {
        Self {
            id: BookingId::new(),
            customer_id: request.customer_id,
            customer_email: request.customer_email,
            vehicle_id: None,
            driver_id: None,
            start_time: request.start_time,
            end_time: request.end_time,
            total_price: request.total_price,
            currency: request.currency,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            confirmed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the calendar date the rental starts on.
    pub fn slot_date(&self) -> NaiveDate {
        self.start_time.date_naive()
    }

    /// Returns true if the booking still occupies its customer/slot.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Checks that the booking is in a confirmable state with coherent fields.
    ///
    /// Status must be `Pending`, the rental period must be non-empty, the
    /// price positive, and a notification recipient present. Other ERP
    /// services edit bookings between creation and confirmation, so these
    /// are re-checked here even though creation validates the same rules.
    pub fn validate_for_confirmation(&self) -> Result<(), BookingError> {
        if !self.status.can_confirm() {
            return Err(BookingError::InvalidStateTransition {
                current_status: self.status,
                action: "confirm",
            });
        }

        if self.start_time >= self.end_time {
            return Err(BookingError::InvalidPeriod {
                start: self.start_time,
                end: self.end_time,
            });
        }

        if self.total_price <= Decimal::ZERO {
            return Err(BookingError::InvalidPrice {
                price: self.total_price,
            });
        }

        if !is_plausible_email(&self.customer_email) {
            return Err(BookingError::InvalidEmail {
                email: self.customer_email.clone(),
            });
        }

        Ok(())
    }

    /// Applies a successful confirmation to the record.
    ///
    /// Assigns the vehicle and driver, flips status to `Confirmed` and
    /// payment to `Paid`, and stamps `confirmed_at`. Callers must have
    /// validated the booking first; this method does not re-check status.
    pub fn apply_confirmation(
        &mut self,
        vehicle_id: VehicleId,
        driver_id: DriverId,
        at: DateTime<Utc>,
    ) {
        self.vehicle_id = Some(vehicle_id);
        self.driver_id = Some(driver_id);
        self.status = BookingStatus::Confirmed;
        self.payment_status = PaymentStatus::Paid;
        self.confirmed_at = Some(at);
        self.updated_at = at;
    }
}

/// Minimal shape check: something before and after a single '@'.
fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}
