//! Booking request payloads.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BookingError, Currency, CustomerId, DriverId, VehicleId};

/// Request to create a new booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBooking {
    /// The customer placing the booking.
    pub customer_id: CustomerId,

    /// Recipient for booking notifications.
    pub customer_email: String,

    /// Start of the rental period.
    pub start_time: DateTime<Utc>,

    /// End of the rental period.
    pub end_time: DateTime<Utc>,

    /// Quoted total price for the period.
    pub total_price: Decimal,

    /// Currency of the quoted price.
    pub currency: Currency,
}

impl CreateBooking {
    /// Creates a new CreateBooking request.
    pub fn new(
        customer_id: CustomerId,
        customer_email: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        total_price: Decimal,
        currency: Currency,
    ) -> Self {
        Self {
            customer_id,
            customer_email: customer_email.into(),
            start_time,
            end_time,
            total_price,
            currency,
        }
    }

    /// Returns the calendar date the requested rental starts on.
    pub fn slot_date(&self) -> NaiveDate {
        self.start_time.date_naive()
    }

    /// Checks field coherence before any booking is inserted.
    pub fn validate(&self) -> Result<(), BookingError> {
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

        if !self.customer_email.contains('@') {
            return Err(BookingError::InvalidEmail {
                email: self.customer_email.clone(),
            });
        }

        Ok(())
    }
}

/// Request to confirm a pending booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmBooking {
    /// Gateway reference of the payment to capture.
    pub payment_reference: String,

    /// Vehicle to reserve and assign.
    pub vehicle_id: VehicleId,

    /// Driver to assign.
    pub driver_id: DriverId,
}

impl ConfirmBooking {
    /// Creates a new ConfirmBooking request.
    pub fn new(
        payment_reference: impl Into<String>,
        vehicle_id: VehicleId,
        driver_id: DriverId,
    ) -> Self {
        Self {
            payment_reference: payment_reference.into(),
            vehicle_id,
            driver_id,
        }
    }

    /// Checks the payload before any downstream call is made.
    pub fn validate(&self) -> Result<(), BookingError> {
        if self.payment_reference.trim().is_empty() {
            return Err(BookingError::PaymentReferenceRequired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn valid_create() -> CreateBooking {
        let start = Utc::now() + Duration::days(1);
        CreateBooking::new(
            CustomerId::new(),
            "renter@example.com",
            start,
            start + Duration::days(3),
            Decimal::new(42000, 2),
            Currency::parse("EUR").unwrap(),
        )
    }

    #[test]
    fn test_valid_create_passes() {
        assert!(valid_create().validate().is_ok());
    }

    #[test]
    fn test_create_rejects_empty_period() {
        let mut request = valid_create();
        request.end_time = request.start_time;
        assert!(matches!(
            request.validate(),
            Err(BookingError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn test_create_rejects_zero_price() {
        let mut request = valid_create();
        request.total_price = Decimal::ZERO;
        assert!(matches!(
            request.validate(),
            Err(BookingError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn test_create_rejects_missing_email() {
        let mut request = valid_create();
        request.customer_email = "nobody".to_string();
        assert!(matches!(
            request.validate(),
            Err(BookingError::InvalidEmail { .. })
        ));
    }

    #[test]
    fn test_create_slot_date() {
        let request = valid_create();
        assert_eq!(request.slot_date(), request.start_time.date_naive());
    }

    #[test]
    fn test_confirm_requires_payment_reference() {
        let request = ConfirmBooking::new("", VehicleId::new(), DriverId::new());
        assert!(matches!(
            request.validate(),
            Err(BookingError::PaymentReferenceRequired)
        ));

        let request = ConfirmBooking::new("  ", VehicleId::new(), DriverId::new());
        assert!(request.validate().is_err());

        let request = ConfirmBooking::new("pay_123", VehicleId::new(), DriverId::new());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_confirm_deserializes_from_wire_shape() {
        let vehicle_id = VehicleId::new();
        let driver_id = DriverId::new();
        let json = format!(
            "{{\"payment_reference\":\"pay_123\",\"vehicle_id\":\"{vehicle_id}\",\"driver_id\":\"{driver_id}\"}}"
        );

        let request: ConfirmBooking = serde_json::from_str(&json).unwrap();
        assert_eq!(request.payment_reference, "pay_123");
        assert_eq!(request.vehicle_id, vehicle_id);
        assert_eq!(request.driver_id, driver_id);
    }
}
