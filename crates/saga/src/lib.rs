//! Confirmation saga for vehicle rental bookings.
//!
//! This crate orchestrates the multi-step confirmation of a booking
//! against external fleet, payment and notification services.
//!
//! The confirmation saga follows these steps:
//! 1. Claim an exclusive row lease on the booking
//! 2. Validate the booking and the request payload
//! 3. Reserve the vehicle
//! 4. Confirm the payment (releasing the reservation on failure)
//! 5. Commit the confirmation in one transaction
//! 6. Send the confirmation email, best-effort
//!
//! It also provides the creation guard, which serializes booking creation
//! per customer and rental start date through a distributed lock.

pub mod creation;
pub mod error;
pub mod orchestrator;
pub mod services;

pub use creation::{CreationGuard, CREATION_LOCK_TTL};
pub use error::SagaError;
pub use orchestrator::{ConfirmationOrchestrator, ConfirmationOutcome, NotificationStatus};
pub use services::{
    FleetService, HttpFleetService, HttpNotificationService, HttpPaymentGateway,
    InMemoryFleetService, InMemoryNotificationService, InMemoryPaymentGateway,
    NotificationService, PaymentGateway,
};
