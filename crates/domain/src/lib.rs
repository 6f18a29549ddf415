//! Domain layer for the booking backend.
//!
//! This crate provides the booking model shared by the store, saga, and API
//! layers:
//! - The `Booking` record and its confirmation rules
//! - `BookingStatus` / `PaymentStatus` state machines
//! - Value objects for customers, vehicles, drivers, and currencies
//! - Request payloads with validation

pub mod booking;

pub use booking::{
    Booking, BookingError, BookingStatus, ConfirmBooking, CreateBooking, Currency, CustomerId,
    DriverId, PaymentStatus, VehicleId,
};
