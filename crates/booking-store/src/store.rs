use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::BookingId;
use domain::booking::{Booking, CreateBooking, CustomerId, DriverId, VehicleId};

use crate::Result;

/// Core trait for booking persistence implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Inserts a new Pending booking built from the request.
    ///
    /// The caller validates the request first; the store only persists.
    async fn insert(&self, request: CreateBooking) -> Result<Booking>;

    /// Fetches a booking by id.
    ///
    /// Returns None if the booking doesn't exist.
    async fn fetch(&self, id: BookingId) -> Result<Option<Booking>>;

    /// Finds an active (Pending or Confirmed) booking for this customer
    /// whose rental starts on the given UTC date.
    ///
    /// Returns None if the slot is free.
    async fn find_active_for_slot(
        &self,
        customer_id: CustomerId,
        start_date: NaiveDate,
    ) -> Result<Option<Booking>>;

    /// Claims the exclusive row lease for a booking without waiting.
    ///
    /// Fails with `RowLocked` the instant another holder has the row, and
    /// with `BookingNotFound` when no row exists. While the lease lives, no
    /// other claimant can read-modify-write the row.
    async fn lock_booking(&self, id: BookingId) -> Result<Box<dyn BookingLease>>;
}

/// An exclusive, single-use lease on one booking row.
///
/// [`BookingLease::commit_confirmation`] is the only write path: it applies
/// the confirmation to the row and commits in the same transaction that
/// holds the lease. Dropping the lease without committing rolls everything
/// back and frees the row untouched.
#[async_trait]
pub trait BookingLease: Send {
    /// The row as read at lease time.
    fn booking(&self) -> &Booking;

    /// Confirms the booking (status, payment status, vehicle and driver
    /// assignment, confirmation timestamp) and commits.
    async fn commit_confirmation(
        self: Box<Self>,
        vehicle_id: VehicleId,
        driver_id: DriverId,
        confirmed_at: DateTime<Utc>,
    ) -> Result<Booking>;
}
