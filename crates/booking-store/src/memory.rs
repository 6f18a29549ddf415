use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::BookingId;
use domain::booking::{Booking, CreateBooking, CustomerId, DriverId, VehicleId};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::store::{BookingLease, BookingStore};
use crate::{Result, StoreError};

/// In-memory booking store for testing and single-node runs.
///
/// Provides the same interface and lease semantics as the PostgreSQL
/// implementation: the row lease is a per-booking async mutex claimed with
/// `try_lock`, so a busy row fails immediately instead of queueing.
#[derive(Clone, Default)]
pub struct InMemoryBookingStore {
    rows: Arc<RwLock<HashMap<BookingId, Booking>>>,
    row_locks: Arc<RwLock<HashMap<BookingId, Arc<Mutex<()>>>>>,
}

impl InMemoryBookingStore {
    /// Creates a new empty in-memory booking store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of bookings stored.
    pub async fn booking_count(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Places a booking verbatim, bypassing creation. Lets tests start from
    /// any state.
    pub async fn seed(&self, booking: Booking) {
        self.rows.write().await.insert(booking.id, booking);
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert(&self, request: CreateBooking) -> Result<Booking> {
        let booking = Booking::pending(request, Utc::now());
        self.rows
            .write()
            .await
            .insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn fetch(&self, id: BookingId) -> Result<Option<Booking>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn find_active_for_slot(
        &self,
        customer_id: CustomerId,
        start_date: NaiveDate,
    ) -> Result<Option<Booking>> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .find(|b| {
                b.customer_id == customer_id && b.is_active() && b.slot_date() == start_date
            })
            .cloned())
    }

    async fn lock_booking(&self, id: BookingId) -> Result<Box<dyn BookingLease>> {
        if !self.rows.read().await.contains_key(&id) {
            return Err(StoreError::BookingNotFound(id));
        }

        let row_lock = {
            let mut locks = self.row_locks.write().await;
            locks.entry(id).or_default().clone()
        };
        let guard = row_lock
            .try_lock_owned()
            .map_err(|_| StoreError::RowLocked(id))?;

        // Re-read under the guard so the lease sees the latest committed row.
        let booking = self
            .rows
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::BookingNotFound(id))?;

        Ok(Box::new(InMemoryLease {
            rows: self.rows.clone(),
            booking,
            _guard: guard,
        }))
    }
}

struct InMemoryLease {
    rows: Arc<RwLock<HashMap<BookingId, Booking>>>,
    booking: Booking,
    _guard: OwnedMutexGuard<()>,
}

#[async_trait]
impl BookingLease for InMemoryLease {
    fn booking(&self) -> &Booking {
        &self.booking
    }

    async fn commit_confirmation(
        self: Box<Self>,
        vehicle_id: VehicleId,
        driver_id: DriverId,
        confirmed_at: DateTime<Utc>,
    ) -> Result<Booking> {
        let InMemoryLease {
            rows,
            mut booking,
            _guard,
        } = *self;

        booking.apply_confirmation(vehicle_id, driver_id, confirmed_at);
        rows.write().await.insert(booking.id, booking.clone());
        Ok(booking)
    }
}
