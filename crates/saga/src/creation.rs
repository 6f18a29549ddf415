//! Double-booking guard for booking creation.

use std::sync::Arc;
use std::time::Duration;

use booking_store::BookingStore;
use chrono::NaiveDate;
use domain::booking::{Booking, CreateBooking, CustomerId};
use lock::DistributedLock;

use crate::error::{Result, SagaError};

/// TTL for the creation slot lock.
///
/// Creation holds the lock only across one probe and one insert, so the
/// window is kept short: an orphaned lock (process death between acquire
/// and release) blocks the slot for at most this long.
pub const CREATION_LOCK_TTL: Duration = Duration::from_secs(30);

/// Serializes booking creation per customer and rental start date.
///
/// Two concurrent requests for the same customer and day race on a slot
/// lock; the loser is turned away before touching the store. The check
/// for an existing active booking runs while the lock is held, so the
/// probe and the insert cannot interleave with a competing creation.
pub struct CreationGuard {
    store: Arc<dyn BookingStore>,
    lock: Arc<dyn DistributedLock>,
}

impl CreationGuard {
    /// Creates a new guard over the given store and lock backend.
    pub fn new(store: Arc<dyn BookingStore>, lock: Arc<dyn DistributedLock>) -> Self {
        Self { store, lock }
    }

    fn slot_key(customer_id: CustomerId, date: NaiveDate) -> String {
        format!("booking:{}:{}", customer_id, date.format("%Y-%m-%d"))
    }

    /// Creates a pending booking if the customer's slot is free.
    ///
    /// Fails closed when the lock backend is unreachable: no booking is
    /// created without slot exclusivity.
    #[tracing::instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn create_booking(&self, request: CreateBooking) -> Result<Booking> {
        request.validate()?;

        let key = Self::slot_key(request.customer_id, request.slot_date());
        let Some(token) = self.lock.acquire(&key, CREATION_LOCK_TTL).await? else {
            metrics::counter!("booking_creation_conflicts_total").increment(1);
            tracing::info!(key = %key, "creation slot lock is busy");
            return Err(SagaError::SlotContended);
        };

        let outcome = self.insert_if_slot_free(request).await;

        // Release no matter how the guarded section went; on failure the
        // TTL reclaims the slot.
        match self.lock.release(&key, &token).await {
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(key = %key, %error, "failed to release creation lock");
            }
        }

        outcome
    }

    async fn insert_if_slot_free(&self, request: CreateBooking) -> Result<Booking> {
        let existing = self
            .store
            .find_active_for_slot(request.customer_id, request.slot_date())
            .await?;
        if let Some(existing) = existing {
            metrics::counter!("booking_creation_conflicts_total").increment(1);
            tracing::info!(existing_id = %existing.id, "slot already has an active booking");
            return Err(SagaError::SlotTaken);
        }

        let booking = self.store.insert(request).await?;
        metrics::counter!("bookings_created_total").increment(1);
        tracing::info!(booking_id = %booking.id, "booking created");
        Ok(booking)
    }
}
