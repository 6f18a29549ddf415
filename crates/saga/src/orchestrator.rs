//! Orchestrator for the booking confirmation saga.

use std::sync::Arc;

use booking_store::{BookingStore, StoreError};
use chrono::Utc;
use common::{BookingId, IdempotencyKey};
use domain::booking::{Booking, BookingError, ConfirmBooking, VehicleId};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SagaError};
use crate::services::{FleetService, NotificationService, PaymentGateway};

/// Delivery outcome of the confirmation email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    /// The confirmation email was handed to the notification service.
    Sent,
    /// Delivery failed; the booking is confirmed regardless.
    Failed,
}

impl NotificationStatus {
    /// Returns the wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Sent => "SENT",
            NotificationStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a completed confirmation saga.
#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationOutcome {
    /// The confirmed booking as persisted.
    pub booking: Booking,
    /// Whether the confirmation email went out.
    pub notification_status: NotificationStatus,
}

/// Drives a booking from `Pending` to `Confirmed`.
///
/// The saga runs four effectful steps under an exclusive row lease:
/// reserve the vehicle, confirm the payment, commit the confirmation, and
/// send the notification email. A payment failure releases the vehicle
/// reservation; the notification step is best-effort and never reverses
/// the committed booking.
pub struct ConfirmationOrchestrator {
    store: Arc<dyn BookingStore>,
    fleet: Arc<dyn FleetService>,
    payment: Arc<dyn PaymentGateway>,
    notification: Arc<dyn NotificationService>,
}

impl ConfirmationOrchestrator {
    /// Creates a new orchestrator over the given store and services.
    pub fn new(
        store: Arc<dyn BookingStore>,
        fleet: Arc<dyn FleetService>,
        payment: Arc<dyn PaymentGateway>,
        notification: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            store,
            fleet,
            payment,
            notification,
        }
    }

    /// Executes the confirmation saga for the given booking.
    ///
    /// Exactly one caller can run this per booking at a time; concurrent
    /// callers fail fast with [`SagaError::ConfirmationInProgress`] before
    /// making any downstream call.
    #[tracing::instrument(skip(self, request), fields(booking_id = %booking_id))]
    pub async fn confirm_booking(
        &self,
        booking_id: BookingId,
        request: ConfirmBooking,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<ConfirmationOutcome> {
        metrics::counter!("booking_confirmations_started_total").increment(1);
        let started = std::time::Instant::now();

        let result = self
            .run_confirmation(booking_id, request, idempotency_key)
            .await;

        match &result {
            Ok(outcome) => {
                metrics::counter!("booking_confirmations_completed_total").increment(1);
                metrics::histogram!("booking_confirmation_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                tracing::info!(
                    status = %outcome.booking.status,
                    notification_status = %outcome.notification_status,
                    "booking confirmed"
                );
            }
            Err(error) => {
                metrics::counter!("booking_confirmations_failed_total").increment(1);
                tracing::warn!(%error, "booking confirmation failed");
            }
        }

        result
    }

    async fn run_confirmation(
        &self,
        booking_id: BookingId,
        request: ConfirmBooking,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<ConfirmationOutcome> {
        // 1. Claim the exclusive row lease; concurrent callers fail fast
        let lease = self
            .store
            .lock_booking(booking_id)
            .await
            .map_err(|e| match e {
                StoreError::BookingNotFound(id) => SagaError::BookingNotFound(id),
                StoreError::RowLocked(id) => SagaError::ConfirmationInProgress(id),
                other => SagaError::Store(other),
            })?;

        // 2. Validate the request and the row before any downstream call
        request.validate()?;
        let booking = lease.booking().clone();
        booking.validate_for_confirmation().map_err(|e| match e {
            BookingError::InvalidStateTransition { current_status, .. } => {
                SagaError::NotConfirmable {
                    id: booking_id,
                    status: current_status,
                }
            }
            other => SagaError::Validation(other),
        })?;

        let key = idempotency_key.as_ref();

        // 3. Reserve the vehicle; nothing to compensate if this fails
        tracing::info!(vehicle_id = %request.vehicle_id, "reserving vehicle");
        self.fleet
            .reserve(request.vehicle_id, booking_id, key)
            .await
            .map_err(SagaError::Reservation)?;

        // 4. Confirm the payment; on failure release the reservation
        tracing::info!(reference = %request.payment_reference, "confirming payment");
        if let Err(payment_error) = self
            .payment
            .confirm(
                &request.payment_reference,
                booking.total_price,
                &booking.currency,
                key,
            )
            .await
        {
            self.compensate_reservation(request.vehicle_id, booking_id, key)
                .await;
            return Err(SagaError::Payment(payment_error));
        }

        // 5. Finalize: assignment, statuses and confirmed_at land in one commit
        let confirmed = lease
            .commit_confirmation(request.vehicle_id, request.driver_id, Utc::now())
            .await?;

        // 6. Best-effort notification; the outcome never reverses the commit
        let notification_status = match self
            .notification
            .send_booking_confirmation(&confirmed)
            .await
        {
            Ok(()) => NotificationStatus::Sent,
            Err(error) => {
                metrics::counter!("booking_notifications_failed_total").increment(1);
                tracing::warn!(%error, "confirmation notification failed");
                NotificationStatus::Failed
            }
        };

        Ok(ConfirmationOutcome {
            booking: confirmed,
            notification_status,
        })
    }

    /// Releases the vehicle reservation made in step 3.
    ///
    /// Called exactly once, on the payment-failure path. A release failure
    /// is logged and counted; the caller still reports the payment error.
    async fn compensate_reservation(
        &self,
        vehicle_id: VehicleId,
        booking_id: BookingId,
        idempotency_key: Option<&IdempotencyKey>,
    ) {
        match self
            .fleet
            .release(vehicle_id, booking_id, idempotency_key)
            .await
        {
            Ok(()) => {
                metrics::counter!("booking_compensations_total").increment(1);
                tracing::info!(%vehicle_id, "released vehicle reservation after payment failure");
            }
            Err(error) => {
                metrics::counter!("booking_compensations_failed_total").increment(1);
                tracing::error!(
                    %vehicle_id,
                    %booking_id,
                    %error,
                    "failed to release vehicle reservation after payment failure"
                );
            }
        }
    }
}
