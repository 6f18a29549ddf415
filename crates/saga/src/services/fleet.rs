//! Fleet service trait and implementations for vehicle reservations.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use client::{ClientError, ResilientClient};
use common::{BookingId, IdempotencyKey};
use domain::booking::VehicleId;
use serde_json::json;

/// Trait for vehicle reservation operations against the fleet service.
#[async_trait]
pub trait FleetService: Send + Sync {
    /// Reserves a vehicle for a booking.
    async fn reserve(
        &self,
        vehicle_id: VehicleId,
        booking_id: BookingId,
        idempotency_key: Option<&IdempotencyKey>,
    ) -> Result<(), ClientError>;

    /// Releases a previously made reservation.
    async fn release(
        &self,
        vehicle_id: VehicleId,
        booking_id: BookingId,
        idempotency_key: Option<&IdempotencyKey>,
    ) -> Result<(), ClientError>;
}

/// Fleet service backed by the HTTP API of the fleet system.
#[derive(Debug, Clone)]
pub struct HttpFleetService {
    client: ResilientClient,
}

impl HttpFleetService {
    /// Creates a fleet service on top of a configured HTTP client.
    pub fn new(client: ResilientClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FleetService for HttpFleetService {
    async fn reserve(
        &self,
        vehicle_id: VehicleId,
        booking_id: BookingId,
        idempotency_key: Option<&IdempotencyKey>,
    ) -> Result<(), ClientError> {
        self.client
            .post::<serde_json::Value>(
                &format!("/vehicles/{vehicle_id}/reserve"),
                &json!({ "booking_id": booking_id }),
                idempotency_key,
            )
            .await?;
        Ok(())
    }

    async fn release(
        &self,
        vehicle_id: VehicleId,
        booking_id: BookingId,
        idempotency_key: Option<&IdempotencyKey>,
    ) -> Result<(), ClientError> {
        self.client
            .post::<serde_json::Value>(
                &format!("/vehicles/{vehicle_id}/release"),
                &json!({ "booking_id": booking_id }),
                idempotency_key,
            )
            .await?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryFleetState {
    reservations: Vec<(VehicleId, BookingId)>,
    reserve_calls: Vec<(VehicleId, BookingId)>,
    release_calls: Vec<(VehicleId, BookingId)>,
    fail_on_reserve: bool,
    fail_on_release: bool,
}

/// In-memory fleet service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFleetService {
    state: Arc<RwLock<InMemoryFleetState>>,
}

impl InMemoryFleetService {
    /// Creates a new in-memory fleet service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to reject reserve calls.
    pub fn set_fail_on_reserve(&self, fail: bool) {
        self.state.write().unwrap().fail_on_reserve = fail;
    }

    /// Configures the service to fail release calls.
    pub fn set_fail_on_release(&self, fail: bool) {
        self.state.write().unwrap().fail_on_release = fail;
    }

    /// Returns the number of active reservations.
    pub fn reservation_count(&self) -> usize {
        self.state.read().unwrap().reservations.len()
    }

    /// Returns true if the vehicle is currently reserved for the booking.
    pub fn has_reservation(&self, vehicle_id: VehicleId, booking_id: BookingId) -> bool {
        self.state
            .read()
            .unwrap()
            .reservations
            .contains(&(vehicle_id, booking_id))
    }

    /// Returns how many reserve calls were made, including rejected ones.
    pub fn reserve_call_count(&self) -> usize {
        self.state.read().unwrap().reserve_calls.len()
    }

    /// Returns the (vehicle, booking) pairs passed to release, in call order.
    pub fn release_calls(&self) -> Vec<(VehicleId, BookingId)> {
        self.state.read().unwrap().release_calls.clone()
    }
}

#[async_trait]
impl FleetService for InMemoryFleetService {
    async fn reserve(
        &self,
        vehicle_id: VehicleId,
        booking_id: BookingId,
        _idempotency_key: Option<&IdempotencyKey>,
    ) -> Result<(), ClientError> {
        let mut state = self.state.write().unwrap();
        state.reserve_calls.push((vehicle_id, booking_id));

        if state.fail_on_reserve {
            return Err(ClientError::Rejected {
                status: 409,
                message: "Vehicle unavailable".to_string(),
            });
        }

        state.reservations.push((vehicle_id, booking_id));
        Ok(())
    }

    async fn release(
        &self,
        vehicle_id: VehicleId,
        booking_id: BookingId,
        _idempotency_key: Option<&IdempotencyKey>,
    ) -> Result<(), ClientError> {
        let mut state = self.state.write().unwrap();
        state.release_calls.push((vehicle_id, booking_id));

        if state.fail_on_release {
            return Err(ClientError::Unavailable {
                url: "in-memory:/vehicles/release".to_string(),
                attempts: 1,
                message: "Release failed".to_string(),
            });
        }

        state
            .reservations
            .retain(|entry| *entry != (vehicle_id, booking_id));
        Ok(())
    }
}
