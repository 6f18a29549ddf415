//! Booking creation, lookup and confirmation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use booking_store::BookingStore;
use chrono::{DateTime, Utc};
use common::{BookingId, IdempotencyKey};
use domain::booking::{Booking, ConfirmBooking, CreateBooking, Currency, CustomerId, DriverId, VehicleId};
use rust_decimal::Decimal;
use saga::{ConfirmationOrchestrator, CreationGuard, SagaError};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub orchestrator: ConfirmationOrchestrator,
    pub creation_guard: CreationGuard,
    pub store: Arc<dyn BookingStore>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub customer_id: Option<String>,
    pub customer_email: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_price: Decimal,
    pub currency: String,
}

#[derive(Deserialize)]
pub struct ConfirmBookingRequest {
    pub payment_reference: String,
    pub vehicle_id: String,
    pub driver_id: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct BookingResponse {
    pub booking_id: String,
    pub customer_id: String,
    pub customer_email: String,
    pub vehicle_id: Option<String>,
    pub driver_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_price: Decimal,
    pub currency: String,
    pub status: String,
    pub payment_status: String,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl BookingResponse {
    fn from_booking(booking: &Booking) -> Self {
        Self {
            booking_id: booking.id.to_string(),
            customer_id: booking.customer_id.to_string(),
            customer_email: booking.customer_email.clone(),
            vehicle_id: booking.vehicle_id.map(|v| v.to_string()),
            driver_id: booking.driver_id.map(|d| d.to_string()),
            start_time: booking.start_time,
            end_time: booking.end_time,
            total_price: booking.total_price,
            currency: booking.currency.as_str().to_string(),
            status: booking.status.as_str().to_string(),
            payment_status: booking.payment_status.as_str().to_string(),
            confirmed_at: booking.confirmed_at,
        }
    }
}

#[derive(Serialize)]
pub struct ConfirmBookingResponse {
    pub booking_id: String,
    pub status: String,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub vehicle_id: Option<String>,
    pub driver_id: Option<String>,
    pub payment_status: String,
    pub notification_status: String,
}

// -- Handlers --

/// POST /bookings — create a pending booking behind the slot guard.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let customer_id = match &req.customer_id {
        Some(raw) => CustomerId::from_uuid(parse_uuid(raw, "customer_id")?),
        None => CustomerId::new(),
    };
    let currency =
        Currency::parse(&req.currency).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let request = CreateBooking::new(
        customer_id,
        req.customer_email,
        req.start_time,
        req.end_time,
        req.total_price,
        currency,
    );

    let booking = state.creation_guard.create_booking(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse::from_booking(&booking)),
    ))
}

/// GET /bookings/:id — fetch a booking by ID.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking_id = BookingId::from_uuid(parse_uuid(&id, "booking id")?);

    let booking = state
        .store
        .fetch(booking_id)
        .await
        .map_err(SagaError::Store)?
        .ok_or_else(|| ApiError::NotFound(format!("Booking {id} not found")))?;

    Ok(Json(BookingResponse::from_booking(&booking)))
}

/// POST /bookings/:id/confirm_atomic — run the confirmation saga.
///
/// An `Idempotency-Key` header, when present, is forwarded to the fleet
/// and payment services so a redelivered request cannot double-reserve or
/// double-charge.
#[tracing::instrument(skip(state, headers, req))]
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<ConfirmBookingRequest>,
) -> Result<Json<ConfirmBookingResponse>, ApiError> {
    let booking_id = BookingId::from_uuid(parse_uuid(&id, "booking id")?);
    let vehicle_id = VehicleId::from_uuid(parse_uuid(&req.vehicle_id, "vehicle_id")?);
    let driver_id = DriverId::from_uuid(parse_uuid(&req.driver_id, "driver_id")?);

    let idempotency_key = headers
        .get(client::IDEMPOTENCY_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(IdempotencyKey::new);

    let request = ConfirmBooking::new(req.payment_reference, vehicle_id, driver_id);
    let outcome = state
        .orchestrator
        .confirm_booking(booking_id, request, idempotency_key)
        .await?;

    let booking = &outcome.booking;
    Ok(Json(ConfirmBookingResponse {
        booking_id: booking.id.to_string(),
        status: booking.status.as_str().to_string(),
        confirmed_at: booking.confirmed_at,
        vehicle_id: booking.vehicle_id.map(|v| v.to_string()),
        driver_id: booking.driver_id.map(|d| d.to_string()),
        payment_status: booking.payment_status.as_str().to_string(),
        notification_status: outcome.notification_status.as_str().to_string(),
    }))
}

fn parse_uuid(raw: &str, field: &str) -> Result<uuid::Uuid, ApiError> {
    uuid::Uuid::parse_str(raw).map_err(|e| ApiError::BadRequest(format!("Invalid {field}: {e}")))
}
