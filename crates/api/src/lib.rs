//! HTTP API server for the booking confirmation backend.
//!
//! Exposes booking creation, lookup and the atomic confirmation saga over
//! REST, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use booking_store::{BookingStore, InMemoryBookingStore};
use lock::{DistributedLock, InMemoryLock};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{
    ConfirmationOrchestrator, CreationGuard, FleetService, InMemoryFleetService,
    InMemoryNotificationService, InMemoryPaymentGateway, NotificationService, PaymentGateway,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
use routes::bookings::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/bookings", post(routes::bookings::create))
        .route("/bookings/{id}", get(routes::bookings::get))
        .route(
            "/bookings/{id}/confirm_atomic",
            post(routes::bookings::confirm),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Builds application state from explicit backends.
pub fn create_state(
    store: Arc<dyn BookingStore>,
    lock: Arc<dyn DistributedLock>,
    fleet: Arc<dyn FleetService>,
    payment: Arc<dyn PaymentGateway>,
    notification: Arc<dyn NotificationService>,
) -> Arc<AppState> {
    let orchestrator =
        ConfirmationOrchestrator::new(store.clone(), fleet, payment, notification);
    let creation_guard = CreationGuard::new(store.clone(), lock);

    Arc::new(AppState {
        orchestrator,
        creation_guard,
        store,
    })
}

/// Creates application state with in-memory backends throughout, for local
/// runs and tests.
pub fn create_default_state() -> Arc<AppState> {
    create_state(
        Arc::new(InMemoryBookingStore::new()),
        Arc::new(InMemoryLock::new()),
        Arc::new(InMemoryFleetService::new()),
        Arc::new(InMemoryPaymentGateway::new()),
        Arc::new(InMemoryNotificationService::new()),
    )
}
