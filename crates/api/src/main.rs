//! API server entry point.

use std::sync::Arc;

use api::Config;
use booking_store::{BookingStore, InMemoryBookingStore, PostgresBookingStore};
use client::ResilientClient;
use lock::{DistributedLock, InMemoryLock, RedisLock};
use saga::{
    FleetService, HttpFleetService, HttpNotificationService, HttpPaymentGateway,
    InMemoryFleetService, InMemoryNotificationService, InMemoryPaymentGateway,
    NotificationService, PaymentGateway,
};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Selects backends from configuration: Postgres, Redis and the downstream
/// HTTP services when configured, in-memory implementations otherwise.
async fn build_state(config: &Config) -> Arc<api::routes::bookings::AppState> {
    let store: Arc<dyn BookingStore> = match &config.database_url {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .expect("failed to connect to Postgres");
            let store = PostgresBookingStore::new(pool);
            store
                .run_migrations()
                .await
                .expect("failed to run database migrations");
            tracing::info!("using Postgres booking store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory booking store");
            Arc::new(InMemoryBookingStore::new())
        }
    };

    let lock: Arc<dyn DistributedLock> = match &config.redis_url {
        Some(url) => {
            tracing::info!("using Redis lock backend");
            Arc::new(RedisLock::new(url).expect("failed to open Redis lock backend"))
        }
        None => {
            tracing::warn!("REDIS_URL not set, using in-memory lock backend");
            Arc::new(InMemoryLock::new())
        }
    };

    let fleet: Arc<dyn FleetService> = match &config.fleet.base_url {
        Some(url) => Arc::new(HttpFleetService::new(ResilientClient::new(
            url.clone(),
            config.fleet.client_options(),
        ))),
        None => Arc::new(InMemoryFleetService::new()),
    };

    let payment: Arc<dyn PaymentGateway> = match &config.payment.base_url {
        Some(url) => Arc::new(HttpPaymentGateway::new(ResilientClient::new(
            url.clone(),
            config.payment.client_options(),
        ))),
        None => Arc::new(InMemoryPaymentGateway::new()),
    };

    let notification: Arc<dyn NotificationService> = match &config.notification.base_url {
        Some(url) => Arc::new(HttpNotificationService::new(ResilientClient::new(
            url.clone(),
            config.notification.client_options(),
        ))),
        None => Arc::new(InMemoryNotificationService::new()),
    };

    api::create_state(store, lock, fleet, payment, notification)
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Wire backends and build the application
    let state = build_state(&config).await;
    let app = api::create_app(state, metrics_handle);

    // 4. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
