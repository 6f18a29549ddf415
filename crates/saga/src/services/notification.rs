//! Notification service trait and implementations.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use client::{ClientError, ResilientClient};
use domain::booking::Booking;
use serde_json::json;

/// Trait for sending booking confirmation emails.
///
/// Delivery is best-effort: callers report the outcome but never fail or
/// reverse a confirmed booking over it.
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Sends the confirmation email for a booking.
    async fn send_booking_confirmation(&self, booking: &Booking) -> Result<(), ClientError>;
}

/// Notification service backed by the HTTP API of the email system.
#[derive(Debug, Clone)]
pub struct HttpNotificationService {
    client: ResilientClient,
}

impl HttpNotificationService {
    /// Creates a notification service on top of a configured HTTP client.
    pub fn new(client: ResilientClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotificationService for HttpNotificationService {
    async fn send_booking_confirmation(&self, booking: &Booking) -> Result<(), ClientError> {
        // Fire-and-forget: no idempotency key, a duplicate email is harmless.
        self.client
            .post::<serde_json::Value>(
                "/notifications/email/send",
                &json!({
                    "recipient_email": booking.customer_email,
                    "booking_payload": booking,
                }),
                None,
            )
            .await?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryNotificationState {
    sent: Vec<String>,
    fail_on_send: bool,
}

/// In-memory notification service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationService {
    state: Arc<RwLock<InMemoryNotificationState>>,
}

impl InMemoryNotificationService {
    /// Creates a new in-memory notification service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail send calls.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    /// Returns the number of emails sent.
    pub fn sent_count(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }

    /// Returns the recipients of sent emails, in send order.
    pub fn sent_recipients(&self) -> Vec<String> {
        self.state.read().unwrap().sent.clone()
    }
}

#[async_trait]
impl NotificationService for InMemoryNotificationService {
    async fn send_booking_confirmation(&self, booking: &Booking) -> Result<(), ClientError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_send {
            return Err(ClientError::Unavailable {
                url: "in-memory:/notifications/email/send".to_string(),
                attempts: 1,
                message: "Notification service unavailable".to_string(),
            });
        }

        state.sent.push(booking.customer_email.clone());
        Ok(())
    }
}
