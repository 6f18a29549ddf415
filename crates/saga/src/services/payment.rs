//! Payment gateway trait and implementations.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use client::{ClientError, ResilientClient};
use common::IdempotencyKey;
use domain::booking::Currency;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

/// Gateway statuses that count as settled money.
///
/// Anything else returned with a 2xx (for example "authorized" or
/// "pending_review") is treated as a rejection: the saga must not confirm
/// a booking against unsettled funds.
const SETTLED_STATUSES: [&str; 2] = ["captured", "succeeded"];

/// Trait for payment confirmation against the payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Confirms that the referenced payment settled for the expected amount.
    async fn confirm(
        &self,
        reference: &str,
        expected_amount: Decimal,
        currency: &Currency,
        idempotency_key: Option<&IdempotencyKey>,
    ) -> Result<(), ClientError>;
}

#[derive(Debug, Deserialize)]
struct PaymentConfirmation {
    status: String,
}

/// Payment gateway backed by the HTTP API of the payment provider.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    client: ResilientClient,
}

impl HttpPaymentGateway {
    /// Creates a payment gateway on top of a configured HTTP client.
    pub fn new(client: ResilientClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn confirm(
        &self,
        reference: &str,
        expected_amount: Decimal,
        currency: &Currency,
        idempotency_key: Option<&IdempotencyKey>,
    ) -> Result<(), ClientError> {
        let confirmation: PaymentConfirmation = self
            .client
            .post(
                "/payments/confirm",
                &json!({
                    "reference": reference,
                    "expected_amount": expected_amount,
                    "currency": currency,
                }),
                idempotency_key,
            )
            .await?;

        if !SETTLED_STATUSES.contains(&confirmation.status.as_str()) {
            return Err(ClientError::Rejected {
                status: 200,
                message: format!("Payment not settled: status {:?}", confirmation.status),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    confirmed: HashMap<String, Decimal>,
    confirm_calls: u32,
    fail_on_confirm: bool,
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory payment gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to decline confirmations.
    pub fn set_fail_on_confirm(&self, fail: bool) {
        self.state.write().unwrap().fail_on_confirm = fail;
    }

    /// Returns the number of confirmed payments.
    pub fn confirmation_count(&self) -> usize {
        self.state.read().unwrap().confirmed.len()
    }

    /// Returns true if the referenced payment was confirmed.
    pub fn has_confirmation(&self, reference: &str) -> bool {
        self.state.read().unwrap().confirmed.contains_key(reference)
    }

    /// Returns how many confirm calls were made, including declined ones.
    pub fn confirm_call_count(&self) -> u32 {
        self.state.read().unwrap().confirm_calls
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn confirm(
        &self,
        reference: &str,
        expected_amount: Decimal,
        _currency: &Currency,
        _idempotency_key: Option<&IdempotencyKey>,
    ) -> Result<(), ClientError> {
        let mut state = self.state.write().unwrap();
        state.confirm_calls += 1;

        if state.fail_on_confirm {
            return Err(ClientError::Rejected {
                status: 400,
                message: "Payment declined".to_string(),
            });
        }

        state.confirmed.insert(reference.to_string(), expected_amount);
        Ok(())
    }
}
