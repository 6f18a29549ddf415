//! Downstream service traits and in-memory implementations for saga steps.

pub mod fleet;
pub mod notification;
pub mod payment;

pub use fleet::{FleetService, HttpFleetService, InMemoryFleetService};
pub use notification::{
    HttpNotificationService, InMemoryNotificationService, NotificationService,
};
pub use payment::{HttpPaymentGateway, InMemoryPaymentGateway, PaymentGateway};
