//! Integration tests for the confirmation saga and the creation guard.

use std::sync::Arc;

use booking_store::{BookingStore, InMemoryBookingStore};
use chrono::{DateTime, Duration, Utc};
use domain::booking::{
    Booking, BookingStatus, ConfirmBooking, CreateBooking, Currency, CustomerId, DriverId,
    PaymentStatus, VehicleId,
};
use lock::InMemoryLock;
use rust_decimal::Decimal;
use saga::{
    ConfirmationOrchestrator, CreationGuard, InMemoryFleetService, InMemoryNotificationService,
    InMemoryPaymentGateway, NotificationStatus, SagaError,
};

struct TestHarness {
    orchestrator: Arc<ConfirmationOrchestrator>,
    guard: Arc<CreationGuard>,
    store: InMemoryBookingStore,
    fleet: InMemoryFleetService,
    payment: InMemoryPaymentGateway,
    notification: InMemoryNotificationService,
}

impl TestHarness {
    fn new() -> Self {
        let store = InMemoryBookingStore::new();
        let lock = InMemoryLock::new();
        let fleet = InMemoryFleetService::new();
        let payment = InMemoryPaymentGateway::new();
        let notification = InMemoryNotificationService::new();

        let orchestrator = Arc::new(ConfirmationOrchestrator::new(
            Arc::new(store.clone()),
            Arc::new(fleet.clone()),
            Arc::new(payment.clone()),
            Arc::new(notification.clone()),
        ));
        let guard = Arc::new(CreationGuard::new(
            Arc::new(store.clone()),
            Arc::new(lock.clone()),
        ));

        Self {
            orchestrator,
            guard,
            store,
            fleet,
            payment,
            notification,
        }
    }

    async fn create_pending_booking(&self) -> Booking {
        let request = create_request(CustomerId::new(), Utc::now() + Duration::days(1));
        self.guard.create_booking(request).await.unwrap()
    }
}

fn create_request(customer_id: CustomerId, start: DateTime<Utc>) -> CreateBooking {
    CreateBooking::new(
        customer_id,
        "renter@example.com",
        start,
        start + Duration::days(3),
        Decimal::new(25000, 2),
        Currency::parse("EUR").unwrap(),
    )
}

fn confirm_request() -> ConfirmBooking {
    ConfirmBooking::new("pay_123", VehicleId::new(), DriverId::new())
}

#[tokio::test]
async fn test_full_lifecycle_create_then_confirm() {
    let h = TestHarness::new();
    let booking = h.create_pending_booking().await;
    assert_eq!(booking.status, BookingStatus::Pending);

    let request = confirm_request();
    let vehicle_id = request.vehicle_id;
    let driver_id = request.driver_id;

    let outcome = h
        .orchestrator
        .confirm_booking(booking.id, request, None)
        .await
        .unwrap();

    assert_eq!(outcome.booking.status, BookingStatus::Confirmed);
    assert_eq!(outcome.booking.payment_status, PaymentStatus::Paid);
    assert_eq!(outcome.booking.vehicle_id, Some(vehicle_id));
    assert_eq!(outcome.booking.driver_id, Some(driver_id));
    assert!(outcome.booking.confirmed_at.is_some());
    assert_eq!(outcome.notification_status, NotificationStatus::Sent);

    let stored = h.store.fetch(booking.id).await.unwrap().unwrap();
    assert_eq!(stored, outcome.booking);

    assert!(h.fleet.has_reservation(vehicle_id, booking.id));
    assert!(h.payment.has_confirmation("pay_123"));
    assert_eq!(h.notification.sent_recipients(), vec!["renter@example.com"]);
}

#[tokio::test]
async fn test_payment_declined_leaves_booking_retryable() {
    let h = TestHarness::new();
    let booking = h.create_pending_booking().await;

    h.payment.set_fail_on_confirm(true);
    let result = h
        .orchestrator
        .confirm_booking(booking.id, confirm_request(), None)
        .await;

    match result {
        Err(SagaError::Payment(error)) => assert!(error.to_string().contains("declined")),
        other => panic!("expected Payment error, got {other:?}"),
    }
    assert_eq!(h.fleet.release_calls().len(), 1);
    assert_eq!(h.notification.sent_count(), 0);

    let stored = h.store.fetch(booking.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BookingStatus::Pending);
    assert_eq!(stored.payment_status, PaymentStatus::Pending);

    // The same booking confirms cleanly once the gateway recovers.
    h.payment.set_fail_on_confirm(false);
    let outcome = h
        .orchestrator
        .confirm_booking(booking.id, confirm_request(), None)
        .await
        .unwrap();
    assert_eq!(outcome.booking.status, BookingStatus::Confirmed);
    assert_eq!(outcome.notification_status, NotificationStatus::Sent);
}

#[tokio::test]
async fn test_notification_outage_still_confirms() {
    let h = TestHarness::new();
    let booking = h.create_pending_booking().await;

    h.notification.set_fail_on_send(true);
    let outcome = h
        .orchestrator
        .confirm_booking(booking.id, confirm_request(), None)
        .await
        .unwrap();

    assert_eq!(outcome.booking.status, BookingStatus::Confirmed);
    assert_eq!(outcome.notification_status, NotificationStatus::Failed);

    let stored = h.store.fetch(booking.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BookingStatus::Confirmed);
    assert_eq!(stored.payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn test_concurrent_confirmations_have_a_single_winner() {
    let h = TestHarness::new();
    let booking = h.create_pending_booking().await;

    let first = {
        let orchestrator = h.orchestrator.clone();
        let id = booking.id;
        tokio::spawn(async move { orchestrator.confirm_booking(id, confirm_request(), None).await })
    };
    let second = {
        let orchestrator = h.orchestrator.clone();
        let id = booking.id;
        tokio::spawn(async move { orchestrator.confirm_booking(id, confirm_request(), None).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];

    let winners = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(winners, 1);
    for result in &results {
        if let Err(error) = result {
            assert!(matches!(
                error,
                SagaError::ConfirmationInProgress(_) | SagaError::NotConfirmable { .. }
            ));
        }
    }

    // Only the winner reached the downstream services.
    assert_eq!(h.fleet.reserve_call_count(), 1);
    assert_eq!(h.payment.confirm_call_count(), 1);
    assert_eq!(h.notification.sent_count(), 1);

    let stored = h.store.fetch(booking.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn test_concurrent_creations_yield_one_booking() {
    let h = TestHarness::new();
    let customer_id = CustomerId::new();
    let start = Utc::now() + Duration::days(1);

    let first = {
        let guard = h.guard.clone();
        let request = create_request(customer_id, start);
        tokio::spawn(async move { guard.create_booking(request).await })
    };
    let second = {
        let guard = h.guard.clone();
        let request = create_request(customer_id, start);
        tokio::spawn(async move { guard.create_booking(request).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];

    let winners = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(winners, 1);
    for result in &results {
        if let Err(error) = result {
            assert!(matches!(
                error,
                SagaError::SlotContended | SagaError::SlotTaken
            ));
        }
    }
    assert_eq!(h.store.booking_count().await, 1);
}
