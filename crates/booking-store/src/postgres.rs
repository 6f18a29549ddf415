use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::BookingId;
use domain::booking::{
    Booking, BookingError, BookingStatus, CreateBooking, Currency, CustomerId, DriverId,
    PaymentStatus, VehicleId,
};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::store::{BookingLease, BookingStore};
use crate::{Result, StoreError};

/// Postgres error code for `FOR UPDATE NOWAIT` hitting a held row lock.
const LOCK_NOT_AVAILABLE: &str = "55P03";

const BOOKING_COLUMNS: &str = "id, customer_id, customer_email, vehicle_id, driver_id, \
     start_time, end_time, total_price, currency, status, payment_status, \
     confirmed_at, created_at, updated_at";

/// PostgreSQL-backed booking store.
#[derive(Clone)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Creates a new PostgreSQL booking store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_booking(row: PgRow) -> Result<Booking> {
        let status: BookingStatus = row
            .try_get::<String, _>("status")?
            .parse()
            .map_err(|e: BookingError| StoreError::InvalidRow(e.to_string()))?;
        let payment_status: PaymentStatus = row
            .try_get::<String, _>("payment_status")?
            .parse()
            .map_err(|e: BookingError| StoreError::InvalidRow(e.to_string()))?;
        let currency = Currency::try_from(row.try_get::<String, _>("currency")?)
            .map_err(|e| StoreError::InvalidRow(e.to_string()))?;

        Ok(Booking {
            id: BookingId::from_uuid(row.try_get::<Uuid, _>("id")?),
            customer_id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
            customer_email: row.try_get("customer_email")?,
            vehicle_id: row
                .try_get::<Option<Uuid>, _>("vehicle_id")?
                .map(VehicleId::from_uuid),
            driver_id: row
                .try_get::<Option<Uuid>, _>("driver_id")?
                .map(DriverId::from_uuid),
            start_time: row.try_get("start_time")?,
            end_time: row.try_get("end_time")?,
            total_price: row.try_get::<Decimal, _>("total_price")?,
            currency,
            status,
            payment_status,
            confirmed_at: row.try_get("confirmed_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    #[tracing::instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    async fn insert(&self, request: CreateBooking) -> Result<Booking> {
        let booking = Booking::pending(request, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO bookings (id, customer_id, customer_email, vehicle_id, driver_id,
                start_time, end_time, total_price, currency, status, payment_status,
                confirmed_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(booking.id.as_uuid())
        .bind(booking.customer_id.as_uuid())
        .bind(&booking.customer_email)
        .bind(booking.vehicle_id.map(|v| v.as_uuid()))
        .bind(booking.driver_id.map(|d| d.as_uuid()))
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(booking.total_price)
        .bind(booking.currency.as_str())
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(booking.confirmed_at)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(booking)
    }

    async fn fetch(&self, id: BookingId) -> Result<Option<Booking>> {
        let row: Option<PgRow> =
            sqlx::query(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_booking).transpose()
    }

    async fn find_active_for_slot(
        &self,
        customer_id: CustomerId,
        start_date: NaiveDate,
    ) -> Result<Option<Booking>> {
        let row: Option<PgRow> = sqlx::query(&format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings
            WHERE customer_id = $1
              AND status IN ('Pending', 'Confirmed')
              AND (start_time AT TIME ZONE 'UTC')::date = $2
            LIMIT 1
            "#
        ))
        .bind(customer_id.as_uuid())
        .bind(start_date)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_booking).transpose()
    }

    #[tracing::instrument(skip(self), fields(booking_id = %id))]
    async fn lock_booking(&self, id: BookingId) -> Result<Box<dyn BookingLease>> {
        let mut tx = self.pool.begin().await?;

        let row: Option<PgRow> = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE NOWAIT"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.code().as_deref() == Some(LOCK_NOT_AVAILABLE)
            {
                return StoreError::RowLocked(id);
            }
            StoreError::Database(e)
        })?;

        match row {
            Some(row) => {
                let booking = Self::row_to_booking(row)?;
                Ok(Box::new(PostgresLease { tx, booking }))
            }
            None => Err(StoreError::BookingNotFound(id)),
        }
    }
}

/// Row lease held inside an open transaction. Dropping the lease drops the
/// transaction, which rolls back and releases the row lock.
struct PostgresLease {
    tx: Transaction<'static, Postgres>,
    booking: Booking,
}

#[async_trait]
impl BookingLease for PostgresLease {
    fn booking(&self) -> &Booking {
        &self.booking
    }

    async fn commit_confirmation(
        self: Box<Self>,
        vehicle_id: VehicleId,
        driver_id: DriverId,
        confirmed_at: DateTime<Utc>,
    ) -> Result<Booking> {
        let PostgresLease { mut tx, mut booking } = *self;
        booking.apply_confirmation(vehicle_id, driver_id, confirmed_at);

        sqlx::query(
            r#"
            UPDATE bookings
            SET status = $2,
                payment_status = $3,
                vehicle_id = $4,
                driver_id = $5,
                confirmed_at = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(booking.id.as_uuid())
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(booking.vehicle_id.map(|v| v.as_uuid()))
        .bind(booking.driver_id.map(|d| d.as_uuid()))
        .bind(booking.confirmed_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(booking)
    }
}
