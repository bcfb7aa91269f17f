use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::schedule::ScheduledRoute;
use crate::models::trip::{Trip, TripStatus};
use crate::utils::errors::AppError;

/// Acceso a trips. El trait permite inyectar un store en memoria en los
/// tests de servicios, igual que EventPublisher con el broker.
#[async_trait]
pub trait TripStore: Send + Sync {
    async fn exists_for(&self, schedule_id: Uuid, trip_date: NaiveDate)
        -> Result<bool, AppError>;

    /// Crea el trip del día para un horario. None significa que otro
    /// proceso ya lo materializó (carrera perdida en el ON CONFLICT).
    async fn create_from_schedule(
        &self,
        schedule: &ScheduledRoute,
        trip_date: NaiveDate,
    ) -> Result<Option<Trip>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Trip>, AppError>;

    async fn set_status(&self, id: Uuid, status: TripStatus) -> Result<Trip, AppError>;
}

pub struct TripRepository {
    pool: PgPool,
}

impl TripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TripStore for TripRepository {
    async fn exists_for(
        &self,
        schedule_id: Uuid,
        trip_date: NaiveDate,
    ) -> Result<bool, AppError> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM trips WHERE schedule_id = $1 AND trip_date = $2)",
        )
        .bind(schedule_id)
        .bind(trip_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// La constraint UNIQUE (schedule_id, trip_date) hace el chequeo de
    /// existencia definitivo: bajo carrera el ON CONFLICT devuelve None y
    /// el caller lo trata como "ya materializado".
    async fn create_from_schedule(
        &self,
        schedule: &ScheduledRoute,
        trip_date: NaiveDate,
    ) -> Result<Option<Trip>, AppError> {
        let trip = sqlx::query_as::<_, Trip>(
            r#"
            INSERT INTO trips
                (id, schedule_id, route_id, driver_id, vehicle_id, trip_date, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'SCHEDULED', $7)
            ON CONFLICT (schedule_id, trip_date) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(schedule.id)
        .bind(schedule.route_id)
        .bind(schedule.driver_id)
        .bind(schedule.vehicle_id)
        .bind(trip_date)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(trip)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Trip>, AppError> {
        let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(trip)
    }

    async fn set_status(&self, id: Uuid, status: TripStatus) -> Result<Trip, AppError> {
        let trip = sqlx::query_as::<_, Trip>(
            "UPDATE trips SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(trip)
    }
}
