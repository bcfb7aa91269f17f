use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::trip_exception::{ExceptionStatus, TripException, EXCEPTION_SKIP_TRIP};
use crate::utils::errors::AppError;

#[async_trait]
pub trait TripExceptionStore: Send + Sync {
    /// Upsert por (trip, child): crea la excepción ACTIVE o reactiva la
    /// existente pisando motivo, solicitante y timestamp.
    async fn upsert_skip(
        &self,
        trip_id: Uuid,
        child_id: Uuid,
        requested_by: Uuid,
        reason: Option<String>,
    ) -> Result<TripException, AppError>;

    async fn find(&self, trip_id: Uuid, child_id: Uuid)
        -> Result<Option<TripException>, AppError>;

    async fn set_status(
        &self,
        trip_id: Uuid,
        child_id: Uuid,
        status: ExceptionStatus,
    ) -> Result<Option<TripException>, AppError>;
}

pub struct TripExceptionRepository {
    pool: PgPool,
}

impl TripExceptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TripExceptionStore for TripExceptionRepository {
    async fn upsert_skip(
        &self,
        trip_id: Uuid,
        child_id: Uuid,
        requested_by: Uuid,
        reason: Option<String>,
    ) -> Result<TripException, AppError> {
        let exception = sqlx::query_as::<_, TripException>(
            r#"
            INSERT INTO trip_exceptions
                (id, trip_id, child_id, exception_type, reason, status, requested_by, requested_at)
            VALUES ($1, $2, $3, $4, $5, 'ACTIVE', $6, $7)
            ON CONFLICT (trip_id, child_id) DO UPDATE
            SET status = 'ACTIVE',
                reason = EXCLUDED.reason,
                requested_by = EXCLUDED.requested_by,
                requested_at = EXCLUDED.requested_at
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(trip_id)
        .bind(child_id)
        .bind(EXCEPTION_SKIP_TRIP)
        .bind(reason)
        .bind(requested_by)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(exception)
    }

    async fn find(
        &self,
        trip_id: Uuid,
        child_id: Uuid,
    ) -> Result<Option<TripException>, AppError> {
        let exception = sqlx::query_as::<_, TripException>(
            "SELECT * FROM trip_exceptions WHERE trip_id = $1 AND child_id = $2",
        )
        .bind(trip_id)
        .bind(child_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(exception)
    }

    async fn set_status(
        &self,
        trip_id: Uuid,
        child_id: Uuid,
        status: ExceptionStatus,
    ) -> Result<Option<TripException>, AppError> {
        let exception = sqlx::query_as::<_, TripException>(
            r#"
            UPDATE trip_exceptions
            SET status = $3
            WHERE trip_id = $1 AND child_id = $2
            RETURNING *
            "#,
        )
        .bind(trip_id)
        .bind(child_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(exception)
    }
}
