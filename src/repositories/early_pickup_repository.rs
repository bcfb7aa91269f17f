use async_trait::async_trait;
use chrono::{NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::early_pickup::{EarlyPickupRequest, EarlyPickupStatus};
use crate::utils::errors::AppError;

/// Acceso a solicitudes de retiro anticipado. El índice único parcial
/// sobre (trip_id, child_id) WHERE status = 'PENDING' respalda la regla
/// de una sola PENDING por par; `create` traduce esa violación a Conflict.
#[async_trait]
pub trait EarlyPickupStore: Send + Sync {
    async fn pending_exists(&self, trip_id: Uuid, child_id: Uuid) -> Result<bool, AppError>;

    async fn create(
        &self,
        trip_id: Uuid,
        child_id: Uuid,
        requested_by: Uuid,
        reason: Option<String>,
        pickup_time: Option<NaiveTime>,
    ) -> Result<EarlyPickupRequest, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<EarlyPickupRequest>, AppError>;

    async fn set_status(
        &self,
        id: Uuid,
        status: EarlyPickupStatus,
        approved_by: Option<Uuid>,
    ) -> Result<EarlyPickupRequest, AppError>;
}

pub struct EarlyPickupRepository {
    pool: PgPool,
}

impl EarlyPickupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EarlyPickupStore for EarlyPickupRepository {
    async fn pending_exists(&self, trip_id: Uuid, child_id: Uuid) -> Result<bool, AppError> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM early_pickup_requests
                WHERE trip_id = $1 AND child_id = $2 AND status = 'PENDING'
            )
            "#,
        )
        .bind(trip_id)
        .bind(child_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn create(
        &self,
        trip_id: Uuid,
        child_id: Uuid,
        requested_by: Uuid,
        reason: Option<String>,
        pickup_time: Option<NaiveTime>,
    ) -> Result<EarlyPickupRequest, AppError> {
        let now = Utc::now();
        let request = sqlx::query_as::<_, EarlyPickupRequest>(
            r#"
            INSERT INTO early_pickup_requests
                (id, trip_id, child_id, requested_by, reason, pickup_time, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'PENDING', $7, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(trip_id)
        .bind(child_id)
        .bind(requested_by)
        .bind(reason)
        .bind(pickup_time)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(
                "Ya existe una solicitud pendiente para este niño y trip".to_string(),
            ),
            _ => AppError::Database(e),
        })?;

        Ok(request)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<EarlyPickupRequest>, AppError> {
        let request = sqlx::query_as::<_, EarlyPickupRequest>(
            "SELECT * FROM early_pickup_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: EarlyPickupStatus,
        approved_by: Option<Uuid>,
    ) -> Result<EarlyPickupRequest, AppError> {
        let request = sqlx::query_as::<_, EarlyPickupRequest>(
            r#"
            UPDATE early_pickup_requests
            SET status = $2, approved_by = COALESCE($3, approved_by), updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(approved_by)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }
}
