use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::attendance::{AttendanceRecord, AttendanceStatus};
use crate::utils::errors::AppError;

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Puebla el roster del trip con los niños asignados hoy a la ruta,
    /// todos sin estado registrado. Idempotente por la UNIQUE (trip_id,
    /// child_id). Devuelve la cantidad de filas creadas.
    async fn create_roster(&self, trip_id: Uuid, route_id: Uuid) -> Result<u64, AppError>;

    async fn find(
        &self,
        trip_id: Uuid,
        child_id: Uuid,
    ) -> Result<Option<AttendanceRecord>, AppError>;

    async fn set_status(
        &self,
        trip_id: Uuid,
        child_id: Uuid,
        status: AttendanceStatus,
        recorded_by: Uuid,
        recorded_at: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AppError>;

    async fn list_for_trip(&self, trip_id: Uuid) -> Result<Vec<AttendanceRecord>, AppError>;
}

pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceStore for AttendanceRepository {
    async fn create_roster(&self, trip_id: Uuid, route_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_records (id, trip_id, child_id)
            SELECT gen_random_uuid(), $1, c.id
            FROM children c
            WHERE c.route_id = $2
            ON CONFLICT (trip_id, child_id) DO NOTHING
            "#,
        )
        .bind(trip_id)
        .bind(route_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find(
        &self,
        trip_id: Uuid,
        child_id: Uuid,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            "SELECT * FROM attendance_records WHERE trip_id = $1 AND child_id = $2",
        )
        .bind(trip_id)
        .bind(child_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn set_status(
        &self,
        trip_id: Uuid,
        child_id: Uuid,
        status: AttendanceStatus,
        recorded_by: Uuid,
        recorded_at: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AppError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            UPDATE attendance_records
            SET status = $3, recorded_by = $4, recorded_at = $5
            WHERE trip_id = $1 AND child_id = $2
            RETURNING *
            "#,
        )
        .bind(trip_id)
        .bind(child_id)
        .bind(status.as_str())
        .bind(recorded_by)
        .bind(recorded_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_for_trip(&self, trip_id: Uuid) -> Result<Vec<AttendanceRecord>, AppError> {
        let records = sqlx::query_as::<_, AttendanceRecord>(
            "SELECT * FROM attendance_records WHERE trip_id = $1",
        )
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
