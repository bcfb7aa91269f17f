use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::schedule::{ScheduleStatus, ScheduledRoute};
use crate::utils::errors::AppError;

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    async fn create(
        &self,
        route_id: Uuid,
        driver_id: Uuid,
        vehicle_id: Uuid,
        departure_time: NaiveTime,
        recurring_days: Vec<i16>,
        effective_from: Option<NaiveDate>,
        effective_until: Option<NaiveDate>,
    ) -> Result<ScheduledRoute, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScheduledRoute>, AppError>;

    async fn list(&self) -> Result<Vec<ScheduledRoute>, AppError>;

    /// Horarios ACTIVE, candidatos a materialización (el filtro fino de
    /// día/ventana lo hace `is_eligible_on` en la aplicación)
    async fn find_active(&self) -> Result<Vec<ScheduledRoute>, AppError>;

    /// Actualización parcial. Para las cotas de vigencia, el Option
    /// exterior distingue "no tocar" (None) de "escribir" (Some), y el
    /// interior admite Some(None) para limpiar la cota.
    #[allow(clippy::too_many_arguments)]
    async fn update(
        &self,
        id: Uuid,
        departure_time: Option<NaiveTime>,
        recurring_days: Option<Vec<i16>>,
        driver_id: Option<Uuid>,
        vehicle_id: Option<Uuid>,
        effective_from: Option<Option<NaiveDate>>,
        effective_until: Option<Option<NaiveDate>>,
    ) -> Result<ScheduledRoute, AppError>;

    async fn set_status(
        &self,
        id: Uuid,
        status: ScheduleStatus,
    ) -> Result<ScheduledRoute, AppError>;

    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

pub struct ScheduleRepository {
    pool: PgPool,
}

impl ScheduleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleStore for ScheduleRepository {
    async fn create(
        &self,
        route_id: Uuid,
        driver_id: Uuid,
        vehicle_id: Uuid,
        departure_time: NaiveTime,
        recurring_days: Vec<i16>,
        effective_from: Option<NaiveDate>,
        effective_until: Option<NaiveDate>,
    ) -> Result<ScheduledRoute, AppError> {
        let schedule = sqlx::query_as::<_, ScheduledRoute>(
            r#"
            INSERT INTO scheduled_routes
                (id, route_id, driver_id, vehicle_id, departure_time, recurring_days, status, effective_from, effective_until, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'ACTIVE', $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(route_id)
        .bind(driver_id)
        .bind(vehicle_id)
        .bind(departure_time)
        .bind(recurring_days)
        .bind(effective_from)
        .bind(effective_until)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(schedule)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScheduledRoute>, AppError> {
        let schedule =
            sqlx::query_as::<_, ScheduledRoute>("SELECT * FROM scheduled_routes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(schedule)
    }

    async fn list(&self) -> Result<Vec<ScheduledRoute>, AppError> {
        let schedules = sqlx::query_as::<_, ScheduledRoute>(
            "SELECT * FROM scheduled_routes ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(schedules)
    }

    async fn find_active(&self) -> Result<Vec<ScheduledRoute>, AppError> {
        let schedules = sqlx::query_as::<_, ScheduledRoute>(
            "SELECT * FROM scheduled_routes WHERE status = 'ACTIVE'",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(schedules)
    }

    async fn update(
        &self,
        id: Uuid,
        departure_time: Option<NaiveTime>,
        recurring_days: Option<Vec<i16>>,
        driver_id: Option<Uuid>,
        vehicle_id: Option<Uuid>,
        effective_from: Option<Option<NaiveDate>>,
        effective_until: Option<Option<NaiveDate>>,
    ) -> Result<ScheduledRoute, AppError> {
        // Obtener horario actual
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Horario no encontrado".to_string()))?;

        let schedule = sqlx::query_as::<_, ScheduledRoute>(
            r#"
            UPDATE scheduled_routes
            SET departure_time = $2, recurring_days = $3, driver_id = $4, vehicle_id = $5,
                effective_from = CASE WHEN $6 THEN $7 ELSE effective_from END,
                effective_until = CASE WHEN $8 THEN $9 ELSE effective_until END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(departure_time.unwrap_or(current.departure_time))
        .bind(recurring_days.unwrap_or(current.recurring_days))
        .bind(driver_id.unwrap_or(current.driver_id))
        .bind(vehicle_id.unwrap_or(current.vehicle_id))
        .bind(effective_from.is_some())
        .bind(effective_from.flatten())
        .bind(effective_until.is_some())
        .bind(effective_until.flatten())
        .fetch_one(&self.pool)
        .await?;

        Ok(schedule)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ScheduleStatus,
    ) -> Result<ScheduledRoute, AppError> {
        let schedule = sqlx::query_as::<_, ScheduledRoute>(
            "UPDATE scheduled_routes SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(schedule)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM scheduled_routes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Horario no encontrado".to_string()));
        }

        Ok(())
    }
}
