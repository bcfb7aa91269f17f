use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::schedule_dto::{
    CreateScheduleRequest, MaterializeRequest, ScheduleResponse, UpdateScheduleRequest,
};
use crate::models::identity::Identity;
use crate::realtime::fanout::EventPublisher;
use crate::services::materialization_service::{MaterializationService, MaterializationSummary};
use crate::services::schedule_service::ScheduleService;
use crate::utils::errors::AppError;

pub struct ScheduleController {
    service: ScheduleService,
    materialization: MaterializationService,
}

impl ScheduleController {
    pub fn new(pool: PgPool, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            service: ScheduleService::new(pool.clone(), publisher.clone()),
            materialization: MaterializationService::new(pool, publisher),
        }
    }

    pub async fn create(
        &self,
        caller: &Identity,
        request: CreateScheduleRequest,
    ) -> Result<ApiResponse<ScheduleResponse>, AppError> {
        require_admin(caller)?;
        request.validate()?;

        let schedule = self
            .service
            .create(
                request.route_id,
                request.driver_id,
                request.vehicle_id,
                request.departure_time,
                request.recurring_days,
                request.effective_from,
                request.effective_until,
            )
            .await?;

        Ok(ApiResponse::success_with_message(
            schedule.into(),
            "Horario creado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<ScheduleResponse, AppError> {
        Ok(self.service.get(id).await?.into())
    }

    pub async fn list(&self) -> Result<Vec<ScheduleResponse>, AppError> {
        Ok(self
            .service
            .list()
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    pub async fn update(
        &self,
        caller: &Identity,
        id: Uuid,
        request: UpdateScheduleRequest,
    ) -> Result<ApiResponse<ScheduleResponse>, AppError> {
        require_admin(caller)?;
        request.validate()?;

        let schedule = self
            .service
            .update(
                id,
                request.departure_time,
                request.recurring_days,
                request.driver_id,
                request.vehicle_id,
                request.effective_from,
                request.effective_until,
            )
            .await?;

        Ok(ApiResponse::success_with_message(
            schedule.into(),
            "Horario actualizado exitosamente".to_string(),
        ))
    }

    pub async fn suspend(
        &self,
        caller: &Identity,
        id: Uuid,
    ) -> Result<ApiResponse<ScheduleResponse>, AppError> {
        require_admin(caller)?;
        let schedule = self.service.suspend(id).await?;
        Ok(ApiResponse::success_with_message(
            schedule.into(),
            "Horario suspendido".to_string(),
        ))
    }

    pub async fn activate(
        &self,
        caller: &Identity,
        id: Uuid,
    ) -> Result<ApiResponse<ScheduleResponse>, AppError> {
        require_admin(caller)?;
        let schedule = self.service.activate(id).await?;
        Ok(ApiResponse::success_with_message(
            schedule.into(),
            "Horario activado".to_string(),
        ))
    }

    pub async fn delete(&self, caller: &Identity, id: Uuid) -> Result<(), AppError> {
        require_admin(caller)?;
        self.service.delete(id).await
    }

    /// Corrida manual de materialización. Segura de reintentar por la
    /// idempotencia de (schedule_id, trip_date).
    pub async fn materialize(
        &self,
        caller: &Identity,
        request: MaterializeRequest,
    ) -> Result<ApiResponse<MaterializationSummary>, AppError> {
        require_admin(caller)?;
        let date = request.date.unwrap_or_else(|| Utc::now().date_naive());
        let summary = self.materialization.run_for_date(date).await?;
        Ok(ApiResponse::success(summary))
    }
}

fn require_admin(caller: &Identity) -> Result<(), AppError> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Solo un administrador gestiona horarios".to_string(),
        ))
    }
}
