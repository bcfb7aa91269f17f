use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::early_pickup_dto::{CreateEarlyPickupRequest, EarlyPickupResponse};
use crate::models::identity::Identity;
use crate::realtime::fanout::EventPublisher;
use crate::services::early_pickup_service::EarlyPickupService;
use crate::utils::errors::AppError;

pub struct EarlyPickupController {
    service: EarlyPickupService,
}

impl EarlyPickupController {
    pub fn new(pool: PgPool, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            service: EarlyPickupService::new(pool, publisher),
        }
    }

    pub async fn create(
        &self,
        caller: &Identity,
        request: CreateEarlyPickupRequest,
    ) -> Result<ApiResponse<EarlyPickupResponse>, AppError> {
        request.validate()?;
        let created = self
            .service
            .create(
                request.trip_id,
                request.child_id,
                caller,
                request.reason,
                request.pickup_time,
            )
            .await?;
        Ok(ApiResponse::success_with_message(
            created.into(),
            "Solicitud de retiro anticipado creada".to_string(),
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<EarlyPickupResponse, AppError> {
        Ok(self.service.get(id).await?.into())
    }

    pub async fn approve(
        &self,
        caller: &Identity,
        id: Uuid,
    ) -> Result<ApiResponse<EarlyPickupResponse>, AppError> {
        let updated = self.service.approve(id, caller).await?;
        Ok(ApiResponse::success_with_message(
            updated.into(),
            "Solicitud aprobada".to_string(),
        ))
    }

    pub async fn reject(
        &self,
        caller: &Identity,
        id: Uuid,
    ) -> Result<ApiResponse<EarlyPickupResponse>, AppError> {
        let updated = self.service.reject(id, caller).await?;
        Ok(ApiResponse::success_with_message(
            updated.into(),
            "Solicitud rechazada".to_string(),
        ))
    }

    pub async fn cancel(
        &self,
        caller: &Identity,
        id: Uuid,
    ) -> Result<ApiResponse<EarlyPickupResponse>, AppError> {
        let updated = self.service.cancel(id, caller).await?;
        Ok(ApiResponse::success_with_message(
            updated.into(),
            "Solicitud cancelada".to_string(),
        ))
    }
}
