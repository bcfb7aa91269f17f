use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::common::ApiResponse;
use crate::dto::exception_dto::{RequestSkipRequest, TripExceptionResponse};
use crate::models::identity::Identity;
use crate::realtime::fanout::EventPublisher;
use crate::services::trip_exception_service::TripExceptionService;
use crate::utils::errors::AppError;

pub struct TripExceptionController {
    service: TripExceptionService,
}

impl TripExceptionController {
    pub fn new(pool: PgPool, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            service: TripExceptionService::new(pool, publisher),
        }
    }

    pub async fn request_skip(
        &self,
        caller: &Identity,
        request: RequestSkipRequest,
    ) -> Result<ApiResponse<TripExceptionResponse>, AppError> {
        request.validate()?;
        let exception = self
            .service
            .request_skip(request.trip_id, request.child_id, caller, request.reason)
            .await?;
        Ok(ApiResponse::success_with_message(
            exception.into(),
            "Excepción de viaje registrada".to_string(),
        ))
    }

    pub async fn cancel(
        &self,
        caller: &Identity,
        trip_id: Uuid,
        child_id: Uuid,
    ) -> Result<ApiResponse<TripExceptionResponse>, AppError> {
        let exception = self.service.cancel(trip_id, child_id, caller).await?;
        Ok(ApiResponse::success_with_message(
            exception.into(),
            "Excepción cancelada".to_string(),
        ))
    }
}
