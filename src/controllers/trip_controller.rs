use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::common::ApiResponse;
use crate::dto::trip_dto::{AttendanceResponse, RecordAttendanceRequest, TripResponse};
use crate::models::identity::Identity;
use crate::realtime::fanout::EventPublisher;
use crate::services::attendance_service::AttendanceService;
use crate::services::trip_service::TripService;
use crate::utils::errors::AppError;

pub struct TripController {
    trips: TripService,
    attendance: AttendanceService,
}

impl TripController {
    pub fn new(pool: PgPool, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            trips: TripService::new(pool.clone(), publisher.clone()),
            attendance: AttendanceService::new(pool, publisher),
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<TripResponse, AppError> {
        Ok(self.trips.get(id).await?.into())
    }

    pub async fn start(
        &self,
        caller: &Identity,
        id: Uuid,
    ) -> Result<ApiResponse<TripResponse>, AppError> {
        let trip = self.trips.start(id, caller).await?;
        Ok(ApiResponse::success_with_message(
            trip.into(),
            "Trip iniciado".to_string(),
        ))
    }

    pub async fn complete(
        &self,
        caller: &Identity,
        id: Uuid,
    ) -> Result<ApiResponse<TripResponse>, AppError> {
        let trip = self.trips.complete(id, caller).await?;
        Ok(ApiResponse::success_with_message(
            trip.into(),
            "Trip completado".to_string(),
        ))
    }

    pub async fn record_attendance(
        &self,
        caller: &Identity,
        trip_id: Uuid,
        request: RecordAttendanceRequest,
    ) -> Result<ApiResponse<AttendanceResponse>, AppError> {
        let record = self
            .attendance
            .record(trip_id, request.child_id, request.status, caller)
            .await?;
        Ok(ApiResponse::success(record.into()))
    }

    pub async fn list_attendance(
        &self,
        trip_id: Uuid,
    ) -> Result<Vec<AttendanceResponse>, AppError> {
        Ok(self
            .attendance
            .list_for_trip(trip_id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}
