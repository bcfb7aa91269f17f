use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::trip_controller::TripController;
use crate::dto::common::ApiResponse;
use crate::dto::trip_dto::{AttendanceResponse, RecordAttendanceRequest, TripResponse};
use crate::models::identity::Identity;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_trip_router() -> Router<AppState> {
    Router::new()
        .route("/:id", get(get_trip))
        .route("/:id/start", post(start_trip))
        .route("/:id/complete", post(complete_trip))
        .route("/:id/attendance", post(record_attendance))
        .route("/:id/attendance", get(list_attendance))
}

async fn get_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TripResponse>, AppError> {
    let controller = TripController::new(state.pool.clone(), state.publisher.clone());
    Ok(Json(controller.get_by_id(id).await?))
}

async fn start_trip(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TripResponse>>, AppError> {
    let controller = TripController::new(state.pool.clone(), state.publisher.clone());
    Ok(Json(controller.start(&identity, id).await?))
}

async fn complete_trip(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TripResponse>>, AppError> {
    let controller = TripController::new(state.pool.clone(), state.publisher.clone());
    Ok(Json(controller.complete(&identity, id).await?))
}

async fn record_attendance(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordAttendanceRequest>,
) -> Result<Json<ApiResponse<AttendanceResponse>>, AppError> {
    let controller = TripController::new(state.pool.clone(), state.publisher.clone());
    Ok(Json(controller.record_attendance(&identity, id, request).await?))
}

async fn list_attendance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AttendanceResponse>>, AppError> {
    let controller = TripController::new(state.pool.clone(), state.publisher.clone());
    Ok(Json(controller.list_attendance(id).await?))
}
