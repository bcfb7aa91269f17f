use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::schedule_controller::ScheduleController;
use crate::dto::common::ApiResponse;
use crate::dto::schedule_dto::{
    CreateScheduleRequest, MaterializeRequest, ScheduleResponse, UpdateScheduleRequest,
};
use crate::models::identity::Identity;
use crate::services::materialization_service::MaterializationSummary;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_schedule_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_schedule))
        .route("/", get(list_schedules))
        .route("/:id", get(get_schedule))
        .route("/:id", put(update_schedule))
        .route("/:id", delete(delete_schedule))
        .route("/:id/suspend", post(suspend_schedule))
        .route("/:id/activate", post(activate_schedule))
        .route("/materialize", post(materialize))
}

async fn create_schedule(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<Json<ApiResponse<ScheduleResponse>>, AppError> {
    let controller = ScheduleController::new(state.pool.clone(), state.publisher.clone());
    Ok(Json(controller.create(&identity, request).await?))
}

async fn list_schedules(
    State(state): State<AppState>,
) -> Result<Json<Vec<ScheduleResponse>>, AppError> {
    let controller = ScheduleController::new(state.pool.clone(), state.publisher.clone());
    Ok(Json(controller.list().await?))
}

async fn get_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let controller = ScheduleController::new(state.pool.clone(), state.publisher.clone());
    Ok(Json(controller.get_by_id(id).await?))
}

async fn update_schedule(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<ApiResponse<ScheduleResponse>>, AppError> {
    let controller = ScheduleController::new(state.pool.clone(), state.publisher.clone());
    Ok(Json(controller.update(&identity, id, request).await?))
}

async fn suspend_schedule(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ScheduleResponse>>, AppError> {
    let controller = ScheduleController::new(state.pool.clone(), state.publisher.clone());
    Ok(Json(controller.suspend(&identity, id).await?))
}

async fn activate_schedule(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ScheduleResponse>>, AppError> {
    let controller = ScheduleController::new(state.pool.clone(), state.publisher.clone());
    Ok(Json(controller.activate(&identity, id).await?))
}

async fn delete_schedule(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = ScheduleController::new(state.pool.clone(), state.publisher.clone());
    controller.delete(&identity, id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Horario eliminado exitosamente"
    })))
}

async fn materialize(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<MaterializeRequest>,
) -> Result<Json<ApiResponse<MaterializationSummary>>, AppError> {
    let controller = ScheduleController::new(state.pool.clone(), state.publisher.clone());
    Ok(Json(controller.materialize(&identity, request).await?))
}
