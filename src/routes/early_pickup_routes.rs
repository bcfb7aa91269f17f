use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::early_pickup_controller::EarlyPickupController;
use crate::dto::common::ApiResponse;
use crate::dto::early_pickup_dto::{CreateEarlyPickupRequest, EarlyPickupResponse};
use crate::models::identity::Identity;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_early_pickup_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_request))
        .route("/:id", get(get_request))
        .route("/:id/approve", post(approve_request))
        .route("/:id/reject", post(reject_request))
        .route("/:id/cancel", post(cancel_request))
}

async fn create_request(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<CreateEarlyPickupRequest>,
) -> Result<Json<ApiResponse<EarlyPickupResponse>>, AppError> {
    let controller = EarlyPickupController::new(state.pool.clone(), state.publisher.clone());
    Ok(Json(controller.create(&identity, request).await?))
}

async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EarlyPickupResponse>, AppError> {
    let controller = EarlyPickupController::new(state.pool.clone(), state.publisher.clone());
    Ok(Json(controller.get_by_id(id).await?))
}

async fn approve_request(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<EarlyPickupResponse>>, AppError> {
    let controller = EarlyPickupController::new(state.pool.clone(), state.publisher.clone());
    Ok(Json(controller.approve(&identity, id).await?))
}

async fn reject_request(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<EarlyPickupResponse>>, AppError> {
    let controller = EarlyPickupController::new(state.pool.clone(), state.publisher.clone());
    Ok(Json(controller.reject(&identity, id).await?))
}

async fn cancel_request(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<EarlyPickupResponse>>, AppError> {
    let controller = EarlyPickupController::new(state.pool.clone(), state.publisher.clone());
    Ok(Json(controller.cancel(&identity, id).await?))
}
