use axum::{
    extract::{Path, State},
    routing::post,
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::controllers::trip_exception_controller::TripExceptionController;
use crate::dto::common::ApiResponse;
use crate::dto::exception_dto::{RequestSkipRequest, TripExceptionResponse};
use crate::models::identity::Identity;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_trip_exception_router() -> Router<AppState> {
    Router::new()
        .route("/", post(request_skip))
        .route("/:trip_id/:child_id/cancel", post(cancel_exception))
}

async fn request_skip(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<RequestSkipRequest>,
) -> Result<Json<ApiResponse<TripExceptionResponse>>, AppError> {
    let controller = TripExceptionController::new(state.pool.clone(), state.publisher.clone());
    Ok(Json(controller.request_skip(&identity, request).await?))
}

async fn cancel_exception(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((trip_id, child_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<TripExceptionResponse>>, AppError> {
    let controller = TripExceptionController::new(state.pool.clone(), state.publisher.clone());
    Ok(Json(controller.cancel(&identity, trip_id, child_id).await?))
}
