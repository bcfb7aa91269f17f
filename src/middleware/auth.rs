//! Middleware de autenticación JWT
//!
//! Extrae el bearer token, lo verifica y deja la Identity en las
//! extensions de la request para los handlers.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::services::jwt_service::verify_token;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_str| auth_str.to_str().ok())
        .and_then(|auth_str| auth_str.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Token de autorización requerido".to_string()))?;

    let identity = verify_token(token, &state.config)?;

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}
