use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::trip_exception::TripException;

// Request para pedir que un niño saltee un trip
#[derive(Debug, Deserialize, Validate)]
pub struct RequestSkipRequest {
    pub trip_id: Uuid,
    pub child_id: Uuid,

    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

// Response de excepción de viaje
#[derive(Debug, Serialize)]
pub struct TripExceptionResponse {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub child_id: Uuid,
    pub exception_type: String,
    pub reason: Option<String>,
    pub status: String,
    pub requested_by: Uuid,
    pub requested_at: DateTime<Utc>,
}

impl From<TripException> for TripExceptionResponse {
    fn from(e: TripException) -> Self {
        Self {
            id: e.id,
            trip_id: e.trip_id,
            child_id: e.child_id,
            exception_type: e.exception_type,
            reason: e.reason,
            status: e.status,
            requested_by: e.requested_by,
            requested_at: e.requested_at,
        }
    }
}
