use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::early_pickup::EarlyPickupRequest;

// Request para solicitar un retiro anticipado
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEarlyPickupRequest {
    pub trip_id: Uuid,
    pub child_id: Uuid,

    #[validate(length(max = 500))]
    pub reason: Option<String>,

    pub pickup_time: Option<NaiveTime>,
}

// Response de solicitud de retiro anticipado
#[derive(Debug, Serialize)]
pub struct EarlyPickupResponse {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub child_id: Uuid,
    pub requested_by: Uuid,
    pub reason: Option<String>,
    pub pickup_time: Option<NaiveTime>,
    pub status: String,
    pub approved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EarlyPickupRequest> for EarlyPickupResponse {
    fn from(r: EarlyPickupRequest) -> Self {
        Self {
            id: r.id,
            trip_id: r.trip_id,
            child_id: r.child_id,
            requested_by: r.requested_by,
            reason: r.reason,
            pickup_time: r.pickup_time,
            status: r.status,
            approved_by: r.approved_by,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
