use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::attendance::{AttendanceRecord, AttendanceStatus};
use crate::models::trip::Trip;

// Request para registrar asistencia de un niño en un trip
#[derive(Debug, Deserialize)]
pub struct RecordAttendanceRequest {
    pub child_id: Uuid,
    pub status: AttendanceStatus,
}

// Response de trip
#[derive(Debug, Serialize)]
pub struct TripResponse {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub route_id: Uuid,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub trip_date: NaiveDate,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Trip> for TripResponse {
    fn from(t: Trip) -> Self {
        Self {
            id: t.id,
            schedule_id: t.schedule_id,
            route_id: t.route_id,
            driver_id: t.driver_id,
            vehicle_id: t.vehicle_id,
            trip_date: t.trip_date,
            status: t.status,
            created_at: t.created_at,
        }
    }
}

// Response de un registro de asistencia (último estado por niño)
#[derive(Debug, Serialize)]
pub struct AttendanceResponse {
    pub child_id: Uuid,
    pub trip_id: Uuid,
    pub status: Option<String>,
    pub recorded_by: Option<Uuid>,
    pub recorded_at: Option<DateTime<Utc>>,
}

impl From<AttendanceRecord> for AttendanceResponse {
    fn from(r: AttendanceRecord) -> Self {
        Self {
            child_id: r.child_id,
            trip_id: r.trip_id,
            status: r.status,
            recorded_by: r.recorded_by,
            recorded_at: r.recorded_at,
        }
    }
}
