//! Modelo de TripException
//!
//! Excepción de viaje (actualmente solo SKIP_TRIP) con semántica de upsert
//! por (child, trip): volver a solicitar un skip reactiva el registro
//! existente en lugar de duplicarlo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Tipo de excepción
pub const EXCEPTION_SKIP_TRIP: &str = "SKIP_TRIP";

/// Estado de la excepción
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionStatus {
    Active,
    Cancelled,
}

impl ExceptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExceptionStatus::Active => "ACTIVE",
            ExceptionStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ACTIVE" => Some(ExceptionStatus::Active),
            "CANCELLED" => Some(ExceptionStatus::Cancelled),
            _ => None,
        }
    }
}

/// TripException - mapea a la tabla trip_exceptions
/// UNIQUE (trip_id, child_id) respalda el upsert.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TripException {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub child_id: Uuid,
    pub exception_type: String,
    pub reason: Option<String>,
    pub status: String,
    pub requested_by: Uuid,
    pub requested_at: DateTime<Utc>,
}

impl TripException {
    pub fn exception_status(&self) -> Option<ExceptionStatus> {
        ExceptionStatus::parse(&self.status)
    }
}
