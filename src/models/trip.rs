//! Modelo de Trip
//!
//! Instancia concreta de un horario para una fecha. A lo sumo existe un
//! Trip por (schedule, fecha); la constraint UNIQUE (schedule_id, trip_date)
//! respalda la idempotencia de la materialización.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Estado del trip: SCHEDULED → IN_PROGRESS → COMPLETED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Scheduled,
    InProgress,
    Completed,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Scheduled => "SCHEDULED",
            TripStatus::InProgress => "IN_PROGRESS",
            TripStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "SCHEDULED" => Some(TripStatus::Scheduled),
            "IN_PROGRESS" => Some(TripStatus::InProgress),
            "COMPLETED" => Some(TripStatus::Completed),
            _ => None,
        }
    }

    /// Transiciones legales del ciclo de vida del trip
    pub fn can_transition_to(&self, next: TripStatus) -> bool {
        matches!(
            (self, next),
            (TripStatus::Scheduled, TripStatus::InProgress)
                | (TripStatus::InProgress, TripStatus::Completed)
        )
    }
}

/// Trip - mapea a la tabla trips
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Trip {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub route_id: Uuid,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub trip_date: NaiveDate,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    pub fn trip_status(&self) -> Option<TripStatus> {
        TripStatus::parse(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        assert!(TripStatus::Scheduled.can_transition_to(TripStatus::InProgress));
        assert!(TripStatus::InProgress.can_transition_to(TripStatus::Completed));
        // sin saltos ni retrocesos
        assert!(!TripStatus::Scheduled.can_transition_to(TripStatus::Completed));
        assert!(!TripStatus::Completed.can_transition_to(TripStatus::InProgress));
        assert!(!TripStatus::InProgress.can_transition_to(TripStatus::Scheduled));
    }
}
