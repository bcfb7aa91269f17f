//! Modelo de EarlyPickupRequest
//!
//! Solicitud de retiro anticipado de un niño. A lo sumo una solicitud
//! PENDING por (child, trip); el índice único parcial en la base de datos
//! respalda el chequeo de la aplicación.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Estado de la solicitud
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EarlyPickupStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl EarlyPickupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EarlyPickupStatus::Pending => "PENDING",
            EarlyPickupStatus::Approved => "APPROVED",
            EarlyPickupStatus::Rejected => "REJECTED",
            EarlyPickupStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(EarlyPickupStatus::Pending),
            "APPROVED" => Some(EarlyPickupStatus::Approved),
            "REJECTED" => Some(EarlyPickupStatus::Rejected),
            "CANCELLED" => Some(EarlyPickupStatus::Cancelled),
            _ => None,
        }
    }

    /// Transiciones legales. Una solicitud APPROVED no puede cancelarse:
    /// una vez aprobada queda comprometida.
    pub fn can_transition_to(&self, next: EarlyPickupStatus) -> bool {
        matches!(
            (self, next),
            (EarlyPickupStatus::Pending, EarlyPickupStatus::Approved)
                | (EarlyPickupStatus::Pending, EarlyPickupStatus::Rejected)
                | (EarlyPickupStatus::Pending, EarlyPickupStatus::Cancelled)
        )
    }
}

/// EarlyPickupRequest - mapea a la tabla early_pickup_requests
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EarlyPickupRequest {
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

impl EarlyPickupRequest {
    pub fn pickup_status(&self) -> Option<EarlyPickupStatus> {
        EarlyPickupStatus::parse(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_can_resolve() {
        assert!(EarlyPickupStatus::Pending.can_transition_to(EarlyPickupStatus::Approved));
        assert!(EarlyPickupStatus::Pending.can_transition_to(EarlyPickupStatus::Rejected));
        assert!(EarlyPickupStatus::Pending.can_transition_to(EarlyPickupStatus::Cancelled));
    }

    #[test]
    fn test_approved_is_committed() {
        assert!(!EarlyPickupStatus::Approved.can_transition_to(EarlyPickupStatus::Cancelled));
        assert!(!EarlyPickupStatus::Approved.can_transition_to(EarlyPickupStatus::Rejected));
    }

    #[test]
    fn test_terminal_states() {
        for terminal in [EarlyPickupStatus::Rejected, EarlyPickupStatus::Cancelled] {
            assert!(!terminal.can_transition_to(EarlyPickupStatus::Approved));
            assert!(!terminal.can_transition_to(EarlyPickupStatus::Pending));
        }
    }
}
