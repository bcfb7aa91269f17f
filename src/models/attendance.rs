//! Modelo de AttendanceRecord
//!
//! Un registro por (child, trip). Se crea sin estado en la materialización
//! y transiciona: sin registrar → {PICKED_UP, MISSED} → DROPPED.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Estado de asistencia
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    PickedUp,
    Dropped,
    Missed,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::PickedUp => "PICKED_UP",
            AttendanceStatus::Dropped => "DROPPED",
            AttendanceStatus::Missed => "MISSED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PICKED_UP" => Some(AttendanceStatus::PickedUp),
            "DROPPED" => Some(AttendanceStatus::Dropped),
            "MISSED" => Some(AttendanceStatus::Missed),
            _ => None,
        }
    }
}

/// Valida una transición de asistencia desde el estado actual (None si
/// todavía no se registró nada).
pub fn is_valid_attendance_transition(
    from: Option<AttendanceStatus>,
    to: AttendanceStatus,
) -> bool {
    match (from, to) {
        (None, AttendanceStatus::PickedUp) | (None, AttendanceStatus::Missed) => true,
        (Some(AttendanceStatus::PickedUp), AttendanceStatus::Dropped) => true,
        (Some(AttendanceStatus::Missed), AttendanceStatus::Dropped) => true,
        _ => false,
    }
}

/// AttendanceRecord - mapea a la tabla attendance_records
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub child_id: Uuid,
    pub status: Option<String>,
    pub recorded_by: Option<Uuid>,
    pub recorded_at: Option<DateTime<Utc>>,
}

impl AttendanceRecord {
    pub fn attendance_status(&self) -> Option<AttendanceStatus> {
        self.status.as_deref().and_then(AttendanceStatus::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_transitions() {
        assert!(is_valid_attendance_transition(None, AttendanceStatus::PickedUp));
        assert!(is_valid_attendance_transition(None, AttendanceStatus::Missed));
        assert!(!is_valid_attendance_transition(None, AttendanceStatus::Dropped));
    }

    #[test]
    fn test_drop_after_pickup_or_miss() {
        assert!(is_valid_attendance_transition(
            Some(AttendanceStatus::PickedUp),
            AttendanceStatus::Dropped
        ));
        assert!(is_valid_attendance_transition(
            Some(AttendanceStatus::Missed),
            AttendanceStatus::Dropped
        ));
    }

    #[test]
    fn test_terminal_and_repeat_transitions_rejected() {
        assert!(!is_valid_attendance_transition(
            Some(AttendanceStatus::Dropped),
            AttendanceStatus::PickedUp
        ));
        assert!(!is_valid_attendance_transition(
            Some(AttendanceStatus::PickedUp),
            AttendanceStatus::PickedUp
        ));
        assert!(!is_valid_attendance_transition(
            Some(AttendanceStatus::PickedUp),
            AttendanceStatus::Missed
        ));
    }
}
