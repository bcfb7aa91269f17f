//! Eventos en tiempo real
//!
//! Cada evento es una variante tipada con su payload fijo, validada al
//! construirse en lugar de al entregarse. El nombre de wire (snake_case)
//! es estable: lo consumen las apps de conductor y de padres.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::attendance::AttendanceStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RealtimeEvent {
    LocationUpdate {
        bus_id: Uuid,
        latitude: f64,
        longitude: f64,
        speed: f64,
        timestamp: DateTime<Utc>,
    },
    BusOnline {
        bus_id: Uuid,
    },
    BusOffline {
        bus_id: Uuid,
    },
    AttendanceChanged {
        child_id: Uuid,
        trip_id: Uuid,
        status: AttendanceStatus,
        timestamp: DateTime<Utc>,
    },
    EarlyPickupRequested {
        request_id: Uuid,
        trip_id: Uuid,
        child_id: Uuid,
        child_name: String,
        pickup_time: Option<NaiveTime>,
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    },
    EarlyPickupApproved {
        request_id: Uuid,
        child_id: Uuid,
        child_name: String,
        timestamp: DateTime<Utc>,
    },
    EarlyPickupRejected {
        request_id: Uuid,
        child_id: Uuid,
        child_name: String,
        timestamp: DateTime<Utc>,
    },
    TripSkipRequested {
        trip_id: Uuid,
        child_id: Uuid,
        child_name: String,
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    },
    TripStatusChanged {
        trip_id: Uuid,
        status: String,
        timestamp: DateTime<Utc>,
    },
    TripsGenerated {
        date: NaiveDate,
        created: usize,
        skipped: usize,
        trip_ids: Vec<Uuid>,
    },
    ScheduleActivated {
        schedule_id: Uuid,
    },
    ScheduleSuspended {
        schedule_id: Uuid,
    },
}

impl RealtimeEvent {
    /// Nombre de wire del evento
    pub fn name(&self) -> &'static str {
        match self {
            RealtimeEvent::LocationUpdate { .. } => "location_update",
            RealtimeEvent::BusOnline { .. } => "bus_online",
            RealtimeEvent::BusOffline { .. } => "bus_offline",
            RealtimeEvent::AttendanceChanged { .. } => "attendance_changed",
            RealtimeEvent::EarlyPickupRequested { .. } => "early_pickup_requested",
            RealtimeEvent::EarlyPickupApproved { .. } => "early_pickup_approved",
            RealtimeEvent::EarlyPickupRejected { .. } => "early_pickup_rejected",
            RealtimeEvent::TripSkipRequested { .. } => "trip_skip_requested",
            RealtimeEvent::TripStatusChanged { .. } => "trip_status_changed",
            RealtimeEvent::TripsGenerated { .. } => "trips_generated",
            RealtimeEvent::ScheduleActivated { .. } => "schedule_activated",
            RealtimeEvent::ScheduleSuspended { .. } => "schedule_suspended",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_tag_matches_name() {
        let event = RealtimeEvent::BusOnline {
            bus_id: Uuid::new_v4(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], event.name());
        assert!(value["data"]["bus_id"].is_string());
    }

    #[test]
    fn test_location_update_payload_fields() {
        let event = RealtimeEvent::LocationUpdate {
            bus_id: Uuid::new_v4(),
            latitude: -34.6037,
            longitude: -58.3816,
            speed: 42.5,
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "location_update");
        for field in ["bus_id", "latitude", "longitude", "speed", "timestamp"] {
            assert!(!value["data"][field].is_null(), "missing field {}", field);
        }
    }

    #[test]
    fn test_roundtrip() {
        let event = RealtimeEvent::AttendanceChanged {
            child_id: Uuid::new_v4(),
            trip_id: Uuid::new_v4(),
            status: AttendanceStatus::PickedUp,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: RealtimeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
