use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::schedule::ScheduledRoute;

// Request para crear un horario recurrente
#[derive(Debug, Deserialize, Validate)]
pub struct CreateScheduleRequest {
    pub route_id: Uuid,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub departure_time: NaiveTime,

    #[validate(length(min = 1, max = 7))]
    pub recurring_days: Vec<i16>,

    pub effective_from: Option<NaiveDate>,
    pub effective_until: Option<NaiveDate>,
}

// Request para actualizar un horario (todos los campos opcionales)
//
// Las cotas de vigencia distinguen tres casos: campo ausente (no tocar),
// null explícito (limpiar la cota) y valor (escribirla).
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateScheduleRequest {
    pub departure_time: Option<NaiveTime>,

    #[validate(length(min = 1, max = 7))]
    pub recurring_days: Option<Vec<i16>>,

    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,

    #[serde(default, deserialize_with = "double_option")]
    pub effective_from: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "double_option")]
    pub effective_until: Option<Option<NaiveDate>>,
}

/// Ausente → None; null → Some(None); valor → Some(Some(v)).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// Request para la materialización manual (reintento de ops)
#[derive(Debug, Deserialize)]
pub struct MaterializeRequest {
    pub date: Option<NaiveDate>,
}

// Response de horario
#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub id: Uuid,
    pub route_id: Uuid,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub departure_time: NaiveTime,
    pub recurring_days: Vec<i16>,
    pub status: String,
    pub effective_from: Option<NaiveDate>,
    pub effective_until: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<ScheduledRoute> for ScheduleResponse {
    fn from(s: ScheduledRoute) -> Self {
        Self {
            id: s.id,
            route_id: s.route_id,
            driver_id: s.driver_id,
            vehicle_id: s.vehicle_id,
            departure_time: s.departure_time,
            recurring_days: s.recurring_days,
            status: s.status,
            effective_from: s.effective_from,
            effective_until: s.effective_until,
            created_at: s.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_distinguishes_absent_null_and_value() {
        let absent: UpdateScheduleRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.effective_from, None);

        let cleared: UpdateScheduleRequest =
            serde_json::from_str(r#"{"effective_from": null}"#).unwrap();
        assert_eq!(cleared.effective_from, Some(None));

        let set: UpdateScheduleRequest =
            serde_json::from_str(r#"{"effective_from": "2026-01-15"}"#).unwrap();
        assert_eq!(
            set.effective_from,
            Some(Some(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()))
        );
        assert_eq!(set.effective_until, None);
    }
}
