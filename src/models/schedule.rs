//! Modelo de ScheduledRoute
//!
//! Un horario recurrente (días de la semana + hora de salida) con ruta,
//! conductor y vehículo asignados. La materialización diaria lo convierte
//! en instancias concretas de Trip.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Estado del horario - ACTIVE ⇄ SUSPENDED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Active,
    Suspended,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Active => "ACTIVE",
            ScheduleStatus::Suspended => "SUSPENDED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ACTIVE" => Some(ScheduleStatus::Active),
            "SUSPENDED" => Some(ScheduleStatus::Suspended),
            _ => None,
        }
    }
}

/// ScheduledRoute - mapea a la tabla scheduled_routes
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ScheduledRoute {
    pub id: Uuid,
    pub route_id: Uuid,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub departure_time: NaiveTime,
    /// Días recurrentes: 0 = lunes .. 6 = domingo
    pub recurring_days: Vec<i16>,
    pub status: String,
    pub effective_from: Option<NaiveDate>,
    pub effective_until: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Índice de día de la semana usado en `recurring_days` (0 = lunes)
pub fn weekday_index(date: NaiveDate) -> i16 {
    date.weekday().num_days_from_monday() as i16
}

impl ScheduledRoute {
    pub fn schedule_status(&self) -> Option<ScheduleStatus> {
        ScheduleStatus::parse(&self.status)
    }

    /// Elegibilidad de materialización para una fecha concreta.
    ///
    /// El horario debe estar ACTIVE, la fecha debe caer en su conjunto de
    /// días recurrentes, y la ventana effective_from/effective_until (si
    /// existe) debe cubrir la fecha. Los límites de la ventana son inclusivos.
    pub fn is_eligible_on(&self, date: NaiveDate) -> bool {
        if self.schedule_status() != Some(ScheduleStatus::Active) {
            return false;
        }
        if !self.recurring_days.contains(&weekday_index(date)) {
            return false;
        }
        if let Some(from) = self.effective_from {
            if date < from {
                return false;
            }
        }
        if let Some(until) = self.effective_until {
            if date > until {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(status: &str, days: Vec<i16>, from: Option<&str>, until: Option<&str>) -> ScheduledRoute {
        ScheduledRoute {
            id: Uuid::new_v4(),
            route_id: Uuid::new_v4(),
            driver_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            departure_time: NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
            recurring_days: days,
            status: status.to_string(),
            effective_from: from.map(|d| d.parse().unwrap()),
            effective_until: until.map(|d| d.parse().unwrap()),
            created_at: Utc::now(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_weekday_index() {
        // 2025-08-25 es lunes
        assert_eq!(weekday_index(date("2025-08-25")), 0);
        assert_eq!(weekday_index(date("2025-08-31")), 6);
    }

    #[test]
    fn test_eligible_on_recurring_day() {
        // lunes y miércoles
        let s = schedule("ACTIVE", vec![0, 2], None, None);
        assert!(s.is_eligible_on(date("2025-08-25"))); // lunes
        assert!(s.is_eligible_on(date("2025-08-27"))); // miércoles
        assert!(!s.is_eligible_on(date("2025-08-26"))); // martes
    }

    #[test]
    fn test_suspended_schedule_not_eligible() {
        let s = schedule("SUSPENDED", vec![0], None, None);
        assert!(!s.is_eligible_on(date("2025-08-25")));
    }

    #[test]
    fn test_effective_window_bounds_inclusive() {
        let s = schedule("ACTIVE", vec![0], Some("2025-08-25"), Some("2025-09-01"));
        // ambos extremos cuentan
        assert!(s.is_eligible_on(date("2025-08-25")));
        assert!(s.is_eligible_on(date("2025-09-01")));
        // fuera de la ventana
        assert!(!s.is_eligible_on(date("2025-08-18")));
        assert!(!s.is_eligible_on(date("2025-09-08")));
    }

    #[test]
    fn test_unknown_status_not_eligible() {
        let s = schedule("DELETED", vec![0], None, None);
        assert!(!s.is_eligible_on(date("2025-08-25")));
    }
}
