//! Materialización diaria de trips
//!
//! Convierte los horarios recurrentes elegibles del día en instancias
//! concretas de Trip, exactamente una por (horario, fecha). La rutina es
//! idempotente: el chequeo de existencia más la UNIQUE (schedule_id,
//! trip_date) hacen que reintentar una corrida parcial nunca duplique.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::schedule::ScheduledRoute;
use crate::realtime::events::RealtimeEvent;
use crate::realtime::fanout::EventPublisher;
use crate::realtime::rooms::ADMIN_ROOM;
use crate::repositories::attendance_repository::{AttendanceRepository, AttendanceStore};
use crate::repositories::schedule_repository::{ScheduleRepository, ScheduleStore};
use crate::repositories::trip_repository::{TripRepository, TripStore};
use crate::utils::errors::AppError;

/// Resultado de una corrida de materialización
#[derive(Debug, Serialize)]
pub struct MaterializationSummary {
    pub date: NaiveDate,
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    pub trip_ids: Vec<Uuid>,
}

pub struct MaterializationService {
    schedules: Arc<dyn ScheduleStore>,
    trips: Arc<dyn TripStore>,
    attendance: Arc<dyn AttendanceStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl MaterializationService {
    pub fn new(pool: PgPool, publisher: Arc<dyn EventPublisher>) -> Self {
        Self::with_stores(
            Arc::new(ScheduleRepository::new(pool.clone())),
            Arc::new(TripRepository::new(pool.clone())),
            Arc::new(AttendanceRepository::new(pool)),
            publisher,
        )
    }

    pub fn with_stores(
        schedules: Arc<dyn ScheduleStore>,
        trips: Arc<dyn TripStore>,
        attendance: Arc<dyn AttendanceStore>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            schedules,
            trips,
            attendance,
            publisher,
        }
    }

    /// Corre la materialización para una fecha. El fallo de un horario se
    /// loguea y se sigue con el resto; la corrida nunca aborta entera.
    pub async fn run_for_date(&self, date: NaiveDate) -> Result<MaterializationSummary, AppError> {
        info!("📅 Materializando trips para {}", date);

        let schedules = self.schedules.find_active().await?;

        let mut summary = MaterializationSummary {
            date,
            created: 0,
            skipped: 0,
            failed: 0,
            trip_ids: Vec::new(),
        };

        for schedule in schedules {
            if !schedule.is_eligible_on(date) {
                continue;
            }
            match self.materialize_one(&schedule, date).await {
                Ok(Some(trip_id)) => {
                    summary.created += 1;
                    summary.trip_ids.push(trip_id);
                }
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    error!(
                        "❌ Error materializando horario {} para {}: {}",
                        schedule.id, date, e
                    );
                    summary.failed += 1;
                }
            }
        }

        info!(
            "✅ Materialización {}: {} creados, {} ya existentes, {} fallidos",
            date, summary.created, summary.skipped, summary.failed
        );

        self.publisher
            .publish(
                ADMIN_ROOM,
                RealtimeEvent::TripsGenerated {
                    date,
                    created: summary.created,
                    skipped: summary.skipped,
                    trip_ids: summary.trip_ids.clone(),
                },
            )
            .await;

        Ok(summary)
    }

    /// Materializa un horario. None cuando el trip del día ya existía.
    async fn materialize_one(
        &self,
        schedule: &ScheduledRoute,
        date: NaiveDate,
    ) -> Result<Option<Uuid>, AppError> {
        if self.trips.exists_for(schedule.id, date).await? {
            return Ok(None);
        }

        let Some(trip) = self.trips.create_from_schedule(schedule, date).await? else {
            // Otro proceso ganó la carrera en el ON CONFLICT
            return Ok(None);
        };

        let roster = self
            .attendance
            .create_roster(trip.id, schedule.route_id)
            .await?;
        info!(
            "🚌 Trip {} creado para horario {} ({} niños en el roster)",
            trip.id, schedule.id, roster
        );

        Ok(Some(trip.id))
    }
}

/// Tiempo hasta la próxima corrida: la siguiente ocurrencia (estrictamente
/// futura) de `hour`:00 UTC. Horas fuera de rango se saturan a 23.
pub fn next_run_delay(now: DateTime<Utc>, hour: u32) -> Duration {
    let hour = hour.min(23);
    let today_run = Utc
        .with_ymd_and_hms(now.year(), now.month(), now.day(), hour, 0, 0)
        .single()
        .expect("hora saturada a 0..=23");

    let next = if today_run > now {
        today_run
    } else {
        today_run + chrono::Duration::days(1)
    };

    (next - now).to_std().unwrap_or(Duration::from_secs(0))
}

/// Lanza la tarea de materialización diaria. En tests se invoca
/// `run_for_date` directamente, sin esperar al reloj.
pub fn spawn_daily_materialization(
    service: Arc<MaterializationService>,
    hour: u32,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let delay = next_run_delay(Utc::now(), hour);
            info!(
                "⏰ Próxima materialización en {} segundos",
                delay.as_secs()
            );
            tokio::time::sleep(delay).await;

            let today = Utc::now().date_naive();
            if let Err(e) = service.run_for_date(today).await {
                error!("❌ Corrida de materialización fallida para {}: {}", today, e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_next_run_later_today() {
        let now = utc("2025-08-25T02:00:00Z");
        assert_eq!(next_run_delay(now, 4), Duration::from_secs(2 * 3600));
    }

    #[test]
    fn test_next_run_tomorrow_when_hour_passed() {
        let now = utc("2025-08-25T05:30:00Z");
        assert_eq!(
            next_run_delay(now, 4),
            Duration::from_secs((24 - 1) * 3600 - 1800)
        );
    }

    #[test]
    fn test_next_run_exactly_at_hour_waits_a_day() {
        let now = utc("2025-08-25T04:00:00Z");
        assert_eq!(next_run_delay(now, 4), Duration::from_secs(24 * 3600));
    }

    #[test]
    fn test_next_run_saturates_out_of_range_hour() {
        let now = utc("2025-08-25T02:00:00Z");
        // 24 no es una hora del día; se satura a 23 en vez de entrar en pánico
        assert_eq!(next_run_delay(now, 24), next_run_delay(now, 23));
        assert_eq!(next_run_delay(now, 99), Duration::from_secs(21 * 3600));
    }
}
