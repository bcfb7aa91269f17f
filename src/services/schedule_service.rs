//! Servicio de horarios recurrentes
//!
//! CRUD de ScheduledRoute más la máquina de estados ACTIVE ⇄ SUSPENDED.
//! Los cambios de estado publican eventos al room operacional.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::schedule::{ScheduleStatus, ScheduledRoute};
use crate::realtime::events::RealtimeEvent;
use crate::realtime::fanout::EventPublisher;
use crate::realtime::rooms::ADMIN_ROOM;
use crate::utils::errors::{invalid_transition_error, AppError};
use crate::repositories::schedule_repository::{ScheduleRepository, ScheduleStore};

pub struct ScheduleService {
    repository: Arc<dyn ScheduleStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl ScheduleService {
    pub fn new(pool: PgPool, publisher: Arc<dyn EventPublisher>) -> Self {
        Self::with_stores(Arc::new(ScheduleRepository::new(pool)), publisher)
    }

    pub fn with_stores(
        repository: Arc<dyn ScheduleStore>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repository,
            publisher,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        route_id: Uuid,
        driver_id: Uuid,
        vehicle_id: Uuid,
        departure_time: NaiveTime,
        recurring_days: Vec<i16>,
        effective_from: Option<NaiveDate>,
        effective_until: Option<NaiveDate>,
    ) -> Result<ScheduledRoute, AppError> {
        if recurring_days.is_empty() {
            return Err(AppError::BadRequest(
                "El horario necesita al menos un día recurrente".to_string(),
            ));
        }
        if recurring_days.iter().any(|d| !(0..=6).contains(d)) {
            return Err(AppError::BadRequest(
                "Los días recurrentes van de 0 (lunes) a 6 (domingo)".to_string(),
            ));
        }
        if let (Some(from), Some(until)) = (effective_from, effective_until) {
            if until < from {
                return Err(AppError::BadRequest(
                    "effective_until no puede ser anterior a effective_from".to_string(),
                ));
            }
        }

        self.repository
            .create(
                route_id,
                driver_id,
                vehicle_id,
                departure_time,
                recurring_days,
                effective_from,
                effective_until,
            )
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<ScheduledRoute, AppError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Horario no encontrado".to_string()))
    }

    pub async fn list(&self) -> Result<Vec<ScheduledRoute>, AppError> {
        self.repository.list().await
    }

    /// Las cotas de vigencia llegan como doble Option: el exterior marca si
    /// el campo vino en el request, el interior admite null para limpiarla.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: Uuid,
        departure_time: Option<NaiveTime>,
        recurring_days: Option<Vec<i16>>,
        driver_id: Option<Uuid>,
        vehicle_id: Option<Uuid>,
        effective_from: Option<Option<NaiveDate>>,
        effective_until: Option<Option<NaiveDate>>,
    ) -> Result<ScheduledRoute, AppError> {
        if let Some(days) = &recurring_days {
            if days.is_empty() || days.iter().any(|d| !(0..=6).contains(d)) {
                return Err(AppError::BadRequest(
                    "Los días recurrentes van de 0 (lunes) a 6 (domingo)".to_string(),
                ));
            }
        }

        self.repository
            .update(
                id,
                departure_time,
                recurring_days,
                driver_id,
                vehicle_id,
                effective_from,
                effective_until,
            )
            .await
    }

    pub async fn suspend(&self, id: Uuid) -> Result<ScheduledRoute, AppError> {
        let current = self.get(id).await?;
        if current.schedule_status() != Some(ScheduleStatus::Active) {
            return Err(invalid_transition_error(
                "ScheduledRoute",
                &current.status,
                ScheduleStatus::Suspended.as_str(),
            ));
        }

        let schedule = self
            .repository
            .set_status(id, ScheduleStatus::Suspended)
            .await?;

        self.publisher
            .publish(ADMIN_ROOM, RealtimeEvent::ScheduleSuspended { schedule_id: id })
            .await;

        Ok(schedule)
    }

    pub async fn activate(&self, id: Uuid) -> Result<ScheduledRoute, AppError> {
        let current = self.get(id).await?;
        if current.schedule_status() != Some(ScheduleStatus::Suspended) {
            return Err(invalid_transition_error(
                "ScheduledRoute",
                &current.status,
                ScheduleStatus::Active.as_str(),
            ));
        }

        let schedule = self
            .repository
            .set_status(id, ScheduleStatus::Active)
            .await?;

        self.publisher
            .publish(ADMIN_ROOM, RealtimeEvent::ScheduleActivated { schedule_id: id })
            .await;

        Ok(schedule)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.repository.delete(id).await
    }
}
