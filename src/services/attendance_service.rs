//! Máquina de estados de asistencia
//!
//! Por (child, trip): sin registrar → {PICKED_UP, MISSED} → DROPPED.
//! Valida precondición, persiste, y recién después publica a los rooms
//! del trip y del padre del niño.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::attendance::{
    is_valid_attendance_transition, AttendanceRecord, AttendanceStatus,
};
use crate::models::identity::{Identity, UserRole};
use crate::realtime::events::RealtimeEvent;
use crate::realtime::fanout::EventPublisher;
use crate::realtime::rooms::{trip_room, user_room};
use crate::repositories::attendance_repository::{AttendanceRepository, AttendanceStore};
use crate::repositories::child_repository::{ChildRepository, ChildStore};
use crate::repositories::trip_repository::{TripRepository, TripStore};
use crate::utils::errors::AppError;

pub struct AttendanceService {
    attendance: Arc<dyn AttendanceStore>,
    children: Arc<dyn ChildStore>,
    trips: Arc<dyn TripStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl AttendanceService {
    pub fn new(pool: PgPool, publisher: Arc<dyn EventPublisher>) -> Self {
        Self::with_stores(
            Arc::new(AttendanceRepository::new(pool.clone())),
            Arc::new(ChildRepository::new(pool.clone())),
            Arc::new(TripRepository::new(pool)),
            publisher,
        )
    }

    pub fn with_stores(
        attendance: Arc<dyn AttendanceStore>,
        children: Arc<dyn ChildStore>,
        trips: Arc<dyn TripStore>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            attendance,
            children,
            trips,
            publisher,
        }
    }

    pub async fn record(
        &self,
        trip_id: Uuid,
        child_id: Uuid,
        status: AttendanceStatus,
        recorded_by: &Identity,
    ) -> Result<AttendanceRecord, AppError> {
        let trip = self
            .trips
            .find_by_id(trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip no encontrado".to_string()))?;

        // Solo el conductor del trip o un admin registran asistencia
        if recorded_by.role == UserRole::Driver && trip.driver_id != recorded_by.user_id {
            return Err(AppError::Forbidden(
                "El trip no pertenece a este conductor".to_string(),
            ));
        }
        if recorded_by.role == UserRole::Parent {
            return Err(AppError::Forbidden(
                "Los padres no registran asistencia".to_string(),
            ));
        }

        let child = self
            .children
            .find_by_id(child_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Niño no encontrado".to_string()))?;

        let current = self
            .attendance
            .find(trip_id, child_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("El niño no está en el roster de este trip".to_string())
            })?;

        let from = current.attendance_status();
        if !is_valid_attendance_transition(from, status) {
            return Err(AppError::InvalidTransition(format!(
                "Asistencia no puede pasar de {} a {}",
                from.map(|s| s.as_str()).unwrap_or("sin registrar"),
                status.as_str()
            )));
        }

        let timestamp = Utc::now();
        let record = self
            .attendance
            .set_status(trip_id, child_id, status, recorded_by.user_id, timestamp)
            .await?;

        // Persistido: ahora sí el eco en tiempo real
        let event = RealtimeEvent::AttendanceChanged {
            child_id,
            trip_id,
            status,
            timestamp,
        };
        self.publisher.publish(&trip_room(trip_id), event.clone()).await;
        self.publisher
            .publish(&user_room(child.parent_id), event)
            .await;

        Ok(record)
    }

    pub async fn list_for_trip(&self, trip_id: Uuid) -> Result<Vec<AttendanceRecord>, AppError> {
        self.trips
            .find_by_id(trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip no encontrado".to_string()))?;
        self.attendance.list_for_trip(trip_id).await
    }
}
