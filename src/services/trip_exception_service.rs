//! Excepciones de viaje (skip-trip)
//!
//! Upsert por (child, trip): pedir un skip crea la excepción ACTIVE o
//! reactiva la existente con el motivo y timestamp nuevos. Cancelar la
//! pasa a CANCELLED.

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::identity::{Identity, UserRole};
use crate::models::trip_exception::{ExceptionStatus, TripException};
use crate::realtime::events::RealtimeEvent;
use crate::realtime::fanout::EventPublisher;
use crate::realtime::rooms::trip_room;
use crate::repositories::child_repository::{ChildRepository, ChildStore};
use crate::repositories::trip_exception_repository::{TripExceptionRepository, TripExceptionStore};
use crate::repositories::trip_repository::{TripRepository, TripStore};
use crate::utils::errors::AppError;

pub struct TripExceptionService {
    exceptions: Arc<dyn TripExceptionStore>,
    children: Arc<dyn ChildStore>,
    trips: Arc<dyn TripStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl TripExceptionService {
    pub fn new(pool: PgPool, publisher: Arc<dyn EventPublisher>) -> Self {
        Self::with_stores(
            Arc::new(TripExceptionRepository::new(pool.clone())),
            Arc::new(ChildRepository::new(pool.clone())),
            Arc::new(TripRepository::new(pool)),
            publisher,
        )
    }

    pub fn with_stores(
        exceptions: Arc<dyn TripExceptionStore>,
        children: Arc<dyn ChildStore>,
        trips: Arc<dyn TripStore>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            exceptions,
            children,
            trips,
            publisher,
        }
    }

    pub async fn request_skip(
        &self,
        trip_id: Uuid,
        child_id: Uuid,
        requester: &Identity,
        reason: Option<String>,
    ) -> Result<TripException, AppError> {
        self.trips
            .find_by_id(trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip no encontrado".to_string()))?;

        let child = self
            .children
            .find_by_id(child_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Niño no encontrado".to_string()))?;

        if requester.role == UserRole::Parent && child.parent_id != requester.user_id {
            return Err(AppError::Forbidden(
                "El niño no pertenece a este usuario".to_string(),
            ));
        }

        let exception = self
            .exceptions
            .upsert_skip(trip_id, child_id, requester.user_id, reason)
            .await?;

        self.publisher
            .publish(
                &trip_room(trip_id),
                RealtimeEvent::TripSkipRequested {
                    trip_id,
                    child_id,
                    child_name: child.full_name,
                    reason: exception.reason.clone(),
                    timestamp: exception.requested_at,
                },
            )
            .await;

        Ok(exception)
    }

    pub async fn cancel(
        &self,
        trip_id: Uuid,
        child_id: Uuid,
        caller: &Identity,
    ) -> Result<TripException, AppError> {
        let existing = self
            .exceptions
            .find(trip_id, child_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("No hay excepción para este niño y trip".to_string())
            })?;

        if !caller.is_admin() && existing.requested_by != caller.user_id {
            return Err(AppError::Forbidden(
                "Solo quien la solicitó puede cancelar la excepción".to_string(),
            ));
        }

        self.exceptions
            .set_status(trip_id, child_id, ExceptionStatus::Cancelled)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("No hay excepción para este niño y trip".to_string())
            })
    }
}
