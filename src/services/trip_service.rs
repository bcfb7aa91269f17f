//! Ciclo de vida del trip
//!
//! SCHEDULED → IN_PROGRESS → COMPLETED, manejado por el conductor del trip.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::identity::{Identity, UserRole};
use crate::models::trip::{Trip, TripStatus};
use crate::realtime::events::RealtimeEvent;
use crate::realtime::fanout::EventPublisher;
use crate::realtime::rooms::trip_room;
use crate::repositories::trip_repository::{TripRepository, TripStore};
use crate::utils::errors::{invalid_transition_error, AppError};

pub struct TripService {
    trips: Arc<dyn TripStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl TripService {
    pub fn new(pool: PgPool, publisher: Arc<dyn EventPublisher>) -> Self {
        Self::with_stores(Arc::new(TripRepository::new(pool)), publisher)
    }

    pub fn with_stores(trips: Arc<dyn TripStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { trips, publisher }
    }

    pub async fn get(&self, id: Uuid) -> Result<Trip, AppError> {
        self.trips
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip no encontrado".to_string()))
    }

    pub async fn start(&self, id: Uuid, caller: &Identity) -> Result<Trip, AppError> {
        self.transition(id, caller, TripStatus::InProgress).await
    }

    pub async fn complete(&self, id: Uuid, caller: &Identity) -> Result<Trip, AppError> {
        self.transition(id, caller, TripStatus::Completed).await
    }

    async fn transition(
        &self,
        id: Uuid,
        caller: &Identity,
        next: TripStatus,
    ) -> Result<Trip, AppError> {
        let trip = self.get(id).await?;

        match caller.role {
            UserRole::Admin => {}
            UserRole::Driver if trip.driver_id == caller.user_id => {}
            _ => {
                return Err(AppError::Forbidden(
                    "Solo el conductor asignado maneja el ciclo del trip".to_string(),
                ))
            }
        }

        let current = trip
            .trip_status()
            .ok_or_else(|| AppError::Internal(format!("Estado ilegible: {}", trip.status)))?;
        if !current.can_transition_to(next) {
            return Err(invalid_transition_error(
                "Trip",
                current.as_str(),
                next.as_str(),
            ));
        }

        let updated = self.trips.set_status(id, next).await?;
        info!("🚌 Trip {} pasó a {}", updated.id, updated.status);

        self.publisher
            .publish(
                &trip_room(updated.id),
                RealtimeEvent::TripStatusChanged {
                    trip_id: updated.id,
                    status: updated.status.clone(),
                    timestamp: Utc::now(),
                },
            )
            .await;

        Ok(updated)
    }
}
