//! Máquina de estados de retiro anticipado
//!
//! PENDING → {APPROVED, REJECTED, CANCELLED}. Una solicitud aprobada no se
//! cancela. A lo sumo una PENDING por (child, trip); CANCELLED o REJECTED
//! liberan el par para una solicitud nueva.

use std::sync::Arc;

use chrono::NaiveTime;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::child::Child;
use crate::models::early_pickup::{EarlyPickupRequest, EarlyPickupStatus};
use crate::models::identity::{Identity, UserRole};
use crate::realtime::events::RealtimeEvent;
use crate::realtime::fanout::EventPublisher;
use crate::realtime::rooms::{trip_room, user_room};
use crate::repositories::child_repository::{ChildRepository, ChildStore};
use crate::repositories::early_pickup_repository::{EarlyPickupRepository, EarlyPickupStore};
use crate::repositories::trip_repository::{TripRepository, TripStore};
use crate::utils::errors::{invalid_transition_error, AppError};

pub struct EarlyPickupService {
    requests: Arc<dyn EarlyPickupStore>,
    children: Arc<dyn ChildStore>,
    trips: Arc<dyn TripStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl EarlyPickupService {
    pub fn new(pool: PgPool, publisher: Arc<dyn EventPublisher>) -> Self {
        Self::with_stores(
            Arc::new(EarlyPickupRepository::new(pool.clone())),
            Arc::new(ChildRepository::new(pool.clone())),
            Arc::new(TripRepository::new(pool)),
            publisher,
        )
    }

    pub fn with_stores(
        requests: Arc<dyn EarlyPickupStore>,
        children: Arc<dyn ChildStore>,
        trips: Arc<dyn TripStore>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            requests,
            children,
            trips,
            publisher,
        }
    }

    pub async fn create(
        &self,
        trip_id: Uuid,
        child_id: Uuid,
        requester: &Identity,
        reason: Option<String>,
        pickup_time: Option<NaiveTime>,
    ) -> Result<EarlyPickupRequest, AppError> {
        self.trips
            .find_by_id(trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip no encontrado".to_string()))?;

        let child = self.owned_child(child_id, requester).await?;

        // Fail-fast: el índice único parcial respalda este chequeo bajo carrera
        if self.requests.pending_exists(trip_id, child_id).await? {
            return Err(AppError::Conflict(
                "Ya existe una solicitud pendiente para este niño y trip".to_string(),
            ));
        }

        let request = self
            .requests
            .create(trip_id, child_id, requester.user_id, reason, pickup_time)
            .await?;

        self.publisher
            .publish(
                &trip_room(trip_id),
                RealtimeEvent::EarlyPickupRequested {
                    request_id: request.id,
                    trip_id,
                    child_id,
                    child_name: child.full_name,
                    pickup_time: request.pickup_time,
                    reason: request.reason.clone(),
                    timestamp: request.created_at,
                },
            )
            .await;

        Ok(request)
    }

    pub async fn approve(
        &self,
        id: Uuid,
        approver: &Identity,
    ) -> Result<EarlyPickupRequest, AppError> {
        self.resolve(id, approver, EarlyPickupStatus::Approved).await
    }

    pub async fn reject(
        &self,
        id: Uuid,
        approver: &Identity,
    ) -> Result<EarlyPickupRequest, AppError> {
        self.resolve(id, approver, EarlyPickupStatus::Rejected).await
    }

    /// Cancelación por parte del solicitante. Una solicitud APPROVED queda
    /// comprometida y no puede cancelarse.
    pub async fn cancel(
        &self,
        id: Uuid,
        caller: &Identity,
    ) -> Result<EarlyPickupRequest, AppError> {
        let request = self.get(id).await?;

        if !caller.is_admin() && request.requested_by != caller.user_id {
            return Err(AppError::Forbidden(
                "Solo el solicitante puede cancelar su solicitud".to_string(),
            ));
        }

        let current = request
            .pickup_status()
            .ok_or_else(|| AppError::Internal(format!("Estado ilegible: {}", request.status)))?;
        if !current.can_transition_to(EarlyPickupStatus::Cancelled) {
            return Err(invalid_transition_error(
                "EarlyPickupRequest",
                current.as_str(),
                EarlyPickupStatus::Cancelled.as_str(),
            ));
        }

        self.requests
            .set_status(id, EarlyPickupStatus::Cancelled, None)
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<EarlyPickupRequest, AppError> {
        self.requests
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Solicitud no encontrada".to_string()))
    }

    async fn resolve(
        &self,
        id: Uuid,
        approver: &Identity,
        next: EarlyPickupStatus,
    ) -> Result<EarlyPickupRequest, AppError> {
        if !approver.is_admin() {
            return Err(AppError::Forbidden(
                "Solo un administrador resuelve solicitudes".to_string(),
            ));
        }

        let request = self.get(id).await?;
        let current = request
            .pickup_status()
            .ok_or_else(|| AppError::Internal(format!("Estado ilegible: {}", request.status)))?;

        if !current.can_transition_to(next) {
            return Err(invalid_transition_error(
                "EarlyPickupRequest",
                current.as_str(),
                next.as_str(),
            ));
        }

        // El niño se resuelve antes de persistir: si no existe, la solicitud
        // queda intacta y no se emite una resolución a medias
        let child = self
            .children
            .find_by_id(request.child_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Niño no encontrado".to_string()))?;

        let updated = self
            .requests
            .set_status(id, next, Some(approver.user_id))
            .await?;

        let event = match next {
            EarlyPickupStatus::Approved => RealtimeEvent::EarlyPickupApproved {
                request_id: updated.id,
                child_id: updated.child_id,
                child_name: child.full_name,
                timestamp: updated.updated_at,
            },
            _ => RealtimeEvent::EarlyPickupRejected {
                request_id: updated.id,
                child_id: updated.child_id,
                child_name: child.full_name,
                timestamp: updated.updated_at,
            },
        };

        // La resolución le llega al solicitante en su propio room
        self.publisher
            .publish(&user_room(updated.requested_by), event)
            .await;

        Ok(updated)
    }

    async fn owned_child(&self, child_id: Uuid, requester: &Identity) -> Result<Child, AppError> {
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

        Ok(child)
    }
}
