//! Modelo de Child
//!
//! Un niño asignado a una ruta, con referencia a su padre/madre
//! para el enrutamiento de eventos en tiempo real.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Child {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub route_id: Option<Uuid>,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}
