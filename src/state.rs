//! Shared application state
//!
//! Estado compartido que se pasa a través del router de Axum. Las conexiones
//! en vivo y el publisher de fan-out viven acá para que gateway, servicios y
//! listener usen las mismas instancias.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::EnvironmentConfig;
use crate::realtime::connection::ConnectionManager;
use crate::realtime::fanout::EventPublisher;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub connections: Arc<ConnectionManager>,
    pub publisher: Arc<dyn EventPublisher>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        config: EnvironmentConfig,
        connections: Arc<ConnectionManager>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            pool,
            config,
            connections,
            publisher,
        }
    }
}
