//! Fan-out Bus
//!
//! Puente de eventos entre procesos vía Redis pub/sub: todas las instancias
//! se suscriben a un único canal con mensajes etiquetados por room, y cada
//! una reentrega a sus clientes locales a través del ConnectionManager.
//!
//! El publish es fire-and-forget: la transición de estado ya se persistió
//! antes de llegar acá, así que una caída del broker degrada a "vista en
//! tiempo real desactualizada", nunca a estado perdido.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager as RedisConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::realtime::connection::ConnectionManager;
use crate::realtime::events::RealtimeEvent;

/// Espera entre reintentos de conexión del listener
const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(5);

/// Mensaje serializado en el canal compartido
#[derive(Debug, Serialize, Deserialize)]
pub struct FanoutMessage {
    pub room: String,
    #[serde(flatten)]
    pub event: RealtimeEvent,
}

/// Capacidad de publicar eventos hacia todos los procesos.
///
/// Cualquier subsistema puede publicar sin conocer la gestión de conexiones.
/// En despliegues sin broker se inyecta [`NoopEventPublisher`] en lugar de
/// referencias anulables repartidas por la lógica de negocio.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, room: &str, event: RealtimeEvent);

    /// El broker responde. Sin broker configurado no hay nada que pueda
    /// fallar, así que el default reporta sano.
    async fn healthy(&self) -> bool {
        true
    }
}

/// Publisher respaldado por Redis
#[derive(Clone)]
pub struct RedisEventPublisher {
    manager: RedisConnectionManager,
    channel: String,
}

impl RedisEventPublisher {
    /// Crear nuevo publisher conectado al broker
    pub async fn new(redis_url: &str, channel: &str) -> Result<Self> {
        info!("🔗 Conectando publisher de fan-out a Redis");

        let client = redis::Client::open(redis_url)?;
        let manager = RedisConnectionManager::new(client).await?;

        // Test de conexión usando un comando simple
        let mut conn = manager.clone();
        let _: () = redis::cmd("PING").query_async(&mut conn).await?;

        info!("✅ Publisher de fan-out conectado");

        Ok(Self {
            manager,
            channel: channel.to_string(),
        })
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    async fn publish(&self, room: &str, event: RealtimeEvent) {
        let name = event.name();
        let message = FanoutMessage {
            room: room.to_string(),
            event,
        };
        let payload = match serde_json::to_string(&message) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("⚠️ Error serializando evento {} para fan-out: {}", name, e);
                return;
            }
        };

        let mut conn = self.manager.clone();
        match conn
            .publish::<_, _, i64>(self.channel.as_str(), payload)
            .await
        {
            Ok(receivers) => {
                debug!(
                    "📤 Evento {} publicado a room {} ({} suscriptores)",
                    name, message.room, receivers
                );
            }
            Err(e) => {
                // No-fatal: el estado ya está persistido
                warn!(
                    "⚠️ Error publicando evento {} a room {}: {}",
                    name, message.room, e
                );
            }
        }
    }

    async fn healthy(&self) -> bool {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .is_ok()
    }
}

/// Publisher no-op para despliegues sin broker (tests, instancia única)
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish(&self, room: &str, event: RealtimeEvent) {
        trace!("Fan-out deshabilitado: {} -> {}", event.name(), room);
    }
}

/// Lanza la tarea que escucha el canal compartido y reentrega cada mensaje
/// a los clientes locales. Se reconecta y resuscribe sola tras una caída
/// del broker, sin reiniciar el proceso.
pub fn spawn_fanout_listener(
    redis_url: String,
    channel: String,
    connections: Arc<ConnectionManager>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(e) = run_listener(&redis_url, &channel, &connections).await {
                warn!("⚠️ Listener de fan-out caído: {}. Reintentando...", e);
            }
            tokio::time::sleep(RESUBSCRIBE_DELAY).await;
        }
    })
}

async fn run_listener(
    redis_url: &str,
    channel: &str,
    connections: &ConnectionManager,
) -> Result<()> {
    let client = redis::Client::open(redis_url)?;
    let conn = client.get_async_connection().await?;
    let mut pubsub = conn.into_pubsub();
    pubsub.subscribe(channel).await?;

    info!("✅ Suscrito al canal de fan-out: {}", channel);

    let mut stream = pubsub.on_message();
    while let Some(msg) = stream.next().await {
        let payload: String = match msg.get_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("⚠️ Payload de fan-out ilegible: {}", e);
                continue;
            }
        };

        match serde_json::from_str::<FanoutMessage>(&payload) {
            Ok(message) => {
                let delivered = connections
                    .deliver_to_room(&message.room, &message.event)
                    .await;
                trace!(
                    "📥 {} -> {} entregado a {} conexiones locales",
                    message.event.name(),
                    message.room,
                    delivered
                );
            }
            Err(e) => {
                warn!("⚠️ Mensaje de fan-out malformado: {}", e);
            }
        }
    }

    Err(anyhow::anyhow!("stream de pub/sub terminado"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_fanout_message_roundtrip() {
        let message = FanoutMessage {
            room: "bus:123".to_string(),
            event: RealtimeEvent::BusOffline {
                bus_id: Uuid::new_v4(),
            },
        };
        let json = serde_json::to_string(&message).unwrap();
        let back: FanoutMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back.room, message.room);
        assert_eq!(back.event, message.event);
    }

    #[test]
    fn test_fanout_wire_shape() {
        let message = FanoutMessage {
            room: "trip:abc".to_string(),
            event: RealtimeEvent::BusOnline {
                bus_id: Uuid::new_v4(),
            },
        };
        let value = serde_json::to_value(&message).unwrap();
        // room + tag del evento al mismo nivel
        assert_eq!(value["room"], "trip:abc");
        assert_eq!(value["event"], "bus_online");
    }

    #[tokio::test]
    async fn test_noop_publisher_does_not_panic() {
        let publisher = NoopEventPublisher;
        publisher
            .publish(
                "bus:1",
                RealtimeEvent::BusOnline {
                    bus_id: Uuid::new_v4(),
                },
            )
            .await;
    }

    #[tokio::test]
    async fn test_noop_publisher_reports_healthy() {
        assert!(NoopEventPublisher.healthy().await);
    }
}
