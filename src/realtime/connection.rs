//! Connection Manager
//!
//! Tabla por proceso de conexiones vivas. Media toda mutación de rooms y
//! toda entrega de mensajes a clientes conectados localmente; el Room
//! Registry es un campo privado y nadie más lo toca.

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::models::identity::{Identity, UserRole};
use crate::realtime::events::RealtimeEvent;
use crate::realtime::rooms::{user_room, ConnectionId, RoomRegistry, ADMIN_ROOM};

/// Frame saliente entregado a cada conexión, ya resuelto a un room
#[derive(Debug, Serialize)]
struct OutboundFrame<'a> {
    room: &'a str,
    #[serde(flatten)]
    event: &'a RealtimeEvent,
}

/// Una conexión viva registrada
struct ConnectionHandle {
    identity: Identity,
    sender: mpsc::UnboundedSender<String>,
}

/// Rooms implícitos derivados de la identidad al conectar.
///
/// Toda conexión entra a su propio room `user:<id>`; los admins entran
/// además al room operacional. El room del bus del conductor se resuelve
/// aparte porque requiere consultar la asignación de vehículo.
pub fn default_rooms_for(identity: &Identity) -> Vec<String> {
    let mut rooms = vec![user_room(identity.user_id)];
    if identity.role == UserRole::Admin {
        rooms.push(ADMIN_ROOM.to_string());
    }
    rooms
}

#[derive(Default)]
pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
    rooms: RoomRegistry,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra una conexión ya autenticada y realiza los joins implícitos.
    /// La verificación del token ocurre antes, en el gateway: acá nunca
    /// llega una identidad sin validar.
    pub async fn register(
        &self,
        identity: Identity,
        sender: mpsc::UnboundedSender<String>,
    ) -> ConnectionId {
        let connection_id = Uuid::new_v4();
        let default_rooms = default_rooms_for(&identity);
        {
            let mut connections = self.connections.write().await;
            connections.insert(connection_id, ConnectionHandle { identity, sender });
        }
        for room in default_rooms {
            self.rooms.join(connection_id, &room).await;
        }
        connection_id
    }

    /// Elimina la conexión de la tabla y de todos sus rooms. Idempotente.
    pub async fn disconnect(&self, connection_id: ConnectionId) {
        {
            let mut connections = self.connections.write().await;
            connections.remove(&connection_id);
        }
        let left = self.rooms.remove_connection(connection_id).await;
        if !left.is_empty() {
            debug!(
                "🔌 Conexión {} desconectada, abandonó {} rooms",
                connection_id,
                left.len()
            );
        }
    }

    /// Join explícito. Si la conexión ya no está viva es un no-op: puede
    /// desconectarse en medio de un join.
    pub async fn join_room(&self, connection_id: ConnectionId, room: &str) {
        let alive = {
            let connections = self.connections.read().await;
            connections.contains_key(&connection_id)
        };
        if !alive {
            debug!("Join ignorado para conexión desconocida {}", connection_id);
            return;
        }
        self.rooms.join(connection_id, room).await;

        // Si `disconnect` corrió entre el chequeo y el join, su
        // remove_connection no vio esta membresía: se deshace acá
        let still_alive = {
            let connections = self.connections.read().await;
            connections.contains_key(&connection_id)
        };
        if !still_alive {
            self.rooms.remove_connection(connection_id).await;
        }
    }

    pub async fn leave_room(&self, connection_id: ConnectionId, room: &str) {
        self.rooms.leave(connection_id, room).await;
    }

    pub async fn rooms_of(&self, connection_id: ConnectionId) -> Vec<String> {
        self.rooms.rooms_of(connection_id).await
    }

    pub async fn members_of(&self, room: &str) -> Vec<ConnectionId> {
        self.rooms.members_of(room).await
    }

    pub async fn identity_of(&self, connection_id: ConnectionId) -> Option<Identity> {
        let connections = self.connections.read().await;
        connections.get(&connection_id).map(|c| c.identity.clone())
    }

    /// Entrega un evento a todos los miembros locales del room.
    ///
    /// El fan-out es best-effort, no multicast atómico: una conexión que se
    /// desconecta a mitad de la entrega simplemente se saltea. Devuelve la
    /// cantidad de conexiones alcanzadas.
    pub async fn deliver_to_room(&self, room: &str, event: &RealtimeEvent) -> usize {
        let members = self.rooms.members_of(room).await;
        if members.is_empty() {
            return 0;
        }

        let frame = match serde_json::to_string(&OutboundFrame { room, event }) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Error serializando evento {}: {}", event.name(), e);
                return 0;
            }
        };

        let connections = self.connections.read().await;
        let mut delivered = 0;
        for member in members {
            if let Some(handle) = connections.get(&member) {
                if handle.sender.send(frame.clone()).is_ok() {
                    delivered += 1;
                } else {
                    debug!(
                        "Entrega salteada a conexión {} (canal cerrado)",
                        member
                    );
                }
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: UserRole) -> Identity {
        Identity::new(Uuid::new_v4(), role)
    }

    #[test]
    fn test_default_rooms_for_parent() {
        let parent = identity(UserRole::Parent);
        assert_eq!(default_rooms_for(&parent), vec![user_room(parent.user_id)]);
    }

    #[test]
    fn test_default_rooms_for_admin() {
        let admin = identity(UserRole::Admin);
        let rooms = default_rooms_for(&admin);
        assert!(rooms.contains(&user_room(admin.user_id)));
        assert!(rooms.contains(&ADMIN_ROOM.to_string()));
    }

    #[tokio::test]
    async fn test_register_performs_implicit_joins() {
        let manager = ConnectionManager::new();
        let parent = identity(UserRole::Parent);
        let (tx, _rx) = mpsc::unbounded_channel();

        let conn = manager.register(parent.clone(), tx).await;
        assert_eq!(
            manager.members_of(&user_room(parent.user_id)).await,
            vec![conn]
        );
    }

    #[tokio::test]
    async fn test_join_unknown_connection_is_noop() {
        let manager = ConnectionManager::new();
        manager.join_room(Uuid::new_v4(), "trip:x").await;
        assert!(manager.members_of("trip:x").await.is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let manager = ConnectionManager::new();
        let parent = identity(UserRole::Parent);
        let (tx, _rx) = mpsc::unbounded_channel();

        let conn = manager.register(parent.clone(), tx).await;
        manager.disconnect(conn).await;
        manager.disconnect(conn).await;
        assert!(manager
            .members_of(&user_room(parent.user_id))
            .await
            .is_empty());
        assert!(manager.identity_of(conn).await.is_none());
    }

    #[tokio::test]
    async fn test_join_racing_disconnect_leaves_no_membership() {
        // join_room y disconnect concurrentes no deben dejar membresía
        // residual, cualquiera sea el entrelazado
        for _ in 0..50 {
            let manager = std::sync::Arc::new(ConnectionManager::new());
            let parent = identity(UserRole::Parent);
            let (tx, _rx) = mpsc::unbounded_channel();
            let conn = manager.register(parent, tx).await;

            let m1 = manager.clone();
            let m2 = manager.clone();
            tokio::join!(
                async move { m1.join_room(conn, "trip:carrera").await },
                async move { m2.disconnect(conn).await },
            );

            assert!(
                !manager.members_of("trip:carrera").await.contains(&conn),
                "membresía residual tras desconectar"
            );
        }
    }

    #[tokio::test]
    async fn test_deliver_skips_closed_channels() {
        let manager = ConnectionManager::new();
        let a = identity(UserRole::Parent);
        let b = identity(UserRole::Parent);
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, rx_b) = mpsc::unbounded_channel();

        let conn_a = manager.register(a, tx_a).await;
        let conn_b = manager.register(b, tx_b).await;
        manager.join_room(conn_a, "bus:1-room").await;
        manager.join_room(conn_b, "bus:1-room").await;
        drop(rx_b); // canal de b cerrado en medio de la entrega

        let event = RealtimeEvent::BusOnline {
            bus_id: Uuid::new_v4(),
        };
        let delivered = manager.deliver_to_room("bus:1-room", &event).await;
        assert_eq!(delivered, 1);

        let frame = rx_a.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["room"], "bus:1-room");
        assert_eq!(value["event"], "bus_online");
    }
}
