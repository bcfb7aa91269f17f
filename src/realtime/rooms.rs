//! Room Registry
//!
//! Mapeo en memoria de rooms a conexiones suscritas. Es la única estructura
//! mutable compartida del proceso y pertenece al ConnectionManager; nunca
//! se persiste.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;
use uuid::Uuid;

/// Identificador efímero de una conexión viva
pub type ConnectionId = Uuid;

/// Room operacional para dashboards de administración
pub const ADMIN_ROOM: &str = "admin";

pub fn bus_room(bus_id: Uuid) -> String {
    format!("bus:{}", bus_id)
}

pub fn trip_room(trip_id: Uuid) -> String {
    format!("trip:{}", trip_id)
}

pub fn user_room(user_id: Uuid) -> String {
    format!("user:{}", user_id)
}

/// Alcance derivable del nombre de un room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomScope {
    Bus(Uuid),
    Trip(Uuid),
    User(Uuid),
    Admin,
}

impl RoomScope {
    /// Parsea un nombre de room. Nombres desconocidos devuelven None.
    pub fn parse(room: &str) -> Option<Self> {
        if room == ADMIN_ROOM {
            return Some(RoomScope::Admin);
        }
        let (kind, id) = room.split_once(':')?;
        let id = Uuid::parse_str(id).ok()?;
        match kind {
            "bus" => Some(RoomScope::Bus(id)),
            "trip" => Some(RoomScope::Trip(id)),
            "user" => Some(RoomScope::User(id)),
            _ => None,
        }
    }
}

#[derive(Default)]
struct RegistryInner {
    /// room -> conexiones miembro
    rooms: HashMap<String, HashSet<ConnectionId>>,
    /// conexión -> rooms a los que pertenece (para limpieza O(rooms) al desconectar)
    memberships: HashMap<ConnectionId, HashSet<String>>,
}

/// Registro de membresías room ↔ conexión, sincronizado internamente
#[derive(Default)]
pub struct RoomRegistry {
    inner: RwLock<RegistryInner>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn join(&self, connection_id: ConnectionId, room: &str) {
        let mut inner = self.inner.write().await;
        inner
            .rooms
            .entry(room.to_string())
            .or_default()
            .insert(connection_id);
        inner
            .memberships
            .entry(connection_id)
            .or_default()
            .insert(room.to_string());
    }

    pub async fn leave(&self, connection_id: ConnectionId, room: &str) {
        let mut inner = self.inner.write().await;
        if let Some(members) = inner.rooms.get_mut(room) {
            members.remove(&connection_id);
            if members.is_empty() {
                inner.rooms.remove(room);
            }
        }
        if let Some(rooms) = inner.memberships.get_mut(&connection_id) {
            rooms.remove(room);
            if rooms.is_empty() {
                inner.memberships.remove(&connection_id);
            }
        }
    }

    pub async fn members_of(&self, room: &str) -> Vec<ConnectionId> {
        let inner = self.inner.read().await;
        inner
            .rooms
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub async fn rooms_of(&self, connection_id: ConnectionId) -> Vec<String> {
        let inner = self.inner.read().await;
        inner
            .memberships
            .get(&connection_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Saca la conexión de todos sus rooms. Devuelve los rooms abandonados.
    pub async fn remove_connection(&self, connection_id: ConnectionId) -> Vec<String> {
        let mut inner = self.inner.write().await;
        let rooms = inner
            .memberships
            .remove(&connection_id)
            .unwrap_or_default();
        for room in &rooms {
            if let Some(members) = inner.rooms.get_mut(room) {
                members.remove(&connection_id);
                if members.is_empty() {
                    inner.rooms.remove(room);
                }
            }
        }
        rooms.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_join_and_members() {
        let registry = RoomRegistry::new();
        let conn = Uuid::new_v4();
        registry.join(conn, "trip:a").await;
        assert_eq!(registry.members_of("trip:a").await, vec![conn]);
        assert!(registry.members_of("trip:b").await.is_empty());
    }

    #[tokio::test]
    async fn test_leave_removes_membership() {
        let registry = RoomRegistry::new();
        let conn = Uuid::new_v4();
        registry.join(conn, "trip:a").await;
        registry.leave(conn, "trip:a").await;
        assert!(registry.members_of("trip:a").await.is_empty());
        assert!(registry.rooms_of(conn).await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_connection_leaves_all_rooms() {
        let registry = RoomRegistry::new();
        let conn = Uuid::new_v4();
        let other = Uuid::new_v4();
        registry.join(conn, "trip:a").await;
        registry.join(conn, "bus:b").await;
        registry.join(other, "bus:b").await;

        let mut left = registry.remove_connection(conn).await;
        left.sort();
        assert_eq!(left, vec!["bus:b".to_string(), "trip:a".to_string()]);
        assert!(registry.members_of("trip:a").await.is_empty());
        // la otra conexión sigue en su room
        assert_eq!(registry.members_of("bus:b").await, vec![other]);
    }

    #[tokio::test]
    async fn test_remove_unknown_connection_is_noop() {
        let registry = RoomRegistry::new();
        assert!(registry.remove_connection(Uuid::new_v4()).await.is_empty());
    }

    #[test]
    fn test_room_scope_parse() {
        let id = Uuid::new_v4();
        assert_eq!(RoomScope::parse(&bus_room(id)), Some(RoomScope::Bus(id)));
        assert_eq!(RoomScope::parse(&trip_room(id)), Some(RoomScope::Trip(id)));
        assert_eq!(RoomScope::parse(&user_room(id)), Some(RoomScope::User(id)));
        assert_eq!(RoomScope::parse(ADMIN_ROOM), Some(RoomScope::Admin));
        assert_eq!(RoomScope::parse("garage:123"), None);
        assert_eq!(RoomScope::parse("bus:not-a-uuid"), None);
    }
}
