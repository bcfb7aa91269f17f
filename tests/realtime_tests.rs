//! Escenarios de integración del núcleo de tiempo real, sin broker ni base
//! de datos: un publisher en memoria que entrega directo al
//! ConnectionManager hace el papel del canal de fan-out.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use uuid::Uuid;

use school_transport::models::identity::{Identity, UserRole};
use school_transport::realtime::connection::ConnectionManager;
use school_transport::realtime::events::RealtimeEvent;
use school_transport::realtime::fanout::EventPublisher;
use school_transport::realtime::rooms::{bus_room, trip_room, user_room};

/// Publisher que entrega localmente y graba lo publicado, como lo haría el
/// listener de fan-out en el mismo proceso.
struct LocalPublisher {
    connections: Arc<ConnectionManager>,
    published: Mutex<Vec<(String, RealtimeEvent)>>,
}

impl LocalPublisher {
    fn new(connections: Arc<ConnectionManager>) -> Self {
        Self {
            connections,
            published: Mutex::new(Vec::new()),
        }
    }

    async fn published(&self) -> Vec<(String, RealtimeEvent)> {
        self.published.lock().await.clone()
    }
}

#[async_trait]
impl EventPublisher for LocalPublisher {
    async fn publish(&self, room: &str, event: RealtimeEvent) {
        self.connections.deliver_to_room(room, &event).await;
        self.published
            .lock()
            .await
            .push((room.to_string(), event));
    }
}

fn identity(role: UserRole) -> Identity {
    Identity::new(Uuid::new_v4(), role)
}

async fn connect(
    manager: &ConnectionManager,
    role: UserRole,
) -> (Uuid, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let conn = manager.register(identity(role), tx).await;
    (conn, rx)
}

fn frame_event(frame: &str) -> (String, String) {
    let value: serde_json::Value = serde_json::from_str(frame).unwrap();
    (
        value["room"].as_str().unwrap().to_string(),
        value["event"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_room_isolation() {
    let manager = Arc::new(ConnectionManager::new());
    let publisher = LocalPublisher::new(manager.clone());

    let bus_a = Uuid::new_v4();
    let bus_b = Uuid::new_v4();

    let (conn_a, mut rx_a) = connect(&manager, UserRole::Parent).await;
    let (conn_b, mut rx_b) = connect(&manager, UserRole::Parent).await;
    manager.join_room(conn_a, &bus_room(bus_a)).await;
    manager.join_room(conn_b, &bus_room(bus_b)).await;

    publisher
        .publish(&bus_room(bus_a), RealtimeEvent::BusOnline { bus_id: bus_a })
        .await;

    let (room, event) = frame_event(&rx_a.recv().await.unwrap());
    assert_eq!(room, bus_room(bus_a));
    assert_eq!(event, "bus_online");

    // El suscriptor del otro bus no recibe nada
    assert!(rx_b.try_recv().is_err());
}

#[tokio::test]
async fn test_disconnect_cleanup_stops_delivery() {
    let manager = Arc::new(ConnectionManager::new());
    let publisher = LocalPublisher::new(manager.clone());

    let trip_id = Uuid::new_v4();
    let (conn, mut rx) = connect(&manager, UserRole::Parent).await;
    manager.join_room(conn, &trip_room(trip_id)).await;

    manager.disconnect(conn).await;
    assert!(manager.rooms_of(conn).await.is_empty());
    assert!(manager.members_of(&trip_room(trip_id)).await.is_empty());

    publisher
        .publish(
            &trip_room(trip_id),
            RealtimeEvent::TripStatusChanged {
                trip_id,
                status: "IN_PROGRESS".to_string(),
                timestamp: chrono::Utc::now(),
            },
        )
        .await;

    // El canal quedó cerrado del lado del manager; nada llega
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_per_room_ordering_preserved() {
    let manager = Arc::new(ConnectionManager::new());
    let publisher = LocalPublisher::new(manager.clone());

    let bus_id = Uuid::new_v4();
    let (conn, mut rx) = connect(&manager, UserRole::Parent).await;
    manager.join_room(conn, &bus_room(bus_id)).await;

    for speed in [10.0, 20.0, 30.0] {
        publisher
            .publish(
                &bus_room(bus_id),
                RealtimeEvent::LocationUpdate {
                    bus_id,
                    latitude: -34.6,
                    longitude: -58.4,
                    speed,
                    timestamp: chrono::Utc::now(),
                },
            )
            .await;
    }

    for expected in [10.0, 20.0, 30.0] {
        let frame = rx.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["data"]["speed"], expected);
    }
}

#[tokio::test]
async fn test_event_reaches_trip_and_parent_rooms() {
    // Escenario: la asistencia se publica al room del trip y al room del
    // padre; un admin en el room del trip y el padre en el suyo ven ambos
    // el mismo evento.
    let manager = Arc::new(ConnectionManager::new());
    let publisher = LocalPublisher::new(manager.clone());

    let trip_id = Uuid::new_v4();
    let child_id = Uuid::new_v4();

    let (admin_conn, mut admin_rx) = connect(&manager, UserRole::Admin).await;
    manager.join_room(admin_conn, &trip_room(trip_id)).await;

    let parent = identity(UserRole::Parent);
    let (tx, mut parent_rx) = mpsc::unbounded_channel();
    manager.register(parent.clone(), tx).await;

    let event = RealtimeEvent::AttendanceChanged {
        child_id,
        trip_id,
        status: school_transport::models::attendance::AttendanceStatus::PickedUp,
        timestamp: chrono::Utc::now(),
    };
    publisher.publish(&trip_room(trip_id), event.clone()).await;
    publisher.publish(&user_room(parent.user_id), event).await;

    let (_, admin_event) = frame_event(&admin_rx.recv().await.unwrap());
    assert_eq!(admin_event, "attendance_changed");

    let (parent_room, parent_event) = frame_event(&parent_rx.recv().await.unwrap());
    assert_eq!(parent_room, user_room(parent.user_id));
    assert_eq!(parent_event, "attendance_changed");

    let published = publisher.published().await;
    assert_eq!(published.len(), 2);
}

#[tokio::test]
async fn test_admin_room_receives_operational_events() {
    let manager = Arc::new(ConnectionManager::new());
    let publisher = LocalPublisher::new(manager.clone());

    // Los admins entran al room operacional en el registro implícito
    let (_conn, mut rx) = connect(&manager, UserRole::Admin).await;

    publisher
        .publish(
            "admin",
            RealtimeEvent::TripsGenerated {
                date: chrono::NaiveDate::from_ymd_opt(2025, 8, 25).unwrap(),
                created: 3,
                skipped: 1,
                trip_ids: vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()],
            },
        )
        .await;

    let frame = rx.recv().await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value["event"], "trips_generated");
    assert_eq!(value["data"]["created"], 3);
    assert_eq!(value["data"]["trip_ids"].as_array().unwrap().len(), 3);
}
