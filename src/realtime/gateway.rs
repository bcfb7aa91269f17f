//! Gateway WebSocket
//!
//! Punto de entrada de las conexiones en vivo. El token se verifica antes
//! del upgrade: un handshake rechazado cierra con 401 sin registrar nada.
//! Cada conexión tiene su propia tarea de lectura y una de escritura; el
//! único estado compartido es el ConnectionManager.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::identity::{Identity, UserRole};
use crate::realtime::events::RealtimeEvent;
use crate::realtime::rooms::{bus_room, trip_room, ConnectionId};
use crate::services::{authorization_service, jwt_service};
use crate::state::AppState;
use crate::utils::errors::AppError;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: String,
}

/// Mensajes cliente → servidor
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    JoinRoom {
        room: String,
    },
    LeaveRoom {
        room: String,
    },
    SubscribeTripTracking {
        trip_id: Uuid,
        #[serde(default)]
        child_ids: Vec<Uuid>,
    },
    LocationUpdate {
        latitude: f64,
        longitude: f64,
        speed: f64,
    },
}

/// Frame de error servidor → cliente
#[derive(Debug, Serialize)]
struct ErrorFrame<'a> {
    event: &'static str,
    data: ErrorData<'a>,
}

#[derive(Debug, Serialize)]
struct ErrorData<'a> {
    message: &'a str,
}

fn error_frame(message: &str) -> String {
    serde_json::to_string(&ErrorFrame {
        event: "error",
        data: ErrorData { message },
    })
    .unwrap_or_else(|_| r#"{"event":"error"}"#.to_string())
}

/// Handler del upgrade: GET /ws?token=<jwt>
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let identity = jwt_service::verify_token(&query.token, &state.config)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, identity)))
}

async fn handle_socket(socket: WebSocket, state: AppState, identity: Identity) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let connection_id = state.connections.register(identity.clone(), tx.clone()).await;
    info!(
        "🔌 Conexión {} registrada ({} {})",
        connection_id,
        identity.role.as_str(),
        identity.user_id
    );

    // Un conductor entra implícitamente al room de su bus asignado y
    // anuncia presencia a todas las instancias
    let assigned_bus = resolve_assigned_bus(&state, &identity).await;
    if let Some(bus_id) = assigned_bus {
        state.connections.join_room(connection_id, &bus_room(bus_id)).await;
        state
            .publisher
            .publish(&bus_room(bus_id), RealtimeEvent::BusOnline { bus_id })
            .await;
    }

    // Tarea de escritura: drena el canal propio de la conexión
    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_tx.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    // Loop de lectura
    while let Some(Ok(message)) = ws_rx.next().await {
        match message {
            Message::Text(text) => {
                if let Err(e) =
                    handle_client_message(&state, connection_id, &identity, assigned_bus, &text)
                        .await
                {
                    debug!("Mensaje rechazado en conexión {}: {}", connection_id, e);
                    let _ = tx.send(error_frame(&e.to_string()));
                }
            }
            Message::Close(_) => break,
            // Ping/Pong los maneja axum; binario no es parte del protocolo
            _ => {}
        }
    }

    // La desconexión saca a la conexión de todos sus rooms de forma
    // síncrona: ninguna entrega posterior la va a encontrar
    state.connections.disconnect(connection_id).await;
    if let Some(bus_id) = assigned_bus {
        state
            .publisher
            .publish(&bus_room(bus_id), RealtimeEvent::BusOffline { bus_id })
            .await;
    }
    writer.abort();
    info!("👋 Conexión {} cerrada", connection_id);
}

async fn resolve_assigned_bus(state: &AppState, identity: &Identity) -> Option<Uuid> {
    if identity.role != UserRole::Driver {
        return None;
    }
    match authorization_service::assigned_bus(&state.pool, identity.user_id).await {
        Ok(bus) => bus,
        Err(e) => {
            warn!(
                "⚠️ No se pudo resolver el bus del conductor {}: {}",
                identity.user_id, e
            );
            None
        }
    }
}

async fn handle_client_message(
    state: &AppState,
    connection_id: ConnectionId,
    identity: &Identity,
    assigned_bus: Option<Uuid>,
    text: &str,
) -> Result<(), AppError> {
    let message: ClientMessage = serde_json::from_str(text)
        .map_err(|e| AppError::BadRequest(format!("Mensaje malformado: {}", e)))?;

    match message {
        ClientMessage::JoinRoom { room } => {
            authorization_service::authorize_room_join(&state.pool, identity, &room).await?;
            state.connections.join_room(connection_id, &room).await;
            debug!("Conexión {} se unió a {}", connection_id, room);
        }
        ClientMessage::LeaveRoom { room } => {
            state.connections.leave_room(connection_id, &room).await;
        }
        ClientMessage::SubscribeTripTracking { trip_id, child_ids } => {
            let room = trip_room(trip_id);
            authorization_service::authorize_room_join(&state.pool, identity, &room).await?;
            state.connections.join_room(connection_id, &room).await;

            // También el room del bus que cubre el trip, para los pings GPS
            let vehicle: Option<(Uuid,)> =
                sqlx::query_as("SELECT vehicle_id FROM trips WHERE id = $1")
                    .bind(trip_id)
                    .fetch_optional(&state.pool)
                    .await?;
            if let Some((vehicle_id,)) = vehicle {
                state
                    .connections
                    .join_room(connection_id, &bus_room(vehicle_id))
                    .await;
            }
            debug!(
                "Conexión {} sigue el trip {} ({} niños)",
                connection_id,
                trip_id,
                child_ids.len()
            );
        }
        ClientMessage::LocationUpdate {
            latitude,
            longitude,
            speed,
        } => {
            if identity.role != UserRole::Driver {
                return Err(AppError::Forbidden(
                    "Solo los conductores reportan ubicación".to_string(),
                ));
            }
            let bus_id = assigned_bus.ok_or_else(|| {
                AppError::BadRequest("El conductor no tiene bus asignado".to_string())
            })?;
            state
                .publisher
                .publish(
                    &bus_room(bus_id),
                    RealtimeEvent::LocationUpdate {
                        bus_id,
                        latitude,
                        longitude,
                        speed,
                        timestamp: chrono::Utc::now(),
                    },
                )
                .await;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_parsing() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"join_room","room":"bus:00000000-0000-0000-0000-000000000001"}"#)
                .unwrap();
        assert!(matches!(msg, ClientMessage::JoinRoom { .. }));

        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"location_update","latitude":-34.6,"longitude":-58.4,"speed":30.0}"#,
        )
        .unwrap();
        assert!(matches!(msg, ClientMessage::LocationUpdate { .. }));
    }

    #[test]
    fn test_subscribe_without_child_ids_defaults_empty() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"subscribe_trip_tracking","trip_id":"00000000-0000-0000-0000-000000000002"}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::SubscribeTripTracking { child_ids, .. } => {
                assert!(child_ids.is_empty())
            }
            _ => panic!("variante inesperada"),
        }
    }

    #[test]
    fn test_error_frame_shape() {
        let frame = error_frame("sin permiso");
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["event"], "error");
        assert_eq!(value["data"]["message"], "sin permiso");
    }
}
