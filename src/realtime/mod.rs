//! Núcleo de tiempo real
//!
//! Registro de rooms, gestión de conexiones, gateway WebSocket y fan-out
//! entre procesos vía Redis pub/sub.

pub mod connection;
pub mod events;
pub mod fanout;
pub mod gateway;
pub mod rooms;
