//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL, más los enums de estado y sus reglas de transición.

pub mod attendance;
pub mod child;
pub mod early_pickup;
pub mod identity;
pub mod schedule;
pub mod trip;
pub mod trip_exception;
