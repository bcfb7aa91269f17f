//! Servicios de negocio

pub mod attendance_service;
pub mod authorization_service;
pub mod early_pickup_service;
pub mod jwt_service;
pub mod materialization_service;
pub mod schedule_service;
pub mod trip_exception_service;
pub mod trip_service;
