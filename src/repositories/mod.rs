//! Repositorios de acceso a datos
//!
//! Un repositorio por agregado, sobre el pool de PostgreSQL. Las
//! constraints de unicidad (trip por (schedule, fecha), solicitud PENDING
//! por (child, trip), excepción por (child, trip)) viven en la base: los
//! chequeos de la aplicación son optimización, no la única barrera.

pub mod attendance_repository;
pub mod child_repository;
pub mod early_pickup_repository;
pub mod schedule_repository;
pub mod trip_exception_repository;
pub mod trip_repository;
