pub mod common;
pub mod early_pickup_dto;
pub mod exception_dto;
pub mod schedule_dto;
pub mod trip_dto;
