pub mod early_pickup_controller;
pub mod schedule_controller;
pub mod trip_controller;
pub mod trip_exception_controller;
