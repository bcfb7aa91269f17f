pub mod early_pickup_routes;
pub mod schedule_routes;
pub mod trip_exception_routes;
pub mod trip_routes;
