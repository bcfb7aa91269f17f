//! Servicio de autorización de rooms
//!
//! Verifica que una conexión tenga una relación legítima con el room al que
//! pide unirse: su propio room de usuario siempre; bus/trip requieren ser
//! el conductor asignado, un padre con un niño a bordo, o un admin.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::identity::{Identity, UserRole};
use crate::realtime::rooms::RoomScope;
use crate::utils::errors::AppError;

/// Bus (vehículo) actualmente asignado a un conductor vía sus horarios activos
pub async fn assigned_bus(pool: &PgPool, driver_id: Uuid) -> Result<Option<Uuid>, AppError> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        "SELECT vehicle_id FROM scheduled_routes WHERE driver_id = $1 AND status = 'ACTIVE' ORDER BY created_at DESC LIMIT 1",
    )
    .bind(driver_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(vehicle_id,)| vehicle_id))
}

/// Autoriza un join explícito a un room. Los joins no autorizados se
/// rechazan con un error explícito, nunca se descartan en silencio.
pub async fn authorize_room_join(
    pool: &PgPool,
    identity: &Identity,
    room: &str,
) -> Result<(), AppError> {
    let scope = RoomScope::parse(room)
        .ok_or_else(|| AppError::BadRequest(format!("Room desconocido: {}", room)))?;

    if identity.is_admin() {
        return Ok(());
    }

    match scope {
        RoomScope::User(user_id) => {
            if user_id == identity.user_id {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "No puedes unirte al room de otro usuario".to_string(),
                ))
            }
        }
        RoomScope::Admin => Err(AppError::Forbidden(
            "Room reservado para administradores".to_string(),
        )),
        RoomScope::Bus(bus_id) => match identity.role {
            UserRole::Driver => {
                if assigned_bus(pool, identity.user_id).await? == Some(bus_id) {
                    Ok(())
                } else {
                    Err(AppError::Forbidden(
                        "El bus no está asignado a este conductor".to_string(),
                    ))
                }
            }
            UserRole::Parent => {
                if parent_has_child_on_bus(pool, identity.user_id, bus_id).await? {
                    Ok(())
                } else {
                    Err(AppError::Forbidden(
                        "Ningún niño de este usuario viaja en ese bus".to_string(),
                    ))
                }
            }
            UserRole::Admin => Ok(()),
        },
        RoomScope::Trip(trip_id) => match identity.role {
            UserRole::Driver => {
                if driver_owns_trip(pool, identity.user_id, trip_id).await? {
                    Ok(())
                } else {
                    Err(AppError::Forbidden(
                        "El trip no pertenece a este conductor".to_string(),
                    ))
                }
            }
            UserRole::Parent => {
                if parent_has_child_on_trip(pool, identity.user_id, trip_id).await? {
                    Ok(())
                } else {
                    Err(AppError::Forbidden(
                        "Ningún niño de este usuario está en ese trip".to_string(),
                    ))
                }
            }
            UserRole::Admin => Ok(()),
        },
    }
}

async fn driver_owns_trip(
    pool: &PgPool,
    driver_id: Uuid,
    trip_id: Uuid,
) -> Result<bool, AppError> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM trips WHERE id = $1 AND driver_id = $2)",
    )
    .bind(trip_id)
    .bind(driver_id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

async fn parent_has_child_on_trip(
    pool: &PgPool,
    parent_id: Uuid,
    trip_id: Uuid,
) -> Result<bool, AppError> {
    let row: (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM attendance_records a
            JOIN children c ON c.id = a.child_id
            WHERE a.trip_id = $1 AND c.parent_id = $2
        )
        "#,
    )
    .bind(trip_id)
    .bind(parent_id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

async fn parent_has_child_on_bus(
    pool: &PgPool,
    parent_id: Uuid,
    bus_id: Uuid,
) -> Result<bool, AppError> {
    // La relación padre-bus pasa por los trips vigentes del vehículo
    let row: (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM trips t
            JOIN attendance_records a ON a.trip_id = t.id
            JOIN children c ON c.id = a.child_id
            WHERE t.vehicle_id = $1 AND c.parent_id = $2
              AND t.status <> 'COMPLETED'
        )
        "#,
    )
    .bind(bus_id)
    .bind(parent_id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}
