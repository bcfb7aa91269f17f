use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{middleware::from_fn_with_state, response::Json, routing::get, Router};
use dotenvy::dotenv;
use serde_json::json;
use tokio::signal;
use tracing::{error, info, warn};

use school_transport::config::EnvironmentConfig;
use school_transport::middleware::{
    self,
    cors::{cors_middleware, cors_middleware_with_origins},
};
use school_transport::realtime::connection::ConnectionManager;
use school_transport::realtime::fanout::{
    spawn_fanout_listener, EventPublisher, NoopEventPublisher, RedisEventPublisher,
};
use school_transport::services::materialization_service::{
    spawn_daily_materialization, MaterializationService,
};
use school_transport::state::AppState;
use school_transport::{database, realtime, routes};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚌 School Transport - Tracking en tiempo real");
    info!("=============================================");

    let config = EnvironmentConfig::default();

    // Inicializar base de datos
    let pool = match database::create_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };
    info!("✅ PostgreSQL conectado");

    // Conexiones en vivo de este proceso
    let connections = Arc::new(ConnectionManager::new());

    // Fan-out: Redis si hay broker configurado, no-op si no
    let publisher: Arc<dyn EventPublisher> = match &config.redis_url {
        Some(redis_url) => {
            let publisher = RedisEventPublisher::new(redis_url, &config.fanout_channel).await?;
            spawn_fanout_listener(
                redis_url.clone(),
                config.fanout_channel.clone(),
                connections.clone(),
            );
            Arc::new(publisher)
        }
        None => {
            warn!("⚠️ REDIS_URL no configurado: fan-out entre procesos deshabilitado");
            Arc::new(NoopEventPublisher)
        }
    };

    // Materialización diaria de trips
    let materialization = Arc::new(MaterializationService::new(
        pool.clone(),
        publisher.clone(),
    ));
    spawn_daily_materialization(materialization, config.materialization_hour);

    let app_state = AppState::new(pool, config.clone(), connections, publisher);

    let app = Router::new()
        .route("/health", get(health_endpoint))
        .route("/ws", get(realtime::gateway::ws_handler))
        .nest(
            "/api",
            Router::new()
                .nest("/schedule", routes::schedule_routes::create_schedule_router())
                .nest("/trip", routes::trip_routes::create_trip_router())
                .nest(
                    "/early-pickup",
                    routes::early_pickup_routes::create_early_pickup_router(),
                )
                .nest(
                    "/trip-exception",
                    routes::trip_exception_routes::create_trip_exception_router(),
                )
                .layer(from_fn_with_state(
                    app_state.clone(),
                    middleware::auth::auth_middleware,
                )),
        )
        .layer(if config.is_production() && !config.cors_origins.is_empty() {
            cors_middleware_with_origins(config.cors_origins.clone())
        } else {
            cors_middleware()
        })
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("   GET  /ws?token=<jwt> - Gateway WebSocket");
    info!("📅 Endpoints - Schedule:");
    info!("   POST /api/schedule - Crear horario");
    info!("   GET  /api/schedule - Listar horarios");
    info!("   GET  /api/schedule/:id - Obtener horario");
    info!("   PUT  /api/schedule/:id - Actualizar horario");
    info!("   DELETE /api/schedule/:id - Eliminar horario");
    info!("   POST /api/schedule/:id/suspend - Suspender horario");
    info!("   POST /api/schedule/:id/activate - Activar horario");
    info!("   POST /api/schedule/materialize - Materialización manual");
    info!("🚌 Endpoints - Trip:");
    info!("   GET  /api/trip/:id - Obtener trip");
    info!("   POST /api/trip/:id/start - Iniciar trip");
    info!("   POST /api/trip/:id/complete - Completar trip");
    info!("   POST /api/trip/:id/attendance - Registrar asistencia");
    info!("   GET  /api/trip/:id/attendance - Asistencia del trip");
    info!("🧒 Endpoints - Early Pickup:");
    info!("   POST /api/early-pickup - Solicitar retiro anticipado");
    info!("   GET  /api/early-pickup/:id - Obtener solicitud");
    info!("   POST /api/early-pickup/:id/approve - Aprobar");
    info!("   POST /api/early-pickup/:id/reject - Rechazar");
    info!("   POST /api/early-pickup/:id/cancel - Cancelar");
    info!("🚫 Endpoints - Trip Exception:");
    info!("   POST /api/trip-exception - Pedir skip de trip");
    info!("   POST /api/trip-exception/:trip_id/:child_id/cancel - Cancelar skip");

    let server_handle = tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                error!("❌ Error del servidor: {}", e);
                e
            })
    });

    if let Err(e) = server_handle.await? {
        error!("❌ Servidor terminó con error: {}", e);
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Health check: reporta si la base de datos y el broker responden
async fn health_endpoint(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    let database = sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .is_ok();
    let broker = state.publisher.healthy().await;

    Json(json!({
        "status": if database && broker { "ok" } else { "degraded" },
        "service": "school_transport",
        "database": database,
        "broker": broker,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
