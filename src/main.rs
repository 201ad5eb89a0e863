use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};

use fleet_trips::config::EnvironmentConfig;
use fleet_trips::database::DatabaseConnection;
use fleet_trips::middleware::cors_for;
use fleet_trips::repositories::PgFleetStore;
use fleet_trips::routes::create_router;
use fleet_trips::services::{
    AssignmentPolicy, SimulatedDistance, SystemClock, TripLifecycleService,
};
use fleet_trips::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    info!("🚚 Fleet Trips - Ciclo de vida de viajes");
    info!("=========================================");
    info!("🌍 Entorno: {}", config.environment);

    // Inicializar base de datos
    let db_connection = match DatabaseConnection::connect(&config.database).await {
        Ok(conn) => conn,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    let store = Arc::new(PgFleetStore::new(
        db_connection.pool().clone(),
        &config.database,
    ));
    let distance = SimulatedDistance::new(
        config.trip_min_distance_km,
        config.trip_max_distance_km,
    )?;
    let trips = TripLifecycleService::new(
        store,
        AssignmentPolicy::default(),
        Arc::new(distance),
        Arc::new(SystemClock),
    );

    if config.is_production() && config.cors_origins.is_empty() {
        warn!("⚠️ CORS_ORIGINS vacío en producción: se acepta cualquier origen");
    }
    let app = create_router(AppState::new(trips), cors_for(&config.cors_origins));

    let addr: SocketAddr = config.server_url().parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Estado del servicio");
    info!("🧭 Viajes:");
    info!("   POST  /api/trips - Iniciar viaje");
    info!("   GET   /api/trips?status= - Listar viajes");
    info!("   GET   /api/trips/active - Viajes en curso");
    info!("   GET   /api/trips/:id - Obtener viaje");
    info!("   POST  /api/trips/:id/finalize - Finalizar viaje");
    info!("   POST  /api/trips/:id/cancel - Cancelar viaje");
    info!("   PATCH /api/trips/:id/notes - Actualizar observaciones");
    info!("🚗 Vehículos:");
    info!("   POST /api/vehicles - Registrar vehículo");
    info!("   GET  /api/vehicles - Listar vehículos");
    info!("   GET  /api/vehicles/:id - Obtener vehículo");
    info!("🧑‍✈️ Conductores:");
    info!("   POST /api/drivers - Registrar conductor");
    info!("   GET  /api/drivers - Listar conductores");
    info!("   GET  /api/drivers/available - Conductores disponibles hoy");
    info!("   GET  /api/drivers/:id - Obtener conductor por documento");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Servidor terminó con error: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el manejador de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el manejador de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
