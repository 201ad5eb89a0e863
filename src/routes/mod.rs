pub mod driver_routes;
pub mod trip_routes;
pub mod vehicle_routes;

use axum::{response::Json, routing::get, Router};
use serde_json::json;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::repositories::FleetStore;
use crate::state::AppState;

/// Router completo de la API con sus capas de trazas, compresión y CORS
pub fn create_router<S: FleetStore>(state: AppState<S>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/trips", trip_routes::create_trip_router::<S>())
        .nest("/api/vehicles", vehicle_routes::create_vehicle_router::<S>())
        .nest("/api/drivers", driver_routes::create_driver_router::<S>())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
