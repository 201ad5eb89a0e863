use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::controllers::vehicle_controller::VehicleController;
use crate::dto::vehicle_dto::CreateVehicleRequest;
use crate::dto::ApiResponse;
use crate::models::Vehicle;
use crate::repositories::FleetStore;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_vehicle_router<S: FleetStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(list_vehicles::<S>).post(create_vehicle::<S>))
        .route("/:id", get(get_vehicle::<S>))
}

async fn create_vehicle<S: FleetStore>(
    State(state): State<AppState<S>>,
    Json(request): Json<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Vehicle>>), AppError> {
    let controller = VehicleController::new(state.store.clone());
    let response = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_vehicle<S: FleetStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<i32>,
) -> Result<Json<Vehicle>, AppError> {
    let controller = VehicleController::new(state.store.clone());
    let response = controller.get_by_id(id).await?;
    Ok(Json(response))
}

async fn list_vehicles<S: FleetStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    let controller = VehicleController::new(state.store.clone());
    let response = controller.list().await?;
    Ok(Json(response))
}
