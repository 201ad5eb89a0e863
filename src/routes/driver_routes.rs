use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::controllers::driver_controller::DriverController;
use crate::dto::driver_dto::CreateDriverRequest;
use crate::dto::ApiResponse;
use crate::models::Driver;
use crate::repositories::FleetStore;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_driver_router<S: FleetStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(list_drivers::<S>).post(create_driver::<S>))
        .route("/available", get(list_available_drivers::<S>))
        .route("/:id", get(get_driver::<S>))
}

fn controller<S: FleetStore>(state: &AppState<S>) -> DriverController<S> {
    DriverController::new(state.store.clone(), state.trips.clone())
}

async fn create_driver<S: FleetStore>(
    State(state): State<AppState<S>>,
    Json(request): Json<CreateDriverRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Driver>>), AppError> {
    let response = controller(&state).create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_driver<S: FleetStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<Driver>, AppError> {
    let response = controller(&state).get_by_document(&id).await?;
    Ok(Json(response))
}

async fn list_drivers<S: FleetStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<Driver>>, AppError> {
    let response = controller(&state).list().await?;
    Ok(Json(response))
}

async fn list_available_drivers<S: FleetStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<Driver>>, AppError> {
    let response = controller(&state).list_available().await?;
    Ok(Json(response))
}
