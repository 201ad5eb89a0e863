use std::sync::Arc;
use validator::Validate;

use crate::dto::vehicle_dto::CreateVehicleRequest;
use crate::dto::ApiResponse;
use crate::models::Vehicle;
use crate::repositories::FleetStore;
use crate::utils::errors::{not_found_error, AppResult};

pub struct VehicleController<S: FleetStore> {
    store: Arc<S>,
}

impl<S: FleetStore> VehicleController<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn create(&self, request: CreateVehicleRequest) -> AppResult<ApiResponse<Vehicle>> {
        request.validate()?;
        let vehicle = self.store.insert_vehicle(request.into()).await?;
        log::info!("🚗 Vehículo {} registrado con id {}", vehicle.plate, vehicle.id);
        Ok(ApiResponse::success_with_message(
            vehicle,
            "Vehículo registrado exitosamente",
        ))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Vehicle> {
        self.store
            .find_vehicle(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))
    }

    pub async fn list(&self) -> AppResult<Vec<Vehicle>> {
        self.store.list_vehicles().await
    }
}
