use std::sync::Arc;
use validator::Validate;

use crate::dto::driver_dto::CreateDriverRequest;
use crate::dto::ApiResponse;
use crate::models::Driver;
use crate::repositories::FleetStore;
use crate::services::TripLifecycleService;
use crate::utils::errors::{not_found_error, AppResult};
use crate::utils::validation::normalize_document;

pub struct DriverController<S: FleetStore> {
    store: Arc<S>,
    trips: Arc<TripLifecycleService<S>>,
}

impl<S: FleetStore> DriverController<S> {
    pub fn new(store: Arc<S>, trips: Arc<TripLifecycleService<S>>) -> Self {
        Self { store, trips }
    }

    pub async fn create(&self, request: CreateDriverRequest) -> AppResult<ApiResponse<Driver>> {
        request.validate()?;
        let driver = self.store.insert_driver(request.into_new_driver()?).await?;
        log::info!("🧑‍✈️ Conductor {} registrado", driver.id);
        Ok(ApiResponse::success_with_message(
            driver,
            "Conductor registrado exitosamente",
        ))
    }

    /// Acepta el documento con o sin puntuación
    pub async fn get_by_document(&self, document: &str) -> AppResult<Driver> {
        let id = normalize_document(document);
        self.store
            .find_driver(&id)
            .await?
            .ok_or_else(|| not_found_error("Driver", &id))
    }

    pub async fn list(&self) -> AppResult<Vec<Driver>> {
        self.store.list_drivers().await
    }

    pub async fn list_available(&self) -> AppResult<Vec<Driver>> {
        self.trips.list_available_drivers().await
    }
}
