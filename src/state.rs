//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Es genérico sobre el store para poder
//! servir la misma API sobre PostgreSQL o sobre el store en memoria.

use std::sync::Arc;

use crate::repositories::FleetStore;
use crate::services::TripLifecycleService;

pub struct AppState<S: FleetStore> {
    pub store: Arc<S>,
    pub trips: Arc<TripLifecycleService<S>>,
}

impl<S: FleetStore> AppState<S> {
    pub fn new(trips: TripLifecycleService<S>) -> Self {
        Self {
            store: trips.store().clone(),
            trips: Arc::new(trips),
        }
    }
}

impl<S: FleetStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            trips: self.trips.clone(),
        }
    }
}
