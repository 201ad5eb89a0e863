use serde::Deserialize;
use validator::Validate;

use crate::services::StartTripCommand;
use crate::utils::validation::{normalize_document, validate_document};

// Request para iniciar un viaje
#[derive(Debug, Deserialize, Validate)]
pub struct StartTripRequest {
    #[validate(range(min = 1))]
    pub vehicle_id: i32,

    #[validate(custom = "validate_document")]
    pub driver_id: Option<String>,

    #[validate(range(min = 1))]
    pub origin_city_id: Option<i32>,

    #[validate(range(min = 1))]
    pub destination_city_id: Option<i32>,
}

impl From<StartTripRequest> for StartTripCommand {
    fn from(request: StartTripRequest) -> Self {
        Self {
            vehicle_id: request.vehicle_id,
            driver_id: request.driver_id.as_deref().map(normalize_document),
            origin_city_id: request.origin_city_id,
            destination_city_id: request.destination_city_id,
        }
    }
}

// Request para cancelar un viaje
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CancelTripRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

// Request para reemplazar las observaciones de un viaje
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTripNotesRequest {
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

// Filtros del listado de viajes
#[derive(Debug, Default, Deserialize)]
pub struct TripFilters {
    pub status: Option<String>,
}

/// Texto vacío o solo espacios se guarda como NULL
pub fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
