use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::models::NewVehicle;
use crate::utils::validation::{
    normalize_plate, validate_non_negative_decimal, validate_plate, validate_positive_decimal,
};

// Request para registrar un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(custom = "validate_plate")]
    pub plate: String,

    #[validate(length(min = 2, max = 100))]
    pub brand: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,

    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,

    #[validate(custom = "validate_non_negative_decimal")]
    pub odometer: Option<Decimal>,

    #[validate(custom = "validate_positive_decimal")]
    pub tank_capacity: Option<Decimal>,
}

impl From<CreateVehicleRequest> for NewVehicle {
    fn from(request: CreateVehicleRequest) -> Self {
        Self {
            plate: normalize_plate(&request.plate),
            brand: request.brand,
            model: request.model,
            year: request.year,
            odometer: request.odometer.unwrap_or(Decimal::ZERO),
            tank_capacity: request.tank_capacity,
        }
    }
}
