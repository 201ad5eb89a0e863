use serde::Deserialize;
use validator::Validate;

use crate::models::NewDriver;
use crate::utils::errors::{validation_error, AppResult};
use crate::utils::validation::{
    normalize_document, parse_date, validate_document, validate_future_date,
    validate_license_category, validate_license_number,
};

// Request para registrar un conductor
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDriverRequest {
    #[validate(custom = "validate_document")]
    pub document: String,

    #[validate(length(min = 2, max = 120))]
    pub name: String,

    #[validate(custom = "validate_license_number")]
    pub license_number: String,

    #[validate(custom = "validate_license_category")]
    pub license_category: String,

    /// `YYYY-MM-DD`, posterior a hoy
    #[validate(custom = "validate_future_date")]
    pub license_expiry: String,
}

impl CreateDriverRequest {
    /// Convierte una solicitud ya validada
    pub fn into_new_driver(self) -> AppResult<NewDriver> {
        let license_expiry = parse_date(&self.license_expiry)
            .ok_or_else(|| validation_error("license_expiry", "expected a YYYY-MM-DD date"))?;
        Ok(NewDriver {
            id: normalize_document(&self.document),
            name: self.name.trim().to_string(),
            license_number: normalize_document(&self.license_number),
            license_category: self.license_category.trim().to_uppercase(),
            license_expiry,
        })
    }
}
