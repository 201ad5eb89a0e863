//! Modelo de Driver
//!
//! El conductor se identifica por su documento (CPF), único en la tabla `driver`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;

/// Estado del conductor - mapea al ENUM driver_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "driver_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    Active,
    OnTrip,
    Inactive,
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DriverStatus::Active => "active",
            DriverStatus::OnTrip => "on_trip",
            DriverStatus::Inactive => "inactive",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Driver {
    /// Documento (CPF, solo dígitos)
    pub id: String,
    pub name: String,
    pub license_number: String,
    pub license_category: String,
    pub license_expiry: NaiveDate,
    pub status: DriverStatus,
}

impl Driver {
    /// Parte del predicado de elegibilidad que depende solo de la fila.
    /// La ausencia de viajes en curso la verifica el store.
    pub fn is_assignable_on(&self, today: NaiveDate) -> bool {
        self.status == DriverStatus::Active && self.license_expiry > today
    }
}

#[derive(Debug, Clone)]
pub struct NewDriver {
    pub id: String,
    pub name: String,
    pub license_number: String,
    pub license_category: String,
    pub license_expiry: NaiveDate,
}
