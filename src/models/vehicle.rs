//! Modelo de Vehicle
//!
//! Mapea la tabla `vehicle` y el ENUM `vehicle_status` del schema PostgreSQL.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;
use std::str::FromStr;

/// Estado del vehículo - mapea al ENUM vehicle_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "vehicle_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Active,
    OnTrip,
    InMaintenance,
    Inactive,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Active => "active",
            VehicleStatus::OnTrip => "on_trip",
            VehicleStatus::InMaintenance => "in_maintenance",
            VehicleStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(VehicleStatus::Active),
            "on_trip" => Ok(VehicleStatus::OnTrip),
            "in_maintenance" => Ok(VehicleStatus::InMaintenance),
            "inactive" => Ok(VehicleStatus::Inactive),
            other => Err(format!("unknown vehicle status '{}'", other)),
        }
    }
}

/// Vehicle principal - mapea exactamente a la tabla vehicle
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Vehicle {
    pub id: i32,
    pub plate: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    /// Kilometraje actual, nunca decrece
    pub odometer: Decimal,
    pub tank_capacity: Option<Decimal>,
    pub status: VehicleStatus,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Active
    }
}

/// Datos para registrar un vehículo nuevo (ya validados)
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub plate: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub odometer: Decimal,
    pub tank_capacity: Option<Decimal>,
}
