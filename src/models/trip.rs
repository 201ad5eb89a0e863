//! Modelo de Trip
//!
//! Contiene la fila `trip`, su máquina de estados y la vista enriquecida
//! (placa, modelo, conductor y ciudades) que consume la capa de presentación.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;
use std::str::FromStr;

/// Estado del viaje - mapea al ENUM trip_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "trip_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Planned => "planned",
            TripStatus::InProgress => "in_progress",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        }
    }

    /// completed y cancelled no admiten más transiciones
    pub fn is_terminal(&self) -> bool {
        matches!(self, TripStatus::Completed | TripStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: TripStatus) -> bool {
        match (self, next) {
            (TripStatus::Planned, TripStatus::InProgress | TripStatus::Cancelled) => true,
            (TripStatus::InProgress, TripStatus::Completed | TripStatus::Cancelled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "planned" => Ok(TripStatus::Planned),
            "in_progress" => Ok(TripStatus::InProgress),
            "completed" => Ok(TripStatus::Completed),
            "cancelled" => Ok(TripStatus::Cancelled),
            other => Err(format!("unknown trip status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Trip {
    pub id: i32,
    pub vehicle_id: i32,
    pub driver_id: String,
    pub origin_city_id: i32,
    pub destination_city_id: i32,
    pub departed_at: DateTime<Utc>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub starting_odometer: Decimal,
    pub ending_odometer: Option<Decimal>,
    pub status: TripStatus,
    pub notes: Option<String>,
}

/// Fila a insertar por startTrip
#[derive(Debug, Clone)]
pub struct NewTrip {
    pub vehicle_id: i32,
    pub driver_id: String,
    pub origin_city_id: i32,
    pub destination_city_id: i32,
    pub departed_at: DateTime<Utc>,
    pub starting_odometer: Decimal,
}

/// Viaje con los campos de presentación de vehículo, conductor y ciudades
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct TripView {
    pub id: i32,
    pub vehicle_id: i32,
    pub vehicle_plate: String,
    pub vehicle_model: Option<String>,
    pub driver_id: String,
    pub driver_name: String,
    pub origin_city_id: i32,
    pub origin_name: String,
    pub origin_region: String,
    pub destination_city_id: i32,
    pub destination_name: String,
    pub destination_region: String,
    pub departed_at: DateTime<Utc>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub starting_odometer: Decimal,
    pub ending_odometer: Option<Decimal>,
    pub status: TripStatus,
    pub notes: Option<String>,
}

/// Resultado de finalizeTrip
#[derive(Debug, Clone, Serialize)]
pub struct FinalizedTrip {
    pub trip: TripView,
    pub distance_travelled: Decimal,
    pub elapsed_minutes: i64,
}
