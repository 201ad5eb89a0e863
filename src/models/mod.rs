//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos que mapean exactamente
//! al schema PostgreSQL (ver `migrations/`).

pub mod city;
pub mod driver;
pub mod trip;
pub mod vehicle;

pub use city::City;
pub use driver::{Driver, DriverStatus, NewDriver};
pub use trip::{FinalizedTrip, NewTrip, Trip, TripStatus, TripView};
pub use vehicle::{NewVehicle, Vehicle, VehicleStatus};
