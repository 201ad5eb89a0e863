//! Repositorios
//!
//! Puerto `FleetStore` y sus implementaciones (PostgreSQL y memoria).

pub mod fleet_store;
pub mod memory_fleet_store;
pub mod pg_fleet_store;

pub use fleet_store::FleetStore;
pub use memory_fleet_store::{FleetData, MemoryFleetStore};
pub use pg_fleet_store::PgFleetStore;
