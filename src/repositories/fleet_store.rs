//! Puerto del Entity Store
//!
//! Toda operación transaccional recibe explícitamente el handle `Tx`, de modo
//! que el límite "todo o nada" queda visible en cada llamada. Los métodos
//! `lock_*` toman un lock de fila que se mantiene hasta `commit`/`rollback`;
//! un `Tx` descartado sin `commit` equivale a `rollback`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::models::{
    City, Driver, DriverStatus, NewDriver, NewTrip, NewVehicle, Trip, TripStatus, TripView,
    Vehicle, VehicleStatus,
};
use crate::utils::errors::AppResult;

#[async_trait]
pub trait FleetStore: Send + Sync + 'static {
    type Tx: Send + 'static;

    async fn begin(&self) -> AppResult<Self::Tx>;
    async fn commit(&self, tx: Self::Tx) -> AppResult<()>;
    async fn rollback(&self, tx: Self::Tx) -> AppResult<()>;

    // --- Locks de fila ---

    async fn lock_vehicle(&self, tx: &mut Self::Tx, id: i32) -> AppResult<Option<Vehicle>>;
    async fn lock_driver(&self, tx: &mut Self::Tx, id: &str) -> AppResult<Option<Driver>>;
    async fn lock_trip(&self, tx: &mut Self::Tx, id: i32) -> AppResult<Option<Trip>>;

    // --- Lecturas dentro de la transacción ---

    async fn driver_has_active_trip(&self, tx: &mut Self::Tx, driver_id: &str) -> AppResult<bool>;

    /// Un escritor externo puede haber devuelto el vehículo a `active` con un
    /// viaje todavía abierto; la fuente de verdad es la tabla de viajes
    async fn vehicle_has_active_trip(&self, tx: &mut Self::Tx, vehicle_id: i32) -> AppResult<bool>;

    /// Conductores activos, con licencia vigente después de `today` y sin
    /// viaje en curso. Sin lock: el llamador bloquea y revalida su elección.
    async fn eligible_drivers(&self, tx: &mut Self::Tx, today: NaiveDate) -> AppResult<Vec<Driver>>;

    async fn list_cities(&self, tx: &mut Self::Tx) -> AppResult<Vec<City>>;

    async fn trip_view(&self, tx: &mut Self::Tx, id: i32) -> AppResult<Option<TripView>>;

    // --- Escrituras dentro de la transacción ---

    async fn insert_trip(&self, tx: &mut Self::Tx, trip: NewTrip) -> AppResult<Trip>;

    async fn set_vehicle_status(
        &self,
        tx: &mut Self::Tx,
        id: i32,
        status: VehicleStatus,
    ) -> AppResult<()>;

    /// Lleva el odómetro a `max(actual, reading)`
    async fn advance_vehicle_odometer(
        &self,
        tx: &mut Self::Tx,
        id: i32,
        reading: Decimal,
    ) -> AppResult<()>;

    async fn set_driver_status(
        &self,
        tx: &mut Self::Tx,
        id: &str,
        status: DriverStatus,
    ) -> AppResult<()>;

    async fn complete_trip(
        &self,
        tx: &mut Self::Tx,
        id: i32,
        arrived_at: DateTime<Utc>,
        ending_odometer: Decimal,
    ) -> AppResult<()>;

    async fn cancel_trip(&self, tx: &mut Self::Tx, id: i32, notes: Option<String>) -> AppResult<()>;

    async fn set_trip_notes(&self, tx: &mut Self::Tx, id: i32, notes: Option<String>) -> AppResult<()>;

    // --- Lecturas fuera de transacción ---

    async fn list_trips(&self, status: Option<TripStatus>) -> AppResult<Vec<TripView>>;
    async fn find_trip_view(&self, id: i32) -> AppResult<Option<TripView>>;
    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>>;
    async fn find_vehicle(&self, id: i32) -> AppResult<Option<Vehicle>>;
    async fn list_drivers(&self) -> AppResult<Vec<Driver>>;
    async fn find_driver(&self, id: &str) -> AppResult<Option<Driver>>;

    /// Mismo criterio que `eligible_drivers`, sin transacción; ordenados por nombre
    async fn list_available_drivers(&self, today: NaiveDate) -> AppResult<Vec<Driver>>;

    // --- Registro ---

    async fn insert_vehicle(&self, vehicle: NewVehicle) -> AppResult<Vehicle>;
    async fn insert_driver(&self, driver: NewDriver) -> AppResult<Driver>;
}
