//! Entity Store en memoria
//!
//! Una transacción retiene el mutex de todo el store (un lock más grueso que
//! el de fila, con la misma semántica observable: el perdedor espera al
//! ganador y relee estado fresco). Las escrituras se aplican sobre una copia
//! que solo se publica en `commit`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::{
    City, Driver, DriverStatus, NewDriver, NewTrip, NewVehicle, Trip, TripStatus, TripView,
    Vehicle, VehicleStatus,
};
use crate::repositories::fleet_store::FleetStore;
use crate::utils::errors::{conflict_error, not_found_error, AppResult};

/// Contenido completo del store
#[derive(Debug, Clone, Default)]
pub struct FleetData {
    pub vehicles: BTreeMap<i32, Vehicle>,
    pub drivers: BTreeMap<String, Driver>,
    pub cities: BTreeMap<i32, City>,
    pub trips: BTreeMap<i32, Trip>,
    next_vehicle_id: i32,
    next_trip_id: i32,
}

impl FleetData {
    fn view(&self, trip: &Trip) -> Option<TripView> {
        let vehicle = self.vehicles.get(&trip.vehicle_id)?;
        let driver = self.drivers.get(&trip.driver_id)?;
        let origin = self.cities.get(&trip.origin_city_id)?;
        let destination = self.cities.get(&trip.destination_city_id)?;
        Some(TripView {
            id: trip.id,
            vehicle_id: trip.vehicle_id,
            vehicle_plate: vehicle.plate.clone(),
            vehicle_model: vehicle.model.clone(),
            driver_id: trip.driver_id.clone(),
            driver_name: driver.name.clone(),
            origin_city_id: origin.id,
            origin_name: origin.name.clone(),
            origin_region: origin.region.clone(),
            destination_city_id: destination.id,
            destination_name: destination.name.clone(),
            destination_region: destination.region.clone(),
            departed_at: trip.departed_at,
            arrived_at: trip.arrived_at,
            starting_odometer: trip.starting_odometer,
            ending_odometer: trip.ending_odometer,
            status: trip.status,
            notes: trip.notes.clone(),
        })
    }

    fn has_active_trip(&self, driver_id: &str) -> bool {
        self.trips
            .values()
            .any(|t| t.driver_id == driver_id && t.status == TripStatus::InProgress)
    }

    fn vehicle_has_active_trip(&self, vehicle_id: i32) -> bool {
        self.trips
            .values()
            .any(|t| t.vehicle_id == vehicle_id && t.status == TripStatus::InProgress)
    }

    fn trip_mut(&mut self, id: i32) -> AppResult<&mut Trip> {
        self.trips
            .get_mut(&id)
            .ok_or_else(|| not_found_error("Trip", &id.to_string()))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<FleetData>,
    staged: FleetData,
}

#[derive(Clone, Default)]
pub struct MemoryFleetStore {
    data: Arc<Mutex<FleetData>>,
}

impl MemoryFleetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Carga datos de referencia; las ciudades no se gestionan por la API
    pub async fn insert_city(&self, id: i32, name: &str, region: &str) -> City {
        let city = City {
            id,
            name: name.to_string(),
            region: region.to_string(),
        };
        self.data.lock().await.cities.insert(id, city.clone());
        city
    }

    /// Escritor externo (mantenimiento, combustible) que no pasa por el orquestador
    pub async fn force_vehicle_status(&self, id: i32, status: VehicleStatus) {
        if let Some(vehicle) = self.data.lock().await.vehicles.get_mut(&id) {
            vehicle.status = status;
        }
    }

    pub async fn force_vehicle_odometer(&self, id: i32, odometer: Decimal) {
        if let Some(vehicle) = self.data.lock().await.vehicles.get_mut(&id) {
            vehicle.odometer = odometer;
        }
    }

    pub async fn force_driver_status(&self, id: &str, status: DriverStatus) {
        if let Some(driver) = self.data.lock().await.drivers.get_mut(id) {
            driver.status = status;
        }
    }

    /// Registra un viaje `planned`; no toca vehículo ni conductor
    pub async fn insert_planned_trip(&self, trip: NewTrip) -> Trip {
        let mut data = self.data.lock().await;
        data.next_trip_id += 1;
        let row = Trip {
            id: data.next_trip_id,
            vehicle_id: trip.vehicle_id,
            driver_id: trip.driver_id,
            origin_city_id: trip.origin_city_id,
            destination_city_id: trip.destination_city_id,
            departed_at: trip.departed_at,
            arrived_at: None,
            starting_odometer: trip.starting_odometer,
            ending_odometer: None,
            status: TripStatus::Planned,
            notes: None,
        };
        data.trips.insert(row.id, row.clone());
        row
    }

    /// Copia consistente del estado confirmado
    pub async fn snapshot(&self) -> FleetData {
        self.data.lock().await.clone()
    }
}

#[async_trait]
impl FleetStore for MemoryFleetStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> AppResult<Self::Tx> {
        let guard = self.data.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryTx { guard, staged })
    }

    async fn commit(&self, tx: Self::Tx) -> AppResult<()> {
        let MemoryTx { mut guard, staged } = tx;
        *guard = staged;
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> AppResult<()> {
        drop(tx);
        Ok(())
    }

    async fn lock_vehicle(&self, tx: &mut Self::Tx, id: i32) -> AppResult<Option<Vehicle>> {
        Ok(tx.staged.vehicles.get(&id).cloned())
    }

    async fn lock_driver(&self, tx: &mut Self::Tx, id: &str) -> AppResult<Option<Driver>> {
        Ok(tx.staged.drivers.get(id).cloned())
    }

    async fn lock_trip(&self, tx: &mut Self::Tx, id: i32) -> AppResult<Option<Trip>> {
        Ok(tx.staged.trips.get(&id).cloned())
    }

    async fn driver_has_active_trip(&self, tx: &mut Self::Tx, driver_id: &str) -> AppResult<bool> {
        Ok(tx.staged.has_active_trip(driver_id))
    }

    async fn vehicle_has_active_trip(&self, tx: &mut Self::Tx, vehicle_id: i32) -> AppResult<bool> {
        Ok(tx.staged.vehicle_has_active_trip(vehicle_id))
    }

    async fn eligible_drivers(&self, tx: &mut Self::Tx, today: NaiveDate) -> AppResult<Vec<Driver>> {
        let data = &tx.staged;
        Ok(data
            .drivers
            .values()
            .filter(|d| d.is_assignable_on(today) && !data.has_active_trip(&d.id))
            .cloned()
            .collect())
    }

    async fn list_cities(&self, tx: &mut Self::Tx) -> AppResult<Vec<City>> {
        Ok(tx.staged.cities.values().cloned().collect())
    }

    async fn trip_view(&self, tx: &mut Self::Tx, id: i32) -> AppResult<Option<TripView>> {
        let data = &tx.staged;
        Ok(data.trips.get(&id).and_then(|t| data.view(t)))
    }

    async fn insert_trip(&self, tx: &mut Self::Tx, trip: NewTrip) -> AppResult<Trip> {
        let data = &mut tx.staged;
        data.next_trip_id += 1;
        let row = Trip {
            id: data.next_trip_id,
            vehicle_id: trip.vehicle_id,
            driver_id: trip.driver_id,
            origin_city_id: trip.origin_city_id,
            destination_city_id: trip.destination_city_id,
            departed_at: trip.departed_at,
            arrived_at: None,
            starting_odometer: trip.starting_odometer,
            ending_odometer: None,
            status: TripStatus::InProgress,
            notes: None,
        };
        data.trips.insert(row.id, row.clone());
        Ok(row)
    }

    async fn set_vehicle_status(
        &self,
        tx: &mut Self::Tx,
        id: i32,
        status: VehicleStatus,
    ) -> AppResult<()> {
        if let Some(vehicle) = tx.staged.vehicles.get_mut(&id) {
            vehicle.status = status;
        }
        Ok(())
    }

    async fn advance_vehicle_odometer(
        &self,
        tx: &mut Self::Tx,
        id: i32,
        reading: Decimal,
    ) -> AppResult<()> {
        if let Some(vehicle) = tx.staged.vehicles.get_mut(&id) {
            vehicle.odometer = vehicle.odometer.max(reading);
        }
        Ok(())
    }

    async fn set_driver_status(
        &self,
        tx: &mut Self::Tx,
        id: &str,
        status: DriverStatus,
    ) -> AppResult<()> {
        if let Some(driver) = tx.staged.drivers.get_mut(id) {
            driver.status = status;
        }
        Ok(())
    }

    async fn complete_trip(
        &self,
        tx: &mut Self::Tx,
        id: i32,
        arrived_at: DateTime<Utc>,
        ending_odometer: Decimal,
    ) -> AppResult<()> {
        let trip = tx.staged.trip_mut(id)?;
        trip.status = TripStatus::Completed;
        trip.arrived_at = Some(arrived_at);
        trip.ending_odometer = Some(ending_odometer);
        Ok(())
    }

    async fn cancel_trip(&self, tx: &mut Self::Tx, id: i32, notes: Option<String>) -> AppResult<()> {
        let trip = tx.staged.trip_mut(id)?;
        trip.status = TripStatus::Cancelled;
        if notes.is_some() {
            trip.notes = notes;
        }
        Ok(())
    }

    async fn set_trip_notes(&self, tx: &mut Self::Tx, id: i32, notes: Option<String>) -> AppResult<()> {
        tx.staged.trip_mut(id)?.notes = notes;
        Ok(())
    }

    async fn list_trips(&self, status: Option<TripStatus>) -> AppResult<Vec<TripView>> {
        let data = self.data.lock().await;
        let mut views: Vec<TripView> = data
            .trips
            .values()
            .filter(|t| status.map_or(true, |s| t.status == s))
            .filter_map(|t| data.view(t))
            .collect();
        views.sort_by(|a, b| b.departed_at.cmp(&a.departed_at).then(b.id.cmp(&a.id)));
        Ok(views)
    }

    async fn find_trip_view(&self, id: i32) -> AppResult<Option<TripView>> {
        let data = self.data.lock().await;
        Ok(data.trips.get(&id).and_then(|t| data.view(t)))
    }

    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        Ok(self.data.lock().await.vehicles.values().cloned().collect())
    }

    async fn find_vehicle(&self, id: i32) -> AppResult<Option<Vehicle>> {
        Ok(self.data.lock().await.vehicles.get(&id).cloned())
    }

    async fn list_drivers(&self) -> AppResult<Vec<Driver>> {
        let mut drivers: Vec<Driver> = self.data.lock().await.drivers.values().cloned().collect();
        drivers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(drivers)
    }

    async fn find_driver(&self, id: &str) -> AppResult<Option<Driver>> {
        Ok(self.data.lock().await.drivers.get(id).cloned())
    }

    async fn list_available_drivers(&self, today: NaiveDate) -> AppResult<Vec<Driver>> {
        let data = self.data.lock().await;
        let mut drivers: Vec<Driver> = data
            .drivers
            .values()
            .filter(|d| d.is_assignable_on(today) && !data.has_active_trip(&d.id))
            .cloned()
            .collect();
        drivers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(drivers)
    }

    async fn insert_vehicle(&self, vehicle: NewVehicle) -> AppResult<Vehicle> {
        let mut data = self.data.lock().await;
        if data.vehicles.values().any(|v| v.plate == vehicle.plate) {
            return Err(conflict_error("Vehicle", "plate", &vehicle.plate));
        }
        data.next_vehicle_id += 1;
        let row = Vehicle {
            id: data.next_vehicle_id,
            plate: vehicle.plate,
            brand: vehicle.brand,
            model: vehicle.model,
            year: vehicle.year,
            odometer: vehicle.odometer,
            tank_capacity: vehicle.tank_capacity,
            status: VehicleStatus::Active,
            created_at: Utc::now(),
        };
        data.vehicles.insert(row.id, row.clone());
        Ok(row)
    }

    async fn insert_driver(&self, driver: NewDriver) -> AppResult<Driver> {
        let mut data = self.data.lock().await;
        if data.drivers.contains_key(&driver.id) {
            return Err(conflict_error("Driver", "document", &driver.id));
        }
        if data
            .drivers
            .values()
            .any(|d| d.license_number == driver.license_number)
        {
            return Err(conflict_error("Driver", "license_number", &driver.license_number));
        }
        let row = Driver {
            id: driver.id,
            name: driver.name,
            license_number: driver.license_number,
            license_category: driver.license_category,
            license_expiry: driver.license_expiry,
            status: DriverStatus::Active,
        };
        data.drivers.insert(row.id.clone(), row.clone());
        Ok(row)
    }
}
