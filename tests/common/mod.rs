#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use fleet_trips::models::{NewDriver, NewVehicle, Vehicle};
use fleet_trips::repositories::{FleetStore, MemoryFleetStore};
use fleet_trips::services::{
    AssignmentPolicy, FixedDistance, FixedSelection, ManualClock, TripLifecycleService,
};

pub const MARIA: &str = "52998224725";
pub const JOAO: &str = "11144477735";

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
}

pub fn km(tenths: i64) -> Decimal {
    Decimal::new(tenths, 1)
}

/// Store con tres ciudades y sin flota
pub async fn store_with_cities() -> MemoryFleetStore {
    let store = MemoryFleetStore::new();
    store.insert_city(1, "São Paulo", "SP").await;
    store.insert_city(2, "Campinas", "SP").await;
    store.insert_city(3, "Rio de Janeiro", "RJ").await;
    store
}

pub async fn add_vehicle(store: &MemoryFleetStore, plate: &str, odometer: Decimal) -> Vehicle {
    store
        .insert_vehicle(NewVehicle {
            plate: plate.to_string(),
            brand: Some("Volvo".to_string()),
            model: Some("FH 540".to_string()),
            year: Some(2022),
            odometer,
            tank_capacity: Some(Decimal::new(600, 0)),
        })
        .await
        .unwrap()
}

pub async fn add_driver(store: &MemoryFleetStore, id: &str, name: &str, expiry: NaiveDate) {
    store
        .insert_driver(NewDriver {
            id: id.to_string(),
            name: name.to_string(),
            license_number: format!("0{}", &id[..10]),
            license_category: "E".to_string(),
            license_expiry: expiry,
        })
        .await
        .unwrap();
}

pub fn valid_expiry() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 12, 31).unwrap()
}

/// Flota mínima: tres ciudades, un vehículo (odómetro 1000.0) y un conductor
pub async fn basic_fleet() -> (MemoryFleetStore, Vehicle) {
    let store = store_with_cities().await;
    let vehicle = add_vehicle(&store, "ABC1D23", km(10_000)).await;
    add_driver(&store, MARIA, "Maria Souza", valid_expiry()).await;
    (store, vehicle)
}

pub fn service(
    store: &MemoryFleetStore,
    distance: Decimal,
    clock: Arc<ManualClock>,
) -> TripLifecycleService<MemoryFleetStore> {
    TripLifecycleService::new(
        Arc::new(store.clone()),
        AssignmentPolicy::new(Arc::new(FixedSelection(0))),
        Arc::new(FixedDistance(distance)),
        clock,
    )
}

pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(start_time()))
}
