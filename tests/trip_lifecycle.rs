mod common;

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use futures::future::join_all;

use common::*;
use fleet_trips::models::{DriverStatus, NewTrip, TripStatus, VehicleStatus};
use fleet_trips::repositories::MemoryFleetStore;
use fleet_trips::services::{
    AssignmentPolicy, FixedDistance, RandomSelection, StartTripCommand, TripLifecycleService,
};
use fleet_trips::utils::errors::{AppError, ErrorKind, TripError};

fn trip_error(err: &AppError) -> TripError {
    err.as_trip_error()
        .cloned()
        .unwrap_or_else(|| panic!("expected a trip error, got {:?}", err))
}

#[tokio::test]
async fn start_then_finalize_round_trip() {
    let (store, vehicle) = basic_fleet().await;
    let clock = clock();
    let trips = service(&store, km(1234), clock.clone());

    let started = trips
        .start_trip(StartTripCommand::for_vehicle(vehicle.id))
        .await
        .unwrap();
    assert_eq!(started.status, TripStatus::InProgress);
    assert_eq!(started.driver_id, MARIA);
    assert_eq!(started.starting_odometer, km(10_000));
    assert_eq!((started.origin_city_id, started.destination_city_id), (1, 2));
    assert_eq!(started.departed_at, start_time());

    let data = store.snapshot().await;
    assert_eq!(data.vehicles[&vehicle.id].status, VehicleStatus::OnTrip);
    assert_eq!(data.drivers[MARIA].status, DriverStatus::OnTrip);

    clock.advance(Duration::minutes(95));
    let finalized = trips.finalize_trip(started.id).await.unwrap();
    assert_eq!(finalized.trip.status, TripStatus::Completed);
    assert_eq!(finalized.distance_travelled, km(1234));
    assert_eq!(finalized.elapsed_minutes, 95);
    assert_eq!(finalized.trip.ending_odometer, Some(km(11_234)));
    assert_eq!(finalized.trip.arrived_at, Some(start_time() + Duration::minutes(95)));

    let data = store.snapshot().await;
    assert_eq!(data.vehicles[&vehicle.id].status, VehicleStatus::Active);
    assert_eq!(data.vehicles[&vehicle.id].odometer, km(11_234));
    assert_eq!(data.drivers[MARIA].status, DriverStatus::Active);
}

#[tokio::test]
async fn explicit_route_and_driver_are_honoured() {
    let (store, vehicle) = basic_fleet().await;
    add_driver(&store, JOAO, "João Lima", valid_expiry()).await;
    let trips = service(&store, km(100), clock());

    let started = trips
        .start_trip(StartTripCommand {
            vehicle_id: vehicle.id,
            driver_id: Some(JOAO.to_string()),
            origin_city_id: Some(3),
            destination_city_id: Some(1),
        })
        .await
        .unwrap();
    assert_eq!(started.driver_id, JOAO);
    assert_eq!(started.origin_name, "Rio de Janeiro");
    assert_eq!(started.destination_region, "SP");
}

#[tokio::test]
async fn same_origin_and_destination_is_rejected_before_lookup() {
    let (store, vehicle) = basic_fleet().await;
    let trips = service(&store, km(100), clock());

    let err = trips
        .start_trip(StartTripCommand {
            vehicle_id: vehicle.id,
            origin_city_id: Some(5),
            destination_city_id: Some(5),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(trip_error(&err), TripError::InvalidRoute(5));
    assert_eq!(trip_error(&err).kind(), ErrorKind::Validation);
    assert!(store.snapshot().await.trips.is_empty());
}

#[tokio::test]
async fn unknown_city_is_reported() {
    let (store, vehicle) = basic_fleet().await;
    let trips = service(&store, km(100), clock());

    let err = trips
        .start_trip(StartTripCommand {
            vehicle_id: vehicle.id,
            origin_city_id: Some(99),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(trip_error(&err), TripError::CityNotFound(99));
}

#[tokio::test]
async fn a_single_city_is_not_enough_to_pick_a_route() {
    let store = MemoryFleetStore::new();
    store.insert_city(1, "Curitiba", "PR").await;
    let vehicle = add_vehicle(&store, "XYZ9876", km(0)).await;
    add_driver(&store, MARIA, "Maria Souza", valid_expiry()).await;
    let trips = service(&store, km(100), clock());

    let err = trips
        .start_trip(StartTripCommand::for_vehicle(vehicle.id))
        .await
        .unwrap_err();
    assert_eq!(
        trip_error(&err),
        TripError::InsufficientReferenceData { available: 1 }
    );
    assert_eq!(trip_error(&err).kind(), ErrorKind::ResourceExhaustion);
}

#[tokio::test]
async fn missing_vehicle_is_not_found() {
    let (store, _) = basic_fleet().await;
    let trips = service(&store, km(100), clock());

    let err = trips
        .start_trip(StartTripCommand::for_vehicle(404))
        .await
        .unwrap_err();
    assert_eq!(trip_error(&err), TripError::VehicleNotFound(404));
    assert_eq!(trip_error(&err).kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn vehicle_in_maintenance_cannot_start() {
    let (store, vehicle) = basic_fleet().await;
    store
        .force_vehicle_status(vehicle.id, VehicleStatus::InMaintenance)
        .await;
    let trips = service(&store, km(100), clock());

    let err = trips
        .start_trip(StartTripCommand::for_vehicle(vehicle.id))
        .await
        .unwrap_err();
    assert_eq!(
        trip_error(&err),
        TripError::VehicleUnavailable {
            id: vehicle.id,
            status: VehicleStatus::InMaintenance,
        }
    );
    assert_eq!(trip_error(&err).kind(), ErrorKind::StateConflict);

    let data = store.snapshot().await;
    assert!(data.trips.is_empty());
    assert_eq!(data.drivers[MARIA].status, DriverStatus::Active);
}

#[tokio::test]
async fn vehicle_marked_active_with_open_trip_cannot_start_again() {
    let (store, vehicle) = basic_fleet().await;
    add_driver(&store, JOAO, "João Lima", valid_expiry()).await;
    let trips = service(&store, km(100), clock());

    let first = trips
        .start_trip(StartTripCommand::for_vehicle(vehicle.id))
        .await
        .unwrap();
    // Escritor externo devuelve el vehículo a active sin cerrar el viaje
    store
        .force_vehicle_status(vehicle.id, VehicleStatus::Active)
        .await;

    let err = trips
        .start_trip(StartTripCommand::for_vehicle(vehicle.id))
        .await
        .unwrap_err();
    assert_eq!(
        trip_error(&err),
        TripError::VehicleUnavailable {
            id: vehicle.id,
            status: VehicleStatus::OnTrip,
        }
    );

    let data = store.snapshot().await;
    let open: Vec<_> = data
        .trips
        .values()
        .filter(|t| t.vehicle_id == vehicle.id && t.status == TripStatus::InProgress)
        .collect();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, first.id);
    assert_eq!(data.drivers[JOAO].status, DriverStatus::Active);
}

#[tokio::test]
async fn no_eligible_driver_leaves_no_trace() {
    let (store, vehicle) = basic_fleet().await;
    // Vence hoy: ya no es elegible
    add_driver(&store, JOAO, "João Lima", start_time().date_naive()).await;
    store.force_driver_status(MARIA, DriverStatus::Inactive).await;
    let before = store.snapshot().await;
    let trips = service(&store, km(100), clock());

    let err = trips
        .start_trip(StartTripCommand::for_vehicle(vehicle.id))
        .await
        .unwrap_err();
    assert_eq!(trip_error(&err), TripError::NoDriverAvailable);

    let after = store.snapshot().await;
    assert!(after.trips.is_empty());
    assert_eq!(after.vehicles, before.vehicles);
    assert_eq!(after.drivers, before.drivers);
}

#[tokio::test]
async fn requested_driver_must_be_eligible() {
    let (store, vehicle) = basic_fleet().await;
    add_driver(
        &store,
        JOAO,
        "João Lima",
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
    )
    .await;
    let trips = service(&store, km(100), clock());

    let err = trips
        .start_trip(StartTripCommand {
            vehicle_id: vehicle.id,
            driver_id: Some(JOAO.to_string()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(trip_error(&err), TripError::DriverUnavailable(JOAO.to_string()));

    let err = trips
        .start_trip(StartTripCommand {
            vehicle_id: vehicle.id,
            driver_id: Some("00000000000".to_string()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(
        trip_error(&err),
        TripError::DriverNotFound("00000000000".to_string())
    );
}

#[tokio::test]
async fn driver_on_a_trip_cannot_take_a_second_vehicle() {
    let (store, first) = basic_fleet().await;
    let second = add_vehicle(&store, "DEF4G56", km(500)).await;
    let trips = service(&store, km(100), clock());

    trips
        .start_trip(StartTripCommand::for_vehicle(first.id))
        .await
        .unwrap();
    let err = trips
        .start_trip(StartTripCommand {
            vehicle_id: second.id,
            driver_id: Some(MARIA.to_string()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(trip_error(&err), TripError::DriverUnavailable(MARIA.to_string()));

    let err = trips
        .start_trip(StartTripCommand::for_vehicle(second.id))
        .await
        .unwrap_err();
    assert_eq!(trip_error(&err), TripError::NoDriverAvailable);
}

#[tokio::test]
async fn cancel_releases_vehicle_and_driver() {
    let (store, vehicle) = basic_fleet().await;
    let trips = service(&store, km(100), clock());

    let started = trips
        .start_trip(StartTripCommand::for_vehicle(vehicle.id))
        .await
        .unwrap();
    let cancelled = trips
        .cancel_trip(started.id, Some("Pneu furado".to_string()))
        .await
        .unwrap();
    assert_eq!(cancelled.status, TripStatus::Cancelled);
    assert_eq!(cancelled.notes.as_deref(), Some("Pneu furado"));
    assert_eq!(cancelled.arrived_at, None);
    assert_eq!(cancelled.ending_odometer, None);

    let data = store.snapshot().await;
    assert_eq!(data.vehicles[&vehicle.id].status, VehicleStatus::Active);
    assert_eq!(data.vehicles[&vehicle.id].odometer, km(10_000));
    assert_eq!(data.drivers[MARIA].status, DriverStatus::Active);

    // Ambos quedan libres para un viaje nuevo
    trips
        .start_trip(StartTripCommand::for_vehicle(vehicle.id))
        .await
        .unwrap();
}

#[tokio::test]
async fn cancel_without_reason_keeps_existing_notes() {
    let (store, vehicle) = basic_fleet().await;
    let trips = service(&store, km(100), clock());

    let started = trips
        .start_trip(StartTripCommand::for_vehicle(vehicle.id))
        .await
        .unwrap();
    trips
        .update_trip_notes(started.id, Some("Carga frágil".to_string()))
        .await
        .unwrap();
    let cancelled = trips.cancel_trip(started.id, None).await.unwrap();
    assert_eq!(cancelled.notes.as_deref(), Some("Carga frágil"));
}

#[tokio::test]
async fn cancelling_a_planned_trip_does_not_touch_resources() {
    let (store, vehicle) = basic_fleet().await;
    let planned = store
        .insert_planned_trip(NewTrip {
            vehicle_id: vehicle.id,
            driver_id: MARIA.to_string(),
            origin_city_id: 1,
            destination_city_id: 3,
            departed_at: start_time(),
            starting_odometer: vehicle.odometer,
        })
        .await;
    store.force_vehicle_status(vehicle.id, VehicleStatus::InMaintenance).await;
    let trips = service(&store, km(100), clock());

    let cancelled = trips.cancel_trip(planned.id, None).await.unwrap();
    assert_eq!(cancelled.status, TripStatus::Cancelled);

    let data = store.snapshot().await;
    assert_eq!(data.vehicles[&vehicle.id].status, VehicleStatus::InMaintenance);
    assert_eq!(data.drivers[MARIA].status, DriverStatus::Active);

    // Un viaje planned no se finaliza
    let err = trips.finalize_trip(planned.id).await.unwrap_err();
    assert_eq!(
        trip_error(&err),
        TripError::TripNotInProgress {
            id: planned.id,
            status: TripStatus::Cancelled,
        }
    );
}

#[tokio::test]
async fn terminal_trips_are_immutable() {
    let (store, vehicle) = basic_fleet().await;
    let trips = service(&store, km(100), clock());

    let started = trips
        .start_trip(StartTripCommand::for_vehicle(vehicle.id))
        .await
        .unwrap();
    trips.finalize_trip(started.id).await.unwrap();
    let after_finalize = store.snapshot().await;

    let err = trips.finalize_trip(started.id).await.unwrap_err();
    assert_eq!(
        trip_error(&err),
        TripError::TripNotInProgress {
            id: started.id,
            status: TripStatus::Completed,
        }
    );
    let err = trips.cancel_trip(started.id, Some("tarde".to_string())).await.unwrap_err();
    assert_eq!(
        trip_error(&err),
        TripError::TripAlreadyTerminal {
            id: started.id,
            status: TripStatus::Completed,
        }
    );
    assert_eq!(trip_error(&err).kind(), ErrorKind::StateConflict);

    let after_rejections = store.snapshot().await;
    assert_eq!(after_rejections.trips, after_finalize.trips);
    assert_eq!(after_rejections.vehicles, after_finalize.vehicles);
}

#[tokio::test]
async fn unknown_trip_is_not_found_everywhere() {
    let (store, _) = basic_fleet().await;
    let trips = service(&store, km(100), clock());

    for err in [
        trips.finalize_trip(77).await.unwrap_err(),
        trips.cancel_trip(77, None).await.unwrap_err(),
        trips.update_trip_notes(77, None).await.unwrap_err(),
        trips.get_trip(77).await.unwrap_err(),
    ] {
        assert_eq!(trip_error(&err), TripError::TripNotFound(77));
    }
}

#[tokio::test]
async fn odometer_never_moves_backwards() {
    let (store, vehicle) = basic_fleet().await;
    let trips = service(&store, km(1234), clock());

    let started = trips
        .start_trip(StartTripCommand::for_vehicle(vehicle.id))
        .await
        .unwrap();
    // Lectura externa más alta durante el viaje
    store.force_vehicle_odometer(vehicle.id, km(50_000)).await;

    let finalized = trips.finalize_trip(started.id).await.unwrap();
    assert_eq!(finalized.trip.ending_odometer, Some(km(11_234)));
    assert_eq!(store.snapshot().await.vehicles[&vehicle.id].odometer, km(50_000));
}

#[tokio::test]
async fn listings_are_ordered_and_side_effect_free() {
    let (store, first) = basic_fleet().await;
    let second = add_vehicle(&store, "DEF4G56", km(500)).await;
    add_driver(&store, JOAO, "João Lima", valid_expiry()).await;
    let clock = clock();
    let trips = service(&store, km(100), clock.clone());

    let a = trips
        .start_trip(StartTripCommand::for_vehicle(first.id))
        .await
        .unwrap();
    clock.advance(Duration::minutes(10));
    let b = trips
        .start_trip(StartTripCommand::for_vehicle(second.id))
        .await
        .unwrap();

    let before = store.snapshot().await;
    let active = trips.list_active_trips().await.unwrap();
    let again = trips.list_active_trips().await.unwrap();
    assert_eq!(active, again);
    assert_eq!(
        active.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![b.id, a.id]
    );
    let after = store.snapshot().await;
    assert_eq!(before.trips, after.trips);

    trips.finalize_trip(a.id).await.unwrap();
    let active = trips.list_active_trips().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, b.id);

    let completed = trips.list_trips(Some(TripStatus::Completed)).await.unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, a.id);
    assert_eq!(trips.list_trips(None).await.unwrap().len(), 2);

    let fetched = trips.get_trip(b.id).await.unwrap();
    assert_eq!(fetched.vehicle_plate, "DEF4G56");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starts_on_one_vehicle_have_a_single_winner() {
    let (store, vehicle) = basic_fleet().await;
    add_driver(&store, JOAO, "João Lima", valid_expiry()).await;
    let trips = Arc::new(service(&store, km(100), clock()));

    let attempts = (0..8).map(|_| {
        let trips = trips.clone();
        tokio::spawn(async move {
            trips
                .start_trip(StartTripCommand::for_vehicle(vehicle.id))
                .await
        })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(
            trip_error(err),
            TripError::VehicleUnavailable {
                id: vehicle.id,
                status: VehicleStatus::OnTrip,
            }
        );
    }
    assert_eq!(store.snapshot().await.trips.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_assignment_never_shares_a_driver() {
    let store = store_with_cities().await;
    let mut vehicles = Vec::new();
    for plate in ["AAA1A11", "BBB2B22", "CCC3C33", "DDD4D44"] {
        vehicles.push(add_vehicle(&store, plate, km(0)).await);
    }
    add_driver(&store, MARIA, "Maria Souza", valid_expiry()).await;
    add_driver(&store, JOAO, "João Lima", valid_expiry()).await;
    let trips = Arc::new(TripLifecycleService::new(
        Arc::new(store.clone()),
        AssignmentPolicy::new(Arc::new(RandomSelection)),
        Arc::new(FixedDistance(km(100))),
        clock(),
    ));

    let attempts = vehicles.iter().map(|v| {
        let trips = trips.clone();
        let id = v.id;
        tokio::spawn(async move { trips.start_trip(StartTripCommand::for_vehicle(id)).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let mut drivers: Vec<String> = results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .map(|t| t.driver_id.clone())
        .collect();
    assert_eq!(drivers.len(), 2);
    drivers.sort();
    drivers.dedup();
    assert_eq!(drivers.len(), 2);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(trip_error(err), TripError::NoDriverAvailable);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn status_mirrors_trips_under_mixed_load() {
    let store = store_with_cities().await;
    let mut vehicle_ids = Vec::new();
    for plate in ["AAA1A11", "BBB2B22", "CCC3C33"] {
        vehicle_ids.push(add_vehicle(&store, plate, km(0)).await.id);
    }
    add_driver(&store, MARIA, "Maria Souza", valid_expiry()).await;
    add_driver(&store, JOAO, "João Lima", valid_expiry()).await;
    let trips = Arc::new(TripLifecycleService::new(
        Arc::new(store.clone()),
        AssignmentPolicy::new(Arc::new(RandomSelection)),
        Arc::new(FixedDistance(km(55))),
        clock(),
    ));

    for round in 0..5 {
        let mut tasks = Vec::new();
        for (i, id) in vehicle_ids.iter().copied().enumerate() {
            let starter = trips.clone();
            tasks.push(tokio::spawn(async move {
                let _ = starter.start_trip(StartTripCommand::for_vehicle(id)).await;
            }));
            let closer = trips.clone();
            let trip_id = (round * 3 + i) as i32;
            tasks.push(tokio::spawn(async move {
                if trip_id % 2 == 0 {
                    let _ = closer.finalize_trip(trip_id).await;
                } else {
                    let _ = closer.cancel_trip(trip_id, None).await;
                }
            }));
        }
        join_all(tasks).await;
    }

    let data = store.snapshot().await;
    let in_progress: Vec<_> = data
        .trips
        .values()
        .filter(|t| t.status == TripStatus::InProgress)
        .collect();
    for vehicle in data.vehicles.values() {
        let open = in_progress.iter().filter(|t| t.vehicle_id == vehicle.id).count();
        match vehicle.status {
            VehicleStatus::OnTrip => assert_eq!(open, 1, "vehicle {}", vehicle.id),
            _ => assert_eq!(open, 0, "vehicle {}", vehicle.id),
        }
    }
    for driver in data.drivers.values() {
        let open = in_progress.iter().filter(|t| t.driver_id == driver.id).count();
        match driver.status {
            DriverStatus::OnTrip => assert_eq!(open, 1, "driver {}", driver.id),
            _ => assert_eq!(open, 0, "driver {}", driver.id),
        }
    }
    for trip in data.trips.values().filter(|t| t.status == TripStatus::Completed) {
        assert!(trip.ending_odometer >= Some(trip.starting_odometer));
        assert!(trip.arrived_at >= Some(trip.departed_at));
    }
}
