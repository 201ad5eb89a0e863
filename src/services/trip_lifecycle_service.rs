//! Orquestador del ciclo de vida de viajes
//!
//! Cada operación pública corre en una única transacción del store: se
//! bloquean las filas afectadas (orden Trip → Vehicle → Driver), se relee
//! su estado bajo lock y se valida la transición antes de escribir. Cualquier
//! error revierte todas las escrituras de la operación; no hay reintentos
//! internos.
//!
//! ```text
//!         start_trip
//!  (none) ----------> in_progress --finalize_trip--> completed
//!                          |
//!                          +--cancel_trip--> cancelled
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    Driver, DriverStatus, FinalizedTrip, NewTrip, TripStatus, TripView, VehicleStatus,
};
use crate::repositories::FleetStore;
use crate::services::assignment_policy::AssignmentPolicy;
use crate::services::clock::Clock;
use crate::services::distance_service::DistanceSource;
use crate::utils::errors::{AppError, AppResult, TripError};

/// Parámetros de start_trip; lo que no venga lo decide la política de asignación
#[derive(Debug, Clone, Default)]
pub struct StartTripCommand {
    pub vehicle_id: i32,
    pub driver_id: Option<String>,
    pub origin_city_id: Option<i32>,
    pub destination_city_id: Option<i32>,
}

impl StartTripCommand {
    pub fn for_vehicle(vehicle_id: i32) -> Self {
        Self {
            vehicle_id,
            ..Self::default()
        }
    }
}

pub struct TripLifecycleService<S: FleetStore> {
    store: Arc<S>,
    policy: AssignmentPolicy,
    distance: Arc<dyn DistanceSource>,
    clock: Arc<dyn Clock>,
}

impl<S: FleetStore> TripLifecycleService<S> {
    pub fn new(
        store: Arc<S>,
        policy: AssignmentPolicy,
        distance: Arc<dyn DistanceSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            policy,
            distance,
            clock,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Confirma si `result` es Ok; si no, revierte y devuelve el error original
    async fn finish<T>(&self, tx: S::Tx, result: AppResult<T>) -> AppResult<T> {
        match result {
            Ok(value) => {
                self.store.commit(tx).await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.store.rollback(tx).await {
                    warn!("⚠️ Rollback falló tras '{}': {}", err, rollback_err);
                }
                Err(err)
            }
        }
    }

    #[tracing::instrument(skip(self), fields(op_id = %Uuid::new_v4()))]
    pub async fn start_trip(&self, command: StartTripCommand) -> AppResult<TripView> {
        let mut tx = self.store.begin().await?;
        let result = self.start_trip_in(&mut tx, command).await;
        let view = self.finish(tx, result).await?;
        info!(
            "🚚 Viaje {} iniciado: vehículo {} con {} ({} → {})",
            view.id, view.vehicle_plate, view.driver_name, view.origin_name, view.destination_name
        );
        Ok(view)
    }

    async fn start_trip_in(&self, tx: &mut S::Tx, command: StartTripCommand) -> AppResult<TripView> {
        let now = self.clock.now();
        let today = now.date_naive();

        let vehicle = self
            .store
            .lock_vehicle(tx, command.vehicle_id)
            .await?
            .ok_or(TripError::VehicleNotFound(command.vehicle_id))?;
        if !vehicle.is_available() {
            return Err(TripError::VehicleUnavailable {
                id: vehicle.id,
                status: vehicle.status,
            }
            .into());
        }
        if self.store.vehicle_has_active_trip(tx, vehicle.id).await? {
            warn!(
                "⚠️ Vehículo {} figura como {} pero tiene un viaje en curso",
                vehicle.id, vehicle.status
            );
            return Err(TripError::VehicleUnavailable {
                id: vehicle.id,
                status: VehicleStatus::OnTrip,
            }
            .into());
        }

        let cities = self.store.list_cities(tx).await?;
        let (origin, destination) = self.policy.resolve_route(
            &cities,
            command.origin_city_id,
            command.destination_city_id,
        )?;

        let driver = match command.driver_id.as_deref() {
            Some(driver_id) => self.lock_requested_driver(tx, driver_id, today).await?,
            None => self.assign_driver(tx, today).await?,
        };

        let trip = self
            .store
            .insert_trip(
                tx,
                NewTrip {
                    vehicle_id: vehicle.id,
                    driver_id: driver.id.clone(),
                    origin_city_id: origin.id,
                    destination_city_id: destination.id,
                    departed_at: now,
                    starting_odometer: vehicle.odometer,
                },
            )
            .await?;

        self.store
            .set_vehicle_status(tx, vehicle.id, VehicleStatus::OnTrip)
            .await?;
        self.store
            .set_driver_status(tx, &driver.id, DriverStatus::OnTrip)
            .await?;

        self.joined_view(tx, trip.id).await
    }

    /// Conductor pedido explícitamente: se bloquea y se revalida la elegibilidad
    async fn lock_requested_driver(
        &self,
        tx: &mut S::Tx,
        driver_id: &str,
        today: NaiveDate,
    ) -> AppResult<Driver> {
        let driver = self
            .store
            .lock_driver(tx, driver_id)
            .await?
            .ok_or_else(|| TripError::DriverNotFound(driver_id.to_string()))?;
        if !self.is_eligible_locked(tx, &driver, today).await? {
            return Err(TripError::DriverUnavailable(driver.id).into());
        }
        Ok(driver)
    }

    /// Elige entre los candidatos elegibles. Un candidato que otra transacción
    /// tomó mientras esperábamos su lock se descarta y se elige otro.
    async fn assign_driver(&self, tx: &mut S::Tx, today: NaiveDate) -> AppResult<Driver> {
        let mut candidates = self.store.eligible_drivers(tx, today).await?;
        loop {
            let Some(picked) = self.policy.pick(&candidates).cloned() else {
                return Err(TripError::NoDriverAvailable.into());
            };
            if let Some(driver) = self.store.lock_driver(tx, &picked.id).await? {
                if self.is_eligible_locked(tx, &driver, today).await? {
                    return Ok(driver);
                }
            }
            debug!("Conductor {} ya no es elegible, descartado", picked.id);
            candidates.retain(|c| c.id != picked.id);
        }
    }

    async fn is_eligible_locked(
        &self,
        tx: &mut S::Tx,
        driver: &Driver,
        today: NaiveDate,
    ) -> AppResult<bool> {
        if !driver.is_assignable_on(today) {
            return Ok(false);
        }
        Ok(!self.store.driver_has_active_trip(tx, &driver.id).await?)
    }

    #[tracing::instrument(skip(self), fields(op_id = %Uuid::new_v4()))]
    pub async fn finalize_trip(&self, trip_id: i32) -> AppResult<FinalizedTrip> {
        let mut tx = self.store.begin().await?;
        let result = self.finalize_trip_in(&mut tx, trip_id).await;
        let finalized = self.finish(tx, result).await?;
        info!(
            "🏁 Viaje {} finalizado: {} km en {} min",
            trip_id, finalized.distance_travelled, finalized.elapsed_minutes
        );
        Ok(finalized)
    }

    async fn finalize_trip_in(&self, tx: &mut S::Tx, trip_id: i32) -> AppResult<FinalizedTrip> {
        let trip = self
            .store
            .lock_trip(tx, trip_id)
            .await?
            .ok_or(TripError::TripNotFound(trip_id))?;
        if !trip.status.can_transition_to(TripStatus::Completed) {
            return Err(TripError::TripNotInProgress {
                id: trip.id,
                status: trip.status,
            }
            .into());
        }

        let vehicle = self
            .store
            .lock_vehicle(tx, trip.vehicle_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("trip {} references a missing vehicle", trip.id)))?;
        self.store.lock_driver(tx, &trip.driver_id).await?;

        let distance = self.distance.distance_travelled(&trip).await?;
        if distance < Decimal::ZERO {
            return Err(AppError::Internal(format!(
                "distance source reported a negative distance ({}) for trip {}",
                distance, trip.id
            )));
        }
        let ending_odometer = trip.starting_odometer + distance;
        let arrived_at = self.clock.now().max(trip.departed_at);

        self.store
            .complete_trip(tx, trip.id, arrived_at, ending_odometer)
            .await?;
        if vehicle.odometer > ending_odometer {
            debug!(
                "Odómetro del vehículo {} ({}) ya supera la lectura final {}",
                vehicle.id, vehicle.odometer, ending_odometer
            );
        }
        self.store
            .advance_vehicle_odometer(tx, vehicle.id, ending_odometer)
            .await?;
        self.store
            .set_vehicle_status(tx, vehicle.id, VehicleStatus::Active)
            .await?;
        self.store
            .set_driver_status(tx, &trip.driver_id, DriverStatus::Active)
            .await?;

        let view = self.joined_view(tx, trip.id).await?;
        Ok(FinalizedTrip {
            trip: view,
            distance_travelled: distance,
            elapsed_minutes: (arrived_at - trip.departed_at).num_minutes(),
        })
    }

    #[tracing::instrument(skip(self), fields(op_id = %Uuid::new_v4()))]
    pub async fn cancel_trip(&self, trip_id: i32, reason: Option<String>) -> AppResult<TripView> {
        let mut tx = self.store.begin().await?;
        let result = self.cancel_trip_in(&mut tx, trip_id, reason).await;
        let view = self.finish(tx, result).await?;
        info!("🛑 Viaje {} cancelado", trip_id);
        Ok(view)
    }

    async fn cancel_trip_in(
        &self,
        tx: &mut S::Tx,
        trip_id: i32,
        reason: Option<String>,
    ) -> AppResult<TripView> {
        let trip = self
            .store
            .lock_trip(tx, trip_id)
            .await?
            .ok_or(TripError::TripNotFound(trip_id))?;
        if !trip.status.can_transition_to(TripStatus::Cancelled) {
            return Err(TripError::TripAlreadyTerminal {
                id: trip.id,
                status: trip.status,
            }
            .into());
        }

        // Un viaje planned nunca puso vehículo ni conductor en on_trip
        let releases_resources = trip.status == TripStatus::InProgress;
        if releases_resources {
            self.store.lock_vehicle(tx, trip.vehicle_id).await?;
            self.store.lock_driver(tx, &trip.driver_id).await?;
        }

        self.store.cancel_trip(tx, trip.id, reason).await?;

        if releases_resources {
            self.store
                .set_vehicle_status(tx, trip.vehicle_id, VehicleStatus::Active)
                .await?;
            self.store
                .set_driver_status(tx, &trip.driver_id, DriverStatus::Active)
                .await?;
        }

        self.joined_view(tx, trip.id).await
    }

    #[tracing::instrument(skip(self, notes))]
    pub async fn update_trip_notes(&self, trip_id: i32, notes: Option<String>) -> AppResult<TripView> {
        let mut tx = self.store.begin().await?;
        let result = self.update_trip_notes_in(&mut tx, trip_id, notes).await;
        self.finish(tx, result).await
    }

    async fn update_trip_notes_in(
        &self,
        tx: &mut S::Tx,
        trip_id: i32,
        notes: Option<String>,
    ) -> AppResult<TripView> {
        self.store
            .lock_trip(tx, trip_id)
            .await?
            .ok_or(TripError::TripNotFound(trip_id))?;
        self.store.set_trip_notes(tx, trip_id, notes).await?;
        self.joined_view(tx, trip_id).await
    }

    /// Viajes en curso, más recientes primero. Sin locks.
    pub async fn list_active_trips(&self) -> AppResult<Vec<TripView>> {
        self.store.list_trips(Some(TripStatus::InProgress)).await
    }

    pub async fn list_trips(&self, status: Option<TripStatus>) -> AppResult<Vec<TripView>> {
        self.store.list_trips(status).await
    }

    /// Conductores que hoy podrían recibir un viaje. Sin locks.
    pub async fn list_available_drivers(&self) -> AppResult<Vec<Driver>> {
        let today = self.clock.now().date_naive();
        self.store.list_available_drivers(today).await
    }

    pub async fn get_trip(&self, trip_id: i32) -> AppResult<TripView> {
        self.store
            .find_trip_view(trip_id)
            .await?
            .ok_or_else(|| TripError::TripNotFound(trip_id).into())
    }

    async fn joined_view(&self, tx: &mut S::Tx, trip_id: i32) -> AppResult<TripView> {
        self.store
            .trip_view(tx, trip_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("trip {} has dangling references", trip_id)))
    }
}
