//! Entity Store sobre PostgreSQL
//!
//! Los locks de fila son `SELECT ... FOR UPDATE`; cada transacción fija
//! `lock_timeout` y `statement_timeout` locales para que una espera larga
//! termine en rollback y en un error reintentable.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use crate::config::database::DatabaseConfig;
use crate::models::{
    City, Driver, DriverStatus, NewDriver, NewTrip, NewVehicle, Trip, TripStatus, TripView,
    Vehicle, VehicleStatus,
};
use crate::repositories::fleet_store::FleetStore;
use crate::utils::errors::{conflict_error, AppError, AppResult};

const VEHICLE_COLUMNS: &str =
    "id, plate, brand, model, year, odometer, tank_capacity, status, created_at";

const DRIVER_COLUMNS: &str =
    "id, name, license_number, license_category, license_expiry, status";

const TRIP_COLUMNS: &str = "id, vehicle_id, driver_id, origin_city_id, destination_city_id, \
     departed_at, arrived_at, starting_odometer, ending_odometer, status, notes";

const TRIP_VIEW_SELECT: &str = r#"
    SELECT
        t.id, t.vehicle_id, v.plate AS vehicle_plate, v.model AS vehicle_model,
        t.driver_id, d.name AS driver_name,
        t.origin_city_id, o.name AS origin_name, o.region AS origin_region,
        t.destination_city_id, c.name AS destination_name, c.region AS destination_region,
        t.departed_at, t.arrived_at, t.starting_odometer, t.ending_odometer,
        t.status, t.notes
    FROM trip t
    JOIN vehicle v ON v.id = t.vehicle_id
    JOIN driver d ON d.id = t.driver_id
    JOIN city o ON o.id = t.origin_city_id
    JOIN city c ON c.id = t.destination_city_id
"#;

#[derive(Clone)]
pub struct PgFleetStore {
    pool: PgPool,
    lock_timeout_ms: u64,
    statement_timeout_ms: u64,
}

impl PgFleetStore {
    pub fn new(pool: PgPool, config: &DatabaseConfig) -> Self {
        Self {
            pool,
            lock_timeout_ms: config.lock_timeout.as_millis() as u64,
            statement_timeout_ms: config.statement_timeout.as_millis() as u64,
        }
    }
}

/// Campo en conflicto según la restricción única violada al registrar un conductor
fn duplicate_driver_field(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("driver_license_number_key") => "license_number",
        _ => "document",
    }
}

#[async_trait]
impl FleetStore for PgFleetStore {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> AppResult<Self::Tx> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "SELECT set_config('lock_timeout', $1, true), set_config('statement_timeout', $2, true)",
        )
        .bind(format!("{}ms", self.lock_timeout_ms))
        .bind(format!("{}ms", self.statement_timeout_ms))
        .execute(&mut *tx)
        .await?;
        Ok(tx)
    }

    async fn commit(&self, tx: Self::Tx) -> AppResult<()> {
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> AppResult<()> {
        tx.rollback().await?;
        Ok(())
    }

    async fn lock_vehicle(&self, tx: &mut Self::Tx, id: i32) -> AppResult<Option<Vehicle>> {
        log::debug!("🔒 Lock vehicle {}", id);
        let sql = format!("SELECT {} FROM vehicle WHERE id = $1 FOR UPDATE", VEHICLE_COLUMNS);
        let vehicle = sqlx::query_as::<_, Vehicle>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(vehicle)
    }

    async fn lock_driver(&self, tx: &mut Self::Tx, id: &str) -> AppResult<Option<Driver>> {
        log::debug!("🔒 Lock driver {}", id);
        let sql = format!("SELECT {} FROM driver WHERE id = $1 FOR UPDATE", DRIVER_COLUMNS);
        let driver = sqlx::query_as::<_, Driver>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(driver)
    }

    async fn lock_trip(&self, tx: &mut Self::Tx, id: i32) -> AppResult<Option<Trip>> {
        log::debug!("🔒 Lock trip {}", id);
        let sql = format!("SELECT {} FROM trip WHERE id = $1 FOR UPDATE", TRIP_COLUMNS);
        let trip = sqlx::query_as::<_, Trip>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(trip)
    }

    async fn driver_has_active_trip(&self, tx: &mut Self::Tx, driver_id: &str) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM trip WHERE driver_id = $1 AND status = 'in_progress')",
        )
        .bind(driver_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(result.0)
    }

    async fn vehicle_has_active_trip(&self, tx: &mut Self::Tx, vehicle_id: i32) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM trip WHERE vehicle_id = $1 AND status = 'in_progress')",
        )
        .bind(vehicle_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(result.0)
    }

    async fn eligible_drivers(&self, tx: &mut Self::Tx, today: NaiveDate) -> AppResult<Vec<Driver>> {
        let sql = format!(
            r#"
            SELECT {} FROM driver d
            WHERE d.status = 'active'
              AND d.license_expiry > $1
              AND NOT EXISTS (
                  SELECT 1 FROM trip t
                  WHERE t.driver_id = d.id AND t.status = 'in_progress'
              )
            ORDER BY d.id
            "#,
            DRIVER_COLUMNS
        );
        let drivers = sqlx::query_as::<_, Driver>(&sql)
            .bind(today)
            .fetch_all(&mut **tx)
            .await?;
        Ok(drivers)
    }

    async fn list_cities(&self, tx: &mut Self::Tx) -> AppResult<Vec<City>> {
        let cities = sqlx::query_as::<_, City>("SELECT id, name, region FROM city ORDER BY id")
            .fetch_all(&mut **tx)
            .await?;
        Ok(cities)
    }

    async fn trip_view(&self, tx: &mut Self::Tx, id: i32) -> AppResult<Option<TripView>> {
        let sql = format!("{} WHERE t.id = $1", TRIP_VIEW_SELECT);
        let view = sqlx::query_as::<_, TripView>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(view)
    }

    async fn insert_trip(&self, tx: &mut Self::Tx, trip: NewTrip) -> AppResult<Trip> {
        let sql = format!(
            r#"
            INSERT INTO trip
                (vehicle_id, driver_id, origin_city_id, destination_city_id,
                 departed_at, starting_odometer, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'in_progress')
            RETURNING {}
            "#,
            TRIP_COLUMNS
        );
        let trip = sqlx::query_as::<_, Trip>(&sql)
            .bind(trip.vehicle_id)
            .bind(trip.driver_id)
            .bind(trip.origin_city_id)
            .bind(trip.destination_city_id)
            .bind(trip.departed_at)
            .bind(trip.starting_odometer)
            .fetch_one(&mut **tx)
            .await?;
        log::info!("🆕 Trip {} insertado para vehículo {}", trip.id, trip.vehicle_id);
        Ok(trip)
    }

    async fn set_vehicle_status(
        &self,
        tx: &mut Self::Tx,
        id: i32,
        status: VehicleStatus,
    ) -> AppResult<()> {
        sqlx::query("UPDATE vehicle SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn advance_vehicle_odometer(
        &self,
        tx: &mut Self::Tx,
        id: i32,
        reading: Decimal,
    ) -> AppResult<()> {
        sqlx::query("UPDATE vehicle SET odometer = GREATEST(odometer, $2) WHERE id = $1")
            .bind(id)
            .bind(reading)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn set_driver_status(
        &self,
        tx: &mut Self::Tx,
        id: &str,
        status: DriverStatus,
    ) -> AppResult<()> {
        sqlx::query("UPDATE driver SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn complete_trip(
        &self,
        tx: &mut Self::Tx,
        id: i32,
        arrived_at: DateTime<Utc>,
        ending_odometer: Decimal,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE trip
            SET status = 'completed', arrived_at = $2, ending_odometer = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(arrived_at)
        .bind(ending_odometer)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn cancel_trip(&self, tx: &mut Self::Tx, id: i32, notes: Option<String>) -> AppResult<()> {
        sqlx::query("UPDATE trip SET status = 'cancelled', notes = COALESCE($2, notes) WHERE id = $1")
            .bind(id)
            .bind(notes)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn set_trip_notes(&self, tx: &mut Self::Tx, id: i32, notes: Option<String>) -> AppResult<()> {
        sqlx::query("UPDATE trip SET notes = $2 WHERE id = $1")
            .bind(id)
            .bind(notes)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn list_trips(&self, status: Option<TripStatus>) -> AppResult<Vec<TripView>> {
        let sql = format!(
            "{} WHERE ($1::trip_status IS NULL OR t.status = $1) ORDER BY t.departed_at DESC, t.id DESC",
            TRIP_VIEW_SELECT
        );
        let trips = sqlx::query_as::<_, TripView>(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(trips)
    }

    async fn find_trip_view(&self, id: i32) -> AppResult<Option<TripView>> {
        let sql = format!("{} WHERE t.id = $1", TRIP_VIEW_SELECT);
        let view = sqlx::query_as::<_, TripView>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(view)
    }

    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>> {
        let sql = format!("SELECT {} FROM vehicle ORDER BY id", VEHICLE_COLUMNS);
        let vehicles = sqlx::query_as::<_, Vehicle>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(vehicles)
    }

    async fn find_vehicle(&self, id: i32) -> AppResult<Option<Vehicle>> {
        let sql = format!("SELECT {} FROM vehicle WHERE id = $1", VEHICLE_COLUMNS);
        let vehicle = sqlx::query_as::<_, Vehicle>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(vehicle)
    }

    async fn list_drivers(&self) -> AppResult<Vec<Driver>> {
        let sql = format!("SELECT {} FROM driver ORDER BY name", DRIVER_COLUMNS);
        let drivers = sqlx::query_as::<_, Driver>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(drivers)
    }

    async fn find_driver(&self, id: &str) -> AppResult<Option<Driver>> {
        let sql = format!("SELECT {} FROM driver WHERE id = $1", DRIVER_COLUMNS);
        let driver = sqlx::query_as::<_, Driver>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(driver)
    }

    async fn list_available_drivers(&self, today: NaiveDate) -> AppResult<Vec<Driver>> {
        let sql = format!(
            r#"
            SELECT {} FROM driver d
            WHERE d.status = 'active'
              AND d.license_expiry > $1
              AND NOT EXISTS (
                  SELECT 1 FROM trip t
                  WHERE t.driver_id = d.id AND t.status = 'in_progress'
              )
            ORDER BY d.name
            "#,
            DRIVER_COLUMNS
        );
        let drivers = sqlx::query_as::<_, Driver>(&sql)
            .bind(today)
            .fetch_all(&self.pool)
            .await?;
        Ok(drivers)
    }

    async fn insert_vehicle(&self, vehicle: NewVehicle) -> AppResult<Vehicle> {
        let sql = format!(
            r#"
            INSERT INTO vehicle (plate, brand, model, year, odometer, tank_capacity, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'active', $7)
            RETURNING {}
            "#,
            VEHICLE_COLUMNS
        );
        let plate = vehicle.plate.clone();
        sqlx::query_as::<_, Vehicle>(&sql)
            .bind(vehicle.plate)
            .bind(vehicle.brand)
            .bind(vehicle.model)
            .bind(vehicle.year)
            .bind(vehicle.odometer)
            .bind(vehicle.tank_capacity)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => conflict_error("Vehicle", "plate", &plate),
                other => other,
            })
    }

    async fn insert_driver(&self, driver: NewDriver) -> AppResult<Driver> {
        let sql = format!(
            r#"
            INSERT INTO driver (id, name, license_number, license_category, license_expiry, status)
            VALUES ($1, $2, $3, $4, $5, 'active')
            RETURNING {}
            "#,
            DRIVER_COLUMNS
        );
        let id = driver.id.clone();
        let license_number = driver.license_number.clone();
        sqlx::query_as::<_, Driver>(&sql)
            .bind(driver.id)
            .bind(driver.name)
            .bind(driver.license_number)
            .bind(driver.license_category)
            .bind(driver.license_expiry)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                let constraint = match &e {
                    sqlx::Error::Database(db) => db.constraint().map(str::to_string),
                    _ => None,
                };
                match AppError::from(e) {
                    AppError::Conflict(_) => match duplicate_driver_field(constraint.as_deref()) {
                        "license_number" => {
                            conflict_error("Driver", "license_number", &license_number)
                        }
                        field => conflict_error("Driver", field, &id),
                    },
                    other => other,
                }
            })
    }
}
