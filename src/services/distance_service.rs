//! Fuente de distancia recorrida al finalizar un viaje
//!
//! En producción la distancia vendría de telemetría; `SimulatedDistance`
//! muestrea un valor acotado como sustituto.

use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;

use crate::models::Trip;
use crate::utils::errors::{AppError, AppResult};

#[async_trait]
pub trait DistanceSource: Send + Sync {
    /// Kilómetros recorridos por el viaje; nunca negativo
    async fn distance_travelled(&self, trip: &Trip) -> AppResult<Decimal>;
}

/// Distancia uniforme en `[min_km, max_km]` con un decimal
#[derive(Debug, Clone, Copy)]
pub struct SimulatedDistance {
    min_tenths: i64,
    max_tenths: i64,
}

impl SimulatedDistance {
    pub fn new(min_km: u32, max_km: u32) -> AppResult<Self> {
        if min_km > max_km {
            return Err(AppError::Internal(format!(
                "invalid simulated distance range {}..={}",
                min_km, max_km
            )));
        }
        Ok(Self {
            min_tenths: i64::from(min_km) * 10,
            max_tenths: i64::from(max_km) * 10,
        })
    }
}

impl Default for SimulatedDistance {
    fn default() -> Self {
        Self {
            min_tenths: 100,
            max_tenths: 5000,
        }
    }
}

#[async_trait]
impl DistanceSource for SimulatedDistance {
    async fn distance_travelled(&self, _trip: &Trip) -> AppResult<Decimal> {
        let tenths = rand::thread_rng().gen_range(self.min_tenths..=self.max_tenths);
        Ok(Decimal::new(tenths, 1))
    }
}

/// Distancia fija, útil para pruebas deterministas
#[derive(Debug, Clone, Copy)]
pub struct FixedDistance(pub Decimal);

#[async_trait]
impl DistanceSource for FixedDistance {
    async fn distance_travelled(&self, _trip: &Trip) -> AppResult<Decimal> {
        Ok(self.0)
    }
}
