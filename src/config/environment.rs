//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno. La lectura pasa por una
//! función de búsqueda para poder probarla sin tocar el entorno del proceso.

use anyhow::{anyhow, Context, Result};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

use super::database::DatabaseConfig;

/// Búsqueda de variables: `std::env::var` en producción, un mapa en tests
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Lee `key` y la parsea; si falta devuelve `default`
pub(crate) fn var_or<T>(lookup: Lookup<'_>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{} must be valid: {}", key, e)),
        _ => Ok(default),
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub log_level: tracing::Level,
    pub cors_origins: Vec<String>,
    pub trip_min_distance_km: u32,
    pub trip_max_distance_km: u32,
    pub database: DatabaseConfig,
}

impl EnvironmentConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        let cors_origins = lookup("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let config = Self {
            environment: var_or(lookup, "ENVIRONMENT", "development".to_string())?,
            port: var_or(lookup, "PORT", 3001)?,
            host: var_or(lookup, "HOST", "0.0.0.0".to_string())?,
            log_level: var_or(lookup, "LOG_LEVEL", tracing::Level::INFO)?,
            cors_origins,
            trip_min_distance_km: var_or(lookup, "TRIP_MIN_DISTANCE_KM", 10)?,
            trip_max_distance_km: var_or(lookup, "TRIP_MAX_DISTANCE_KM", 500)?,
            database: DatabaseConfig::from_lookup(lookup).context("invalid database configuration")?,
        };

        if config.trip_min_distance_km > config.trip_max_distance_km {
            return Err(anyhow!(
                "TRIP_MIN_DISTANCE_KM ({}) must not exceed TRIP_MAX_DISTANCE_KM ({})",
                config.trip_min_distance_km,
                config.trip_max_distance_km
            ));
        }
        Ok(config)
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
