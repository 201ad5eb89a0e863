//! Configuración de base de datos
//!
//! Este módulo maneja la configuración del pool de PostgreSQL con SQLx y los
//! timeouts que acotan la espera de locks dentro de una transacción.

use anyhow::{anyhow, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use super::environment::{var_or, Lookup};

/// Configuración de la base de datos
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    /// `lock_timeout` local de cada transacción
    pub lock_timeout: Duration,
    /// `statement_timeout` local de cada transacción
    pub statement_timeout: Duration,
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        let url = lookup("DATABASE_URL")
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| anyhow!("DATABASE_URL must be set in environment variables"))?;

        Ok(Self {
            url,
            max_connections: var_or(lookup, "DB_MAX_CONNECTIONS", 20)?,
            min_connections: var_or(lookup, "DB_MIN_CONNECTIONS", 2)?,
            connect_timeout: Duration::from_secs(var_or(lookup, "DB_CONNECT_TIMEOUT_SECS", 30)?),
            idle_timeout: Duration::from_secs(300),
            max_lifetime: Duration::from_secs(3600),
            lock_timeout: Duration::from_millis(var_or(lookup, "DB_LOCK_TIMEOUT_MS", 5_000)?),
            statement_timeout: Duration::from_millis(var_or(
                lookup,
                "DB_STATEMENT_TIMEOUT_MS",
                15_000,
            )?),
            run_migrations: var_or(lookup, "RUN_MIGRATIONS", true)?,
        })
    }

    /// Crear un nuevo pool de conexiones
    pub async fn create_pool(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.connect_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
            .connect(&self.url)
            .await
    }
}
