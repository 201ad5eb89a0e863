//! Gestión del ciclo de vida de viajes de una flota
//!
//! Capas: `routes` → `controllers` → `services` → `repositories`.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
