//! Middleware del sistema
//!
//! Por ahora solo contiene la configuración de CORS.

pub mod cors;

pub use cors::*;
