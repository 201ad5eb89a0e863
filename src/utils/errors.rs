//! Sistema de manejo de errores
//!
//! Este módulo define los errores tipados del ciclo de vida de viajes
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::{TripStatus, VehicleStatus};

/// Familia de error; determina la severidad HTTP equivalente
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    /// La entidad no está en el estado requerido; reintentar sin releer no sirve
    StateConflict,
    Validation,
    ResourceExhaustion,
}

impl ErrorKind {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::StateConflict => StatusCode::CONFLICT,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::ResourceExhaustion => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

/// Fallos de dominio del orquestador de viajes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TripError {
    #[error("Vehicle {0} not found")]
    VehicleNotFound(i32),

    #[error("Vehicle {id} is not available (status: {status})")]
    VehicleUnavailable { id: i32, status: VehicleStatus },

    #[error("Driver '{0}' not found")]
    DriverNotFound(String),

    #[error("Driver '{0}' is not available for assignment")]
    DriverUnavailable(String),

    #[error("No eligible driver is available")]
    NoDriverAvailable,

    #[error("City {0} not found")]
    CityNotFound(i32),

    #[error("Origin and destination must differ (city {0})")]
    InvalidRoute(i32),

    #[error("At least two cities are required to pick a route ({available} available)")]
    InsufficientReferenceData { available: usize },

    #[error("Trip {0} not found")]
    TripNotFound(i32),

    #[error("Trip {id} is not in progress (status: {status})")]
    TripNotInProgress { id: i32, status: TripStatus },

    #[error("Trip {id} is already {status}")]
    TripAlreadyTerminal { id: i32, status: TripStatus },
}

impl TripError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TripError::VehicleNotFound(_)
            | TripError::DriverNotFound(_)
            | TripError::CityNotFound(_)
            | TripError::TripNotFound(_) => ErrorKind::NotFound,
            TripError::VehicleUnavailable { .. }
            | TripError::DriverUnavailable(_)
            | TripError::TripNotInProgress { .. }
            | TripError::TripAlreadyTerminal { .. } => ErrorKind::StateConflict,
            TripError::InvalidRoute(_) => ErrorKind::Validation,
            TripError::NoDriverAvailable | TripError::InsufficientReferenceData { .. } => {
                ErrorKind::ResourceExhaustion
            }
        }
    }

    /// Código estable expuesto a los clientes
    pub fn code(&self) -> &'static str {
        match self {
            TripError::VehicleNotFound(_) => "VEHICLE_NOT_FOUND",
            TripError::VehicleUnavailable { .. } => "VEHICLE_UNAVAILABLE",
            TripError::DriverNotFound(_) => "DRIVER_NOT_FOUND",
            TripError::DriverUnavailable(_) => "DRIVER_UNAVAILABLE",
            TripError::NoDriverAvailable => "NO_DRIVER_AVAILABLE",
            TripError::CityNotFound(_) => "CITY_NOT_FOUND",
            TripError::InvalidRoute(_) => "INVALID_ROUTE",
            TripError::InsufficientReferenceData { .. } => "INSUFFICIENT_REFERENCE_DATA",
            TripError::TripNotFound(_) => "TRIP_NOT_FOUND",
            TripError::TripNotInProgress { .. } => "TRIP_NOT_IN_PROGRESS",
            TripError::TripAlreadyTerminal { .. } => "TRIP_ALREADY_TERMINAL",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }
}

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Trip(#[from] TripError),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Timeout de lock, deadlock o pool agotado; la transacción ya fue revertida
    #[error("Retryable store failure: {0}")]
    Retryable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Retryable(_))
    }

    /// Acceso directo al error de dominio, útil en tests y logs
    pub fn as_trip_error(&self) -> Option<&TripError> {
        match self {
            AppError::Trip(e) => Some(e),
            _ => None,
        }
    }
}

/// SQLSTATEs que indican que la transacción fue abortada por el gestor de locks
const RETRYABLE_SQLSTATES: &[&str] = &[
    "55P03", // lock_not_available (lock_timeout)
    "57014", // query_canceled (statement_timeout)
    "40P01", // deadlock_detected
    "40001", // serialization_failure
];

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        let code = match &e {
            sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
            _ => None,
        };

        match (e, code) {
            (sqlx::Error::PoolTimedOut, _) => {
                AppError::Retryable("timed out waiting for a database connection".to_string())
            }
            (e, Some(code)) if RETRYABLE_SQLSTATES.contains(&code.as_str()) => {
                AppError::Retryable(e.to_string())
            }
            (sqlx::Error::Database(db), Some(code)) if code == "23505" => {
                AppError::Conflict(db.message().to_string())
            }
            (e, _) => AppError::Database(e),
        }
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Trip(e) => {
                tracing::info!("Trip operation rejected: {}", e);
                (
                    e.status_code(),
                    ErrorResponse {
                        error: e.status_code()
                            .canonical_reason()
                            .unwrap_or("Error")
                            .to_string(),
                        message: e.to_string(),
                        details: None,
                        code: e.code().to_string(),
                    },
                )
            }

            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Database Error".to_string(),
                        message: "An error occurred while accessing the database".to_string(),
                        details: None,
                        code: "DB_ERROR".to_string(),
                    },
                )
            }

            AppError::Validation(e) => {
                tracing::info!("Validation error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Validation Error".to_string(),
                        message: "The provided data is invalid".to_string(),
                        details: Some(json!(e)),
                        code: "VALIDATION_ERROR".to_string(),
                    },
                )
            }

            AppError::Retryable(msg) => {
                tracing::warn!("Retryable store failure: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse {
                        error: "Service Unavailable".to_string(),
                        message: "The operation was rolled back and can be retried".to_string(),
                        details: Some(json!({ "retryable": true })),
                        code: "RETRYABLE".to_string(),
                    },
                )
            }

            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: "Not Found".to_string(),
                    message: msg,
                    details: None,
                    code: "NOT_FOUND".to_string(),
                },
            ),

            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: "Conflict".to_string(),
                    message: msg,
                    details: None,
                    code: "CONFLICT".to_string(),
                },
            ),

            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Bad Request".to_string(),
                    message: msg,
                    details: None,
                    code: "BAD_REQUEST".to_string(),
                },
            ),

            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal Server Error".to_string(),
                        message: "An unexpected error occurred".to_string(),
                        details: None,
                        code: "INTERNAL_ERROR".to_string(),
                    },
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de validación
pub fn validation_error(field: &'static str, message: &'static str) -> AppError {
    use validator::ValidationError;

    let mut error = ValidationError::new("custom");
    error.add_param("message".into(), &message);

    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);

    AppError::Validation(errors)
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de conflicto
pub fn conflict_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::Conflict(format!("{} with {} '{}' already exists", resource, field, value))
}
