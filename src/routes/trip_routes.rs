use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};

use crate::controllers::trip_controller::TripController;
use crate::dto::trip_dto::{CancelTripRequest, StartTripRequest, TripFilters, UpdateTripNotesRequest};
use crate::dto::ApiResponse;
use crate::models::{FinalizedTrip, TripView};
use crate::repositories::FleetStore;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_trip_router<S: FleetStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/", post(start_trip::<S>).get(list_trips::<S>))
        .route("/active", get(list_active_trips::<S>))
        .route("/:id", get(get_trip::<S>))
        .route("/:id/finalize", post(finalize_trip::<S>))
        .route("/:id/cancel", post(cancel_trip::<S>))
        .route("/:id/notes", patch(update_trip_notes::<S>))
}

fn controller<S: FleetStore>(state: &AppState<S>) -> TripController<S> {
    TripController::new(state.trips.clone())
}

async fn start_trip<S: FleetStore>(
    State(state): State<AppState<S>>,
    Json(request): Json<StartTripRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TripView>>), AppError> {
    let response = controller(&state).start(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_trips<S: FleetStore>(
    State(state): State<AppState<S>>,
    Query(filters): Query<TripFilters>,
) -> Result<Json<Vec<TripView>>, AppError> {
    let response = controller(&state).list(filters).await?;
    Ok(Json(response))
}

async fn list_active_trips<S: FleetStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<TripView>>, AppError> {
    let response = controller(&state).list_active().await?;
    Ok(Json(response))
}

async fn get_trip<S: FleetStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<i32>,
) -> Result<Json<TripView>, AppError> {
    let response = controller(&state).get_by_id(id).await?;
    Ok(Json(response))
}

async fn finalize_trip<S: FleetStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<FinalizedTrip>>, AppError> {
    let response = controller(&state).finalize(id).await?;
    Ok(Json(response))
}

// El cuerpo es opcional: sin motivo se conservan las notas existentes.
// Un cuerpo presente que no se puede interpretar rechaza la cancelación.
async fn cancel_trip<S: FleetStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<i32>,
    body: Bytes,
) -> Result<Json<ApiResponse<TripView>>, AppError> {
    let request = parse_cancel_request(&body)?;
    let response = controller(&state).cancel(id, request).await?;
    Ok(Json(response))
}

async fn update_trip_notes<S: FleetStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateTripNotesRequest>,
) -> Result<Json<ApiResponse<TripView>>, AppError> {
    let response = controller(&state).update_notes(id, request).await?;
    Ok(Json(response))
}

fn parse_cancel_request(body: &[u8]) -> Result<CancelTripRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CancelTripRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("invalid cancel request body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_means_no_reason() {
        assert_eq!(parse_cancel_request(b"").unwrap().reason, None);
        assert_eq!(parse_cancel_request(b"  \n").unwrap().reason, None);
        assert_eq!(parse_cancel_request(b"{}").unwrap().reason, None);
    }

    #[test]
    fn malformed_body_is_rejected() {
        assert!(matches!(
            parse_cancel_request(br#"{"reason": 42}"#),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            parse_cancel_request(b"reason=late"),
            Err(AppError::BadRequest(_))
        ));
        let parsed = parse_cancel_request(br#"{"reason": "Pneu furado"}"#).unwrap();
        assert_eq!(parsed.reason.as_deref(), Some("Pneu furado"));
    }
}
