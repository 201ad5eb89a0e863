use std::sync::Arc;
use validator::Validate;

use crate::dto::trip_dto::{
    clean_text, CancelTripRequest, StartTripRequest, TripFilters, UpdateTripNotesRequest,
};
use crate::dto::ApiResponse;
use crate::models::{FinalizedTrip, TripStatus, TripView};
use crate::repositories::FleetStore;
use crate::services::TripLifecycleService;
use crate::utils::errors::{AppError, AppResult};

pub struct TripController<S: FleetStore> {
    trips: Arc<TripLifecycleService<S>>,
}

impl<S: FleetStore> TripController<S> {
    pub fn new(trips: Arc<TripLifecycleService<S>>) -> Self {
        Self { trips }
    }

    pub async fn start(&self, request: StartTripRequest) -> AppResult<ApiResponse<TripView>> {
        request.validate()?;
        let trip = self.trips.start_trip(request.into()).await?;
        Ok(ApiResponse::success_with_message(trip, "Viaje iniciado"))
    }

    pub async fn finalize(&self, trip_id: i32) -> AppResult<ApiResponse<FinalizedTrip>> {
        let finalized = self.trips.finalize_trip(trip_id).await?;
        Ok(ApiResponse::success_with_message(finalized, "Viaje finalizado"))
    }

    pub async fn cancel(
        &self,
        trip_id: i32,
        request: CancelTripRequest,
    ) -> AppResult<ApiResponse<TripView>> {
        request.validate()?;
        let trip = self
            .trips
            .cancel_trip(trip_id, clean_text(request.reason))
            .await?;
        Ok(ApiResponse::success_with_message(trip, "Viaje cancelado"))
    }

    pub async fn update_notes(
        &self,
        trip_id: i32,
        request: UpdateTripNotesRequest,
    ) -> AppResult<ApiResponse<TripView>> {
        request.validate()?;
        let trip = self
            .trips
            .update_trip_notes(trip_id, clean_text(request.notes))
            .await?;
        Ok(ApiResponse::success(trip))
    }

    pub async fn list(&self, filters: TripFilters) -> AppResult<Vec<TripView>> {
        let status = match filters.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<TripStatus>().map_err(AppError::BadRequest)?),
        };
        self.trips.list_trips(status).await
    }

    pub async fn list_active(&self) -> AppResult<Vec<TripView>> {
        self.trips.list_active_trips().await
    }

    pub async fn get_by_id(&self, trip_id: i32) -> AppResult<TripView> {
        self.trips.get_trip(trip_id).await
    }
}
