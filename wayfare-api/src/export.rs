use axum::{extract::State, routing::get, Router};
use serde::Serialize;
use wayfare_catalog::views::{self, CitySummary};

use crate::outcome::Outcome;
use crate::reshape::HotelSummary;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/export/hotels", get(export_hotels))
        .route("/api/export/cities", get(export_cities))
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelExport {
    pub total: usize,
    pub captured_at: Option<chrono::DateTime<chrono::Utc>>,
    pub hotels: Vec<HotelSummary>,
}

/// Every listed hotel in the current snapshot.
async fn export_hotels(State(state): State<AppState>) -> Outcome<HotelExport> {
    match state.catalog.catalog_snapshot().await {
        Ok(snapshot) => {
            let hotels: Vec<HotelSummary> = snapshot
                .hotels
                .iter()
                .filter(|h| h.is_listed())
                .map(HotelSummary::from_catalog)
                .collect();
            Outcome::Success(HotelExport {
                total: hotels.len(),
                captured_at: Some(snapshot.captured_at),
                hotels,
            })
        }
        Err(e) => Outcome::empty_failure(e),
    }
}

async fn export_cities(State(state): State<AppState>) -> Outcome<Vec<CitySummary>> {
    match state.catalog.catalog_snapshot().await {
        Ok(snapshot) => Outcome::Success(views::city_summaries(&snapshot.hotels, None)),
        Err(e) => Outcome::empty_failure(e),
    }
}
