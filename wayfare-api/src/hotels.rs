use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, warn};
use wayfare_catalog::views::{self, CitySummary};
use wayfare_catalog::{DataSource, ResolvedVia};
use wayfare_core::catalog::{CatalogEntry, HotelId};
use wayfare_core::search::{HotelSearchRequest, RoomOccupancy, SearchTarget};
use wayfare_core::supplier::SupplierError;
use wayfare_core::CoreError;

use crate::outcome::Outcome;
use crate::reshape::{HotelDetail, HotelSummary};
use crate::state::AppState;

pub const HOTEL_UNAVAILABLE: &str = "Hotel is no longer available";
pub const HOTEL_NOT_FOUND: &str = "Hotel not found";

const DEFAULT_NAME_LIMIT: usize = 20;
const DEFAULT_AVAILABLE_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/hotels/search", post(search_hotels))
        .route("/api/hotels/cities", get(cities))
        .route("/api/hotels/search-by-name", get(search_by_name))
        .route("/api/hotels/available", get(available))
        .route("/api/hotels/{id}", get(hotel_detail))
}

fn default_nationality() -> String {
    "US".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelSearchBody {
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    #[serde(default)]
    pub rooms: Vec<RoomOccupancy>,
    #[serde(default)]
    pub adults: Option<u32>,
    #[serde(default)]
    pub children: Option<u32>,
    #[serde(default)]
    pub child_ages: Vec<u32>,
    #[serde(default = "default_nationality", alias = "guestNationality")]
    pub nationality: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub city_id: Option<String>,
    #[serde(default)]
    pub hotel_ids: Vec<String>,
}

impl HotelSearchBody {
    /// `cityId` wins over `hotelIds`; a flat adults/children pair stands in
    /// for a single room when `rooms` is absent.
    pub fn into_request(self) -> Result<HotelSearchRequest, CoreError> {
        let target = match self.city_id.filter(|c| !c.trim().is_empty()) {
            Some(city) => SearchTarget::City(city),
            None if !self.hotel_ids.is_empty() => SearchTarget::Hotels(self.hotel_ids),
            None => {
                return Err(CoreError::ValidationError(
                    "either cityId or hotelIds is required".to_string(),
                ))
            }
        };

        let rooms = if self.rooms.is_empty() {
            vec![RoomOccupancy {
                adults: self.adults.unwrap_or(2),
                children: self.children.unwrap_or(self.child_ages.len() as u32),
                child_ages: self.child_ages,
            }]
        } else {
            self.rooms
        };

        let request = HotelSearchRequest {
            checkin: self.checkin,
            checkout: self.checkout,
            rooms,
            nationality: self.nationality,
            currency: self.currency,
            target,
        };
        request.validate()?;
        Ok(request)
    }
}

async fn search_hotels(
    State(state): State<AppState>,
    body: Result<Json<HotelSearchBody>, JsonRejection>,
) -> Outcome<Vec<HotelSummary>> {
    let request = match body.map_err(|r| r.body_text()).and_then(|Json(b)| {
        b.into_request().map_err(|e| e.to_string())
    }) {
        Ok(request) => request,
        Err(e) => return Outcome::empty_failure(e),
    };

    match state.inventory.search_hotels(&request).await {
        Ok(found) => {
            debug!(
                "Hotel search for {} nights returned {} of {} results",
                request.nights(),
                found.results.len(),
                found.count
            );
            Outcome::Success(found.results.iter().map(HotelSummary::from_vendor).collect())
        }
        Err(e) => Outcome::empty_failure(format!("Hotel search failed: {}", e)),
    }
}

/// Memo first, then the vendor detail endpoint, then the catalog
/// heuristics. A vendor deactivation stops the chain.
async fn hotel_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Outcome<Option<HotelDetail>> {
    if let Some(entry) = state.catalog.cached(&id) {
        debug!("Hotel {} served from memo ({:?})", id, entry.source);
        return Outcome::Success(Some(HotelDetail::from_entry(&entry.hotel, entry.source)));
    }

    match state.inventory.hotel_detail(&id).await {
        Ok(raw) => match serde_json::from_value::<CatalogEntry>(raw) {
            Ok(mut entry) => {
                if entry.id == HotelId::default() {
                    entry.id = HotelId::text(id.as_str());
                }
                state.catalog.remember(&id, entry.clone(), DataSource::Detail);
                return Outcome::Success(Some(HotelDetail::from_entry(&entry, DataSource::Detail)));
            }
            Err(e) => warn!("Hotel {} detail did not decode, trying catalog: {}", id, e),
        },
        Err(SupplierError::HotelUnavailable(_)) => {
            info!("Hotel {} is deactivated at the vendor", id);
            return Outcome::degraded(HOTEL_UNAVAILABLE, None);
        }
        Err(e) => warn!("Hotel {} detail lookup failed, trying catalog: {}", id, e),
    }

    match state.catalog.resolve_in_catalog(&id).await {
        Ok(Some(found)) => {
            if let ResolvedVia::Rule(rule) = found.via {
                debug!("Hotel {} resolved from catalog by {:?} match", id, rule);
            }
            Outcome::Success(Some(HotelDetail::from_entry(&found.hotel, found.source)))
        }
        Ok(None) => Outcome::degraded(HOTEL_NOT_FOUND, None),
        Err(e) => Outcome::degraded(e, None),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub search: Option<String>,
    pub city: Option<String>,
    pub limit: Option<usize>,
}

fn clamp_limit(requested: Option<usize>, default: usize) -> usize {
    requested.unwrap_or(default).clamp(1, MAX_LIMIT)
}

async fn cities(
    State(state): State<AppState>,
    Query(params): Query<ListingQuery>,
) -> Outcome<Vec<CitySummary>> {
    match state.catalog.catalog_snapshot().await {
        Ok(snapshot) => {
            Outcome::Success(views::city_summaries(&snapshot.hotels, params.search.as_deref()))
        }
        Err(e) => Outcome::empty_failure(e),
    }
}

async fn search_by_name(
    State(state): State<AppState>,
    Query(params): Query<ListingQuery>,
) -> Outcome<Vec<HotelSummary>> {
    let term = params.search.unwrap_or_default();
    if term.trim().is_empty() {
        return Outcome::Success(Vec::new());
    }
    match state.catalog.catalog_snapshot().await {
        Ok(snapshot) => {
            let limit = clamp_limit(params.limit, DEFAULT_NAME_LIMIT);
            Outcome::Success(
                views::search_by_name(&snapshot.hotels, &term, limit)
                    .into_iter()
                    .map(HotelSummary::from_catalog)
                    .collect(),
            )
        }
        Err(e) => Outcome::empty_failure(e),
    }
}

async fn available(
    State(state): State<AppState>,
    Query(params): Query<ListingQuery>,
) -> Outcome<Vec<HotelSummary>> {
    match state.catalog.catalog_snapshot().await {
        Ok(snapshot) => Outcome::Success(
            views::available_hotels(
                &snapshot.hotels,
                params.city.as_deref(),
                clamp_limit(params.limit, DEFAULT_AVAILABLE_LIMIT),
            )
            .into_iter()
            .map(HotelSummary::from_catalog)
            .collect(),
        ),
        Err(e) => Outcome::empty_failure(e),
    }
}
