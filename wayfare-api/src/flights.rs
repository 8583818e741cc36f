use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use chrono::NaiveDate;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wayfare_core::search::FlightSearchRequest;

use crate::outcome::Outcome;
use crate::reshape::FlightOffer;
use crate::state::AppState;

pub const MAX_PRICE_DATES: usize = 31;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/flight/search", post(search_flights))
        .route("/api/flight/date-prices", post(date_prices))
}

async fn search_flights(
    State(state): State<AppState>,
    body: Result<Json<FlightSearchRequest>, JsonRejection>,
) -> Outcome<Vec<FlightOffer>> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return Outcome::empty_failure(rejection.body_text()),
    };
    if let Err(e) = request.validate() {
        return Outcome::empty_failure(e);
    }

    match state.inventory.search_flights(&request).await {
        Ok(items) => {
            debug!(
                "Flight search {} -> {} on {}: {} offers",
                request.origin,
                request.destination,
                request.departure_date,
                items.len()
            );
            Outcome::Success(
                items
                    .iter()
                    .map(|v| FlightOffer::from_vendor(v, &request.cabin_class))
                    .collect(),
            )
        }
        Err(e) => Outcome::empty_failure(format!("Flight search failed: {}", e)),
    }
}

fn default_adults() -> u32 {
    1
}

fn default_cabin() -> String {
    "economy".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatePriceRequest {
    pub origin: String,
    pub destination: String,
    pub dates: Vec<NaiveDate>,
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default = "default_cabin")]
    pub cabin_class: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatePrice {
    pub date: NaiveDate,
    pub lowest_price: Option<f64>,
    pub currency: String,
    pub error: Option<String>,
}

/// One vendor search per date, all in flight at once. A failed date is
/// reported in its own row.
async fn date_prices(
    State(state): State<AppState>,
    body: Result<Json<DatePriceRequest>, JsonRejection>,
) -> Outcome<Vec<DatePrice>> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return Outcome::empty_failure(rejection.body_text()),
    };
    if request.dates.len() > MAX_PRICE_DATES {
        return Outcome::empty_failure(format!("at most {} dates per request", MAX_PRICE_DATES));
    }

    let lookups = request.dates.iter().map(|date| {
        let search = FlightSearchRequest {
            origin: request.origin.clone(),
            destination: request.destination.clone(),
            departure_date: *date,
            return_date: None,
            adults: request.adults,
            children: 0,
            infants: 0,
            cabin_class: request.cabin_class.clone(),
            currency: request.currency.clone(),
        };
        let state = state.clone();
        async move {
            if let Err(e) = search.validate() {
                return price_row(search.departure_date, &search.currency, Err(e.to_string()));
            }
            let result = state
                .inventory
                .search_flights(&search)
                .await
                .map_err(|e| e.to_string());
            if let Err(e) = &result {
                warn!("Date price lookup for {} failed: {}", search.departure_date, e);
            }
            price_row(search.departure_date, &search.currency, result.map(|items| {
                items
                    .iter()
                    .map(|v| FlightOffer::from_vendor(v, &search.cabin_class))
                    .collect()
            }))
        }
    });

    Outcome::Success(join_all(lookups).await)
}

fn price_row(
    date: NaiveDate,
    requested_currency: &str,
    offers: Result<Vec<FlightOffer>, String>,
) -> DatePrice {
    match offers {
        Ok(offers) => {
            let cheapest = offers
                .iter()
                .filter_map(|o| o.price.map(|p| (p, o.currency.clone())))
                .min_by(|a, b| a.0.total_cmp(&b.0));
            DatePrice {
                date,
                lowest_price: cheapest.as_ref().map(|(p, _)| *p),
                currency: cheapest
                    .and_then(|(_, c)| c)
                    .unwrap_or_else(|| requested_currency.to_string()),
                error: None,
            }
        }
        Err(error) => DatePrice {
            date,
            lowest_price: None,
            currency: requested_currency.to_string(),
            error: Some(error),
        },
    }
}
