use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::outcome::Outcome;
use crate::reshape::Airport;
use crate::state::AppState;

const MAX_RESULTS: usize = 10;

/// (IATA, name, city, country) served when the vendor lookup fails.
const FALLBACK_AIRPORTS: &[(&str, &str, &str, &str)] = &[
    ("ATL", "Hartsfield-Jackson Atlanta International", "Atlanta", "US"),
    ("AMS", "Amsterdam Schiphol", "Amsterdam", "NL"),
    ("AUH", "Zayed International", "Abu Dhabi", "AE"),
    ("BKK", "Suvarnabhumi", "Bangkok", "TH"),
    ("BCN", "Josep Tarradellas Barcelona-El Prat", "Barcelona", "ES"),
    ("BOM", "Chhatrapati Shivaji Maharaj International", "Mumbai", "IN"),
    ("CDG", "Paris Charles de Gaulle", "Paris", "FR"),
    ("DEL", "Indira Gandhi International", "Delhi", "IN"),
    ("DOH", "Hamad International", "Doha", "QA"),
    ("DXB", "Dubai International", "Dubai", "AE"),
    ("FCO", "Leonardo da Vinci-Fiumicino", "Rome", "IT"),
    ("FRA", "Frankfurt am Main", "Frankfurt", "DE"),
    ("HKG", "Hong Kong International", "Hong Kong", "HK"),
    ("HND", "Tokyo Haneda", "Tokyo", "JP"),
    ("IST", "Istanbul", "Istanbul", "TR"),
    ("JFK", "John F. Kennedy International", "New York", "US"),
    ("LAX", "Los Angeles International", "Los Angeles", "US"),
    ("LGW", "London Gatwick", "London", "GB"),
    ("LHR", "London Heathrow", "London", "GB"),
    ("MAD", "Adolfo Suarez Madrid-Barajas", "Madrid", "ES"),
    ("MIA", "Miami International", "Miami", "US"),
    ("NRT", "Narita International", "Tokyo", "JP"),
    ("ORD", "O'Hare International", "Chicago", "US"),
    ("SFO", "San Francisco International", "San Francisco", "US"),
    ("SIN", "Singapore Changi", "Singapore", "SG"),
    ("SYD", "Sydney Kingsford Smith", "Sydney", "AU"),
    ("YYZ", "Toronto Pearson International", "Toronto", "CA"),
];

#[derive(Debug, Deserialize)]
pub struct AirportQuery {
    #[serde(default)]
    pub q: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/airports", get(search_airports))
}

/// Exact code matches first, then code/city/name substring matches.
pub fn fallback_airports(query: &str) -> Vec<Airport> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let (exact, partial): (Vec<_>, Vec<_>) = FALLBACK_AIRPORTS
        .iter()
        .filter(|(code, name, city, _)| {
            code.to_lowercase().contains(&needle)
                || city.to_lowercase().contains(&needle)
                || name.to_lowercase().contains(&needle)
        })
        .partition(|(code, ..)| code.eq_ignore_ascii_case(&needle));

    exact
        .into_iter()
        .chain(partial)
        .take(MAX_RESULTS)
        .map(|(code, name, city, country)| Airport {
            code: code.to_string(),
            name: name.to_string(),
            city: Some(city.to_string()),
            country: Some(country.to_string()),
        })
        .collect()
}

async fn search_airports(
    State(state): State<AppState>,
    Query(params): Query<AirportQuery>,
) -> Outcome<Vec<Airport>> {
    let query = params.q.trim();
    if query.is_empty() {
        return Outcome::Success(Vec::new());
    }

    match state.inventory.search_airports(query).await {
        Ok(items) => Outcome::Success(
            items
                .iter()
                .filter_map(Airport::from_vendor)
                .take(MAX_RESULTS)
                .collect(),
        ),
        Err(e) => Outcome::degraded(
            format!("Airport lookup failed: {}", e),
            fallback_airports(query),
        ),
    }
}
