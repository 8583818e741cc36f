//! Vendor JSON to the response shapes the front end reads.
//!
//! Vendor payloads abbreviate and move fields around between endpoints, so
//! every field is looked up through a short list of JSON pointers and the
//! first scalar hit wins.

use serde::Serialize;
use serde_json::Value;
use wayfare_catalog::attractions::{nearby_attractions, strip_markup};
use wayfare_catalog::DataSource;
use wayfare_core::catalog::{CatalogEntry, GeoLocation};

const NEARBY_LIMIT: usize = 5;

fn pick_str(value: &Value, pointers: &[&str]) -> Option<String> {
    pointers.iter().filter_map(|p| value.pointer(p)).find_map(|v| match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn pick_f64(value: &Value, pointers: &[&str]) -> Option<f64> {
    pointers.iter().filter_map(|p| value.pointer(p)).find_map(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelSummary {
    pub id: String,
    pub name: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub rating: Option<f64>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub image: Option<String>,
    pub address: Option<String>,
}

impl HotelSummary {
    pub fn from_vendor(v: &Value) -> Self {
        Self {
            id: pick_str(v, &["/hotelId", "/id", "/code"]).unwrap_or_default(),
            name: pick_str(v, &["/name", "/hotelName"]).unwrap_or_default(),
            city: pick_str(v, &["/city", "/cityName", "/address/city/name", "/address/city"]),
            country: pick_str(
                v,
                &["/country", "/countryCode", "/address/country/code", "/address/country"],
            ),
            rating: pick_f64(v, &["/rating", "/stars", "/starRating", "/category"]),
            price: pick_f64(
                v,
                &[
                    "/price",
                    "/minRate",
                    "/lowestPrice",
                    "/offerRetailRate/amount",
                    "/rates/0/total",
                    "/rates/0/price",
                ],
            ),
            currency: pick_str(v, &["/currency", "/offerRetailRate/currency", "/rates/0/currency"]),
            image: pick_str(
                v,
                &["/image", "/thumbnail", "/mainPhoto", "/images/0/url", "/images/0"],
            ),
            address: pick_str(v, &["/address/line1", "/address/line", "/address"]),
        }
    }

    pub fn from_catalog(entry: &CatalogEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            name: entry.name.clone(),
            city: entry.city_name().map(str::to_string),
            country: entry
                .country_code()
                .or_else(|| entry.country_name())
                .map(str::to_string),
            rating: entry.star_rating.map(f64::from),
            price: None,
            currency: None,
            image: entry.primary_image().map(str::to_string),
            address: entry.address.line1.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailAddress {
    pub line1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelDetail {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub address: DetailAddress,
    pub location: GeoLocation,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub facilities: Vec<String>,
    pub images: Vec<String>,
    pub nearby_attractions: Vec<String>,
    pub source: DataSource,
}

impl HotelDetail {
    pub fn from_entry(entry: &CatalogEntry, source: DataSource) -> Self {
        let description = entry.description.as_deref().map(strip_markup);
        let nearby = entry
            .description
            .as_deref()
            .map(|d| nearby_attractions(d, NEARBY_LIMIT))
            .unwrap_or_default();

        Self {
            id: entry.id.to_string(),
            name: entry.name.clone(),
            description: description.filter(|d| !d.is_empty()),
            rating: entry.star_rating.map(f64::from),
            address: DetailAddress {
                line1: entry.address.line1.clone(),
                city: entry.city_name().map(str::to_string),
                state: entry.address.state.name.clone(),
                country: entry.country_name().map(str::to_string),
                country_code: entry.country_code().map(str::to_string),
                postal_code: entry.address.postal_code.clone(),
            },
            location: entry.location.clone(),
            phone: entry.contact.phone.clone(),
            email: entry.contact.email.clone(),
            website: entry.contact.website.clone(),
            facilities: entry.facilities.clone(),
            images: entry.images.iter().map(|i| i.url.clone()).collect(),
            nearby_attractions: nearby,
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOffer {
    pub id: String,
    pub airline: Option<String>,
    pub flight_number: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    pub duration: Option<String>,
    pub stops: u64,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub cabin_class: String,
}

impl FlightOffer {
    pub fn from_vendor(v: &Value, requested_cabin: &str) -> Self {
        let segments = v.get("segments").and_then(Value::as_array);
        let stops = v
            .get("stops")
            .and_then(Value::as_u64)
            .or_else(|| segments.map(|s| s.len().saturating_sub(1) as u64))
            .unwrap_or(0);
        let last_segment = segments.and_then(|s| s.last());

        Self {
            id: pick_str(v, &["/id", "/offerId"]).unwrap_or_default(),
            airline: pick_str(
                v,
                &["/airline", "/carrier", "/validatingAirline", "/segments/0/airline"],
            ),
            flight_number: pick_str(v, &["/flightNumber", "/segments/0/flightNumber"]),
            origin: pick_str(v, &["/origin", "/from", "/segments/0/origin"]),
            destination: pick_str(v, &["/destination", "/to"])
                .or_else(|| last_segment.and_then(|s| pick_str(s, &["/destination"]))),
            departure_time: pick_str(
                v,
                &["/departureTime", "/departure", "/segments/0/departureTime"],
            ),
            arrival_time: pick_str(v, &["/arrivalTime", "/arrival"])
                .or_else(|| last_segment.and_then(|s| pick_str(s, &["/arrivalTime"]))),
            duration: pick_str(v, &["/duration", "/totalDuration"]),
            stops,
            price: pick_f64(v, &["/price/total", "/price/amount", "/price", "/totalPrice"]),
            currency: pick_str(v, &["/currency", "/price/currency"]),
            cabin_class: pick_str(v, &["/cabinClass", "/cabin"])
                .unwrap_or_else(|| requested_cabin.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Airport {
    pub code: String,
    pub name: String,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl Airport {
    pub fn from_vendor(v: &Value) -> Option<Self> {
        let code = pick_str(v, &["/code", "/iata", "/iataCode"])?;
        Some(Self {
            name: pick_str(v, &["/name"]).unwrap_or_else(|| code.clone()),
            code,
            city: pick_str(v, &["/city", "/cityName"]),
            country: pick_str(v, &["/country", "/countryCode"]),
        })
    }
}
