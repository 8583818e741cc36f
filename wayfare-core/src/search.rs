use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomOccupancy {
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub child_ages: Vec<u32>,
}

/// A search is scoped either to a city or to an explicit set of hotels.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchTarget {
    City(String),
    Hotels(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HotelSearchRequest {
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    pub rooms: Vec<RoomOccupancy>,
    pub nationality: String,
    pub currency: String,
    pub target: SearchTarget,
}

impl HotelSearchRequest {
    pub fn validate(&self) -> CoreResult<()> {
        if self.checkout <= self.checkin {
            return Err(CoreError::ValidationError(
                "checkout must be after checkin".to_string(),
            ));
        }
        if self.rooms.is_empty() {
            return Err(CoreError::ValidationError("at least one room is required".to_string()));
        }
        for (idx, room) in self.rooms.iter().enumerate() {
            if room.adults == 0 {
                return Err(CoreError::ValidationError(format!(
                    "room {} needs at least one adult",
                    idx + 1
                )));
            }
            if room.child_ages.len() != room.children as usize {
                return Err(CoreError::ValidationError(format!(
                    "room {} lists {} child ages for {} children",
                    idx + 1,
                    room.child_ages.len(),
                    room.children
                )));
            }
        }
        match &self.target {
            SearchTarget::City(id) if id.trim().is_empty() => {
                Err(CoreError::ValidationError("cityId must not be empty".to_string()))
            }
            SearchTarget::Hotels(ids) if ids.is_empty() => {
                Err(CoreError::ValidationError("hotelIds must not be empty".to_string()))
            }
            _ => Ok(()),
        }
    }

    pub fn nights(&self) -> i64 {
        (self.checkout - self.checkin).num_days()
    }
}

/// Raw vendor search output. Individual results stay untyped; the API layer
/// reshapes them.
#[derive(Debug, Clone, Default)]
pub struct HotelSearchResults {
    pub results: Vec<Value>,
    pub count: usize,
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSearchRequest {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants: u32,
    #[serde(default = "default_cabin")]
    pub cabin_class: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl FlightSearchRequest {
    pub fn validate(&self) -> CoreResult<()> {
        if self.origin.trim().is_empty() || self.destination.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "origin and destination are required".to_string(),
            ));
        }
        if self.origin.eq_ignore_ascii_case(&self.destination) {
            return Err(CoreError::ValidationError(
                "origin and destination must differ".to_string(),
            ));
        }
        if self.adults == 0 {
            return Err(CoreError::ValidationError("at least one adult is required".to_string()));
        }
        if let Some(ret) = self.return_date {
            if ret < self.departure_date {
                return Err(CoreError::ValidationError(
                    "returnDate must not precede departureDate".to_string(),
                ));
            }
        }
        Ok(())
    }
}
