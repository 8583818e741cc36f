use axum::{
    extract::{rejection::JsonRejection, State},
    middleware,
    routing::get,
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;
use wayfare_core::booking::{
    BookingKind, BookingStatus, FlightBooking, HotelBooking, PaymentStatus,
};
use wayfare_core::CoreError;
use wayfare_shared::Masked;

use crate::auth::{require_customer, CustomerClaims};
use crate::error::AppError;
use crate::state::AppState;

/// Fresh references tried before a duplicate-key error is given up on.
pub const REFERENCE_ATTEMPTS: usize = 5;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/bookings/hotels", get(list_hotel_bookings).post(create_hotel_booking))
        .route("/api/bookings/flights", get(list_flight_bookings).post(create_flight_booking))
        .route_layer(middleware::from_fn_with_state(state, require_customer))
}

// Prices arrive as 412.5 or "412.50"; either way they are stored as text.
fn price_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn non_blank(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

fn require_fields(missing: Vec<&str>) -> Result<(), AppError> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationError(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(b)| b)
        .map_err(|r| AppError::ValidationError(r.body_text()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHotelBooking {
    pub hotel_id: Option<String>,
    pub hotel_name: Option<String>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub rooms: Option<i32>,
    pub adults: Option<i32>,
    pub children: Option<i32>,
    pub guest_name: Option<String>,
    pub guest_email: Option<Masked<String>>,
    pub special_requests: Option<String>,
    #[serde(default, deserialize_with = "price_text")]
    pub total_price: Option<String>,
    pub currency: Option<String>,
}

impl NewHotelBooking {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !non_blank(&self.hotel_id) {
            missing.push("hotelId");
        }
        if self.check_in.is_none() {
            missing.push("checkIn");
        }
        if self.check_out.is_none() {
            missing.push("checkOut");
        }
        if self.total_price.is_none() {
            missing.push("totalPrice");
        }
        missing
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFlightBooking {
    pub offer_id: Option<String>,
    pub airline: Option<String>,
    pub flight_number: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub departure_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub passengers: Option<i32>,
    pub cabin_class: Option<String>,
    #[serde(default, deserialize_with = "price_text")]
    pub total_price: Option<String>,
    pub currency: Option<String>,
}

impl NewFlightBooking {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !non_blank(&self.origin) {
            missing.push("origin");
        }
        if !non_blank(&self.destination) {
            missing.push("destination");
        }
        if self.departure_date.is_none() {
            missing.push("departureDate");
        }
        if self.total_price.is_none() {
            missing.push("totalPrice");
        }
        missing
    }
}

async fn create_hotel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    body: Result<Json<NewHotelBooking>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let input = json_body(body)?;
    require_fields(input.missing_fields())?;

    let (Some(hotel_id), Some(check_in), Some(check_out), Some(total_price)) =
        (input.hotel_id, input.check_in, input.check_out, input.total_price)
    else {
        return Err(AppError::ValidationError("Missing required fields".to_string()));
    };
    if check_out <= check_in {
        return Err(AppError::ValidationError("checkOut must be after checkIn".to_string()));
    }

    let guest_email = input.guest_email;
    let mut booking = HotelBooking {
        id: Uuid::new_v4(),
        booking_reference: String::new(),
        user_id: claims.sub.clone(),
        hotel_id: hotel_id.trim().to_string(),
        hotel_name: input.hotel_name,
        check_in,
        check_out,
        rooms: input.rooms.unwrap_or(1).max(1),
        adults: input.adults.unwrap_or(1).max(1),
        children: input.children.unwrap_or(0).max(0),
        guest_name: input.guest_name,
        guest_email: guest_email.clone().map(Masked::into_inner),
        special_requests: input.special_requests,
        total_price,
        currency: input.currency.unwrap_or_else(|| "USD".to_string()),
        status: BookingStatus::default(),
        payment_status: PaymentStatus::default(),
        created_at: state.clock.now(),
    };

    for attempt in 1..=REFERENCE_ATTEMPTS {
        booking.booking_reference = BookingKind::Hotel.generate_reference();
        match state.booking_repo.insert_hotel_booking(&booking).await {
            Ok(()) => {
                info!(
                    reference = %booking.booking_reference,
                    user = %booking.user_id,
                    guest_email = ?guest_email,
                    "Hotel booking created"
                );
                return Ok(Json(json!({ "success": true, "booking": booking })));
            }
            Err(CoreError::Conflict(msg)) => {
                warn!("Booking reference collision on attempt {}: {}", attempt, msg);
            }
            Err(e) => return Err(AppError::InternalServerError(e.to_string())),
        }
    }

    Err(AppError::InternalServerError(
        "could not allocate a unique booking reference".to_string(),
    ))
}

async fn list_hotel_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Result<Json<Value>, AppError> {
    let bookings = state
        .booking_repo
        .list_hotel_bookings(&claims.sub)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    Ok(Json(json!({ "success": true, "bookings": bookings })))
}

async fn create_flight_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    body: Result<Json<NewFlightBooking>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let input = json_body(body)?;
    require_fields(input.missing_fields())?;

    let (Some(origin), Some(destination), Some(departure_date), Some(total_price)) =
        (input.origin, input.destination, input.departure_date, input.total_price)
    else {
        return Err(AppError::ValidationError("Missing required fields".to_string()));
    };
    if input.return_date.is_some_and(|r| r < departure_date) {
        return Err(AppError::ValidationError(
            "returnDate must not precede departureDate".to_string(),
        ));
    }

    let mut booking = FlightBooking {
        id: Uuid::new_v4(),
        booking_reference: String::new(),
        user_id: claims.sub.clone(),
        offer_id: input.offer_id,
        airline: input.airline,
        flight_number: input.flight_number,
        origin: origin.trim().to_uppercase(),
        destination: destination.trim().to_uppercase(),
        departure_date,
        return_date: input.return_date,
        passengers: input.passengers.unwrap_or(1).max(1),
        cabin_class: input.cabin_class.unwrap_or_else(|| "economy".to_string()),
        total_price,
        currency: input.currency.unwrap_or_else(|| "USD".to_string()),
        status: BookingStatus::default(),
        payment_status: PaymentStatus::default(),
        created_at: state.clock.now(),
    };

    for attempt in 1..=REFERENCE_ATTEMPTS {
        booking.booking_reference = BookingKind::Flight.generate_reference();
        match state.booking_repo.insert_flight_booking(&booking).await {
            Ok(()) => {
                info!(
                    reference = %booking.booking_reference,
                    user = %booking.user_id,
                    "Flight booking created"
                );
                return Ok(Json(json!({ "success": true, "booking": booking })));
            }
            Err(CoreError::Conflict(msg)) => {
                warn!("Booking reference collision on attempt {}: {}", attempt, msg);
            }
            Err(e) => return Err(AppError::InternalServerError(e.to_string())),
        }
    }

    Err(AppError::InternalServerError(
        "could not allocate a unique booking reference".to_string(),
    ))
}

async fn list_flight_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Result<Json<Value>, AppError> {
    let bookings = state
        .booking_repo
        .list_flight_bookings(&claims.sub)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    Ok(Json(json!({ "success": true, "bookings": bookings })))
}
