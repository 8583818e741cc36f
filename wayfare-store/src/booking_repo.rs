use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use wayfare_core::booking::{FlightBooking, HotelBooking};
use wayfare_core::repository::BookingRepository;
use wayfare_core::{CoreError, CoreResult};

use crate::database::map_db_error;

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct HotelBookingRow {
    id: Uuid,
    booking_reference: String,
    user_id: String,
    hotel_id: String,
    hotel_name: Option<String>,
    check_in: NaiveDate,
    check_out: NaiveDate,
    rooms: i32,
    adults: i32,
    children: i32,
    guest_name: Option<String>,
    guest_email: Option<String>,
    special_requests: Option<String>,
    total_price: String,
    currency: String,
    status: String,
    payment_status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<HotelBookingRow> for HotelBooking {
    type Error = CoreError;

    fn try_from(row: HotelBookingRow) -> Result<Self, Self::Error> {
        Ok(HotelBooking {
            id: row.id,
            booking_reference: row.booking_reference,
            user_id: row.user_id,
            hotel_id: row.hotel_id,
            hotel_name: row.hotel_name,
            check_in: row.check_in,
            check_out: row.check_out,
            rooms: row.rooms,
            adults: row.adults,
            children: row.children,
            guest_name: row.guest_name,
            guest_email: row.guest_email,
            special_requests: row.special_requests,
            total_price: row.total_price,
            currency: row.currency,
            status: row.status.parse()?,
            payment_status: row.payment_status.parse()?,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct FlightBookingRow {
    id: Uuid,
    booking_reference: String,
    user_id: String,
    offer_id: Option<String>,
    airline: Option<String>,
    flight_number: Option<String>,
    origin: String,
    destination: String,
    departure_date: NaiveDate,
    return_date: Option<NaiveDate>,
    passengers: i32,
    cabin_class: String,
    total_price: String,
    currency: String,
    status: String,
    payment_status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<FlightBookingRow> for FlightBooking {
    type Error = CoreError;

    fn try_from(row: FlightBookingRow) -> Result<Self, Self::Error> {
        Ok(FlightBooking {
            id: row.id,
            booking_reference: row.booking_reference,
            user_id: row.user_id,
            offer_id: row.offer_id,
            airline: row.airline,
            flight_number: row.flight_number,
            origin: row.origin,
            destination: row.destination,
            departure_date: row.departure_date,
            return_date: row.return_date,
            passengers: row.passengers,
            cabin_class: row.cabin_class,
            total_price: row.total_price,
            currency: row.currency,
            status: row.status.parse()?,
            payment_status: row.payment_status.parse()?,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn insert_hotel_booking(&self, booking: &HotelBooking) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO hotel_bookings (
                id, booking_reference, user_id, hotel_id, hotel_name, check_in, check_out,
                rooms, adults, children, guest_name, guest_email, special_requests,
                total_price, currency, status, payment_status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.booking_reference)
        .bind(&booking.user_id)
        .bind(&booking.hotel_id)
        .bind(&booking.hotel_name)
        .bind(booking.check_in)
        .bind(booking.check_out)
        .bind(booking.rooms)
        .bind(booking.adults)
        .bind(booking.children)
        .bind(&booking.guest_name)
        .bind(&booking.guest_email)
        .bind(&booking.special_requests)
        .bind(&booking.total_price)
        .bind(&booking.currency)
        .bind(booking.status.to_string())
        .bind(booking.payment_status.to_string())
        .bind(booking.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn list_hotel_bookings(&self, user_id: &str) -> CoreResult<Vec<HotelBooking>> {
        let rows: Vec<HotelBookingRow> = sqlx::query_as(
            r#"
            SELECT id, booking_reference, user_id, hotel_id, hotel_name, check_in, check_out,
                   rooms, adults, children, guest_name, guest_email, special_requests,
                   total_price, currency, status, payment_status, created_at
            FROM hotel_bookings
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.into_iter().map(HotelBooking::try_from).collect()
    }

    async fn insert_flight_booking(&self, booking: &FlightBooking) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO flight_bookings (
                id, booking_reference, user_id, offer_id, airline, flight_number, origin,
                destination, departure_date, return_date, passengers, cabin_class,
                total_price, currency, status, payment_status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.booking_reference)
        .bind(&booking.user_id)
        .bind(&booking.offer_id)
        .bind(&booking.airline)
        .bind(&booking.flight_number)
        .bind(&booking.origin)
        .bind(&booking.destination)
        .bind(booking.departure_date)
        .bind(booking.return_date)
        .bind(booking.passengers)
        .bind(&booking.cabin_class)
        .bind(&booking.total_price)
        .bind(&booking.currency)
        .bind(booking.status.to_string())
        .bind(booking.payment_status.to_string())
        .bind(booking.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn list_flight_bookings(&self, user_id: &str) -> CoreResult<Vec<FlightBooking>> {
        let rows: Vec<FlightBookingRow> = sqlx::query_as(
            r#"
            SELECT id, booking_reference, user_id, offer_id, airline, flight_number, origin,
                   destination, departure_date, return_date, passengers, cabin_class,
                   total_price, currency, status, payment_status, created_at
            FROM flight_bookings
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.into_iter().map(FlightBooking::try_from).collect()
    }
}
