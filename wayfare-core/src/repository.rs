use async_trait::async_trait;

use crate::booking::{FlightBooking, HotelBooking};
use crate::identity::{Account, Session, User};
use crate::CoreResult;

/// Booking persistence. Inserts are single statements; a duplicate
/// `booking_reference` comes back as [`crate::CoreError::Conflict`].
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert_hotel_booking(&self, booking: &HotelBooking) -> CoreResult<()>;

    async fn list_hotel_bookings(&self, user_id: &str) -> CoreResult<Vec<HotelBooking>>;

    async fn insert_flight_booking(&self, booking: &FlightBooking) -> CoreResult<()>;

    async fn list_flight_bookings(&self, user_id: &str) -> CoreResult<Vec<FlightBooking>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: &User) -> CoreResult<()>;

    async fn get_user(&self, id: &str) -> CoreResult<Option<User>>;

    async fn create_session(&self, session: &Session) -> CoreResult<()>;

    async fn get_session(&self, session_token: &str) -> CoreResult<Option<Session>>;

    async fn list_accounts(&self, user_id: &str) -> CoreResult<Vec<Account>>;
}
