use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, NaiveDate, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use wayfare_api::{app, AppState, AuthConfig};
use wayfare_catalog::{CacheSettings, CatalogCache, DataSource};
use wayfare_core::booking::{BookingKind, FlightBooking, HotelBooking};
use wayfare_core::catalog::{Address, CatalogEntry, CatalogPage, HotelId, NamedCode};
use wayfare_core::clock::SystemClock;
use wayfare_core::identity::{Account, Session, User};
use wayfare_core::repository::{BookingRepository, UserRepository};
use wayfare_core::search::{FlightSearchRequest, HotelSearchRequest, HotelSearchResults};
use wayfare_core::supplier::{InventoryProvider, SupplierError};
use wayfare_core::{CoreError, CoreResult};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeInventory {
    catalog: Vec<CatalogEntry>,
    catalog_down: bool,
    details: HashMap<String, Result<Value, SupplierError>>,
    flights: HashMap<NaiveDate, Result<Vec<Value>, SupplierError>>,
    airports_down: bool,
    catalog_calls: AtomicUsize,
}

#[async_trait]
impl InventoryProvider for FakeInventory {
    async fn search_hotels(
        &self,
        _request: &HotelSearchRequest,
    ) -> Result<HotelSearchResults, SupplierError> {
        Ok(HotelSearchResults {
            results: vec![json!({ "hotelId": "lp-aa", "hotelName": "Creek Palace", "price": 120 })],
            count: 1,
        })
    }

    async fn hotel_detail(&self, hotel_id: &str) -> Result<Value, SupplierError> {
        self.details
            .get(hotel_id)
            .cloned()
            .unwrap_or_else(|| Err(SupplierError::Transport("connection refused".to_string())))
    }

    async fn catalog_page(&self, _token: Option<&str>) -> Result<CatalogPage, SupplierError> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        if self.catalog_down {
            return Err(SupplierError::Http { status: 502, body: Value::Null });
        }
        Ok(CatalogPage { hotels: self.catalog.clone(), next_token: None })
    }

    async fn search_flights(
        &self,
        request: &FlightSearchRequest,
    ) -> Result<Vec<Value>, SupplierError> {
        self.flights
            .get(&request.departure_date)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn search_airports(&self, query: &str) -> Result<Vec<Value>, SupplierError> {
        if self.airports_down {
            return Err(SupplierError::Transport("timeout".to_string()));
        }
        Ok(vec![json!({ "iataCode": query.to_uppercase(), "name": "Vendor Airport" })])
    }
}

#[derive(Default)]
struct InMemoryBookings {
    hotels: Mutex<Vec<HotelBooking>>,
    flights: Mutex<Vec<FlightBooking>>,
    calls: AtomicUsize,
    collisions_left: AtomicUsize,
    broken: bool,
}

impl InMemoryBookings {
    fn check(&self) -> CoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return Err(CoreError::InternalError("connection reset".to_string()));
        }
        let left = self.collisions_left.load(Ordering::SeqCst);
        if left > 0 {
            self.collisions_left.store(left - 1, Ordering::SeqCst);
            return Err(CoreError::Conflict("duplicate booking_reference".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookings {
    async fn insert_hotel_booking(&self, booking: &HotelBooking) -> CoreResult<()> {
        self.check()?;
        self.hotels.lock().unwrap().push(booking.clone());
        Ok(())
    }

    async fn list_hotel_bookings(&self, user_id: &str) -> CoreResult<Vec<HotelBooking>> {
        self.check()?;
        let mut found: Vec<HotelBooking> = self
            .hotels
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn insert_flight_booking(&self, booking: &FlightBooking) -> CoreResult<()> {
        self.check()?;
        self.flights.lock().unwrap().push(booking.clone());
        Ok(())
    }

    async fn list_flight_bookings(&self, user_id: &str) -> CoreResult<Vec<FlightBooking>> {
        self.check()?;
        Ok(self
            .flights
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct InMemoryUsers {
    users: Mutex<Vec<User>>,
    sessions: Mutex<Vec<Session>>,
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn create_user(&self, user: &User) -> CoreResult<()> {
        self.users.lock().unwrap().push(user.clone());
        Ok(())
    }

    async fn get_user(&self, id: &str) -> CoreResult<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn create_session(&self, session: &Session) -> CoreResult<()> {
        self.sessions.lock().unwrap().push(session.clone());
        Ok(())
    }

    async fn get_session(&self, session_token: &str) -> CoreResult<Option<Session>> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.session_token == session_token)
            .cloned())
    }

    async fn list_accounts(&self, _user_id: &str) -> CoreResult<Vec<Account>> {
        Ok(Vec::new())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    app: Router,
    catalog: Arc<CatalogCache>,
    inventory: Arc<FakeInventory>,
    bookings: Arc<InMemoryBookings>,
    users: Arc<InMemoryUsers>,
}

fn harness(inventory: FakeInventory, bookings: InMemoryBookings) -> Harness {
    let inventory = Arc::new(inventory);
    let bookings = Arc::new(bookings);
    let users = Arc::new(InMemoryUsers::default());
    let clock = Arc::new(SystemClock);
    let catalog = Arc::new(CatalogCache::new(
        inventory.clone(),
        clock.clone(),
        CacheSettings::default(),
    ));

    let state = AppState {
        inventory: inventory.clone(),
        catalog: catalog.clone(),
        booking_repo: bookings.clone(),
        user_repo: users.clone(),
        clock,
        auth: AuthConfig {
            secret: "integration-test-secret-0123456789".to_string(),
            expiration: 3600,
        },
    };

    Harness { app: app(state), catalog, inventory, bookings, users }
}

fn hotel(id: HotelId, name: &str, city: &str, deleted: bool) -> CatalogEntry {
    CatalogEntry {
        id,
        name: name.to_string(),
        address: Address {
            city: NamedCode { name: Some(city.to_string()), code: None },
            country: NamedCode {
                name: Some("United Arab Emirates".to_string()),
                code: Some("AE".to_string()),
            },
            ..Default::default()
        },
        deleted,
        ..Default::default()
    }
}

fn uae_catalog() -> Vec<CatalogEntry> {
    vec![
        hotel(HotelId::text("lp-aa"), "Creek Palace", "Dubai", false),
        hotel(HotelId::text("lp-bb"), "Marina Tower", "dubai", false),
        hotel(HotelId::Number(9001), "Old Souk House", "DUBAI", true),
        hotel(HotelId::text("lp-cc"), "Corniche Bay", "Abu Dhabi", false),
    ]
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_authed(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn guest_token(app: &Router) -> String {
    let (status, body) = send(app, post_json("/api/auth/guest", json!({}), None)).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().expect("token").to_string()
}

fn hotel_booking_body() -> Value {
    json!({
        "hotelId": "lp-aa",
        "hotelName": "Creek Palace",
        "checkIn": "2026-11-01",
        "checkOut": "2026-11-04",
        "rooms": 1,
        "adults": 2,
        "guestName": "Jordan Lee",
        "guestEmail": "jordan@example.com",
        "totalPrice": "412.50",
        "currency": "AED"
    })
}

// ---------------------------------------------------------------------------
// Bookings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_booking_routes_require_bearer_token() {
    let h = harness(FakeInventory::default(), InMemoryBookings::default());

    let (status, body) = send(&h.app, get("/api/bookings/hotels")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Unauthorized" }));

    let (status, _) = send(
        &h.app,
        post_json("/api/bookings/flights", json!({}), Some("not-a-jwt")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(h.bookings.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_fields_rejected_before_store() {
    let h = harness(FakeInventory::default(), InMemoryBookings::default());
    let token = guest_token(&h.app).await;

    let mut body = hotel_booking_body();
    body.as_object_mut().unwrap().remove("hotelId");
    body.as_object_mut().unwrap().remove("totalPrice");

    let (status, resp) = send(&h.app, post_json("/api/bookings/hotels", body, Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = resp["error"].as_str().unwrap();
    assert!(message.contains("hotelId"));
    assert!(message.contains("totalPrice"));
    assert_eq!(h.bookings.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_hotel_booking_is_persisted_pending_with_reference() {
    let h = harness(FakeInventory::default(), InMemoryBookings::default());
    let token = guest_token(&h.app).await;

    let (status, resp) = send(
        &h.app,
        post_json("/api/bookings/hotels", hotel_booking_body(), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["success"], true);

    let booking = &resp["booking"];
    let reference = booking["bookingReference"].as_str().unwrap();
    assert!(BookingKind::Hotel.is_valid_reference(reference), "bad reference {}", reference);
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["paymentStatus"], "pending");
    assert_eq!(booking["totalPrice"], "412.50");
    assert_eq!(booking["guestEmail"], "jordan@example.com");

    let stored = h.bookings.hotels.lock().unwrap().clone();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].booking_reference, reference);

    let (status, listed) = send(&h.app, get_authed("/api/bookings/hotels", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["bookings"].as_array().unwrap().len(), 1);

    // Another guest sees nothing.
    let other = guest_token(&h.app).await;
    let (_, listed) = send(&h.app, get_authed("/api/bookings/hotels", &other)).await;
    assert!(listed["bookings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_reference_collision_is_retried() {
    let bookings = InMemoryBookings::default();
    bookings.collisions_left.store(2, Ordering::SeqCst);
    let h = harness(FakeInventory::default(), bookings);
    let token = guest_token(&h.app).await;

    let (status, _) = send(
        &h.app,
        post_json("/api/bookings/hotels", hotel_booking_body(), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.bookings.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_persistence_failure_is_500() {
    let h = harness(
        FakeInventory::default(),
        InMemoryBookings { broken: true, ..Default::default() },
    );
    let token = guest_token(&h.app).await;

    let (status, resp) = send(
        &h.app,
        post_json("/api/bookings/hotels", hotel_booking_body(), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp, json!({ "error": "Internal Server Error" }));
}

#[tokio::test]
async fn test_flight_booking_reference_prefix() {
    let h = harness(FakeInventory::default(), InMemoryBookings::default());
    let token = guest_token(&h.app).await;

    let (status, resp) = send(
        &h.app,
        post_json(
            "/api/bookings/flights",
            json!({
                "offerId": "off-1",
                "airline": "EK",
                "origin": "dxb",
                "destination": "LHR",
                "departureDate": "2026-12-20",
                "passengers": 2,
                "totalPrice": 1290.4
            }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let reference = resp["booking"]["bookingReference"].as_str().unwrap();
    assert!(BookingKind::Flight.is_valid_reference(reference));
    assert_eq!(resp["booking"]["origin"], "DXB");
    assert_eq!(resp["booking"]["totalPrice"], "1290.4");
    assert_eq!(resp["booking"]["cabinClass"], "economy");
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_guest_login_creates_user_and_session() {
    let h = harness(FakeInventory::default(), InMemoryBookings::default());
    let token = guest_token(&h.app).await;

    assert_eq!(h.users.users.lock().unwrap().len(), 1);
    assert_eq!(h.users.sessions.lock().unwrap().len(), 1);

    let (status, me) = send(&h.app, get_authed("/api/auth/me", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(me["user"]["id"].as_str().unwrap().starts_with("guest-"));
    assert_eq!(me["accounts"], json!([]));
}

#[tokio::test]
async fn test_token_without_live_session_is_rejected() {
    let h = harness(FakeInventory::default(), InMemoryBookings::default());

    let revoked = guest_token(&h.app).await;
    h.users.sessions.lock().unwrap().clear();
    let (status, body) = send(&h.app, get_authed("/api/auth/me", &revoked)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let expired = guest_token(&h.app).await;
    for session in h.users.sessions.lock().unwrap().iter_mut() {
        session.expires = Utc::now() - Duration::minutes(1);
    }
    let (status, _) = send(&h.app, get_authed("/api/bookings/hotels", &expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(h.bookings.calls.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------------------
// Catalog views and hotel detail
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_city_search_for_dubai() {
    let h = harness(
        FakeInventory { catalog: uae_catalog(), ..Default::default() },
        InMemoryBookings::default(),
    );

    let (status, resp) = send(&h.app, get("/api/hotels/cities?search=Dubai")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["success"], true);
    let cities = resp["data"].as_array().unwrap();
    assert_eq!(cities.len(), 1);
    assert_eq!(cities[0]["name"], "Dubai");
    assert_eq!(cities[0]["hotelCount"], 2);

    // The snapshot is reused for the next view.
    let (_, resp) = send(&h.app, get("/api/hotels/available?city=abu%20dhabi")).await;
    assert_eq!(resp["data"].as_array().unwrap().len(), 1);
    assert_eq!(h.inventory.catalog_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_catalog_outage_degrades_in_band() {
    let h = harness(
        FakeInventory { catalog_down: true, ..Default::default() },
        InMemoryBookings::default(),
    );

    for uri in [
        "/api/hotels/cities",
        "/api/hotels/search-by-name?search=creek",
        "/api/export/cities",
    ] {
        let (status, resp) = send(&h.app, get(uri)).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(resp["success"], false, "{}", uri);
        assert_eq!(resp["data"], json!([]), "{}", uri);
        assert!(resp["error"].as_str().unwrap().contains("502"), "{}", uri);
    }
}

#[tokio::test]
async fn test_deactivated_hotel_detail() {
    let mut details = HashMap::new();
    details.insert(
        "lp-gone".to_string(),
        Err(SupplierError::HotelUnavailable("lp-gone".to_string())),
    );
    let h = harness(
        FakeInventory { details, catalog: uae_catalog(), ..Default::default() },
        InMemoryBookings::default(),
    );

    let (status, resp) = send(&h.app, get("/api/hotels/lp-gone")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        resp,
        json!({ "success": false, "error": "Hotel is no longer available", "data": null })
    );
    assert_eq!(h.inventory.catalog_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_detail_from_vendor_is_memoized() {
    let mut details = HashMap::new();
    details.insert(
        "lp-77".to_string(),
        Ok(json!({
            "id": "lp-77",
            "name": "Harbour View",
            "description": "<p>Sea-facing suites.</p><p>The marina promenade is steps away from the lobby.</p>"
        })),
    );
    let h = harness(FakeInventory { details, ..Default::default() }, InMemoryBookings::default());

    let (_, resp) = send(&h.app, get("/api/hotels/lp-77")).await;
    assert_eq!(resp["success"], true);
    assert_eq!(resp["data"]["name"], "Harbour View");
    assert_eq!(resp["data"]["source"], "detail");
    assert_eq!(
        resp["data"]["nearbyAttractions"],
        json!(["The marina promenade is steps away from the lobby."])
    );

    let memo = h.catalog.cached("lp-77").expect("memoized");
    assert_eq!(memo.source, DataSource::Detail);
}

#[tokio::test]
async fn test_detail_falls_back_to_catalog_position() {
    let h = harness(
        FakeInventory { catalog: uae_catalog(), ..Default::default() },
        InMemoryBookings::default(),
    );

    let (_, resp) = send(&h.app, get("/api/hotels/2")).await;
    assert_eq!(resp["success"], true);
    assert_eq!(resp["data"]["id"], "lp-bb");
    assert_eq!(resp["data"]["source"], "catalog");

    let (_, resp) = send(&h.app, get("/api/hotels/nothing-like-this")).await;
    assert_eq!(resp["success"], false);
    assert_eq!(resp["error"], "Hotel not found");
}

#[tokio::test]
async fn test_detail_lookup_counts_one_memo_miss() {
    let h = harness(
        FakeInventory { catalog: uae_catalog(), ..Default::default() },
        InMemoryBookings::default(),
    );

    let (_, resp) = send(&h.app, get("/api/hotels/lp-cc")).await;
    assert_eq!(resp["data"]["name"], "Corniche Bay");
    assert_eq!(h.catalog.stats().memo_misses, 1);
    assert_eq!(h.catalog.stats().memo_hits, 0);

    let (_, resp) = send(&h.app, get("/api/hotels/lp-cc")).await;
    assert_eq!(resp["data"]["name"], "Corniche Bay");
    assert_eq!(h.catalog.stats().memo_misses, 1);
    assert_eq!(h.catalog.stats().memo_hits, 1);

    // Identifiers are case-sensitive.
    let (_, resp) = send(&h.app, get("/api/hotels/LP-CC")).await;
    assert_eq!(resp["error"], "Hotel not found");
    assert_eq!(h.catalog.stats().memo_misses, 2);
}

// ---------------------------------------------------------------------------
// Search, airports, flights
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_hotel_search_reshapes_results() {
    let h = harness(FakeInventory::default(), InMemoryBookings::default());
    let (_, resp) = send(
        &h.app,
        post_json(
            "/api/hotels/search",
            json!({ "checkin": "2026-11-01", "checkout": "2026-11-03", "cityId": "DXB" }),
            None,
        ),
    )
    .await;
    assert_eq!(resp["success"], true);
    assert_eq!(resp["data"][0]["id"], "lp-aa");
    assert_eq!(resp["data"][0]["name"], "Creek Palace");
    assert_eq!(resp["data"][0]["price"], 120.0);

    let (status, resp) = send(
        &h.app,
        post_json(
            "/api/hotels/search",
            json!({ "checkin": "2026-11-03", "checkout": "2026-11-01", "cityId": "DXB" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["success"], false);
    assert_eq!(resp["data"], json!([]));
}

#[tokio::test]
async fn test_airport_lookup_falls_back_to_static_table() {
    let h = harness(
        FakeInventory { airports_down: true, ..Default::default() },
        InMemoryBookings::default(),
    );

    let (_, resp) = send(&h.app, get("/api/airports?q=dxb")).await;
    assert_eq!(resp["success"], false);
    assert_eq!(resp["data"][0]["code"], "DXB");

    let (_, resp) = send(&h.app, get("/api/airports?q=")).await;
    assert_eq!(resp, json!({ "success": true, "data": [] }));
}

#[tokio::test]
async fn test_date_prices_report_failures_per_date() {
    let good = NaiveDate::from_ymd_opt(2026, 12, 20).unwrap();
    let bad = NaiveDate::from_ymd_opt(2026, 12, 21).unwrap();
    let mut flights = HashMap::new();
    flights.insert(
        good,
        Ok(vec![
            json!({ "id": "a", "price": 540.0, "currency": "USD" }),
            json!({ "id": "b", "price": 488.0, "currency": "USD" }),
        ]),
    );
    flights.insert(bad, Err(SupplierError::Transport("reset by peer".to_string())));
    let h = harness(FakeInventory { flights, ..Default::default() }, InMemoryBookings::default());

    let (_, resp) = send(
        &h.app,
        post_json(
            "/api/flight/date-prices",
            json!({ "origin": "JFK", "destination": "LHR", "dates": ["2026-12-20", "2026-12-21", "2026-12-22"] }),
            None,
        ),
    )
    .await;
    assert_eq!(resp["success"], true);
    let rows = resp["data"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["lowestPrice"], 488.0);
    assert!(rows[0]["error"].is_null());
    assert!(rows[1]["lowestPrice"].is_null());
    assert!(rows[1]["error"].as_str().unwrap().contains("reset by peer"));
    assert!(rows[2]["lowestPrice"].is_null());
    assert!(rows[2]["error"].is_null());
}
