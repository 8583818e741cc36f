use axum::{http::Method, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod airports;
pub mod auth;
pub mod bookings;
pub mod error;
pub mod export;
pub mod flights;
pub mod health;
pub mod hotels;
pub mod outcome;
pub mod reshape;
pub mod state;

pub use outcome::Outcome;
pub use state::{AppState, AuthConfig};

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .merge(health::routes())
        .merge(auth::routes(state.clone()))
        .merge(airports::routes())
        .merge(flights::routes())
        .merge(hotels::routes())
        .merge(bookings::routes(state.clone()))
        .merge(export::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
