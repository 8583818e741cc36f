use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wayfare_api::{app, AppState, AuthConfig};
use wayfare_catalog::{CacheSettings, CatalogCache};
use wayfare_core::clock::{Clock, SystemClock};
use wayfare_core::supplier::InventoryProvider;
use wayfare_store::app_config::Config;
use wayfare_store::{DbClient, HttpInventoryClient, PgBookingRepository, PgUserRepository};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "wayfare_api=debug,wayfare_catalog=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    config.validate().expect("Invalid configuration");
    tracing::info!("Starting Wayfare API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let inventory: Arc<dyn InventoryProvider> = Arc::new(
        HttpInventoryClient::new(&config.supplier).expect("Failed to build inventory client"),
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let catalog = Arc::new(CatalogCache::new(
        inventory.clone(),
        clock.clone(),
        CacheSettings {
            ttl: config.catalog.ttl(),
            max_pages: config.catalog.max_pages,
            sweep_interval: config.catalog.sweep_interval(),
        },
    ));
    let _sweeper = catalog.spawn_sweeper();

    let app_state = AppState {
        inventory,
        catalog,
        booking_repo: Arc::new(PgBookingRepository::new(db.pool.clone())),
        user_repo: Arc::new(PgUserRepository::new(db.pool.clone())),
        clock,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
