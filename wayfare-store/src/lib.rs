pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod supplier_client;
pub mod user_repo;

pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use supplier_client::HttpInventoryClient;
pub use user_repo::PgUserRepository;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Invalid supplier configuration: {0}")]
    SupplierConfig(String),
    #[error("HTTP client setup failed: {0}")]
    HttpClient(#[from] reqwest::Error),
}
