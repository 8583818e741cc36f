use std::sync::Arc;
use wayfare_catalog::CatalogCache;
use wayfare_core::clock::Clock;
use wayfare_core::repository::{BookingRepository, UserRepository};
use wayfare_core::supplier::InventoryProvider;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub inventory: Arc<dyn InventoryProvider>,
    pub catalog: Arc<CatalogCache>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub clock: Arc<dyn Clock>,
    pub auth: AuthConfig,
}
