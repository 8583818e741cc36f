use async_trait::async_trait;
use serde_json::Value;

use crate::catalog::CatalogPage;
use crate::search::{FlightSearchRequest, HotelSearchRequest, HotelSearchResults};

/// Vendor error codes that mean the hotel has been pulled from sale.
pub const DEACTIVATION_CODES: &[&str] =
    &["HOTEL_DEACTIVATED", "HOTEL_INACTIVE", "HOTEL_NOT_AVAILABLE"];

#[derive(Debug, Clone, thiserror::Error)]
pub enum SupplierError {
    #[error("Supplier unreachable: {0}")]
    Transport(String),

    #[error("Supplier returned HTTP {status}")]
    Http { status: u16, body: Value },

    #[error("Supplier rejected request: {code} - {message}")]
    Rejected { code: String, message: String },

    #[error("Hotel {0} is no longer available")]
    HotelUnavailable(String),

    #[error("Unexpected supplier payload: {0}")]
    Decode(String),
}

impl SupplierError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SupplierError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_deactivation_code(code: &str) -> bool {
        DEACTIVATION_CODES.iter().any(|c| c.eq_ignore_ascii_case(code))
    }
}

/// Third-party hotel and flight inventory.
///
/// No implementation retries; every failure is handed straight back.
#[async_trait]
pub trait InventoryProvider: Send + Sync {
    /// Date/occupancy constrained availability search.
    async fn search_hotels(
        &self,
        request: &HotelSearchRequest,
    ) -> Result<HotelSearchResults, SupplierError>;

    /// Single hotel content. Deactivated hotels surface as
    /// [`SupplierError::HotelUnavailable`].
    async fn hotel_detail(&self, hotel_id: &str) -> Result<Value, SupplierError>;

    /// One page of the full catalog. `None` asks for the first page.
    async fn catalog_page(&self, token: Option<&str>) -> Result<CatalogPage, SupplierError>;

    async fn search_flights(
        &self,
        request: &FlightSearchRequest,
    ) -> Result<Vec<Value>, SupplierError>;

    async fn search_airports(&self, query: &str) -> Result<Vec<Value>, SupplierError>;
}
