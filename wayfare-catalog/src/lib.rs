pub mod attractions;
pub mod cache;
pub mod matching;
pub mod views;

pub use cache::{
    CacheEntry, CacheSettings, CacheStatsReport, CatalogCache, CatalogError, CatalogSnapshot,
    DataSource, Resolution, ResolvedVia,
};
pub use matching::MatchRule;
