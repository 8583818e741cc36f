use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use wayfare_core::catalog::{CatalogEntry, HotelId};
use wayfare_core::clock::Clock;
use wayfare_core::supplier::{InventoryProvider, SupplierError};

use crate::matching::{self, MatchRule};

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub ttl: Duration,
    pub max_pages: usize,
    pub sweep_interval: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
            max_pages: 50,
            sweep_interval: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Catalog,
    Detail,
}

/// Memoized outcome of resolving one caller-supplied identifier.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub requested_id: String,
    pub hotel: CatalogEntry,
    pub source: DataSource,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct CatalogSnapshot {
    pub hotels: Vec<CatalogEntry>,
    pub captured_at: DateTime<Utc>,
    pub pages: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedVia {
    Memo,
    Rule(MatchRule),
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub hotel: CatalogEntry,
    pub source: DataSource,
    pub via: ResolvedVia,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog unavailable: {0}")]
    Unavailable(#[from] SupplierError),
}

#[derive(Debug, Default)]
struct CacheStats {
    snapshot_hits: AtomicUsize,
    snapshot_refreshes: AtomicUsize,
    stale_serves: AtomicUsize,
    memo_hits: AtomicUsize,
    memo_misses: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStatsReport {
    pub snapshot_hits: usize,
    pub snapshot_refreshes: usize,
    pub stale_serves: usize,
    pub memo_hits: usize,
    pub memo_misses: usize,
    pub memo_entries: usize,
}

/// Process-local cache over the vendor's full hotel catalog.
///
/// Holds one catalog snapshot plus a memo of identifier resolutions, both
/// aged against the same TTL. Nothing is shared between instances of the
/// service; each process warms its own copy.
///
/// Two requests that miss at the same time will both page through the
/// catalog. They converge on the same data, so no single-flight guard is
/// used.
pub struct CatalogCache {
    provider: Arc<dyn InventoryProvider>,
    clock: Arc<dyn Clock>,
    settings: CacheSettings,
    ttl: TimeDelta,
    snapshot: RwLock<Option<Arc<CatalogSnapshot>>>,
    entries: DashMap<String, CacheEntry>,
    stats: CacheStats,
}

impl CatalogCache {
    pub fn new(
        provider: Arc<dyn InventoryProvider>,
        clock: Arc<dyn Clock>,
        settings: CacheSettings,
    ) -> Self {
        let ttl = TimeDelta::from_std(settings.ttl).unwrap_or(TimeDelta::MAX);
        Self {
            provider,
            clock,
            settings,
            ttl,
            snapshot: RwLock::new(None),
            entries: DashMap::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    fn is_fresh(&self, captured_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - captured_at < self.ttl
    }

    /// Current catalog, refreshed when older than the TTL.
    ///
    /// A failed refresh falls back to the previous snapshot however old it
    /// is. The error only escapes when there has never been a snapshot.
    pub async fn catalog_snapshot(&self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        let now = self.clock.now();
        let current = self.snapshot.read().clone();

        if let Some(snapshot) = &current {
            if self.is_fresh(snapshot.captured_at, now) {
                self.stats.snapshot_hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::clone(snapshot));
            }
        }

        match self.fetch_full_catalog().await {
            Ok((hotels, pages)) => {
                let snapshot = Arc::new(CatalogSnapshot {
                    hotels,
                    captured_at: self.clock.now(),
                    pages,
                });
                *self.snapshot.write() = Some(Arc::clone(&snapshot));
                self.stats.snapshot_refreshes.fetch_add(1, Ordering::Relaxed);
                info!(
                    "Catalog snapshot refreshed: {} hotels across {} pages",
                    snapshot.hotels.len(),
                    pages
                );
                Ok(snapshot)
            }
            Err(err) => match current {
                Some(stale) => {
                    self.stats.stale_serves.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        "Catalog refresh failed, serving snapshot captured at {}: {}",
                        stale.captured_at, err
                    );
                    Ok(stale)
                }
                None => Err(CatalogError::Unavailable(err)),
            },
        }
    }

    async fn fetch_full_catalog(&self) -> Result<(Vec<CatalogEntry>, usize), SupplierError> {
        let max_pages = self.settings.max_pages.max(1);
        let mut hotels = Vec::new();
        let mut token: Option<String> = None;
        let mut pages = 0;

        loop {
            let page = self.provider.catalog_page(token.as_deref()).await?;
            pages += 1;
            hotels.extend(page.hotels);

            match page.next_token.filter(|t| !t.is_empty()) {
                Some(next) if pages < max_pages => token = Some(next),
                Some(_) => {
                    warn!("Catalog still paginating after {} pages, stopping", pages);
                    break;
                }
                None => break,
            }
        }

        Ok((hotels, pages))
    }

    /// Memoized entry for exactly this identifier, if still within the TTL.
    /// Expired entries are dropped on the way out.
    pub fn cached(&self, requested_id: &str) -> Option<CacheEntry> {
        let now = self.clock.now();
        let hit = self.entries.get(requested_id).map(|e| e.value().clone());

        match hit {
            Some(entry) if self.is_fresh(entry.captured_at, now) => {
                self.stats.memo_hits.fetch_add(1, Ordering::Relaxed);
                Some(entry)
            }
            Some(_) => {
                self.entries
                    .remove_if(requested_id, |_, e| !self.is_fresh(e.captured_at, now));
                self.stats.memo_misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.stats.memo_misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn remember(&self, requested_id: &str, hotel: CatalogEntry, source: DataSource) {
        let entry = CacheEntry {
            requested_id: requested_id.to_string(),
            hotel,
            source,
            captured_at: self.clock.now(),
        };
        self.entries.insert(requested_id.to_string(), entry);
    }

    /// Find one catalog hotel for an identifier of unknown shape.
    ///
    /// `Ok(None)` means every rule was tried and nothing matched. `Err`
    /// means there is no catalog to search at all.
    pub async fn resolve_identifier(
        &self,
        requested_id: &str,
    ) -> Result<Option<Resolution>, CatalogError> {
        if let Some(entry) = self.cached(requested_id) {
            return Ok(Some(Resolution {
                hotel: entry.hotel,
                source: entry.source,
                via: ResolvedVia::Memo,
            }));
        }
        self.resolve_in_catalog(requested_id).await
    }

    /// The catalog half of `resolve_identifier`, for callers that already
    /// checked the memo themselves. A hit is still remembered.
    pub async fn resolve_in_catalog(
        &self,
        requested_id: &str,
    ) -> Result<Option<Resolution>, CatalogError> {
        let snapshot = self.catalog_snapshot().await?;
        let wanted = HotelId::text(requested_id);

        match matching::find_match(&snapshot.hotels, &wanted) {
            Some((rule, idx)) => {
                let hotel = snapshot.hotels[idx].clone();
                debug!("Resolved hotel '{}' to {} via {:?}", requested_id, hotel.id, rule);
                self.remember(requested_id, hotel.clone(), DataSource::Catalog);
                Ok(Some(Resolution {
                    hotel,
                    source: DataSource::Catalog,
                    via: ResolvedVia::Rule(rule),
                }))
            }
            None => {
                debug!(
                    "No catalog hotel for '{}' among {} records",
                    requested_id,
                    snapshot.hotels.len()
                );
                Ok(None)
            }
        }
    }

    /// Drop memo entries older than the TTL. Returns how many went.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = self.is_fresh(entry.captured_at, now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let every = self.settings.sweep_interval.max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // First tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.sweep_expired();
                if removed > 0 {
                    debug!("Swept {} expired hotel cache entries", removed);
                }
            }
        })
    }

    pub fn invalidate(&self) {
        *self.snapshot.write() = None;
        self.entries.clear();
        info!("Catalog cache invalidated");
    }

    pub fn stats(&self) -> CacheStatsReport {
        CacheStatsReport {
            snapshot_hits: self.stats.snapshot_hits.load(Ordering::Relaxed),
            snapshot_refreshes: self.stats.snapshot_refreshes.load(Ordering::Relaxed),
            stale_serves: self.stats.stale_serves.load(Ordering::Relaxed),
            memo_hits: self.stats.memo_hits.load(Ordering::Relaxed),
            memo_misses: self.stats.memo_misses.load(Ordering::Relaxed),
            memo_entries: self.entries.len(),
        }
    }
}
