//! Known pools and their latest snapshots.

use crate::demo::demo_pools;
use nlswap_domain::PoolSnapshot;
use nlswap_protocols::{ContractReader, LedgerError, PairReader};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

/// Configuration for [`PoolCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Factory used for pair discovery and lookups.
    pub factory_address: Option<String>,
    /// Pair addresses served by index.
    pub known_pairs: Vec<String>,
    /// Interval of the background refresh.
    pub refresh_interval: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            factory_address: None,
            known_pairs: Vec::new(),
            refresh_interval: Duration::from_secs(15),
        }
    }
}

impl CatalogConfig {
    /// Reads `FACTORY_ADDRESS`, `KNOWN_PAIRS` (comma separated) and
    /// `POOL_REFRESH_SECS`.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            factory_address: var("FACTORY_ADDRESS"),
            known_pairs: var("KNOWN_PAIRS")
                .map(|list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            refresh_interval: var("POOL_REFRESH_SECS")
                .and_then(|v| v.trim().parse().ok())
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.refresh_interval),
        }
    }
}

/// The set of known pools.
///
/// Snapshots are shared as `Arc<PoolSnapshot>` and replaced wholesale on
/// refresh; a snapshot handed out earlier is never modified.
pub struct PoolCatalog {
    pairs: PairReader,
    config: CatalogConfig,
    pools: RwLock<HashMap<String, Arc<PoolSnapshot>>>,
}

impl PoolCatalog {
    pub fn new(reader: Arc<dyn ContractReader>, config: CatalogConfig) -> Self {
        Self {
            pairs: PairReader::new(reader),
            config,
            pools: RwLock::new(HashMap::new()),
        }
    }

    /// Builds a catalog seeded with the demonstration pools.
    pub async fn with_demo_pools(reader: Arc<dyn ContractReader>, config: CatalogConfig) -> Self {
        let catalog = Self::new(reader, config);
        for pool in demo_pools() {
            catalog.insert(pool).await;
        }
        catalog
    }

    #[must_use]
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    #[must_use]
    pub fn pair_reader(&self) -> &PairReader {
        &self.pairs
    }

    /// The known pair at `index`, if any.
    #[must_use]
    pub fn known_pair(&self, index: usize) -> Option<&str> {
        self.config.known_pairs.get(index).map(String::as_str)
    }

    /// Latest snapshot of `pair`, if it is in the catalog.
    pub async fn snapshot(&self, pair: &str) -> Option<Arc<PoolSnapshot>> {
        self.pools.read().await.get(&key(pair)).cloned()
    }

    /// Cached snapshot of `pair`, reading it from the ledger on a miss.
    ///
    /// # Errors
    /// Returns a [`LedgerError`] if the pair is not cached and cannot be read.
    pub async fn get_or_load(&self, pair: &str) -> Result<Arc<PoolSnapshot>, LedgerError> {
        match self.snapshot(pair).await {
            Some(pool) => Ok(pool),
            None => self.refresh(pair).await,
        }
    }

    /// Pool trading exactly these two symbols, in either order.
    pub async fn find_by_symbols(&self, a: &str, b: &str) -> Option<Arc<PoolSnapshot>> {
        self.pools
            .read()
            .await
            .values()
            .find(|p| {
                let (s0, s1) = (&p.token0_symbol, &p.token1_symbol);
                (s0.eq_ignore_ascii_case(a) && s1.eq_ignore_ascii_case(b))
                    || (s0.eq_ignore_ascii_case(b) && s1.eq_ignore_ascii_case(a))
            })
            .cloned()
    }

    /// All snapshots ordered by pair label.
    pub async fn list(&self) -> Vec<Arc<PoolSnapshot>> {
        let mut pools: Vec<_> = self.pools.read().await.values().cloned().collect();
        pools.sort_by_key(|p| (p.pair_label(), p.address.to_ascii_lowercase()));
        pools
    }

    /// Adds or replaces a snapshot.
    pub async fn insert(&self, pool: PoolSnapshot) -> Arc<PoolSnapshot> {
        let pool = Arc::new(pool);
        self.pools
            .write()
            .await
            .insert(key(&pool.address), pool.clone());
        pool
    }

    /// Reads `pair` from the ledger and replaces its snapshot.
    ///
    /// # Errors
    /// Returns a [`LedgerError`] if the pair cannot be read; the previous
    /// snapshot, if any, is kept.
    pub async fn refresh(&self, pair: &str) -> Result<Arc<PoolSnapshot>, LedgerError> {
        let snapshot = self.pairs.snapshot(pair).await?;
        debug!(pair, label = %snapshot.pair_label(), "Refreshed pool");
        Ok(self.insert(snapshot).await)
    }

    /// Refreshes every cached pool and every known pair.
    ///
    /// Failures are logged and leave the old snapshot in place. Returns how many
    /// pools were refreshed.
    pub async fn refresh_all(&self) -> usize {
        let mut targets: Vec<String> = self.pools.read().await.keys().cloned().collect();
        for pair in &self.config.known_pairs {
            if !targets.contains(&key(pair)) {
                targets.push(key(pair));
            }
        }

        let mut refreshed = 0;
        for pair in &targets {
            match self.refresh(pair).await {
                Ok(_) => refreshed += 1,
                Err(e) => warn!(pair = %pair, error = %e, "Failed to refresh pool"),
            }
        }
        debug!(refreshed, total = targets.len(), "Refreshed catalog");
        refreshed
    }

    /// Adds up to `limit` pairs created by the configured factory.
    ///
    /// # Errors
    /// Returns a [`LedgerError`] if the factory cannot be queried. Pairs that
    /// fail to load are skipped.
    pub async fn discover(&self, limit: u64) -> Result<usize, LedgerError> {
        let Some(factory) = self.config.factory_address.as_deref() else {
            return Ok(0);
        };
        let total = self.pairs.all_pairs_length(factory).await?;
        let mut added = 0;
        for index in 0..total.min(limit) {
            let Some(pair) = self.pairs.pair_at(factory, index).await? else {
                break;
            };
            match self.refresh(&pair).await {
                Ok(_) => added += 1,
                Err(e) => warn!(pair = %pair, error = %e, "Skipping undiscoverable pair"),
            }
        }
        info!(factory, added, total, "Discovered factory pairs");
        Ok(added)
    }

    /// Refreshes the catalog every `refresh_interval` until the task is aborted.
    pub fn spawn_refresh_loop(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.config.refresh_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                interval_secs = self.config.refresh_interval.as_secs(),
                "Starting pool refresh loop"
            );
            loop {
                ticker.tick().await;
                self.refresh_all().await;
            }
        })
    }
}

fn key(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}
