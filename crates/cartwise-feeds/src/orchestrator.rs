//! Concurrent feed acquisition for one store or a planning set of stores.
//!
//! Single-store acquisition treats the price feed as primary: its failure
//! fails the call and aborts the in-flight promo task, while a promo failure
//! only degrades the result to an empty promotion set with a recorded
//! warning. Planning acquisition fans out one task per store and waits for
//! every task to settle, returning a result or a typed failure per store.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use cartwise_core::{AppConfig, Item, Promotion, StoreCatalog, StoreKey};
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::adapter::{ChainAdapter, FeedLocation};
use crate::client::FeedClient;
use crate::error::{AcquisitionError, FeedKind};
use crate::registry::ChainRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Upper bound for any single acquisition task.
    pub task_timeout: Duration,
    /// Stores fetched at once in planning mode.
    pub max_concurrency: usize,
}

impl OrchestratorSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            task_timeout: Duration::from_secs(config.task_timeout_secs),
            max_concurrency: config.max_concurrent_fetches.max(1),
        }
    }
}

/// Result of a single-store acquisition.
#[derive(Debug)]
pub struct StoreAcquisition {
    pub key: StoreKey,
    pub catalog: StoreCatalog,
    /// Why promotions are missing, when the promo feed could not be used.
    pub promo_warning: Option<AcquisitionError>,
}

#[derive(Debug)]
pub enum StoreOutcome {
    Ready(StoreCatalog),
    Failed(AcquisitionError),
}

impl StoreOutcome {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, StoreOutcome::Ready(_))
    }
}

/// Per-store outcomes of a planning acquisition, keyed by store.
#[derive(Debug, Default)]
pub struct PlanningSnapshot {
    outcomes: BTreeMap<StoreKey, StoreOutcome>,
}

impl PlanningSnapshot {
    #[must_use]
    pub fn get(&self, key: &StoreKey) -> Option<&StoreOutcome> {
        self.outcomes.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StoreKey, &StoreOutcome)> {
        self.outcomes.iter()
    }

    pub fn ready(&self) -> impl Iterator<Item = (&StoreKey, &StoreCatalog)> {
        self.outcomes.iter().filter_map(|(key, outcome)| match outcome {
            StoreOutcome::Ready(catalog) => Some((key, catalog)),
            StoreOutcome::Failed(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&StoreKey, &AcquisitionError)> {
        self.outcomes.iter().filter_map(|(key, outcome)| match outcome {
            StoreOutcome::Failed(err) => Some((key, err)),
            StoreOutcome::Ready(_) => None,
        })
    }

    /// Drops failure markers, keeping the successfully acquired catalogs.
    #[must_use]
    pub fn into_catalogs(self) -> BTreeMap<StoreKey, StoreCatalog> {
        self.outcomes
            .into_iter()
            .filter_map(|(key, outcome)| match outcome {
                StoreOutcome::Ready(catalog) => Some((key, catalog)),
                StoreOutcome::Failed(_) => None,
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Cheap to clone; clones share the registry and connection pool.
#[derive(Clone)]
pub struct AcquisitionOrchestrator {
    registry: Arc<ChainRegistry>,
    client: FeedClient,
    settings: OrchestratorSettings,
}

impl AcquisitionOrchestrator {
    #[must_use]
    pub fn new(
        registry: Arc<ChainRegistry>,
        client: FeedClient,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            registry,
            client,
            settings,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    /// Fetches and parses a store's price and promo feeds concurrently.
    ///
    /// Each side resolves its own feed, so a promo listing failure never
    /// reaches the price path. Both run under one task deadline measured
    /// from the start of the call.
    ///
    /// # Errors
    ///
    /// Any failure of the price feed, including [`AcquisitionError::Timeout`]
    /// and [`AcquisitionError::Cancelled`]. Promo failures are reported in
    /// [`StoreAcquisition::promo_warning`] instead.
    pub async fn acquire_store(
        &self,
        key: &StoreKey,
        cancel: &CancellationToken,
    ) -> Result<StoreAcquisition, AcquisitionError> {
        let (adapter, key) = self.canonical(key)?;

        let promo_task = {
            let this = self.clone();
            let adapter = Arc::clone(&adapter);
            let key = key.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                this.guarded(&cancel, this.fetch_promotions(&adapter, &key))
                    .await
            })
        };

        let items = match self
            .guarded(cancel, self.fetch_prices(&adapter, &key))
            .await
        {
            Ok(items) => items,
            Err(err) => {
                promo_task.abort();
                tracing::error!(store = %key, error = %err, "price acquisition failed");
                return Err(err);
            }
        };

        let (promotions, promo_warning) = match promo_task.await {
            Ok(Ok(Some(promotions))) => (promotions, None),
            Ok(Ok(None)) => (
                Vec::new(),
                Some(AcquisitionError::FeedUnavailable {
                    context: format!("{} store {}", adapter.alias(), key.store_code),
                    reason: "no PromoFull file listed".to_owned(),
                }),
            ),
            Ok(Err(err)) => (Vec::new(), Some(err)),
            Err(join) => (Vec::new(), Some(AcquisitionError::Task(join.to_string()))),
        };

        if let Some(warning) = &promo_warning {
            tracing::warn!(
                store = %key,
                feed = %FeedKind::Promo,
                error = %warning,
                "promotions unavailable; continuing with prices only"
            );
        }

        let catalog = StoreCatalog::from_parts(items, promotions);
        tracing::info!(
            store = %key,
            items = catalog.item_count(),
            promotions = catalog.promotion_count(),
            "store acquired"
        );

        Ok(StoreAcquisition {
            key,
            catalog,
            promo_warning,
        })
    }

    /// Fetches and parses only a store's price feed. The promo listing is
    /// never consulted.
    ///
    /// # Errors
    ///
    /// Same as [`AcquisitionOrchestrator::acquire_store`].
    pub async fn acquire_prices(
        &self,
        key: &StoreKey,
        cancel: &CancellationToken,
    ) -> Result<StoreCatalog, AcquisitionError> {
        let (adapter, key) = self.canonical(key)?;
        let items = self
            .guarded(cancel, self.fetch_prices(&adapter, &key))
            .await?;
        Ok(StoreCatalog::from_parts(items, Vec::new()))
    }

    /// Acquires price catalogs for every store in `keys`.
    ///
    /// Never fails as a whole: each store resolves to a catalog or a failure
    /// marker, and the snapshot is returned only after every task settled.
    /// Keys are recorded under the chain code; a store named once by code
    /// and once by alias is acquired once. A key whose chain is unknown is
    /// recorded as given.
    pub async fn acquire_planning(
        &self,
        keys: &[StoreKey],
        cancel: &CancellationToken,
    ) -> PlanningSnapshot {
        let mut outcomes = BTreeMap::new();
        let mut unique = BTreeSet::new();
        for key in keys {
            match self.canonical(key) {
                Ok((_, canonical)) => {
                    unique.insert(canonical);
                }
                Err(err) => {
                    outcomes.insert(key.clone(), StoreOutcome::Failed(err));
                }
            }
        }

        let results: Vec<(StoreKey, StoreOutcome)> = stream::iter(unique)
            .map(|key| {
                let this = self.clone();
                let cancel = cancel.clone();
                let task_key = key.clone();
                let handle =
                    tokio::spawn(async move { this.acquire_prices(&task_key, &cancel).await });
                async move {
                    let outcome = match handle.await {
                        Ok(Ok(catalog)) => StoreOutcome::Ready(catalog),
                        Ok(Err(err)) => StoreOutcome::Failed(err),
                        Err(join) => StoreOutcome::Failed(AcquisitionError::Task(join.to_string())),
                    };
                    (key, outcome)
                }
            })
            .buffer_unordered(self.settings.max_concurrency)
            .collect()
            .await;
        outcomes.extend(results);

        let snapshot = PlanningSnapshot { outcomes };
        for (key, err) in snapshot.failures() {
            tracing::warn!(store = %key, error = %err, "store excluded from planning snapshot");
        }
        tracing::info!(
            stores = snapshot.len(),
            ready = snapshot.ready().count(),
            "planning acquisition settled"
        );

        snapshot
    }

    /// The adapter for `key`'s chain and the key restated with its chain code.
    fn canonical(
        &self,
        key: &StoreKey,
    ) -> Result<(Arc<dyn ChainAdapter>, StoreKey), AcquisitionError> {
        let adapter = self.registry.require(&key.chain_code)?;
        let canonical = StoreKey::new(adapter.chain_code(), key.store_code.trim());
        Ok((adapter, canonical))
    }

    async fn fetch_prices(
        &self,
        adapter: &Arc<dyn ChainAdapter>,
        key: &StoreKey,
    ) -> Result<Vec<Item>, AcquisitionError> {
        let location = adapter
            .resolve_price_feed(&self.client, &key.store_code)
            .await?;
        tracing::debug!(store = %key, feed = %FeedKind::Price, url = %location.url, "resolved feed");

        let xml = self.download(&location).await?;
        let adapter = Arc::clone(adapter);
        parse_blocking(move || adapter.parse_prices(&xml)).await
    }

    /// `Ok(None)` when the chain lists no promo file for the store.
    async fn fetch_promotions(
        &self,
        adapter: &Arc<dyn ChainAdapter>,
        key: &StoreKey,
    ) -> Result<Option<Vec<Promotion>>, AcquisitionError> {
        let Some(location) = adapter
            .resolve_promo_feed(&self.client, &key.store_code)
            .await?
        else {
            return Ok(None);
        };
        tracing::debug!(store = %key, feed = %FeedKind::Promo, url = %location.url, "resolved feed");

        let xml = self.download(&location).await?;
        let adapter = Arc::clone(adapter);
        parse_blocking(move || adapter.parse_promos(&xml))
            .await
            .map(Some)
    }

    async fn download(&self, location: &FeedLocation) -> Result<String, AcquisitionError> {
        self.client
            .fetch_feed(&location.url, location.session_credentials.as_ref())
            .await
    }

    /// Runs `fut` under the task deadline, resolving early on cancellation.
    async fn guarded<T, F>(&self, cancel: &CancellationToken, fut: F) -> Result<T, AcquisitionError>
    where
        F: Future<Output = Result<T, AcquisitionError>>,
    {
        let deadline = self.settings.task_timeout;
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(AcquisitionError::Cancelled),
            result = tokio::time::timeout(deadline, fut) => result.unwrap_or_else(|_| {
                Err(AcquisitionError::Timeout {
                    secs: deadline.as_secs(),
                })
            }),
        }
    }
}

/// Feed parsing is CPU-bound; keep it off the async workers.
async fn parse_blocking<T, F>(parse: F) -> Result<T, AcquisitionError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AcquisitionError> + Send + 'static,
{
    tokio::task::spawn_blocking(parse)
        .await
        .map_err(|e| AcquisitionError::Task(e.to_string()))?
}

