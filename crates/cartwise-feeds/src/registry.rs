//! The process-wide chain → adapter map.
//!
//! Built once at startup by [`ChainRegistry::standard`] and shared read-only
//! behind an `Arc` afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::adapter::ChainAdapter;
use crate::chains::carrefour::CARREFOUR_BASE_URL;
use crate::chains::published_prices::PUBLISHED_PRICES_BASE_URL;
use crate::chains::shufersal::SHUFERSAL_BASE_URL;
use crate::chains::{BinaProjectsAdapter, CarrefourAdapter, PublishedPricesAdapter, ShufersalAdapter};
use crate::error::AcquisitionError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("chain {0} registered twice")]
    DuplicateChain(String),
}

/// Base URLs of each publishing portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEndpoints {
    pub shufersal: String,
    pub published_prices: String,
    pub king_store: String,
    pub maayan_2000: String,
    pub zol_vebegadol: String,
    pub carrefour: String,
}

impl Default for ChainEndpoints {
    fn default() -> Self {
        Self {
            shufersal: SHUFERSAL_BASE_URL.to_owned(),
            published_prices: PUBLISHED_PRICES_BASE_URL.to_owned(),
            king_store: "https://kingstore.binaprojects.com".to_owned(),
            maayan_2000: "https://maayan2000.binaprojects.com".to_owned(),
            zol_vebegadol: "https://zolvebegadol.binaprojects.com".to_owned(),
            carrefour: CARREFOUR_BASE_URL.to_owned(),
        }
    }
}

pub struct ChainRegistry {
    adapters: BTreeMap<String, Arc<dyn ChainAdapter>>,
}

impl ChainRegistry {
    /// Every supported chain, pointed at `endpoints`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateChain`] if two adapters claim the
    /// same chain code.
    pub fn standard(endpoints: &ChainEndpoints) -> Result<Self, RegistryError> {
        let pp = endpoints.published_prices.as_str();
        let adapters: Vec<Arc<dyn ChainAdapter>> = vec![
            Arc::new(ShufersalAdapter::new(endpoints.shufersal.clone())),
            Arc::new(PublishedPricesAdapter::rami_levy(pp)),
            Arc::new(PublishedPricesAdapter::osher_ad(pp)),
            Arc::new(PublishedPricesAdapter::yohananof(pp)),
            Arc::new(PublishedPricesAdapter::tiv_taam(pp)),
            Arc::new(BinaProjectsAdapter::king_store(&endpoints.king_store)),
            Arc::new(BinaProjectsAdapter::maayan_2000(&endpoints.maayan_2000)),
            Arc::new(BinaProjectsAdapter::zol_vebegadol(&endpoints.zol_vebegadol)),
            Arc::new(CarrefourAdapter::new(endpoints.carrefour.clone())),
        ];
        Self::from_adapters(adapters)
    }

    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateChain`] on a repeated chain code.
    pub fn from_adapters(adapters: Vec<Arc<dyn ChainAdapter>>) -> Result<Self, RegistryError> {
        let mut map = BTreeMap::new();
        for adapter in adapters {
            let code = adapter.chain_code().to_owned();
            if map.contains_key(&code) {
                return Err(RegistryError::DuplicateChain(code));
            }
            map.insert(code, adapter);
        }
        Ok(Self { adapters: map })
    }

    #[must_use]
    pub fn get(&self, chain_code: &str) -> Option<Arc<dyn ChainAdapter>> {
        self.adapters.get(chain_code).cloned()
    }

    #[must_use]
    pub fn get_by_alias(&self, alias: &str) -> Option<Arc<dyn ChainAdapter>> {
        self.adapters
            .values()
            .find(|a| a.alias().eq_ignore_ascii_case(alias))
            .cloned()
    }

    /// Looks up by chain code, falling back to alias.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError::UnknownChain`] if neither matches.
    pub fn require(&self, chain: &str) -> Result<Arc<dyn ChainAdapter>, AcquisitionError> {
        self.get(chain)
            .or_else(|| self.get_by_alias(chain))
            .ok_or_else(|| AcquisitionError::UnknownChain(chain.to_owned()))
    }

    /// Registered adapters sorted by alias.
    #[must_use]
    pub fn list(&self) -> Vec<Arc<dyn ChainAdapter>> {
        let mut adapters: Vec<_> = self.adapters.values().cloned().collect();
        adapters.sort_by(|a, b| a.alias().cmp(b.alias()));
        adapters
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
