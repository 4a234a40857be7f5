use std::collections::HashSet;
use std::sync::OnceLock;

use async_trait::async_trait;
use cartwise_core::PromoExclusion;
use regex::Regex;

use super::listing::{file_prefix, join_url, newest_with_prefix, no_feed};
use crate::adapter::{ChainAdapter, FeedLocation};
use crate::client::FeedClient;
use crate::error::AcquisitionError;

pub const CARREFOUR_CHAIN_CODE: &str = "7290055700007";
pub const CARREFOUR_BASE_URL: &str = "https://prices.carrefour.co.il";

/// Carrefour serves a single page listing every file name; files live under
/// a path the page declares in a script constant.
#[derive(Debug, Clone)]
pub struct CarrefourAdapter {
    base_url: String,
}

impl CarrefourAdapter {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Newest `kind` file for the store, as a URL under the page's declared
    /// file directory.
    async fn newest_file(
        &self,
        client: &FeedClient,
        store_code: &str,
        kind: &str,
    ) -> Result<Option<String>, AcquisitionError> {
        let page = client.get(&join_url(&self.base_url, ""), None).await?.text();
        let directory = declared_path(&page).map_or_else(
            || self.base_url.clone(),
            |path| join_url(&self.base_url, path),
        );
        let prefix = file_prefix(kind, CARREFOUR_CHAIN_CODE, store_code);
        Ok(newest_with_prefix(listed_names(&page), &prefix).map(|name| join_url(&directory, name)))
    }
}

impl Default for CarrefourAdapter {
    fn default() -> Self {
        Self::new(CARREFOUR_BASE_URL)
    }
}

fn listed_names(page: &str) -> Vec<&str> {
    static NAME: OnceLock<Regex> = OnceLock::new();
    let re = NAME.get_or_init(|| {
        Regex::new(r"(?:PriceFull|PromoFull)\d+-\d+-\d+\.gz").expect("valid regex")
    });
    re.find_iter(page).map(|m| m.as_str()).collect()
}

/// The `const path = "…"` file directory declared by the page, if any.
fn declared_path(page: &str) -> Option<&str> {
    static PATH: OnceLock<Regex> = OnceLock::new();
    let re = PATH.get_or_init(|| {
        Regex::new(r#"const\s+path\s*=\s*["']([^"']*)["']"#).expect("valid regex")
    });
    re.captures(page)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|p| !p.is_empty())
}

#[async_trait]
impl ChainAdapter for CarrefourAdapter {
    fn chain_code(&self) -> &str {
        CARREFOUR_CHAIN_CODE
    }

    fn alias(&self) -> &str {
        "carrefour"
    }

    async fn resolve_price_feed(
        &self,
        client: &FeedClient,
        store_code: &str,
    ) -> Result<FeedLocation, AcquisitionError> {
        self.newest_file(client, store_code, "PriceFull")
            .await?
            .map(FeedLocation::public)
            .ok_or_else(|| no_feed(self.alias(), store_code, "PriceFull"))
    }

    async fn resolve_promo_feed(
        &self,
        client: &FeedClient,
        store_code: &str,
    ) -> Result<Option<FeedLocation>, AcquisitionError> {
        Ok(self
            .newest_file(client, store_code, "PromoFull")
            .await?
            .map(FeedLocation::public))
    }

    fn promo_blacklist(&self) -> HashSet<PromoExclusion> {
        HashSet::from([PromoExclusion::Audience("1".to_owned())])
    }
}
