use std::collections::HashSet;

use async_trait::async_trait;
use cartwise_core::{PromoExclusion, Promotion};

use super::listing::{extract_links, file_name_of, file_prefix, join_url, newest_with_prefix, no_feed};
use crate::adapter::{default_audience, ChainAdapter, FeedLocation};
use crate::client::FeedClient;
use crate::error::AcquisitionError;

pub const SHUFERSAL_CHAIN_CODE: &str = "7290027600007";
pub const SHUFERSAL_BASE_URL: &str = "https://prices.shufersal.co.il";

/// Listing category ids on the Shufersal portal.
const CATEGORY_PRICE_FULL: u8 = 2;
const CATEGORY_PROMO_FULL: u8 = 4;

/// Shufersal publishes an HTML table per category and store, with direct
/// (signed) links to each gzip file.
#[derive(Debug, Clone)]
pub struct ShufersalAdapter {
    base_url: String,
}

impl ShufersalAdapter {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    async fn newest_file(
        &self,
        client: &FeedClient,
        store_code: &str,
        category: u8,
        kind: &str,
    ) -> Result<Option<String>, AcquisitionError> {
        let listing_url = format!(
            "{}?catID={category}&storeId={}",
            join_url(&self.base_url, "FileObject/UpdateCategory"),
            store_code.trim()
        );
        let page = client.get(&listing_url, None).await?.text();
        let links = extract_links(&page, &self.base_url);
        let prefix = file_prefix(kind, SHUFERSAL_CHAIN_CODE, store_code);

        let newest = newest_with_prefix(links.iter().map(|l| file_name_of(l)), &prefix)
            .and_then(|name| links.iter().find(|l| file_name_of(l) == name))
            .cloned();
        Ok(newest)
    }
}

impl Default for ShufersalAdapter {
    fn default() -> Self {
        Self::new(SHUFERSAL_BASE_URL)
    }
}

#[async_trait]
impl ChainAdapter for ShufersalAdapter {
    fn chain_code(&self) -> &str {
        SHUFERSAL_CHAIN_CODE
    }

    fn alias(&self) -> &str {
        "shufersal"
    }

    async fn resolve_price_feed(
        &self,
        client: &FeedClient,
        store_code: &str,
    ) -> Result<FeedLocation, AcquisitionError> {
        self.newest_file(client, store_code, CATEGORY_PRICE_FULL, "PriceFull")
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
            .newest_file(client, store_code, CATEGORY_PROMO_FULL, "PromoFull")
            .await?
            .map(FeedLocation::public))
    }

    fn promo_blacklist(&self) -> HashSet<PromoExclusion> {
        HashSet::from([PromoExclusion::Audience("1".to_owned())])
    }

    fn promo_audience(&self, promo: &Promotion) -> String {
        match promo.club_id.as_deref() {
            Some("1") => "Shufersal Online/Club".to_owned(),
            other => default_audience(other),
        }
    }
}
