//! Chains hosted by BinaProjects, each on its own subdomain.

use async_trait::async_trait;
use serde::Deserialize;

use super::listing::{file_prefix, join_url, newest_with_prefix, no_feed};
use crate::adapter::{ChainAdapter, FeedLocation};
use crate::client::FeedClient;
use crate::error::AcquisitionError;

const FILE_TYPE_PRICE_FULL: &str = "4";
const FILE_TYPE_PROMO_FULL: &str = "6";

#[derive(Debug, Deserialize)]
struct ListedFile {
    #[serde(rename = "FileNm")]
    file_name: String,
}

#[derive(Debug, Deserialize)]
struct DownloadTarget {
    #[serde(rename = "SPath")]
    path: String,
}

#[derive(Debug, Clone)]
pub struct BinaProjectsAdapter {
    chain_code: String,
    alias: String,
    base_url: String,
}

impl BinaProjectsAdapter {
    #[must_use]
    pub fn new(
        chain_code: impl Into<String>,
        alias: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            chain_code: chain_code.into(),
            alias: alias.into(),
            base_url: base_url.into(),
        }
    }

    #[must_use]
    pub fn king_store(base_url: &str) -> Self {
        Self::new("7290058108879", "king-store", base_url)
    }

    #[must_use]
    pub fn maayan_2000(base_url: &str) -> Self {
        Self::new("7290058159628", "maayan-2000", base_url)
    }

    #[must_use]
    pub fn zol_vebegadol(base_url: &str) -> Self {
        Self::new("7290058173198", "zol-vebegadol", base_url)
    }

    /// Newest full file of `file_type` for the store, resolved to its
    /// download path.
    async fn resolve(
        &self,
        client: &FeedClient,
        store_code: &str,
        file_type: &str,
        kind: &str,
    ) -> Result<Option<String>, AcquisitionError> {
        let listing: Vec<ListedFile> = client
            .post_form(
                &join_url(&self.base_url, "MainIO_Hok.aspx"),
                &[
                    ("WStore", store_code.trim()),
                    ("WDate", ""),
                    ("WFileType", file_type),
                ],
                None,
            )
            .await?
            .json(&format!("{} {kind} listing", self.alias))?;

        let prefix = file_prefix(kind, &self.chain_code, store_code);
        let Some(name) =
            newest_with_prefix(listing.iter().map(|f| f.file_name.as_str()), &prefix)
        else {
            return Ok(None);
        };

        let download_url = format!(
            "{}?FileNm={name}",
            join_url(&self.base_url, "Download.aspx")
        );
        let targets: Vec<DownloadTarget> = client
            .get(&download_url, None)
            .await?
            .json(&format!("{} download target", self.alias))?;

        match targets.into_iter().next() {
            Some(target) => Ok(Some(target.path)),
            None => Err(AcquisitionError::FeedUnavailable {
                context: format!("{} file {name}", self.alias),
                reason: "download target missing".to_owned(),
            }),
        }
    }
}

#[async_trait]
impl ChainAdapter for BinaProjectsAdapter {
    fn chain_code(&self) -> &str {
        &self.chain_code
    }

    fn alias(&self) -> &str {
        &self.alias
    }

    async fn resolve_price_feed(
        &self,
        client: &FeedClient,
        store_code: &str,
    ) -> Result<FeedLocation, AcquisitionError> {
        self.resolve(client, store_code, FILE_TYPE_PRICE_FULL, "PriceFull")
            .await?
            .map(FeedLocation::public)
            .ok_or_else(|| no_feed(&self.alias, store_code, "PriceFull"))
    }

    async fn resolve_promo_feed(
        &self,
        client: &FeedClient,
        store_code: &str,
    ) -> Result<Option<FeedLocation>, AcquisitionError> {
        Ok(self
            .resolve(client, store_code, FILE_TYPE_PROMO_FULL, "PromoFull")
            .await?
            .map(FeedLocation::public))
    }
}
