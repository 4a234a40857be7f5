//! Chains hosted on the shared "published prices" portal.
//!
//! The portal requires a per-chain login (no password) before its file
//! listing can be queried, so downloads carry the session cookies.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use super::listing::{file_prefix, join_url, newest_with_prefix, no_feed};
use crate::adapter::{ChainAdapter, FeedLocation};
use crate::client::{FeedClient, SessionCredentials};
use crate::error::AcquisitionError;

pub const PUBLISHED_PRICES_BASE_URL: &str = "https://url.publishedprices.co.il";

#[derive(Debug, Deserialize)]
struct DirListing {
    #[serde(rename = "aaData", default)]
    files: Vec<DirEntry>,
}

#[derive(Debug, Deserialize)]
struct DirEntry {
    fname: String,
}

#[derive(Debug, Clone)]
pub struct PublishedPricesAdapter {
    chain_code: String,
    alias: String,
    username: String,
    base_url: String,
}

impl PublishedPricesAdapter {
    #[must_use]
    pub fn new(
        chain_code: impl Into<String>,
        alias: impl Into<String>,
        username: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            chain_code: chain_code.into(),
            alias: alias.into(),
            username: username.into(),
            base_url: base_url.into(),
        }
    }

    #[must_use]
    pub fn rami_levy(base_url: &str) -> Self {
        Self::new("7290058140886", "rami-levy", "RamiLevi", base_url)
    }

    #[must_use]
    pub fn osher_ad(base_url: &str) -> Self {
        Self::new("7290103152017", "osher-ad", "osherad", base_url)
    }

    #[must_use]
    pub fn yohananof(base_url: &str) -> Self {
        Self::new("7290803800003", "yohananof", "yohananof", base_url)
    }

    #[must_use]
    pub fn tiv_taam(base_url: &str) -> Self {
        Self::new("7290873255550", "tiv-taam", "TivTaam", base_url)
    }

    /// Logs in and returns the session cookies plus the CSRF token the
    /// listing endpoint expects.
    async fn login(
        &self,
        client: &FeedClient,
    ) -> Result<(SessionCredentials, String), AcquisitionError> {
        let login_page = client.get(&join_url(&self.base_url, "login"), None).await?;
        let mut credentials = SessionCredentials::from_set_cookies(login_page.cookies());
        let token = csrf_token(&login_page.text()).ok_or_else(|| AcquisitionError::Auth {
            context: self.alias.clone(),
            reason: "login page has no csrftoken".to_owned(),
        })?;

        let response = client
            .post_form(
                &join_url(&self.base_url, "login/user"),
                &[
                    ("username", self.username.as_str()),
                    ("password", ""),
                    ("csrftoken", token.as_str()),
                ],
                Some(&credentials),
            )
            .await?;
        credentials.merge(response.cookies());

        if credentials.is_empty() {
            return Err(AcquisitionError::Auth {
                context: self.alias.clone(),
                reason: "login set no session cookie".to_owned(),
            });
        }
        tracing::debug!(chain = %self.alias, "logged in to published-prices portal");
        Ok((credentials, token))
    }

    async fn list_files(
        &self,
        client: &FeedClient,
        credentials: &SessionCredentials,
        token: &str,
        search: &str,
    ) -> Result<Vec<String>, AcquisitionError> {
        let response = client
            .post_form(
                &join_url(&self.base_url, "file/json/dir"),
                &[
                    ("sEcho", "1"),
                    ("iDisplayStart", "0"),
                    ("iDisplayLength", "100000"),
                    ("sSearch", search),
                    ("csrftoken", token),
                ],
                Some(credentials),
            )
            .await?;
        let listing: DirListing = response.json(&format!("{} file listing", self.alias))?;
        Ok(listing.files.into_iter().map(|f| f.fname).collect())
    }

    /// Logs in and finds the newest `kind` file for the store. The download
    /// carries the session that listed it.
    async fn newest_file(
        &self,
        client: &FeedClient,
        store_code: &str,
        kind: &str,
    ) -> Result<Option<FeedLocation>, AcquisitionError> {
        let (credentials, token) = self.login(client).await?;
        let prefix = file_prefix(kind, &self.chain_code, store_code);
        let files = self.list_files(client, &credentials, &token, &prefix).await?;

        let Some(name) = newest_with_prefix(files.iter().map(String::as_str), &prefix) else {
            return Ok(None);
        };
        Ok(Some(FeedLocation {
            url: join_url(&self.base_url, &format!("file/d/{name}")),
            session_credentials: Some(credentials),
        }))
    }
}

fn csrf_token(html: &str) -> Option<String> {
    static META: OnceLock<Regex> = OnceLock::new();
    let re = META.get_or_init(|| {
        Regex::new(r#"<meta\s+name=["']csrftoken["']\s+content=["']([^"']+)["']"#)
            .expect("valid regex")
    });
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
}

#[async_trait]
impl ChainAdapter for PublishedPricesAdapter {
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
        self.newest_file(client, store_code, "PriceFull")
            .await?
            .ok_or_else(|| no_feed(&self.alias, store_code, "PriceFull"))
    }

    async fn resolve_promo_feed(
        &self,
        client: &FeedClient,
        store_code: &str,
    ) -> Result<Option<FeedLocation>, AcquisitionError> {
        self.newest_file(client, store_code, "PromoFull").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_csrf_meta_tag() {
        let html = r#"<head><meta name="csrftoken" content="abc123"></head>"#;
        assert_eq!(csrf_token(html).as_deref(), Some("abc123"));
        assert_eq!(csrf_token("<head></head>"), None);
    }

    #[test]
    fn listing_tolerates_missing_data() {
        let listing: DirListing = serde_json::from_str(r#"{"iTotalRecords":0}"#).unwrap();
        assert!(listing.files.is_empty());
    }
}
