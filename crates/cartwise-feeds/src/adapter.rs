//! The per-chain adapter contract.

use std::collections::HashSet;

use async_trait::async_trait;
use cartwise_core::{Item, PromoExclusion, Promotion};

use crate::client::{FeedClient, SessionCredentials};
use crate::error::AcquisitionError;
use crate::normalize::{parse_price_feed, parse_promo_feed};

/// One downloadable feed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedLocation {
    pub url: String,
    /// Cookies the download must carry, for portals behind a login.
    pub session_credentials: Option<SessionCredentials>,
}

impl FeedLocation {
    #[must_use]
    pub fn public(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            session_credentials: None,
        }
    }
}

/// Where a store's current feeds can be downloaded from.
///
/// The promo side carries its own outcome: a failed promo lookup never
/// hides a resolved price feed.
#[derive(Debug)]
pub struct FeedLocations {
    pub price: FeedLocation,
    /// `Ok(None)` when the chain lists no promo file for the store.
    pub promo: Result<Option<FeedLocation>, AcquisitionError>,
}

/// One supermarket chain's publishing protocol.
///
/// Adapters hold only immutable configuration, so one instance is shared by
/// every concurrent acquisition for that chain. Price and promo discovery
/// are separate operations so that either can run (and fail) alone.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    /// Government registry code of the chain, e.g. `"7290027600007"`.
    fn chain_code(&self) -> &str;

    /// Short lowercase name, e.g. `"shufersal"`.
    fn alias(&self) -> &str;

    /// Finds the newest full price file for `store_code`.
    ///
    /// # Errors
    ///
    /// [`AcquisitionError::FeedUnavailable`] if the chain lists no price file
    /// for the store, or any network/auth error reaching the portal.
    async fn resolve_price_feed(
        &self,
        client: &FeedClient,
        store_code: &str,
    ) -> Result<FeedLocation, AcquisitionError>;

    /// Finds the newest full promo file for `store_code`, if one is listed.
    ///
    /// # Errors
    ///
    /// Any network/auth error reaching the portal's promo listing.
    async fn resolve_promo_feed(
        &self,
        client: &FeedClient,
        store_code: &str,
    ) -> Result<Option<FeedLocation>, AcquisitionError>;

    /// Resolves both feeds. Only a price-side failure fails the call.
    ///
    /// # Errors
    ///
    /// See [`ChainAdapter::resolve_price_feed`].
    async fn resolve_feed_locations(
        &self,
        client: &FeedClient,
        store_code: &str,
    ) -> Result<FeedLocations, AcquisitionError> {
        let price = self.resolve_price_feed(client, store_code).await?;
        let promo = self.resolve_promo_feed(client, store_code).await;
        Ok(FeedLocations { price, promo })
    }

    /// # Errors
    ///
    /// See [`parse_price_feed`].
    fn parse_prices(&self, xml: &str) -> Result<Vec<Item>, AcquisitionError> {
        parse_price_feed(xml)
    }

    /// # Errors
    ///
    /// See [`parse_promo_feed`].
    fn parse_promos(&self, xml: &str) -> Result<Vec<Promotion>, AcquisitionError> {
        parse_promo_feed(xml)
    }

    /// Promotions hidden from shopper-facing listings.
    fn promo_blacklist(&self) -> HashSet<PromoExclusion> {
        HashSet::new()
    }

    /// Who may redeem `promo`, in words.
    fn promo_audience(&self, promo: &Promotion) -> String {
        default_audience(promo.club_id.as_deref())
    }
}

/// Audience text for the standard `ClubId` values.
#[must_use]
pub fn default_audience(club_id: Option<&str>) -> String {
    match club_id {
        None => "Not specified".to_owned(),
        Some("0") => "All customers".to_owned(),
        Some("1") => "Club members".to_owned(),
        Some("2") => "Credit-card holders".to_owned(),
        Some(other) => format!("Other (code {other})"),
    }
}
