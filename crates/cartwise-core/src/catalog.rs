//! Canonical catalog schema: the shape every chain feed is normalized into.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identity of one store: the chain's registry code plus the chain-local
/// store number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StoreKey {
    pub chain_code: String,
    pub store_code: String,
}

impl StoreKey {
    #[must_use]
    pub fn new(chain_code: impl Into<String>, store_code: impl Into<String>) -> Self {
        Self {
            chain_code: chain_code.into(),
            store_code: store_code.into(),
        }
    }

    /// Parses the `"<chain_code>_<store_code>"` planning-snapshot key.
    ///
    /// Chain codes never contain `_`, so the first separator splits the key.
    #[must_use]
    pub fn from_session_key(key: &str) -> Option<Self> {
        let (chain, store) = key.split_once('_')?;
        if chain.is_empty() || store.is_empty() || store.contains('_') {
            return None;
        }
        Some(Self::new(chain, store))
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.chain_code, self.store_code)
    }
}

/// A priced product as listed by one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Barcode or chain-internal code; unique within one store's catalog.
    pub code: String,
    pub name: String,
    /// Shelf price per unit, never negative.
    pub unit_price: Decimal,
    /// Unit of measure as published (e.g. `"ליטר"`, `"kg"`), if any.
    pub unit: Option<String>,
}

/// A promotion as published in a chain's promo feed.
///
/// Discount parameters are optional because which ones apply depends on the
/// reward family; see `cartwise_feeds::classify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub promotion_id: String,
    /// Vendor reward-type code, kept verbatim.
    pub reward_type: String,
    pub description: String,
    /// Discounted unit price for quantity-band offers.
    pub discounted_price: Option<Decimal>,
    /// Discount rate in hundredths of a percent (`1550` is 15.5%).
    pub discount_rate: Option<i64>,
    pub min_qty: Option<Decimal>,
    pub max_qty: Option<Decimal>,
    pub min_purchase_amount: Option<Decimal>,
    /// Vendor audience flag (`ClubId`); `None` when the feed omits it.
    pub club_id: Option<String>,
    pub ends_at: Option<NaiveDateTime>,
    /// Codes of the items the promotion applies to, in feed order.
    pub item_codes: Vec<String>,
}

/// A rule removing promotions from shopper-facing listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PromoExclusion {
    /// Every promotion targeted at this audience flag.
    Audience(String),
    /// One specific promotion id.
    PromotionId(String),
}

impl PromoExclusion {
    #[must_use]
    pub fn matches(&self, promo: &Promotion) -> bool {
        match self {
            PromoExclusion::Audience(club) => promo.club_id.as_deref() == Some(club.as_str()),
            PromoExclusion::PromotionId(id) => promo.promotion_id == *id,
        }
    }
}

/// Normalized in-memory catalog of one store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreCatalog {
    pub items: BTreeMap<String, Item>,
    /// Promotions per item code, preserving feed order.
    pub promotions: BTreeMap<String, Vec<Promotion>>,
}

impl StoreCatalog {
    /// Builds a catalog from parsed feed records.
    ///
    /// Items with a repeated code keep their first occurrence. Each promotion
    /// is listed under every item code it names.
    #[must_use]
    pub fn from_parts(items: Vec<Item>, promotions: Vec<Promotion>) -> Self {
        let mut by_code = BTreeMap::new();
        for item in items {
            by_code.entry(item.code.clone()).or_insert(item);
        }

        let mut promos: BTreeMap<String, Vec<Promotion>> = BTreeMap::new();
        for promo in promotions {
            let mut seen = HashSet::new();
            for code in &promo.item_codes {
                if seen.insert(code.as_str()) {
                    promos.entry(code.clone()).or_default().push(promo.clone());
                }
            }
        }

        Self {
            items: by_code,
            promotions: promos,
        }
    }

    /// Replaces the promotion index, keeping items.
    #[must_use]
    pub fn with_promotions(self, promotions: Vec<Promotion>) -> Self {
        let rebuilt = Self::from_parts(Vec::new(), promotions);
        Self {
            items: self.items,
            promotions: rebuilt.promotions,
        }
    }

    #[must_use]
    pub fn item(&self, code: &str) -> Option<&Item> {
        self.items.get(code)
    }

    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.items.contains_key(code)
    }

    /// Promotions for `code` that survive the chain's blacklist.
    #[must_use]
    pub fn promotions_for<'a>(
        &'a self,
        code: &str,
        blacklist: &'a HashSet<PromoExclusion>,
    ) -> Vec<&'a Promotion> {
        self.promotions
            .get(code)
            .map(|promos| {
                promos
                    .iter()
                    .filter(|p| !blacklist.iter().any(|rule| rule.matches(p)))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Number of distinct promotions (a promotion spanning several items
    /// counts once).
    #[must_use]
    pub fn promotion_count(&self) -> usize {
        self.promotions
            .values()
            .flatten()
            .map(|p| p.promotion_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}
