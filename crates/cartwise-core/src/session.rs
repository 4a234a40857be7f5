//! Key formats callers use when persisting acquisition results in a session.
//!
//! These strings are part of the contract with the interactive layer and must
//! not change shape.

use crate::catalog::StoreKey;

/// Key under which a single-store price catalog is stored:
/// `"<chain_code>_<store_code>_price_data"`.
#[must_use]
pub fn price_data_key(key: &StoreKey) -> String {
    format!("{key}_price_data")
}

/// Key under which a single-store promotion set is stored:
/// `"<chain_code>_<store_code>_promo_data"`.
#[must_use]
pub fn promo_data_key(key: &StoreKey) -> String {
    format!("{key}_promo_data")
}

/// Key under which a planning snapshot entry is stored:
/// `"<chain_code>_<store_code>"`.
#[must_use]
pub fn planning_key(key: &StoreKey) -> String {
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_session_formats() {
        let key = StoreKey::new("7290027600007", "12");
        assert_eq!(price_data_key(&key), "7290027600007_12_price_data");
        assert_eq!(promo_data_key(&key), "7290027600007_12_promo_data");
        assert_eq!(planning_key(&key), "7290027600007_12");
    }
}
