//! Hooks for reconciling items a store does not carry under the list's code.
//!
//! Matching a reference item to similar products in another catalog is an
//! external concern; this module only fixes when it is consulted and the
//! shape of its answer.

use std::collections::BTreeMap;

use cartwise_core::{Item, ShoppingList, StoreCatalog, StoreKey};

use crate::matrix::{CoverageReport, Substitutions};

/// Ranks substitutes for `reference` among a target store's catalog, best
/// first.
pub trait AlternativeMatcher {
    fn candidates<'a>(&self, reference: &Item, target: &'a StoreCatalog) -> Vec<&'a Item>;
}

/// Ranked substitutes for `item_code` in `target`.
///
/// Returns an empty list without consulting `matcher` when the target
/// already carries the code, or when the reference catalog does not know
/// the item either.
pub fn substitution_candidates<'a>(
    matcher: &dyn AlternativeMatcher,
    reference: &StoreCatalog,
    target: &'a StoreCatalog,
    item_code: &str,
) -> Vec<&'a Item> {
    if target.contains(item_code) {
        return Vec::new();
    }
    match reference.item(item_code) {
        Some(item) => matcher.candidates(item, target),
        None => Vec::new(),
    }
}

/// Fills every gap in `report` that `list` still names with the matcher's
/// top-ranked candidate. Gaps with no candidate stay open.
///
/// `reference` is the catalog the list's codes come from.
pub fn auto_substitute(
    matcher: &dyn AlternativeMatcher,
    reference: &StoreCatalog,
    catalogs: &BTreeMap<StoreKey, StoreCatalog>,
    list: &ShoppingList,
    report: &CoverageReport,
) -> Substitutions {
    let mut substitutions = Substitutions::new();
    for store in report.incomplete_stores() {
        let Some(target) = catalogs.get(store) else {
            continue;
        };
        for code in report
            .missing_for(store)
            .iter()
            .filter(|code| list.contains(code))
        {
            if let Some(best) = substitution_candidates(matcher, reference, target, code).first() {
                tracing::debug!(
                    store = %store,
                    item_code = %code,
                    substitute = %best.code,
                    "substituting missing item"
                );
                substitutions.insert(store.clone(), code.clone(), best.code.clone());
            }
        }
    }
    substitutions
}
