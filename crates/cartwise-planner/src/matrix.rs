//! The price matrix the optimizer searches over.
//!
//! A matrix is only ever built when every candidate store prices every list
//! entry, either under the entry's canonical code or under an explicit
//! substitute. Stores lacking coverage are rejected; excluding them is the
//! caller's decision, made with [`coverage_report`] before building.

use std::collections::{BTreeMap, HashMap, HashSet};

use cartwise_core::{Item, ShoppingList, ShoppingListEntry, StoreCatalog, StoreKey};
use rust_decimal::Decimal;

use crate::error::OptimizerInputError;

/// Explicit store-specific stand-ins for canonical item codes.
#[derive(Debug, Clone, Default)]
pub struct Substitutions {
    by_store: HashMap<(StoreKey, String), String>,
}

impl Substitutions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// In `store`, buy `store_item_code` in place of `canonical_code`.
    pub fn insert(
        &mut self,
        store: StoreKey,
        canonical_code: impl Into<String>,
        store_item_code: impl Into<String>,
    ) {
        self.by_store
            .insert((store, canonical_code.into()), store_item_code.into());
    }

    #[must_use]
    pub fn get(&self, store: &StoreKey, canonical_code: &str) -> Option<&str> {
        self.by_store
            .get(&(store.clone(), canonical_code.to_owned()))
            .map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_store.is_empty()
    }
}

/// Which list entries each store cannot price.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageReport {
    missing: BTreeMap<StoreKey, Vec<String>>,
}

impl CoverageReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Canonical codes `store` lacks, in list order.
    #[must_use]
    pub fn missing_for(&self, store: &StoreKey) -> &[String] {
        self.missing.get(store).map_or(&[], Vec::as_slice)
    }

    pub fn incomplete_stores(&self) -> impl Iterator<Item = &StoreKey> {
        self.missing.keys()
    }
}

/// Lists, per store, the entries that neither the store's catalog nor an
/// explicit substitution covers. A store with no catalog lacks everything.
#[must_use]
pub fn coverage_report(
    stores: &[StoreKey],
    catalogs: &BTreeMap<StoreKey, StoreCatalog>,
    list: &ShoppingList,
    substitutions: &Substitutions,
) -> CoverageReport {
    let mut missing = BTreeMap::new();
    for store in stores {
        let catalog = catalogs.get(store);
        let gaps: Vec<String> = list
            .entries()
            .iter()
            .filter(|entry| {
                catalog.map_or(true, |c| {
                    resolve_item(store, c, &entry.item_code, substitutions).is_none()
                })
            })
            .map(|entry| entry.item_code.clone())
            .collect();
        if !gaps.is_empty() {
            missing.insert(store.clone(), gaps);
        }
    }
    CoverageReport { missing }
}

fn resolve_item<'a>(
    store: &StoreKey,
    catalog: &'a StoreCatalog,
    canonical_code: &str,
    substitutions: &Substitutions,
) -> Option<&'a Item> {
    catalog.item(canonical_code).or_else(|| {
        substitutions
            .get(store, canonical_code)
            .and_then(|code| catalog.item(code))
    })
}

/// Unit prices of every list entry at every candidate store.
///
/// Each cell keeps the store's own [`Item`], so plans report the code and
/// name the store itself uses.
#[derive(Debug, Clone)]
pub struct PriceMatrix {
    stores: Vec<StoreKey>,
    entries: Vec<ShoppingListEntry>,
    /// `cells[store][entry]`.
    cells: Vec<Vec<Item>>,
}

impl PriceMatrix {
    /// Builds the matrix for `stores`, in the given order.
    ///
    /// # Errors
    ///
    /// - [`OptimizerInputError::NoCandidateStores`] if `stores` is empty.
    /// - [`OptimizerInputError::DuplicateStore`] if a store repeats.
    /// - [`OptimizerInputError::MissingCatalog`] if a store has no catalog.
    /// - [`OptimizerInputError::InvalidSubstitution`] if a substitute code
    ///   is not in the store's catalog.
    /// - [`OptimizerInputError::MissingCoverage`] if a store cannot price an
    ///   entry.
    /// - [`OptimizerInputError::CostOverflow`] if buying every entry at its
    ///   dearest store could not be totalled in a [`Decimal`].
    pub fn build(
        stores: &[StoreKey],
        catalogs: &BTreeMap<StoreKey, StoreCatalog>,
        list: &ShoppingList,
        substitutions: &Substitutions,
    ) -> Result<Self, OptimizerInputError> {
        if stores.is_empty() {
            return Err(OptimizerInputError::NoCandidateStores);
        }

        let mut seen = HashSet::new();
        let mut cells = Vec::with_capacity(stores.len());
        for store in stores {
            if !seen.insert(store) {
                return Err(OptimizerInputError::DuplicateStore(store.clone()));
            }
            let catalog = catalogs
                .get(store)
                .ok_or_else(|| OptimizerInputError::MissingCatalog(store.clone()))?;

            let row = list
                .entries()
                .iter()
                .map(|entry| price_cell(store, catalog, &entry.item_code, substitutions))
                .collect::<Result<Vec<_>, _>>()?;
            cells.push(row);
        }
        check_cost_bound(list.entries(), &cells)?;

        tracing::debug!(
            stores = stores.len(),
            entries = list.len(),
            "built price matrix"
        );

        Ok(Self {
            stores: stores.to_vec(),
            entries: list.entries().to_vec(),
            cells,
        })
    }

    #[must_use]
    pub fn stores(&self) -> &[StoreKey] {
        &self.stores
    }

    #[must_use]
    pub fn entries(&self) -> &[ShoppingListEntry] {
        &self.entries
    }

    #[must_use]
    pub fn store_count(&self) -> usize {
        self.stores.len()
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// The item `store_idx` sells for entry `entry_idx`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[must_use]
    pub fn item(&self, store_idx: usize, entry_idx: usize) -> &Item {
        &self.cells[store_idx][entry_idx]
    }

    #[must_use]
    pub fn unit_price(&self, store_idx: usize, entry_idx: usize) -> Decimal {
        self.cells[store_idx][entry_idx].unit_price
    }

    #[must_use]
    pub fn store_index(&self, store: &StoreKey) -> Option<usize> {
        self.stores.iter().position(|s| s == store)
    }

    /// Cost of buying the whole list at `store_idx` alone.
    #[must_use]
    pub fn store_total(&self, store_idx: usize) -> Decimal {
        self.entries
            .iter()
            .enumerate()
            .map(|(e, entry)| entry.quantity * self.unit_price(store_idx, e))
            .sum()
    }

    /// Whole-list cost at each store on its own, in store order.
    #[must_use]
    pub fn store_totals(&self) -> Vec<(StoreKey, Decimal)> {
        self.stores
            .iter()
            .enumerate()
            .map(|(s, store)| (store.clone(), self.store_total(s)))
            .collect()
    }
}

/// Every subset cost, store total and plan line is bounded by the sum over
/// entries of the largest `|quantity * unit_price|` across stores, so once
/// that sum fits the optimizer's arithmetic cannot overflow.
fn check_cost_bound(
    entries: &[ShoppingListEntry],
    cells: &[Vec<Item>],
) -> Result<(), OptimizerInputError> {
    let mut bound = Decimal::ZERO;
    for (e, entry) in entries.iter().enumerate() {
        let overflow = || OptimizerInputError::CostOverflow {
            item_code: entry.item_code.clone(),
        };
        let mut dearest = Decimal::ZERO;
        for row in cells {
            let line = entry
                .quantity
                .abs()
                .checked_mul(row[e].unit_price.abs())
                .ok_or_else(overflow)?;
            dearest = dearest.max(line);
        }
        bound = bound.checked_add(dearest).ok_or_else(overflow)?;
    }
    Ok(())
}

fn price_cell(
    store: &StoreKey,
    catalog: &StoreCatalog,
    canonical_code: &str,
    substitutions: &Substitutions,
) -> Result<Item, OptimizerInputError> {
    if let Some(item) = catalog.item(canonical_code) {
        return Ok(item.clone());
    }
    match substitutions.get(store, canonical_code) {
        Some(substitute) => catalog.item(substitute).cloned().ok_or_else(|| {
            OptimizerInputError::InvalidSubstitution {
                store: store.clone(),
                item_code: canonical_code.to_owned(),
                substitute: substitute.to_owned(),
            }
        }),
        None => Err(OptimizerInputError::MissingCoverage {
            store: store.clone(),
            item_code: canonical_code.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(code: &str, name: &str, price: Decimal) -> Item {
        Item {
            code: code.into(),
            name: name.into(),
            unit_price: price,
            unit: None,
        }
    }

    fn setup() -> (Vec<StoreKey>, BTreeMap<StoreKey, StoreCatalog>, ShoppingList) {
        let a = StoreKey::new("1", "001");
        let b = StoreKey::new("2", "002");
        let mut catalogs = BTreeMap::new();
        catalogs.insert(
            a.clone(),
            StoreCatalog::from_parts(
                vec![item("100", "Milk", dec!(3)), item("200", "Bread", dec!(10))],
                vec![],
            ),
        );
        catalogs.insert(
            b.clone(),
            StoreCatalog::from_parts(
                vec![item("100", "Milk 1L", dec!(5)), item("B-7", "Rye bread", dec!(4))],
                vec![],
            ),
        );
        let mut list = ShoppingList::new();
        list.add("100", dec!(2)).unwrap();
        list.add("200", dec!(1)).unwrap();
        (vec![a, b], catalogs, list)
    }

    #[test]
    fn incomplete_store_is_rejected() {
        let (stores, catalogs, list) = setup();
        let err = PriceMatrix::build(&stores, &catalogs, &list, &Substitutions::new()).unwrap_err();
        assert_eq!(
            err,
            OptimizerInputError::MissingCoverage {
                store: stores[1].clone(),
                item_code: "200".into()
            }
        );
    }

    #[test]
    fn substitution_fills_gap_with_store_item() {
        let (stores, catalogs, list) = setup();
        let mut subs = Substitutions::new();
        subs.insert(stores[1].clone(), "200", "B-7");

        let matrix = PriceMatrix::build(&stores, &catalogs, &list, &subs).unwrap();
        assert_eq!(matrix.item(1, 1).name, "Rye bread");
        assert_eq!(matrix.item(1, 0).name, "Milk 1L");
        assert_eq!(matrix.unit_price(1, 1), dec!(4));
    }

    #[test]
    fn substitute_must_exist_in_store() {
        let (stores, catalogs, list) = setup();
        let mut subs = Substitutions::new();
        subs.insert(stores[1].clone(), "200", "nope");
        assert!(matches!(
            PriceMatrix::build(&stores, &catalogs, &list, &subs),
            Err(OptimizerInputError::InvalidSubstitution { .. })
        ));
    }

    #[test]
    fn coverage_report_lists_gaps() {
        let (mut stores, catalogs, list) = setup();
        let ghost = StoreKey::new("3", "003");
        stores.push(ghost.clone());

        let report = coverage_report(&stores, &catalogs, &list, &Substitutions::new());
        assert!(!report.is_complete());
        assert!(report.missing_for(&stores[0]).is_empty());
        assert_eq!(report.missing_for(&stores[1]), ["200"]);
        assert_eq!(report.missing_for(&ghost), ["100", "200"]);
        assert_eq!(report.incomplete_stores().count(), 2);
    }

    #[test]
    fn rejects_empty_and_duplicate_store_sets() {
        let (stores, catalogs, list) = setup();
        let subs = Substitutions::new();
        assert_eq!(
            PriceMatrix::build(&[], &catalogs, &list, &subs).unwrap_err(),
            OptimizerInputError::NoCandidateStores
        );
        let twice = [stores[0].clone(), stores[0].clone()];
        assert_eq!(
            PriceMatrix::build(&twice, &catalogs, &list, &subs).unwrap_err(),
            OptimizerInputError::DuplicateStore(stores[0].clone())
        );
    }

    #[test]
    fn oversized_line_cost_is_rejected() {
        let (stores, catalogs, _) = setup();
        let mut list = ShoppingList::new();
        list.add("100", Decimal::MAX).unwrap();

        assert_eq!(
            PriceMatrix::build(&stores[..1], &catalogs, &list, &Substitutions::new()).unwrap_err(),
            OptimizerInputError::CostOverflow {
                item_code: "100".into()
            }
        );
    }

    #[test]
    fn list_total_past_decimal_range_is_rejected() {
        let (stores, catalogs, _) = setup();
        let mut list = ShoppingList::new();
        // 6e28 and 2e28 each fit; their sum does not.
        list.add("100", dec!(20000000000000000000000000000)).unwrap();
        list.add("200", dec!(2000000000000000000000000000)).unwrap();

        assert_eq!(
            PriceMatrix::build(&stores[..1], &catalogs, &list, &Substitutions::new()).unwrap_err(),
            OptimizerInputError::CostOverflow {
                item_code: "200".into()
            }
        );
    }

    #[test]
    fn store_totals_price_whole_list_per_store() {
        let (stores, catalogs, list) = setup();
        let mut subs = Substitutions::new();
        subs.insert(stores[1].clone(), "200", "B-7");
        let matrix = PriceMatrix::build(&stores, &catalogs, &list, &subs).unwrap();

        assert_eq!(
            matrix.store_totals(),
            vec![(stores[0].clone(), dec!(16)), (stores[1].clone(), dec!(14))]
        );
    }
}
