//! Minimum-cost store selection under a visit limit.
//!
//! Costs are additive and independent per entry, so for a fixed store subset
//! the cheapest assignment sends each entry to the subset store with the
//! lowest unit price. The search therefore enumerates every subset of size
//! `1..=k` and keeps the cheapest. Candidate sets are small (a shopper picks a
//! handful of stores), which keeps the exhaustive search cheap.

use cartwise_core::{Item, StoreKey};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::OptimizerInputError;
use crate::matrix::PriceMatrix;

/// One entry bought at one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanLine {
    /// Canonical code from the shopping list.
    pub list_code: String,
    /// The item as the store lists it.
    pub item: Item,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorePlan {
    pub store: StoreKey,
    /// In shopping-list order. Empty when the store wins no entry.
    pub lines: Vec<PlanLine>,
}

impl StorePlan {
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(|l| l.line_total).sum()
    }
}

/// The optimizer's answer for one visit limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingPlan {
    /// Stores to visit, in matrix order.
    pub subset: Vec<StoreKey>,
    pub total: Decimal,
    /// One plan per store in `subset`, same order.
    pub store_plans: Vec<StorePlan>,
}

impl ShoppingPlan {
    /// How much cheaper this plan is than buying everything at `store`.
    /// `None` if `store` is not in the matrix.
    #[must_use]
    pub fn savings_against(&self, matrix: &PriceMatrix, store: &StoreKey) -> Option<Decimal> {
        matrix
            .store_index(store)
            .and_then(|idx| matrix.store_total(idx).checked_sub(self.total))
    }
}

/// Finds the cheapest way to buy the matrix's list visiting at most
/// `max_stores` stores.
///
/// Subsets are tried by size, then in lexicographic order of store
/// positions; a later subset replaces the best only if strictly cheaper.
/// Within a subset, price ties go to the store listed first.
///
/// # Errors
///
/// [`OptimizerInputError::VisitLimitOutOfRange`] unless
/// `1 <= max_stores <= matrix.store_count()`.
pub fn optimize(
    matrix: &PriceMatrix,
    max_stores: usize,
) -> Result<ShoppingPlan, OptimizerInputError> {
    let m = matrix.store_count();
    if max_stores == 0 || max_stores > m {
        return Err(OptimizerInputError::VisitLimitOutOfRange { k: max_stores, m });
    }

    let mut best: Option<(Vec<usize>, Decimal)> = None;
    let mut examined = 0usize;
    for size in 1..=max_stores {
        for subset in Combinations::new(m, size) {
            examined += 1;
            let total = subset_cost(matrix, &subset);
            if best.as_ref().map_or(true, |(_, best_total)| total < *best_total) {
                best = Some((subset, total));
            }
        }
    }

    // `m >= 1` and `max_stores >= 1`, so at least one subset was examined.
    let (subset, total) = best.ok_or(OptimizerInputError::NoCandidateStores)?;
    tracing::debug!(max_stores, examined, %total, "store selection finished");
    Ok(build_plan(matrix, &subset, total))
}

/// Plans for every visit limit from 1 to the number of stores.
#[must_use]
pub fn optimize_sweep(matrix: &PriceMatrix) -> Vec<ShoppingPlan> {
    (1..=matrix.store_count())
        .filter_map(|k| optimize(matrix, k).ok())
        .collect()
}

/// Total cost when each entry goes to its cheapest store among `subset`
/// (store positions in the matrix).
#[must_use]
pub fn subset_cost(matrix: &PriceMatrix, subset: &[usize]) -> Decimal {
    matrix
        .entries()
        .iter()
        .enumerate()
        .map(|(e, entry)| {
            let (_, price) = cheapest(matrix, subset, e);
            entry.quantity * price
        })
        .sum()
}

/// The first store in `subset` offering the lowest price for entry `e`.
fn cheapest(matrix: &PriceMatrix, subset: &[usize], e: usize) -> (usize, Decimal) {
    let mut best = (subset[0], matrix.unit_price(subset[0], e));
    for &s in &subset[1..] {
        let price = matrix.unit_price(s, e);
        if price < best.1 {
            best = (s, price);
        }
    }
    best
}

fn build_plan(matrix: &PriceMatrix, subset: &[usize], total: Decimal) -> ShoppingPlan {
    let mut store_plans: Vec<StorePlan> = subset
        .iter()
        .map(|&s| StorePlan {
            store: matrix.stores()[s].clone(),
            lines: Vec::new(),
        })
        .collect();

    for (e, entry) in matrix.entries().iter().enumerate() {
        let (store, unit_price) = cheapest(matrix, subset, e);
        let slot = subset.iter().position(|&s| s == store).unwrap_or_default();
        store_plans[slot].lines.push(PlanLine {
            list_code: entry.item_code.clone(),
            item: matrix.item(store, e).clone(),
            quantity: entry.quantity,
            unit_price,
            line_total: entry.quantity * unit_price,
        });
    }

    ShoppingPlan {
        subset: subset.iter().map(|&s| matrix.stores()[s].clone()).collect(),
        total,
        store_plans,
    }
}

/// `size`-element subsets of `0..n` in lexicographic order.
struct Combinations {
    n: usize,
    indices: Vec<usize>,
    done: bool,
}

impl Combinations {
    fn new(n: usize, size: usize) -> Self {
        Self {
            n,
            indices: (0..size).collect(),
            done: size == 0 || size > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self.indices.clone();

        // Advance the rightmost index that still has room.
        let size = self.indices.len();
        match (0..size).rev().find(|&i| self.indices[i] < self.n - size + i) {
            Some(i) => {
                self.indices[i] += 1;
                for j in i + 1..size {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
            }
            None => self.done = true,
        }
        Some(current)
    }
}
