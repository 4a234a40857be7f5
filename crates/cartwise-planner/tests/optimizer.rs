//! Store-selection properties over small hand-built catalogs.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use cartwise_core::{Item, ShoppingList, StoreCatalog, StoreKey};
use cartwise_planner::{
    optimize, optimize_sweep, subset_cost, OptimizerInputError, PriceMatrix, Substitutions,
};

fn store(n: u8) -> StoreKey {
    StoreKey::new(format!("729000000000{n}"), format!("{n:03}"))
}

/// One catalog per price column; item `i` is coded `"{i}"` and named after
/// its store so plans show whose item was used.
fn matrix(prices: &[&[Decimal]], quantities: &[Decimal]) -> PriceMatrix {
    let stores: Vec<StoreKey> = (1..=prices.len())
        .map(|n| store(u8::try_from(n).unwrap()))
        .collect();
    let mut catalogs = BTreeMap::new();
    for (key, row) in stores.iter().zip(prices) {
        let items = row
            .iter()
            .enumerate()
            .map(|(i, price)| Item {
                code: i.to_string(),
                name: format!("item {i} @ {}", key.store_code),
                unit_price: *price,
                unit: None,
            })
            .collect();
        catalogs.insert(key.clone(), StoreCatalog::from_parts(items, vec![]));
    }
    let mut list = ShoppingList::new();
    for (i, qty) in quantities.iter().enumerate() {
        list.add(i.to_string(), *qty).unwrap();
    }
    PriceMatrix::build(&stores, &catalogs, &list, &Substitutions::new()).unwrap()
}

fn worked_example() -> PriceMatrix {
    // Store A: 3, 10. Store B: 5, 4. Quantities 2 and 1.
    matrix(&[&[dec!(3), dec!(10)], &[dec!(5), dec!(4)]], &[dec!(2), dec!(1)])
}

fn five_store_matrix() -> PriceMatrix {
    matrix(
        &[
            &[dec!(4.90), dec!(12.00), dec!(7.50), dec!(3.20)],
            &[dec!(5.10), dec!(9.90), dec!(8.00), dec!(3.50)],
            &[dec!(4.50), dec!(13.40), dec!(6.90), dec!(3.90)],
            &[dec!(6.00), dec!(10.50), dec!(6.40), dec!(2.80)],
            &[dec!(5.00), dec!(11.00), dec!(9.00), dec!(3.00)],
        ],
        &[dec!(2), dec!(1), dec!(3), dec!(0.75)],
    )
}

#[test]
fn worked_example_two_stores() {
    let m = worked_example();
    let plan = optimize(&m, 2).unwrap();

    assert_eq!(plan.subset, vec![store(1), store(2)]);
    assert_eq!(plan.total, dec!(10));
    assert_eq!(plan.store_plans[0].lines.len(), 1);
    assert_eq!(plan.store_plans[0].lines[0].list_code, "0");
    assert_eq!(plan.store_plans[0].lines[0].line_total, dec!(6));
    assert_eq!(plan.store_plans[1].lines[0].list_code, "1");
    assert_eq!(plan.store_plans[1].lines[0].line_total, dec!(4));
}

#[test]
fn worked_example_single_store() {
    let plan = optimize(&worked_example(), 1).unwrap();
    assert_eq!(plan.subset, vec![store(2)]);
    assert_eq!(plan.total, dec!(14));
}

#[test]
fn raising_visit_limit_never_costs_more() {
    let m = five_store_matrix();
    let totals: Vec<Decimal> = optimize_sweep(&m).iter().map(|p| p.total).collect();
    assert_eq!(totals.len(), 5);
    for pair in totals.windows(2) {
        assert!(pair[1] <= pair[0], "{totals:?}");
    }
}

#[test]
fn subset_cost_is_sum_of_per_item_minimums() {
    let m = five_store_matrix();
    for subset in [vec![0], vec![1, 3], vec![0, 2, 4], vec![0, 1, 2, 3, 4]] {
        let expected: Decimal = m
            .entries()
            .iter()
            .enumerate()
            .map(|(e, entry)| {
                let min = subset
                    .iter()
                    .map(|&s| m.unit_price(s, e))
                    .min()
                    .unwrap();
                min * entry.quantity
            })
            .sum();
        assert_eq!(subset_cost(&m, &subset), expected, "subset {subset:?}");
    }
}

#[test]
fn optimum_beats_every_subset_within_limit() {
    let m = five_store_matrix();
    let plan = optimize(&m, 2).unwrap();
    for a in 0..5 {
        assert!(plan.total <= subset_cost(&m, &[a]));
        for b in a + 1..5 {
            assert!(plan.total <= subset_cost(&m, &[a, b]));
        }
    }
}

#[test]
fn identical_inputs_give_identical_plans() {
    let m = five_store_matrix();
    assert_eq!(optimize(&m, 3).unwrap(), optimize(&m, 3).unwrap());
}

#[test]
fn plan_lines_add_up() {
    let m = five_store_matrix();
    for plan in optimize_sweep(&m) {
        let mut sum = Decimal::ZERO;
        for store_plan in &plan.store_plans {
            for line in &store_plan.lines {
                assert_eq!(line.line_total, line.quantity * line.unit_price);
                assert_eq!(line.unit_price, line.item.unit_price);
                sum += line.line_total;
            }
        }
        assert_eq!(sum, plan.total);
        let lines: usize = plan.store_plans.iter().map(|p| p.lines.len()).sum();
        assert_eq!(lines, m.entry_count());
    }
}

#[test]
fn plan_uses_each_stores_own_item() {
    let plan = optimize(&worked_example(), 2).unwrap();
    assert_eq!(plan.store_plans[0].lines[0].item.name, "item 0 @ 001");
    assert_eq!(plan.store_plans[1].lines[0].item.name, "item 1 @ 002");
}

#[test]
fn empty_list_resolves_to_first_single_store() {
    let no_prices: &[Decimal] = &[];
    let m = matrix(&[no_prices, no_prices, no_prices], &[]);
    let plan = optimize(&m, 3).unwrap();
    assert_eq!(plan.subset, vec![store(1)]);
    assert_eq!(plan.total, Decimal::ZERO);
    assert!(plan.store_plans[0].lines.is_empty());
}

#[test]
fn ties_go_to_earlier_subset_and_store() {
    let m = matrix(&[&[dec!(5), dec!(2)], &[dec!(5), dec!(2)]], &[dec!(1), dec!(1)]);
    let plan = optimize(&m, 2).unwrap();
    assert_eq!(plan.subset, vec![store(1)]);

    let both = matrix(
        &[&[dec!(5), dec!(1), dec!(9)], &[dec!(5), dec!(9), dec!(1)]],
        &[dec!(1), dec!(1), dec!(1)],
    );
    let plan = optimize(&both, 2).unwrap();
    assert_eq!(plan.subset, vec![store(1), store(2)]);
    // Equal price for item 0 stays with the first store.
    assert_eq!(plan.store_plans[0].lines[0].list_code, "0");
}

#[test]
fn visit_limit_must_be_in_range() {
    let m = worked_example();
    assert_eq!(
        optimize(&m, 0).unwrap_err(),
        OptimizerInputError::VisitLimitOutOfRange { k: 0, m: 2 }
    );
    assert_eq!(
        optimize(&m, 3).unwrap_err(),
        OptimizerInputError::VisitLimitOutOfRange { k: 3, m: 2 }
    );
}

#[test]
fn savings_measured_against_single_store() {
    let m = worked_example();
    let plan = optimize(&m, 2).unwrap();
    assert_eq!(plan.savings_against(&m, &store(1)), Some(dec!(6)));
    assert_eq!(plan.savings_against(&m, &store(2)), Some(dec!(4)));
    assert_eq!(plan.savings_against(&m, &store(9)), None);
}
