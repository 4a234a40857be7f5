//! `cartwise plan`: acquire candidate stores and print the cheapest trip.

use std::fmt::Write as _;
use std::path::Path;

use cartwise_core::{ShoppingList, ShoppingListEntry, StoreKey};
use cartwise_feeds::AcquisitionOrchestrator;
use cartwise_planner::{
    coverage_report, optimize, CoverageReport, PriceMatrix, ShoppingPlan, Substitutions,
};
use tokio_util::sync::CancellationToken;

use crate::StoreArg;

/// Reads a JSON array of shopping-list entries.
pub(crate) fn read_shopping_list(path: &Path) -> anyhow::Result<ShoppingList> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let entries: Vec<ShoppingListEntry> = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("invalid shopping list {}: {e}", path.display()))?;
    Ok(ShoppingList::from_entries(entries)?)
}

/// Candidate stores that go into the matrix.
///
/// Incomplete stores fail the run unless `exclude_incomplete` is set, in
/// which case they are dropped and reported.
pub(crate) fn select_stores(
    candidates: &[StoreKey],
    report: &CoverageReport,
    exclude_incomplete: bool,
) -> anyhow::Result<Vec<StoreKey>> {
    if report.is_complete() {
        return Ok(candidates.to_vec());
    }

    let mut details = String::new();
    for store in report.incomplete_stores() {
        let _ = write!(
            details,
            "\n  {store}: missing {}",
            report.missing_for(store).join(", ")
        );
    }

    if !exclude_incomplete {
        anyhow::bail!(
            "some stores do not carry every item (rerun with --exclude-incomplete to skip them):{details}"
        );
    }

    println!("excluding stores without full coverage:{details}");
    let kept: Vec<StoreKey> = candidates
        .iter()
        .filter(|s| report.missing_for(s).is_empty())
        .cloned()
        .collect();
    if kept.is_empty() {
        anyhow::bail!("no store carries every item on the list");
    }
    Ok(kept)
}

pub(crate) fn render_plan(matrix: &PriceMatrix, plan: &ShoppingPlan) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Total per store:");
    for (store, total) in matrix.store_totals() {
        let _ = writeln!(out, "  {store}: {total:.2}");
    }

    let _ = writeln!(out, "\nVisit:");
    for store in &plan.subset {
        let _ = writeln!(out, "  {store}");
    }
    let _ = write!(out, "\nTotal cost: {:.2}", plan.total);
    if let Some(saved) = plan
        .subset
        .first()
        .and_then(|first| plan.savings_against(matrix, first))
    {
        let _ = write!(out, " ({saved:.2} saved)");
    }
    let _ = writeln!(out);

    for store_plan in &plan.store_plans {
        let _ = writeln!(out, "\n{}:", store_plan.store);
        for line in &store_plan.lines {
            let _ = writeln!(
                out,
                "  {} - {}: {} x {:.2} = {:.2}",
                line.item.code, line.item.name, line.quantity, line.unit_price, line.line_total
            );
        }
    }
    out
}

/// # Errors
///
/// Returns an error if the list is unreadable, every store failed, coverage
/// is incomplete without `--exclude-incomplete`, or `max_stores` exceeds
/// the stores left to plan over.
pub(crate) async fn run_plan(
    orchestrator: &AcquisitionOrchestrator,
    stores: &[StoreArg],
    list_path: &Path,
    max_stores: usize,
    exclude_incomplete: bool,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let list = read_shopping_list(list_path)?;
    let registry = orchestrator.registry();
    let keys = stores
        .iter()
        .map(|s| crate::store_key(registry, &s.chain, &s.store))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let snapshot = orchestrator.acquire_planning(&keys, cancel).await;
    for (store, err) in snapshot.failures() {
        println!("skipping {store}: {err}");
    }

    let candidates: Vec<StoreKey> = snapshot.ready().map(|(key, _)| key.clone()).collect();
    if candidates.is_empty() {
        anyhow::bail!("no store catalog could be acquired");
    }
    let catalogs = snapshot.into_catalogs();

    let substitutions = Substitutions::new();
    let report = coverage_report(&candidates, &catalogs, &list, &substitutions);
    let selected = select_stores(&candidates, &report, exclude_incomplete)?;

    let matrix = PriceMatrix::build(&selected, &catalogs, &list, &substitutions)?;
    let plan = optimize(&matrix, max_stores)?;
    print!("{}", render_plan(&matrix, &plan));
    Ok(())
}
