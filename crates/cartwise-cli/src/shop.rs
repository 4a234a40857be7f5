//! `cartwise shop`: one store's catalog, one item's price and promotions.

use cartwise_feeds::{AcquisitionOrchestrator, PromoView};
use tokio_util::sync::CancellationToken;

/// # Errors
///
/// Returns an error if the chain is unknown or the price feed cannot be
/// acquired. A missing promo feed only prints a warning.
pub(crate) async fn run_shop(
    orchestrator: &AcquisitionOrchestrator,
    chain: &str,
    store: &str,
    item_code: Option<&str>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let registry = orchestrator.registry();
    let adapter = registry.require(chain)?;
    let key = crate::store_key(registry, chain, store)?;

    let acquired = orchestrator.acquire_store(&key, cancel).await?;
    let catalog = &acquired.catalog;

    println!(
        "{} store {}: {} items, {} promotions",
        adapter.alias(),
        key.store_code,
        catalog.item_count(),
        catalog.promotion_count()
    );
    if let Some(warning) = &acquired.promo_warning {
        println!("warning: promotions unavailable ({warning})");
    }

    let Some(code) = item_code else {
        return Ok(());
    };
    let item = catalog
        .item(code)
        .ok_or_else(|| anyhow::anyhow!("item '{code}' is not sold at store {key}"))?;

    println!();
    println!("{} ({})", item.name, item.code);
    match &item.unit {
        Some(unit) => println!("  Price: {} per {unit}", item.unit_price),
        None => println!("  Price: {}", item.unit_price),
    }

    let blacklist = adapter.promo_blacklist();
    let views: Vec<PromoView> = catalog
        .promotions_for(code, &blacklist)
        .into_iter()
        .filter_map(|promo| PromoView::render(promo, adapter.as_ref()))
        .collect();

    if views.is_empty() {
        println!("  No promotions");
    }
    for view in views {
        println!();
        println!("{view}");
    }

    Ok(())
}
