//! `ChainAdapter` implementations, one per publishing protocol.

pub mod bina_projects;
pub mod carrefour;
pub(crate) mod listing;
pub mod published_prices;
pub mod shufersal;

pub use bina_projects::BinaProjectsAdapter;
pub use carrefour::CarrefourAdapter;
pub use published_prices::PublishedPricesAdapter;
pub use shufersal::ShufersalAdapter;
