use cartwise_core::StoreKey;
use thiserror::Error;

/// A precondition of matrix construction or optimization was violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizerInputError {
    #[error("no candidate stores given")]
    NoCandidateStores,

    #[error("visit limit {k} outside 1..={m}")]
    VisitLimitOutOfRange { k: usize, m: usize },

    #[error("store {0} listed more than once")]
    DuplicateStore(StoreKey),

    #[error("no catalog acquired for store {0}")]
    MissingCatalog(StoreKey),

    #[error("store {store} does not carry item {item_code}")]
    MissingCoverage { store: StoreKey, item_code: String },

    #[error("substitute {substitute} for item {item_code} is not in the catalog of store {store}")]
    InvalidSubstitution {
        store: StoreKey,
        item_code: String,
        substitute: String,
    },

    #[error("cost of item {item_code} at the listed quantity is too large to total")]
    CostOverflow { item_code: String },
}
