//! Domain types and configuration shared by the cartwise crates.
//!
//! Catalog types here are the canonical schema every chain feed is normalized
//! into. Nothing in this crate performs I/O beyond reading the environment.

pub mod app_config;
pub mod catalog;
pub mod config;
pub mod session;
pub mod shopping_list;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use catalog::{Item, PromoExclusion, Promotion, StoreCatalog, StoreKey};
pub use config::{load_app_config, load_app_config_from_env};
pub use shopping_list::{ShoppingList, ShoppingListEntry, ShoppingListError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
