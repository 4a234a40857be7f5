//! Acquisition and normalization of supermarket price-transparency feeds.
//!
//! Each chain publishes its feeds through one of a handful of portal
//! protocols. A [`ChainAdapter`] hides one protocol, the [`ChainRegistry`]
//! maps chain codes to adapters, and the [`AcquisitionOrchestrator`] drives
//! concurrent fetch-and-parse work into [`cartwise_core::StoreCatalog`]s.

pub mod adapter;
pub mod chains;
pub mod classify;
pub mod client;
pub mod decode;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub(crate) mod rate_limit;
pub mod registry;
pub mod xml;

pub use adapter::{default_audience, ChainAdapter, FeedLocation, FeedLocations};
pub use classify::{DiscountFamily, PromoValue, PromoView, PromotionClassifier, RewardKind};
pub use client::{FeedClient, FeedResponse, SessionCredentials};
pub use error::{AcquisitionError, AcquisitionErrorKind, FeedKind, RecordError};
pub use orchestrator::{
    AcquisitionOrchestrator, OrchestratorSettings, PlanningSnapshot, StoreAcquisition,
    StoreOutcome,
};
pub use registry::{ChainEndpoints, ChainRegistry, RegistryError};
