//! Multi-store shopping optimization over acquired catalogs.
//!
//! Everything here is pure and synchronous: build a [`PriceMatrix`] from
//! resident catalogs once, then call [`optimize`] as often as needed.

pub mod error;
pub mod matrix;
pub mod optimizer;
pub mod substitution;

pub use error::OptimizerInputError;
pub use matrix::{coverage_report, CoverageReport, PriceMatrix, Substitutions};
pub use optimizer::{optimize, optimize_sweep, subset_cost, PlanLine, ShoppingPlan, StorePlan};
pub use substitution::{auto_substitute, substitution_candidates, AlternativeMatcher};
