//! Token estimation, pricing, and daily budget enforcement.

mod accountant;
pub mod estimator;
pub mod pricing;

pub use accountant::{BudgetStatus, CostAccountant};
pub use estimator::{estimate_tokens, estimate_usage, split_estimate};
pub use pricing::{ModelPricing, PricingTable, PricingTableBuilder, global_pricing_table};
