//! Model pricing definitions for cost calculation.
//!
//! Prices can be customized via environment variables or programmatically.
//! Defaults follow the provider's published per-million-token rates.

use std::collections::HashMap;
use std::sync::LazyLock;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::Usage;

const MTOK: Decimal = dec!(1_000_000);

/// Separate input/output unit prices, in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_per_mtok: Decimal,
    pub output_per_mtok: Decimal,
}

impl ModelPricing {
    pub const fn new(input_per_mtok: Decimal, output_per_mtok: Decimal) -> Self {
        Self {
            input_per_mtok,
            output_per_mtok,
        }
    }

    pub fn calculate(&self, usage: &Usage) -> Decimal {
        let input = Decimal::from(usage.input_tokens) / MTOK * self.input_per_mtok;
        let output = Decimal::from(usage.output_tokens) / MTOK * self.output_per_mtok;
        input + output
    }
}

#[derive(Debug, Clone)]
pub struct PricingTable {
    models: HashMap<String, ModelPricing>,
    default: ModelPricing,
}

impl PricingTable {
    pub fn builder() -> PricingTableBuilder {
        PricingTableBuilder::new()
    }

    pub fn get(&self, model: &str) -> &ModelPricing {
        let normalized = Self::normalize_model_name(model);
        self.models.get(&normalized).unwrap_or(&self.default)
    }

    pub fn calculate(&self, model: &str, usage: &Usage) -> Decimal {
        self.get(model).calculate(usage)
    }

    fn normalize_model_name(model: &str) -> String {
        let model = model.to_lowercase();
        if model.contains("opus") {
            "opus".to_string()
        } else if model.contains("sonnet") {
            "sonnet".to_string()
        } else if model.contains("haiku") {
            "haiku".to_string()
        } else {
            model
        }
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        global_pricing_table().clone()
    }
}

#[derive(Debug, Default)]
pub struct PricingTableBuilder {
    models: HashMap<String, ModelPricing>,
    default: Option<ModelPricing>,
}

impl PricingTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(mut self) -> Self {
        self.models
            .insert("opus".into(), ModelPricing::new(dec!(15.0), dec!(75.0)));
        self.models
            .insert("sonnet".into(), ModelPricing::new(dec!(3.0), dec!(15.0)));
        self.models
            .insert("haiku".into(), ModelPricing::new(dec!(0.80), dec!(4.0)));
        self
    }

    pub fn model(mut self, name: impl Into<String>, pricing: ModelPricing) -> Self {
        self.models.insert(name.into(), pricing);
        self
    }

    pub fn default_pricing(mut self, pricing: ModelPricing) -> Self {
        self.default = Some(pricing);
        self
    }

    pub fn from_env(mut self) -> Self {
        self = self.with_defaults();

        for model in ["OPUS", "SONNET", "HAIKU"] {
            if let Some(pricing) = Self::parse_env_pricing(model) {
                self.models.insert(model.to_lowercase(), pricing);
            }
        }

        self
    }

    fn parse_env_pricing(model: &str) -> Option<ModelPricing> {
        let input = std::env::var(format!("MODEL_GATEWAY_PRICING_{}_INPUT", model))
            .ok()?
            .parse::<Decimal>()
            .ok()?;
        let output = std::env::var(format!("MODEL_GATEWAY_PRICING_{}_OUTPUT", model))
            .ok()?
            .parse::<Decimal>()
            .ok()?;

        Some(ModelPricing::new(input, output))
    }

    pub fn build(self) -> PricingTable {
        let default = self
            .default
            .or_else(|| self.models.get("sonnet").copied())
            .unwrap_or(ModelPricing::new(dec!(3.0), dec!(15.0)));

        PricingTable {
            models: self.models,
            default,
        }
    }
}

static GLOBAL_PRICING: LazyLock<PricingTable> =
    LazyLock::new(|| PricingTableBuilder::new().from_env().build());

pub fn global_pricing_table() -> &'static PricingTable {
    &GLOBAL_PRICING
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_calculation() {
        let table = PricingTableBuilder::new().with_defaults().build();
        let usage = Usage::new(1_000_000, 1_000_000);

        assert_eq!(table.calculate("claude-sonnet-4-5", &usage), dec!(18.0));
        assert_eq!(table.calculate("claude-opus-4-5", &usage), dec!(90.0));
        assert_eq!(table.calculate("claude-3-5-haiku", &usage), dec!(4.80));
    }

    #[test]
    fn test_unknown_model_uses_default() {
        let table = PricingTableBuilder::new().with_defaults().build();
        let usage = Usage::new(1_000_000, 0);

        assert_eq!(table.calculate("experimental-model", &usage), dec!(3.0));
    }

    #[test]
    fn test_custom_pricing_table() {
        let table = PricingTableBuilder::new()
            .model("custom", ModelPricing::new(dec!(10.0), dec!(50.0)))
            .default_pricing(ModelPricing::new(dec!(1.0), dec!(1.0)))
            .build();

        let usage = Usage::new(1_000_000, 1_000_000);
        assert_eq!(table.calculate("custom", &usage), dec!(60.0));
        assert_eq!(table.calculate("other", &usage), dec!(2.0));
    }

    #[test]
    fn test_partial_usage_precision() {
        let table = PricingTableBuilder::new().with_defaults().build();
        // 1k in + 500 out on sonnet: $0.003 + $0.0075
        let usage = Usage::new(1_000, 500);
        assert_eq!(table.calculate("sonnet", &usage), dec!(0.0105));
    }
}
