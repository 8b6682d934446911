//! Pre-dispatch token estimation.
//!
//! The heuristic approximates tokens as serialized-payload length divided by
//! four. Good enough for budget gating; not billing-grade. Post-dispatch
//! accounting always uses the provider-reported usage instead.

use crate::types::Usage;

const CHARS_PER_TOKEN: u64 = 4;

/// Assumed input share of the estimate when the true split is unknown.
const INPUT_SHARE_PERCENT: u64 = 70;

pub fn estimate_tokens(payload: &str) -> u64 {
    (payload.len() as u64).div_ceil(CHARS_PER_TOKEN)
}

/// Split an estimated total into input/output using the 70/30 assumption.
pub fn split_estimate(total_tokens: u64) -> Usage {
    let input = total_tokens * INPUT_SHARE_PERCENT / 100;
    Usage::new(input, total_tokens - input)
}

/// Token estimate for a payload, pre-split for pricing.
pub fn estimate_usage(payload: &str) -> Usage {
    split_estimate(estimate_tokens(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_split_preserves_total() {
        for total in [0u64, 1, 10, 99, 1_000, 12_345] {
            let usage = split_estimate(total);
            assert_eq!(usage.total(), total);
        }
    }

    #[test]
    fn test_split_ratio() {
        let usage = split_estimate(1_000);
        assert_eq!(usage.input_tokens, 700);
        assert_eq!(usage.output_tokens, 300);
    }
}
