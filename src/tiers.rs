//! Quantity Pricing Tiers
//!
//! Small orders pay a penalty, bulk orders get a discount. Inclusive upper
//! bounds, first match wins, no interpolation.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuantityTier {
    /// Inclusive upper bound; `None` for the open-ended last tier
    pub max_quantity: Option<u32>,
    pub multiplier: f64,
    pub label: &'static str,
}

pub static TIERS: [QuantityTier; 6] = [
    QuantityTier { max_quantity: Some(100), multiplier: 1.15, label: "sample run" },
    QuantityTier { max_quantity: Some(300), multiplier: 1.08, label: "small batch" },
    QuantityTier { max_quantity: Some(500), multiplier: 1.00, label: "standard" },
    QuantityTier { max_quantity: Some(1000), multiplier: 0.92, label: "volume" },
    QuantityTier { max_quantity: Some(3000), multiplier: 0.85, label: "bulk" },
    QuantityTier { max_quantity: None, multiplier: 0.80, label: "mass production" },
];

pub fn tier_for(quantity: u32) -> &'static QuantityTier {
    TIERS
        .iter()
        .find(|tier| tier.max_quantity.map_or(true, |max| quantity <= max))
        .unwrap_or(&TIERS[TIERS.len() - 1])
}

/// MOQ multiplier applied to landed cost
pub fn multiplier(quantity: u32) -> f64 {
    tier_for(quantity).multiplier
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(multiplier(100), 1.15);
        assert_eq!(multiplier(101), 1.08);
        assert_eq!(multiplier(300), 1.08);
        assert_eq!(multiplier(301), 1.00);
        assert_eq!(multiplier(500), 1.00);
        assert_eq!(multiplier(501), 0.92);
        assert_eq!(multiplier(1000), 0.92);
        assert_eq!(multiplier(1001), 0.85);
        assert_eq!(multiplier(3000), 0.85);
        assert_eq!(multiplier(3001), 0.80);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(multiplier(0), 1.15);
        assert_eq!(multiplier(u32::MAX), 0.80);
    }

    #[test]
    fn test_monotonic_non_increasing() {
        let probes = [0, 1, 50, 100, 101, 250, 300, 301, 500, 501, 999, 1000, 1001, 3000, 3001, 100_000];
        for pair in probes.windows(2) {
            assert!(multiplier(pair[0]) >= multiplier(pair[1]));
        }
    }

    #[test]
    fn test_tier_labels() {
        assert_eq!(tier_for(250).label, "small batch");
        assert_eq!(tier_for(10_000).max_quantity, None);
    }
}
