use super::{Balance, Capacity, ValueError};
use serde::Serialize;

pub const DEFAULT_MIN_LOCAL_RATIO: f64 = 0.2;
pub const DEFAULT_MAX_LOCAL_RATIO: f64 = 0.8;

/// Acceptable band for a channel's local balance as a share of capacity.
///
/// Invariant: `0 <= min_local_ratio < max_local_ratio <= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HealthCriteria {
    min_local_ratio: f64,
    max_local_ratio: f64,
}

impl HealthCriteria {
    pub fn new(min_local_ratio: f64, max_local_ratio: f64) -> Result<Self, ValueError> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        // NaN fails the range check as well
        if !in_unit(min_local_ratio)
            || !in_unit(max_local_ratio)
            || min_local_ratio >= max_local_ratio
        {
            return Err(ValueError::InvalidHealthCriteria {
                min: min_local_ratio,
                max: max_local_ratio,
            });
        }
        Ok(Self {
            min_local_ratio,
            max_local_ratio,
        })
    }

    pub fn min_local_ratio(&self) -> f64 {
        self.min_local_ratio
    }

    pub fn max_local_ratio(&self) -> f64 {
        self.max_local_ratio
    }

    /// Centre of the band; rebalance suggestions aim here.
    pub fn midpoint(&self) -> f64 {
        (self.min_local_ratio + self.max_local_ratio) / 2.0
    }

    pub fn is_channel_healthy(&self, local: &Balance, capacity: &Capacity) -> bool {
        local.is_healthy(capacity, self.min_local_ratio, self.max_local_ratio)
    }

    /// Satoshis needed to bring `local` to the band midpoint.
    ///
    /// Positive: the channel should receive this much. Negative: it should send.
    pub fn calculate_rebalance_amount(&self, local: &Balance, capacity: &Capacity) -> i64 {
        let target = self.midpoint() * capacity.value() as f64;
        (target - local.value() as f64).round() as i64
    }
}

impl Default for HealthCriteria {
    fn default() -> Self {
        Self {
            min_local_ratio: DEFAULT_MIN_LOCAL_RATIO,
            max_local_ratio: DEFAULT_MAX_LOCAL_RATIO,
        }
    }
}

/// Why a channel failed its health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnhealthyReason {
    Inactive,
    LocalBalanceLow,
    LocalBalanceHigh,
}

impl UnhealthyReason {
    pub fn describe(&self) -> &'static str {
        match self {
            UnhealthyReason::Inactive => "inactive",
            UnhealthyReason::LocalBalanceLow => "local balance too low",
            UnhealthyReason::LocalBalanceHigh => "local balance too high",
        }
    }
}

/// Health verdict for a single channel under some criteria.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelHealth {
    pub healthy: bool,
    pub local_ratio: f64,
    pub local_percent: f64,
    pub rebalance_sats: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnhealthyReason>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bal(sats: i64) -> Balance {
        Balance::new(sats).unwrap()
    }

    fn cap(sats: i64) -> Capacity {
        Capacity::new(sats).unwrap()
    }

    #[test]
    fn test_rejects_invalid_bounds() {
        for (min, max) in [(0.8, 0.2), (-0.1, 0.5), (0.2, 1.1), (0.5, 0.5), (f64::NAN, 0.5)] {
            assert!(HealthCriteria::new(min, max).is_err(), "{} {}", min, max);
        }
        assert!(HealthCriteria::new(0.0, 1.0).is_ok());
    }

    #[test]
    fn test_default_band() {
        let c = HealthCriteria::default();
        assert_eq!(c.min_local_ratio(), 0.2);
        assert_eq!(c.max_local_ratio(), 0.8);
        assert_eq!(c.midpoint(), 0.5);
    }

    #[test]
    fn test_is_channel_healthy_delegates_to_balance() {
        let c = HealthCriteria::new(0.3, 0.7).unwrap();
        assert!(c.is_channel_healthy(&bal(300_000), &cap(1_000_000)));
        assert!(!c.is_channel_healthy(&bal(299_000), &cap(1_000_000)));
        assert!(!c.is_channel_healthy(&bal(710_000), &cap(1_000_000)));
    }

    #[test]
    fn test_rebalance_amount_targets_midpoint() {
        let c = HealthCriteria::default();
        // midpoint 0.5 of 1M = 500k
        assert_eq!(c.calculate_rebalance_amount(&bal(500_000), &cap(1_000_000)), 0);
        assert_eq!(c.calculate_rebalance_amount(&bal(100_000), &cap(1_000_000)), 400_000);
        assert_eq!(c.calculate_rebalance_amount(&bal(900_000), &cap(1_000_000)), -400_000);
    }

    #[test]
    fn test_rebalance_amount_uses_midpoint_not_band_edge() {
        let c = HealthCriteria::new(0.1, 0.5).unwrap();
        // midpoint 0.3, band edge would be 0.5
        assert_eq!(c.calculate_rebalance_amount(&bal(900_000), &cap(1_000_000)), -600_000);
    }

    #[test]
    fn test_rebalance_amount_sign_across_bands() {
        let bands = [(0.0, 1.0), (0.2, 0.8), (0.1, 0.3), (0.6, 0.9)];
        let capacities = [100_000, 1_000_000, 16_000_000];
        for (min, max) in bands {
            let c = HealthCriteria::new(min, max).unwrap();
            for capacity in capacities {
                let mid = (c.midpoint() * capacity as f64).round() as i64;
                assert_eq!(c.calculate_rebalance_amount(&bal(mid), &cap(capacity)), 0);
                assert!(c.calculate_rebalance_amount(&bal(0), &cap(capacity)) > 0);
                assert!(c.calculate_rebalance_amount(&bal(capacity), &cap(capacity)) < 0);
            }
        }
    }

    #[test]
    fn test_rebalance_amount_rounds() {
        let c = HealthCriteria::default();
        // 0.5 * 3 = 1.5, 1.5 - 0 rounds away from zero
        assert_eq!(c.calculate_rebalance_amount(&bal(0), &cap(3)), 2);
    }
}
