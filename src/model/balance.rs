use super::{Capacity, ValueError};
use serde::Serialize;

/// One side's share of a channel, in satoshis. Never negative.
///
/// A balance is not checked against the capacity it belongs to; keeping
/// `local + remote <= capacity` is up to whoever builds the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Balance(u64);

impl Balance {
    pub fn new(sats: i64) -> Result<Self, ValueError> {
        if sats < 0 {
            return Err(ValueError::InvalidBalance(sats));
        }
        Ok(Self(sats as u64))
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Fraction of `capacity` held by this balance.
    pub fn ratio_of(&self, capacity: &Capacity) -> f64 {
        self.0 as f64 / capacity.value() as f64
    }

    pub fn percentage_of(&self, capacity: &Capacity) -> f64 {
        self.0 as f64 * 100.0 / capacity.value() as f64
    }

    /// True when the ratio sits inside `[min, max]`, both ends inclusive.
    pub fn is_healthy(&self, capacity: &Capacity, min: f64, max: f64) -> bool {
        let ratio = self.ratio_of(capacity);
        min <= ratio && ratio <= max
    }

    pub fn add(&self, other: &Balance) -> Balance {
        Balance(self.0.saturating_add(other.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cap(sats: i64) -> Capacity {
        Capacity::new(sats).unwrap()
    }

    #[test]
    fn test_rejects_negative() {
        assert_eq!(Balance::new(-1), Err(ValueError::InvalidBalance(-1)));
        assert_eq!(Balance::new(0).unwrap().value(), 0);
    }

    #[test]
    fn test_ratio_of_capacity() {
        let cases = [(0, 1_000_000), (250_000, 1_000_000), (1, 3), (700_000, 700_000)];
        for (b, c) in cases {
            let ratio = Balance::new(b).unwrap().ratio_of(&cap(c));
            assert!((ratio - b as f64 / c as f64).abs() < 1e-12, "{}/{}", b, c);
        }
    }

    #[test]
    fn test_percentage_of_capacity() {
        let pct = Balance::new(99).unwrap().percentage_of(&cap(200));
        assert_eq!(pct, 49.5);
    }

    #[test]
    fn test_is_healthy_band_is_inclusive() {
        let c = cap(1_000_000);
        assert!(Balance::new(200_000).unwrap().is_healthy(&c, 0.2, 0.8));
        assert!(Balance::new(800_000).unwrap().is_healthy(&c, 0.2, 0.8));
        assert!(!Balance::new(199_999).unwrap().is_healthy(&c, 0.2, 0.8));
        assert!(!Balance::new(800_001).unwrap().is_healthy(&c, 0.2, 0.8));
    }

    #[test]
    fn test_add() {
        let sum = Balance::new(1_500).unwrap().add(&Balance::new(500).unwrap());
        assert_eq!(sum.value(), 2_000);
    }
}
