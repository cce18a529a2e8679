use super::ValueError;
use serde::Serialize;

/// Total satoshi value committed to a channel. Always greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Capacity(u64);

impl Capacity {
    pub fn new(sats: i64) -> Result<Self, ValueError> {
        if sats <= 0 {
            return Err(ValueError::InvalidCapacity(sats));
        }
        Ok(Self(sats as u64))
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn is_greater_than(&self, other: &Capacity) -> bool {
        self.0 > other.0
    }

    pub fn is_less_than(&self, other: &Capacity) -> bool {
        self.0 < other.0
    }

    /// Share of `total` this capacity represents, in percent.
    pub fn percentage_of(&self, total: &Capacity) -> f64 {
        self.0 as f64 * 100.0 / total.0 as f64
    }
}
