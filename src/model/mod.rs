//! Request-scoped value objects and the channel entity.
//!
//! Everything here is pure: no I/O, no shared state. Channels are rebuilt from
//! gateway records on every query and dropped once the response is produced.

pub mod balance;
pub mod capacity;
pub mod channel;
pub mod health;

pub use balance::Balance;
pub use capacity::Capacity;
pub use channel::{Channel, ChannelErrorKind, ChannelSummary, PubkeyPolicy};
pub use health::{ChannelHealth, HealthCriteria, UnhealthyReason};

/// Satoshis per bitcoin.
pub const SATS_PER_BTC: u64 = 100_000_000;

/// Validation failures raised while constructing value objects.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("Invalid capacity: {0} (must be greater than zero)")]
    InvalidCapacity(i64),

    #[error("Invalid balance: {0} (must not be negative)")]
    InvalidBalance(i64),

    #[error("Invalid health criteria: min {min}, max {max} (need 0 <= min < max <= 1)")]
    InvalidHealthCriteria { min: f64, max: f64 },

    #[error("Invalid remote pubkey: {0}")]
    InvalidPubkey(String),

    #[error("Channel point must not be empty")]
    EmptyChannelPoint,
}
