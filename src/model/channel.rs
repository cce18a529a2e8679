use super::{Balance, Capacity, ChannelHealth, HealthCriteria, UnhealthyReason, ValueError};
use crate::gateway::ChannelRecord;
use serde::Serialize;

/// Alias shown until a lookup succeeds.
pub const UNKNOWN_ALIAS: &str = "Unknown";
/// Alias shown when the lookup for a peer failed.
pub const ALIAS_ERROR: &str = "Unknown (Error retrieving)";

/// How strictly remote pubkeys are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PubkeyPolicy {
    /// 66 hex characters (compressed secp256k1 point).
    #[default]
    Strict,
    /// At least 16 characters. For regtest fixtures and test nodes.
    Relaxed,
}

impl PubkeyPolicy {
    pub fn check(&self, pubkey: &str) -> Result<(), ValueError> {
        let ok = match self {
            PubkeyPolicy::Strict => {
                pubkey.len() == 66 && pubkey.chars().all(|c| c.is_ascii_hexdigit())
            }
            PubkeyPolicy::Relaxed => pubkey.chars().count() >= 16,
        };
        if ok {
            Ok(())
        } else {
            Err(ValueError::InvalidPubkey(pubkey.to_string()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelErrorKind {
    AliasRetrievalFailed,
    AliasRetrievalTimeout,
}

/// Partial-enrichment failure recorded on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelIssue {
    #[serde(rename = "type")]
    pub kind: ChannelErrorKind,
    pub message: String,
}

/// A payment channel as seen from the local node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channel {
    channel_point: String,
    remote_pubkey: String,
    remote_alias: String,
    capacity: Capacity,
    local_balance: Balance,
    remote_balance: Balance,
    active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ChannelIssue>,
}

impl Channel {
    pub fn new(
        channel_point: impl Into<String>,
        remote_pubkey: impl Into<String>,
        capacity: Capacity,
        local_balance: Balance,
        remote_balance: Balance,
        active: bool,
        policy: PubkeyPolicy,
    ) -> Result<Self, ValueError> {
        let channel_point = channel_point.into();
        let remote_pubkey = remote_pubkey.into();
        if channel_point.trim().is_empty() {
            return Err(ValueError::EmptyChannelPoint);
        }
        policy.check(&remote_pubkey)?;
        Ok(Self {
            channel_point,
            remote_pubkey,
            remote_alias: UNKNOWN_ALIAS.to_string(),
            capacity,
            local_balance,
            remote_balance,
            active,
            error: None,
        })
    }

    pub fn from_record(record: &ChannelRecord, policy: PubkeyPolicy) -> Result<Self, ValueError> {
        Self::new(
            record.channel_point.clone(),
            record.remote_pubkey.clone(),
            Capacity::new(record.capacity)?,
            Balance::new(record.local_balance)?,
            Balance::new(record.remote_balance)?,
            record.active,
            policy,
        )
    }

    pub fn remote_pubkey(&self) -> &str {
        &self.remote_pubkey
    }

    pub fn remote_alias(&self) -> &str {
        &self.remote_alias
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub fn local_balance(&self) -> Balance {
        self.local_balance
    }

    pub fn remote_balance(&self) -> Balance {
        self.remote_balance
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn error(&self) -> Option<&ChannelIssue> {
        self.error.as_ref()
    }

    pub fn local_ratio(&self) -> f64 {
        self.local_balance.ratio_of(&self.capacity)
    }

    pub fn set_alias(&mut self, alias: impl Into<String>) {
        self.remote_alias = alias.into();
    }

    pub fn attach_error(&mut self, kind: ChannelErrorKind, message: impl Into<String>) {
        self.error = Some(ChannelIssue {
            kind,
            message: message.into(),
        });
    }

    /// Unhealthy when inactive or when the local ratio leaves the band.
    pub fn is_unhealthy(&self, criteria: &HealthCriteria) -> bool {
        !self.active || !criteria.is_channel_healthy(&self.local_balance, &self.capacity)
    }

    pub fn health(&self, criteria: &HealthCriteria) -> ChannelHealth {
        let local_ratio = self.local_ratio();
        let reason = if !self.active {
            Some(UnhealthyReason::Inactive)
        } else if local_ratio < criteria.min_local_ratio() {
            Some(UnhealthyReason::LocalBalanceLow)
        } else if local_ratio > criteria.max_local_ratio() {
            Some(UnhealthyReason::LocalBalanceHigh)
        } else {
            None
        };
        ChannelHealth {
            healthy: reason.is_none(),
            local_ratio,
            local_percent: self.local_balance.percentage_of(&self.capacity),
            rebalance_sats: criteria
                .calculate_rebalance_amount(&self.local_balance, &self.capacity),
            reason,
        }
    }
}

/// Portfolio-wide statistics, recomputed on every query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChannelSummary {
    pub total_channels: usize,
    pub total_capacity: u64,
    pub total_local_balance: u64,
    pub total_remote_balance: u64,
    pub active_channels: usize,
    pub inactive_channels: usize,
    pub average_capacity: f64,
    pub healthy_channels: usize,
    pub unhealthy_channels: usize,
}

impl ChannelSummary {
    pub fn compute(channels: &[Channel], criteria: &HealthCriteria) -> Self {
        let total_channels = channels.len();
        let total_capacity = channels
            .iter()
            .map(|c| c.capacity.value())
            .fold(0u64, u64::saturating_add);
        let total_local = channels
            .iter()
            .fold(Balance::zero(), |acc, c| acc.add(&c.local_balance));
        let total_remote = channels
            .iter()
            .fold(Balance::zero(), |acc, c| acc.add(&c.remote_balance));
        let active_channels = channels.iter().filter(|c| c.active).count();
        let unhealthy_channels = channels.iter().filter(|c| c.is_unhealthy(criteria)).count();

        let average_capacity = if total_channels == 0 {
            0.0
        } else {
            total_capacity as f64 / total_channels as f64
        };

        Self {
            total_channels,
            total_capacity,
            total_local_balance: total_local.value(),
            total_remote_balance: total_remote.value(),
            active_channels,
            inactive_channels: total_channels - active_channels,
            average_capacity,
            healthy_channels: total_channels - unhealthy_channels,
            unhealthy_channels,
        }
    }
}
