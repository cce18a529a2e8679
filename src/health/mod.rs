pub mod enrich;

use crate::gateway::NodeGateway;
use crate::model::{Channel, ChannelSummary, HealthCriteria, PubkeyPolicy};
use anyhow::Context;
use log::{debug, info};
use std::sync::Arc;

pub use enrich::EnrichmentOptions;

/// Channels of one query together with the portfolio summary.
#[derive(Debug, Clone)]
pub struct ChannelsWithHealth {
    pub channels: Vec<Channel>,
    pub summary: ChannelSummary,
}

/// Fetches channels through the gateway and grades them against the
/// configured health band.
pub struct ChannelHealthService<G> {
    gateway: Arc<G>,
    criteria: HealthCriteria,
    policy: PubkeyPolicy,
    enrichment: EnrichmentOptions,
}

impl<G: NodeGateway + 'static> ChannelHealthService<G> {
    pub fn new(
        gateway: Arc<G>,
        criteria: HealthCriteria,
        policy: PubkeyPolicy,
        enrichment: EnrichmentOptions,
    ) -> Self {
        Self {
            gateway,
            criteria,
            policy,
            enrichment,
        }
    }

    pub fn criteria(&self) -> &HealthCriteria {
        &self.criteria
    }

    /// All channels with aliases attached, plus the summary over all of them.
    pub async fn get_channels_with_health(&self) -> anyhow::Result<ChannelsWithHealth> {
        let records = self
            .gateway
            .list_channels()
            .await
            .context("Failed to fetch channels from node")?;

        let mut channels = records
            .iter()
            .map(|r| Channel::from_record(r, self.policy))
            .collect::<Result<Vec<_>, _>>()
            .context("Node returned an invalid channel")?;

        enrich::resolve_aliases(self.gateway.clone(), &mut channels, self.enrichment).await;

        let summary = ChannelSummary::compute(&channels, &self.criteria);
        info!(
            "Loaded {} channels ({} active, {} unhealthy)",
            summary.total_channels, summary.active_channels, summary.unhealthy_channels
        );

        Ok(ChannelsWithHealth { channels, summary })
    }

    /// Only the unhealthy channels. The summary still covers the whole node.
    pub async fn get_unhealthy_channels(&self) -> anyhow::Result<ChannelsWithHealth> {
        let mut all = self.get_channels_with_health().await?;
        let total = all.channels.len();
        all.channels.retain(|c| c.is_unhealthy(&self.criteria));
        debug!("{} of {} channels are unhealthy", all.channels.len(), total);
        Ok(all)
    }
}
