use super::{format, ChannelQueryResult, ChannelReport, DomainHandler, HandlerOutput};
use crate::gateway::NodeGateway;
use crate::health::{ChannelHealthService, ChannelsWithHealth};
use crate::intent::{ChannelView, Domain, Intent};
use crate::model::HealthCriteria;
use async_trait::async_trait;
use chrono::Utc;
use log::debug;

/// Answers channel list, liquidity and health questions.
pub struct ChannelDomainHandler<G> {
    service: ChannelHealthService<G>,
}

impl<G: NodeGateway + 'static> ChannelDomainHandler<G> {
    pub fn new(service: ChannelHealthService<G>) -> Self {
        Self { service }
    }

    pub fn criteria(&self) -> &HealthCriteria {
        self.service.criteria()
    }

    fn render(&self, view: ChannelView, intent: &Intent, data: &ChannelsWithHealth) -> String {
        let criteria = self.service.criteria();
        match view {
            ChannelView::List => {
                format::list_text(&data.channels, &data.summary, intent.attributes.active)
            }
            ChannelView::Liquidity => format::liquidity_text(
                &data.channels,
                &data.summary,
                criteria,
                intent.attributes.check_balance.unwrap_or(false),
            ),
            ChannelView::Health => format::health_text(&data.channels, &data.summary, criteria),
            ChannelView::Unhealthy => {
                format::unhealthy_text(&data.channels, &data.summary, criteria)
            }
        }
    }
}

#[async_trait]
impl<G: NodeGateway + 'static> DomainHandler for ChannelDomainHandler<G> {
    fn domain(&self) -> Domain {
        Domain::Channels
    }

    fn can_handle(&self, intent: &Intent) -> bool {
        intent.domain == Domain::Channels
    }

    async fn handle(&self, intent: &Intent) -> anyhow::Result<HandlerOutput> {
        let view = intent.view();
        debug!("Handling channel query as {:?}", view);

        let data = match view {
            ChannelView::Unhealthy => self.service.get_unhealthy_channels().await?,
            _ => self.service.get_channels_with_health().await?,
        };

        let text = self.render(view, intent, &data);
        let criteria = *self.service.criteria();

        let channels = format::by_capacity(&data.channels)
            .into_iter()
            .filter(|c| match (view, intent.attributes.active) {
                (ChannelView::List, Some(want)) => c.is_active() == want,
                _ => true,
            })
            .map(|c| ChannelReport {
                channel: c.clone(),
                health: c.health(&criteria),
            })
            .collect();

        Ok(HandlerOutput {
            text,
            data: ChannelQueryResult {
                view,
                intent: intent.clone(),
                channels,
                summary: data.summary,
                criteria,
                generated_at: Utc::now(),
                error: None,
            },
        })
    }
}
