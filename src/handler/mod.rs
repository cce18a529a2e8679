//! Domain handlers turn a classified intent into an answer.

pub mod channels;
pub mod format;

use crate::intent::{ChannelView, Domain, Intent};
use crate::model::{Channel, ChannelHealth, ChannelSummary, HealthCriteria};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub use channels::ChannelDomainHandler;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("No handler found for domain '{0}'")]
    NoHandlerFound(Domain),
}

/// One channel in a response, with its health verdict alongside.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelReport {
    #[serde(flatten)]
    pub channel: Channel,
    pub health: ChannelHealth,
}

/// Structured payload of a channel answer.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelQueryResult {
    pub view: ChannelView,
    pub intent: Intent,
    pub channels: Vec<ChannelReport>,
    pub summary: ChannelSummary,
    pub criteria: HealthCriteria,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChannelQueryResult {
    /// Zeroed result carrying only the failure.
    pub fn empty(intent: &Intent, criteria: HealthCriteria, error: String) -> Self {
        Self {
            view: intent.view(),
            intent: intent.clone(),
            channels: Vec::new(),
            summary: ChannelSummary::default(),
            criteria,
            generated_at: Utc::now(),
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HandlerOutput {
    pub text: String,
    pub data: ChannelQueryResult,
}

#[async_trait]
pub trait DomainHandler: Send + Sync {
    fn domain(&self) -> Domain;

    fn can_handle(&self, intent: &Intent) -> bool;

    async fn handle(&self, intent: &Intent) -> anyhow::Result<HandlerOutput>;
}

/// Closed set of handlers, one per implemented domain.
pub struct HandlerRegistry<G> {
    channels: ChannelDomainHandler<G>,
}

impl<G> HandlerRegistry<G>
where
    G: crate::gateway::NodeGateway + 'static,
{
    pub fn new(channels: ChannelDomainHandler<G>) -> Self {
        Self { channels }
    }

    fn handlers(&self) -> [&dyn DomainHandler; 1] {
        [&self.channels]
    }

    pub fn criteria(&self) -> HealthCriteria {
        *self.channels.criteria()
    }

    /// The handler registered for the intent's domain if it accepts the
    /// intent, otherwise the first handler that does.
    pub fn handler_for(&self, intent: &Intent) -> Result<&dyn DomainHandler, QueryError> {
        let handlers = self.handlers();
        handlers
            .iter()
            .find(|h| h.domain() == intent.domain && h.can_handle(intent))
            .or_else(|| handlers.iter().find(|h| h.can_handle(intent)))
            .copied()
            .ok_or(QueryError::NoHandlerFound(intent.domain))
    }
}
