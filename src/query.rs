//! Entry point for natural-language queries: classify, route, answer.

use crate::config::Config;
use crate::gateway::NodeGateway;
use crate::handler::{ChannelDomainHandler, ChannelQueryResult, HandlerRegistry};
use crate::health::{ChannelHealthService, EnrichmentOptions};
use crate::intent::{self, Intent};
use crate::redact;
use log::{error, info, warn};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum QueryData {
    Channels(ChannelQueryResult),
    Error { error: String },
}

impl QueryData {
    pub fn error(&self) -> Option<&str> {
        match self {
            QueryData::Channels(result) => result.error.as_deref(),
            QueryData::Error { error } => Some(error.as_str()),
        }
    }
}

/// Answer to a query. Always produced, even when the query failed.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub text: String,
    pub data: QueryData,
}

pub struct QueryEngine<G> {
    registry: HandlerRegistry<G>,
}

impl<G: NodeGateway + 'static> QueryEngine<G> {
    pub fn new(registry: HandlerRegistry<G>) -> Self {
        Self { registry }
    }

    pub fn from_config(gateway: Arc<G>, config: &Config) -> anyhow::Result<Self> {
        let service = ChannelHealthService::new(
            gateway,
            config.health_criteria()?,
            config.pubkey_policy(),
            EnrichmentOptions {
                alias_timeout: config.enrichment.alias_timeout(),
                max_concurrent: config.enrichment.max_concurrent_lookups,
            },
        );
        Ok(Self::new(HandlerRegistry::new(ChannelDomainHandler::new(
            service,
        ))))
    }

    pub fn classify(&self, query: &str) -> Intent {
        intent::classify(query)
    }

    pub async fn execute_query(&self, query: &str) -> QueryResponse {
        let intent = self.classify(query);

        if let Some(message) = intent.error.clone() {
            return QueryResponse {
                text: format!("Sorry, I couldn't understand that question: {}", message),
                data: QueryData::Error { error: message },
            };
        }

        let handler = match self.registry.handler_for(&intent) {
            Ok(h) => h,
            Err(e) => {
                warn!("{}", e);
                return self.failure(&intent, e.to_string());
            }
        };

        match handler.handle(&intent).await {
            Ok(output) => {
                info!(
                    "Answered {} query with {} channels",
                    intent.domain,
                    output.data.channels.len()
                );
                QueryResponse {
                    text: output.text,
                    data: QueryData::Channels(output.data),
                }
            }
            Err(e) => {
                let message = redact::error_message(&e);
                error!("Query failed: {}", message);
                self.failure(&intent, message)
            }
        }
    }

    fn failure(&self, intent: &Intent, message: String) -> QueryResponse {
        QueryResponse {
            text: format!("Sorry, I couldn't answer that: {}", message),
            data: QueryData::Channels(ChannelQueryResult::empty(
                intent,
                self.registry.criteria(),
                message,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::{five_channel_node, MockGateway};
    use crate::model::HealthCriteria;

    fn engine(gateway: MockGateway) -> QueryEngine<MockGateway> {
        let config = Config::test_default(std::path::PathBuf::from("/dev/null"));
        QueryEngine::from_config(Arc::new(gateway), &config).unwrap()
    }

    #[tokio::test]
    async fn test_success_has_no_error() {
        let response = engine(five_channel_node()).execute_query("list channels").await;
        assert!(response.data.error().is_none());
        assert!(response.text.starts_with("Your node has 5 channels"));
    }

    #[tokio::test]
    async fn test_classification_error_payload() {
        let response = engine(five_channel_node()).execute_query("").await;
        assert_eq!(response.data.error(), Some("Query is empty"));
        let json = serde_json::to_value(&response.data).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Query is empty" }));
        assert!(response.text.contains("Query is empty"));
    }

    #[tokio::test]
    async fn test_gateway_error_is_sanitized() {
        let mut gateway = five_channel_node();
        gateway.list_error =
            Some("bad auth macaroon=0201036c6e64 reading /home/alice/.lnd/admin.macaroon".into());
        let response = engine(gateway).execute_query("list channels").await;

        let message = response.data.error().unwrap();
        assert!(message.contains("Failed to fetch channels from node"));
        assert!(!message.contains("0201036c6e64"));
        assert!(!message.contains("/home/alice"));
        assert!(!response.text.contains("/home/alice"));

        match response.data {
            QueryData::Channels(result) => {
                assert!(result.channels.is_empty());
                assert_eq!(result.summary.total_capacity, 0);
                assert_eq!(result.criteria, HealthCriteria::default());
            }
            QueryData::Error { .. } => panic!("expected a zeroed channel result"),
        }
    }
}
