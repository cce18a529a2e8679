//! Alias resolution for a batch of channels.
//!
//! One lookup per distinct remote pubkey, run concurrently and joined before
//! returning. Each lookup runs on its own task, so a failed, slow or panicking
//! lookup only affects the channels of that peer.

use crate::gateway::NodeGateway;
use crate::model::channel::{ALIAS_ERROR, UNKNOWN_ALIAS};
use crate::model::{Channel, ChannelErrorKind};
use crate::redact;
use futures_util::{stream, StreamExt};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentOptions {
    pub alias_timeout: Duration,
    pub max_concurrent: usize,
}

impl Default for EnrichmentOptions {
    fn default() -> Self {
        Self {
            alias_timeout: Duration::from_secs(10),
            max_concurrent: 16,
        }
    }
}

#[derive(Debug)]
enum AliasOutcome {
    Resolved(Option<String>),
    Failed(String),
    TimedOut,
}

/// Attach aliases (or error markers) to every channel in place.
pub async fn resolve_aliases<G>(
    gateway: Arc<G>,
    channels: &mut [Channel],
    options: EnrichmentOptions,
) where
    G: NodeGateway + 'static,
{
    let mut seen = HashSet::new();
    let pubkeys: Vec<String> = channels
        .iter()
        .map(|c| c.remote_pubkey().to_string())
        .filter(|pk| seen.insert(pk.clone()))
        .collect();

    if pubkeys.is_empty() {
        return;
    }

    debug!(
        "Resolving aliases for {} distinct peers across {} channels",
        pubkeys.len(),
        channels.len()
    );

    let lookups = tokio::spawn(lookup_all(gateway, pubkeys, options));

    match lookups.await {
        Ok(outcomes) => apply(channels, &outcomes, options.alias_timeout),
        Err(e) => {
            let message = redact::sanitize(&format!("alias enrichment aborted: {}", e));
            warn!("{}", message);
            for channel in channels.iter_mut() {
                channel.set_alias(ALIAS_ERROR);
                channel.attach_error(ChannelErrorKind::AliasRetrievalFailed, message.clone());
            }
        }
    }
}

async fn lookup_all<G>(
    gateway: Arc<G>,
    pubkeys: Vec<String>,
    options: EnrichmentOptions,
) -> HashMap<String, AliasOutcome>
where
    G: NodeGateway + 'static,
{
    stream::iter(pubkeys)
        .map(|pubkey| {
            let gateway = gateway.clone();
            let key = pubkey.clone();
            let lookup = async move {
                timeout(options.alias_timeout, gateway.get_node_alias(&key)).await
            };
            async move {
                let outcome = match tokio::spawn(lookup).await {
                    Ok(Ok(Ok(alias))) => AliasOutcome::Resolved(alias),
                    Ok(Ok(Err(e))) => AliasOutcome::Failed(redact::error_message(&e)),
                    Ok(Err(_)) => AliasOutcome::TimedOut,
                    Err(e) => AliasOutcome::Failed(redact::sanitize(&format!(
                        "alias lookup aborted: {}",
                        e
                    ))),
                };
                (pubkey, outcome)
            }
        })
        .buffer_unordered(options.max_concurrent.max(1))
        .collect()
        .await
}

fn apply(channels: &mut [Channel], outcomes: &HashMap<String, AliasOutcome>, limit: Duration) {
    for channel in channels.iter_mut() {
        match outcomes.get(channel.remote_pubkey()) {
            Some(AliasOutcome::Resolved(Some(alias))) if !alias.trim().is_empty() => {
                channel.set_alias(alias.trim())
            }
            Some(AliasOutcome::Resolved(_)) | None => channel.set_alias(UNKNOWN_ALIAS),
            Some(AliasOutcome::Failed(message)) => {
                warn!(
                    "Alias lookup failed for {}: {}",
                    channel.remote_pubkey(),
                    message
                );
                channel.set_alias(ALIAS_ERROR);
                channel.attach_error(ChannelErrorKind::AliasRetrievalFailed, message.clone());
            }
            Some(AliasOutcome::TimedOut) => {
                warn!(
                    "Alias lookup for {} timed out after {:?}",
                    channel.remote_pubkey(),
                    limit
                );
                channel.set_alias(UNKNOWN_ALIAS);
                channel.attach_error(
                    ChannelErrorKind::AliasRetrievalTimeout,
                    format!("alias lookup timed out after {:?}", limit),
                );
            }
        }
    }
}
