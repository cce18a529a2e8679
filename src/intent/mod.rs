//! Maps a free-text question onto a domain, an operation and a small set of
//! attributes.
//!
//! Classification is deterministic and single-pass:
//!
//! 1. Domain: always `channels` for now.
//! 2. Operation: `liquidity` if any liquidity keyword matches, otherwise `list`.
//! 3. Attributes:
//!    - `health`: `unhealthy` patterns are tried before the general `health`
//!      ones, so the more specific reading wins.
//!    - `active`: "inactive" is checked before "active", because the latter is
//!      a substring of the former.
//!    - `check_balance`: liquidity questions mentioning "imbalanced".
//!
//! Failures never escape `classify`; they come back as an `unknown` intent
//! carrying the (sanitized) error.

mod patterns;

use crate::redact;
use log::{debug, warn};
use serde::Serialize;
use std::fmt;

/// Longest query accepted, in characters.
pub const MAX_QUERY_LEN: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Channels,
    Unknown,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Channels => write!(f, "channels"),
            Domain::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    List,
    Liquidity,
    Unknown,
}

/// Health angle of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthFocus {
    /// Overall health of the node's channels
    Overview,
    /// Only the channels that fail the health check
    Unhealthy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IntentAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_balance: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthFocus>,
}

impl IntentAttributes {
    pub fn is_empty(&self) -> bool {
        *self == IntentAttributes::default()
    }
}

/// Which response a channel question gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelView {
    List,
    Liquidity,
    Health,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Intent {
    pub domain: Domain,
    pub operation: Operation,
    pub attributes: IntentAttributes,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Intent {
    fn unrecognized(query: &str, error: String) -> Self {
        Self {
            domain: Domain::Unknown,
            operation: Operation::Unknown,
            attributes: IntentAttributes::default(),
            query: query.to_string(),
            error: Some(error),
        }
    }

    /// Most specific reading first: unhealthy, health, liquidity, list.
    pub fn view(&self) -> ChannelView {
        match (self.attributes.health, self.operation) {
            (Some(HealthFocus::Unhealthy), _) => ChannelView::Unhealthy,
            (Some(HealthFocus::Overview), _) => ChannelView::Health,
            (None, Operation::Liquidity) => ChannelView::Liquidity,
            (None, _) => ChannelView::List,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("Query is empty")]
    EmptyQuery,

    #[error("Query is too long ({len} characters, limit {max})")]
    QueryTooLong { len: usize, max: usize },
}

/// Classify a raw query. Never fails; see the module docs.
pub fn classify(query: &str) -> Intent {
    match derive_intent(query) {
        Ok(intent) => {
            debug!(
                "Classified {:?} as {}/{:?} {:?}",
                query, intent.domain, intent.operation, intent.attributes
            );
            intent
        }
        Err(e) => {
            let message = redact::sanitize(&e.to_string());
            warn!("Could not classify query: {}", message);
            Intent::unrecognized(query, message)
        }
    }
}

fn derive_intent(query: &str) -> Result<Intent, ClassifyError> {
    let normalized = query.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(ClassifyError::EmptyQuery);
    }
    let len = normalized.chars().count();
    if len > MAX_QUERY_LEN {
        return Err(ClassifyError::QueryTooLong {
            len,
            max: MAX_QUERY_LEN,
        });
    }

    let domain = detect_domain(&normalized);
    let operation = detect_operation(domain, &normalized);
    let attributes = extract_attributes(domain, operation, &normalized);

    Ok(Intent {
        domain,
        operation,
        attributes,
        query: query.to_string(),
        error: None,
    })
}

/// Channels are the only domain implemented so far.
fn detect_domain(_query: &str) -> Domain {
    Domain::Channels
}

fn detect_operation(domain: Domain, query: &str) -> Operation {
    if domain != Domain::Channels {
        return Operation::Unknown;
    }
    if patterns::LIQUIDITY.is_match(query) {
        Operation::Liquidity
    } else {
        Operation::List
    }
}

fn extract_attributes(domain: Domain, operation: Operation, query: &str) -> IntentAttributes {
    let mut attributes = IntentAttributes::default();
    if domain != Domain::Channels {
        return attributes;
    }

    if query.contains("inactive") {
        attributes.active = Some(false);
    } else if query.contains("active") {
        attributes.active = Some(true);
    }

    if operation == Operation::Liquidity && query.contains("imbalanced") {
        attributes.check_balance = Some(true);
    }

    if patterns::UNHEALTHY.is_match(query) {
        attributes.health = Some(HealthFocus::Unhealthy);
    } else if patterns::HEALTH.is_match(query) {
        attributes.health = Some(HealthFocus::Overview);
    }

    attributes
}
