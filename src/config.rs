use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::health::{DEFAULT_MAX_LOCAL_RATIO, DEFAULT_MIN_LOCAL_RATIO};
use crate::model::{HealthCriteria, PubkeyPolicy};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub node: NodeConfig,
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

#[derive(Debug, Deserialize)]
pub struct NodeConfig {
    /// LND REST endpoint, e.g. https://localhost:8080
    pub rest_url: String,
    /// Path to a (read-only) macaroon
    pub macaroon_path: PathBuf,
    /// Path to the node's TLS certificate
    pub tls_cert_path: PathBuf,
    /// Maximum concurrent requests against the node
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Require 66-hex-character pubkeys (disable for regtest fixtures)
    #[serde(default = "default_true")]
    pub strict_pubkeys: bool,
}

#[derive(Debug, Deserialize)]
pub struct HealthConfig {
    /// Lower bound of the healthy local balance ratio
    #[serde(default = "default_min_local_ratio")]
    pub min_local_ratio: f64,
    /// Upper bound of the healthy local balance ratio
    #[serde(default = "default_max_local_ratio")]
    pub max_local_ratio: f64,
}

#[derive(Debug, Deserialize)]
pub struct EnrichmentConfig {
    /// Give up on a single alias lookup after this many seconds
    #[serde(default = "default_alias_timeout")]
    pub alias_timeout_secs: u64,
    /// Maximum alias lookups running at once per query
    #[serde(default = "default_max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_max_in_flight() -> usize {
    4
}
fn default_request_timeout() -> u64 {
    30
}
fn default_min_local_ratio() -> f64 {
    DEFAULT_MIN_LOCAL_RATIO
}
fn default_max_local_ratio() -> f64 {
    DEFAULT_MAX_LOCAL_RATIO
}
fn default_alias_timeout() -> u64 {
    10
}
fn default_max_concurrent_lookups() -> usize {
    16
}

// Default implementations
impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            strict_pubkeys: true,
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            min_local_ratio: default_min_local_ratio(),
            max_local_ratio: default_max_local_ratio(),
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            alias_timeout_secs: default_alias_timeout(),
            max_concurrent_lookups: default_max_concurrent_lookups(),
        }
    }
}

impl EnrichmentConfig {
    pub fn alias_timeout(&self) -> Duration {
        Duration::from_secs(self.alias_timeout_secs)
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config = Self::parse(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and deserialize without validating the node section.
    pub fn parse(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.health_criteria()?;

        if self.enrichment.alias_timeout_secs == 0 {
            anyhow::bail!("alias_timeout_secs must be greater than zero");
        }
        if self.enrichment.max_concurrent_lookups == 0 {
            anyhow::bail!("max_concurrent_lookups must be greater than zero");
        }
        if self.node.max_in_flight == 0 {
            anyhow::bail!("max_in_flight must be greater than zero");
        }
        if self.node.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than zero");
        }
        if !self.node.rest_url.starts_with("https://") {
            anyhow::bail!("rest_url must use https: {}", self.node.rest_url);
        }
        if !self.node.tls_cert_path.exists() {
            anyhow::bail!(
                "TLS cert not found at: {}",
                self.node.tls_cert_path.display()
            );
        }
        if !self.node.macaroon_path.exists() {
            anyhow::bail!(
                "Macaroon not found at: {}",
                self.node.macaroon_path.display()
            );
        }
        Ok(())
    }

    pub fn health_criteria(&self) -> anyhow::Result<HealthCriteria> {
        let criteria =
            HealthCriteria::new(self.health.min_local_ratio, self.health.max_local_ratio)?;
        Ok(criteria)
    }

    pub fn pubkey_policy(&self) -> PubkeyPolicy {
        if self.general.strict_pubkeys {
            PubkeyPolicy::Strict
        } else {
            PubkeyPolicy::Relaxed
        }
    }

    /// Create a config with all defaults for testing purposes.
    /// Credential paths point at `path` (must exist for validation).
    #[cfg(test)]
    pub fn test_default(path: PathBuf) -> Self {
        Self {
            node: NodeConfig {
                rest_url: "https://localhost:8080".to_string(),
                macaroon_path: path.clone(),
                tls_cert_path: path,
                max_in_flight: default_max_in_flight(),
                request_timeout_secs: default_request_timeout(),
            },
            general: GeneralConfig::default(),
            health: HealthConfig::default(),
            enrichment: EnrichmentConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn make_valid_config() -> Config {
        // Use /dev/null as a path that always exists on macOS/Linux
        Config::test_default(PathBuf::from("/dev/null"))
    }

    #[test]
    fn test_validate_defaults_pass() {
        let config = make_valid_config();
        assert!(config.validate().is_ok(), "{}", config.validate().unwrap_err());
    }

    #[test]
    fn test_validate_inverted_health_band() {
        let mut config = make_valid_config();
        config.health.min_local_ratio = 0.9;
        config.health.max_local_ratio = 0.1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid health criteria"));
    }

    #[test]
    fn test_validate_ratio_out_of_range() {
        let mut config = make_valid_config();
        config.health.max_local_ratio = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_alias_timeout() {
        let mut config = make_valid_config();
        config.enrichment.alias_timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("alias_timeout_secs"));
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let mut config = make_valid_config();
        config.enrichment.max_concurrent_lookups = 0;
        assert!(config.validate().is_err());

        let mut config = make_valid_config();
        config.node.max_in_flight = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_plain_http_rejected() {
        let mut config = make_valid_config();
        config.node.rest_url = "http://localhost:8080".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("https"));
    }

    #[test]
    fn test_validate_tls_cert_missing() {
        let mut config = make_valid_config();
        config.node.tls_cert_path = PathBuf::from("/nonexistent/path/tls.cert");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("TLS cert not found"));
    }

    #[test]
    fn test_validate_macaroon_missing() {
        let mut config = make_valid_config();
        config.node.macaroon_path = PathBuf::from("/nonexistent/readonly.macaroon");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Macaroon not found"));
    }

    #[test]
    fn test_pubkey_policy_follows_general() {
        let mut config = make_valid_config();
        assert_eq!(config.pubkey_policy(), PubkeyPolicy::Strict);
        config.general.strict_pubkeys = false;
        assert_eq!(config.pubkey_policy(), PubkeyPolicy::Relaxed);
    }

    #[test]
    fn test_toml_deserialize_minimal() {
        let toml_str = r#"
[node]
rest_url = "https://localhost:8080"
macaroon_path = "/tmp/readonly.macaroon"
tls_cert_path = "/tmp/tls.cert"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.node.rest_url, "https://localhost:8080");
        // Defaults should be applied
        assert_eq!(config.node.max_in_flight, 4);
        assert!(config.general.strict_pubkeys);
        assert_eq!(config.health.min_local_ratio, 0.2);
        assert_eq!(config.health.max_local_ratio, 0.8);
        assert_eq!(config.enrichment.alias_timeout(), Duration::from_secs(10));
        assert_eq!(config.enrichment.max_concurrent_lookups, 16);
    }

    #[test]
    fn test_load_from_file() {
        let cert = tempfile::NamedTempFile::new().unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[node]
rest_url = "https://node.local:8080"
macaroon_path = "{path}"
tls_cert_path = "{path}"

[health]
min_local_ratio = 0.3
max_local_ratio = 0.7

[enrichment]
alias_timeout_secs = 3
"#,
            path = cert.path().display()
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        let criteria = config.health_criteria().unwrap();
        assert_eq!(criteria.min_local_ratio(), 0.3);
        assert_eq!(criteria.max_local_ratio(), 0.7);
        assert_eq!(config.enrichment.alias_timeout_secs, 3);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Config::load(Path::new("/nonexistent/ln-query.toml")).is_err());
    }
}
