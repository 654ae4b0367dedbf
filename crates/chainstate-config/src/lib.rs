//! Configuration module for the chainstate engine.
//!
//! Configuration is loaded from TOML. Before parsing, `${VAR}` and
//! `${VAR:-default}` references are replaced with environment values so
//! that credentials never have to live in the file itself. The parsed
//! configuration is validated before it is handed to the engine.

mod miners;

use chainstate_types::{Miner, Network, ProviderFamily, SecretString};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub use miners::{default_miners, DEFAULT_EXPLORER_URL};

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// What happens to fan-out tasks still running once a first-result
/// operation has its answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StragglerPolicy {
	/// Leave them running until they finish or hit the call deadline.
	#[default]
	Detach,
	/// Cancel them immediately.
	Abort,
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Network the engine operates on.
	#[serde(default)]
	pub network: Network,
	/// Provider families that must never be contacted.
	#[serde(default)]
	pub excluded_providers: Vec<ProviderFamily>,
	/// Deadline for query operations and the broadcast mempool fallback.
	#[serde(default = "default_query_timeout_seconds")]
	pub query_timeout_seconds: u64,
	/// Deadline used by callers that do not pass their own broadcast timeout.
	#[serde(default = "default_broadcast_timeout_seconds")]
	pub broadcast_timeout_seconds: u64,
	/// Deadline for merkle-root verification.
	#[serde(default = "default_merkle_timeout_seconds")]
	pub merkle_timeout_seconds: u64,
	/// Deadline for each miner fee probe at construction.
	#[serde(default = "default_fee_probe_timeout_seconds")]
	pub fee_probe_timeout_seconds: u64,
	/// Select the lowest probed miner fee instead of the default fee.
	#[serde(default = "default_validate_fee_quotes")]
	pub validate_fee_quotes: bool,
	/// Straggler handling for the race query.
	#[serde(default)]
	pub race_stragglers: StragglerPolicy,
	/// Straggler handling for merkle-root verification.
	#[serde(default)]
	pub merkle_stragglers: StragglerPolicy,
	/// Custom miner lists.
	#[serde(default)]
	pub miners: MinersConfig,
	/// Primary block explorer.
	#[serde(default)]
	pub explorer: EndpointConfig,
	/// Secondary block explorer, queried after the primary one.
	#[serde(default)]
	pub secondary_explorer: Option<EndpointConfig>,
	/// Raw-node proxy, only used when an API key is configured.
	#[serde(default)]
	pub node_proxy: Option<EndpointConfig>,
	/// Merkle-root verification services.
	#[serde(default)]
	pub merkle_verifiers: Vec<MerkleVerifierConfig>,
}

/// Broadcast and query miner lists, each independently overridable.
///
/// A missing list falls back to the built-in miners.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MinersConfig {
	pub broadcast: Option<Vec<Miner>>,
	pub query: Option<Vec<Miner>>,
}

/// Location and credential of an HTTP provider.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EndpointConfig {
	pub url: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub api_key: Option<SecretString>,
}

impl Default for EndpointConfig {
	fn default() -> Self {
		Self {
			url: DEFAULT_EXPLORER_URL.to_string(),
			api_key: None,
		}
	}
}

impl EndpointConfig {
	/// The API key, if one is configured and non-blank.
	pub fn credential(&self) -> Option<&SecretString> {
		self.api_key.as_ref().filter(|key| !key.is_empty())
	}
}

/// A merkle-root verification service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MerkleVerifierConfig {
	pub url: String,
	pub token: SecretString,
}

fn default_query_timeout_seconds() -> u64 {
	10
}

fn default_broadcast_timeout_seconds() -> u64 {
	30
}

fn default_merkle_timeout_seconds() -> u64 {
	10
}

fn default_fee_probe_timeout_seconds() -> u64 {
	5
}

fn default_validate_fee_quotes() -> bool {
	true
}

impl Default for Config {
	fn default() -> Self {
		Self {
			network: Network::default(),
			excluded_providers: Vec::new(),
			query_timeout_seconds: default_query_timeout_seconds(),
			broadcast_timeout_seconds: default_broadcast_timeout_seconds(),
			merkle_timeout_seconds: default_merkle_timeout_seconds(),
			fee_probe_timeout_seconds: default_fee_probe_timeout_seconds(),
			validate_fee_quotes: default_validate_fee_quotes(),
			race_stragglers: StragglerPolicy::default(),
			merkle_stragglers: StragglerPolicy::default(),
			miners: MinersConfig::default(),
			explorer: EndpointConfig::default(),
			secondary_explorer: None,
			node_proxy: None,
			merkle_verifiers: Vec::new(),
		}
	}
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut replacements = Vec::new();
	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				}
			},
		};
		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply in reverse so earlier offsets stay valid
	let mut result = input.to_string();
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads, resolves and validates a configuration file.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path.as_ref()).await?;
		content.parse()
	}

	/// Whether a provider family is on the exclusion list.
	pub fn is_excluded(&self, family: ProviderFamily) -> bool {
		self.excluded_providers.contains(&family)
	}

	/// Miners used for broadcasting, custom or built-in.
	pub fn broadcast_miners(&self) -> Vec<Miner> {
		self.miners.broadcast.clone().unwrap_or_else(default_miners)
	}

	/// Miners used for querying, custom or built-in.
	pub fn query_miners(&self) -> Vec<Miner> {
		self.miners.query.clone().unwrap_or_else(default_miners)
	}

	/// Node proxy endpoint, present only when its API key is configured.
	pub fn node_proxy_endpoint(&self) -> Option<&EndpointConfig> {
		self.node_proxy
			.as_ref()
			.filter(|endpoint| endpoint.credential().is_some())
	}

	pub fn query_timeout(&self) -> Duration {
		Duration::from_secs(self.query_timeout_seconds)
	}

	pub fn broadcast_timeout(&self) -> Duration {
		Duration::from_secs(self.broadcast_timeout_seconds)
	}

	pub fn merkle_timeout(&self) -> Duration {
		Duration::from_secs(self.merkle_timeout_seconds)
	}

	pub fn fee_probe_timeout(&self) -> Duration {
		Duration::from_secs(self.fee_probe_timeout_seconds)
	}

	/// Validates the configuration.
	///
	/// Checks that every timeout is positive, that endpoint urls are set and
	/// that miner ids are unique within each miner list.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let timeouts = [
			("query_timeout_seconds", self.query_timeout_seconds),
			("broadcast_timeout_seconds", self.broadcast_timeout_seconds),
			("merkle_timeout_seconds", self.merkle_timeout_seconds),
			("fee_probe_timeout_seconds", self.fee_probe_timeout_seconds),
		];
		for (name, value) in timeouts {
			if value == 0 {
				return Err(ConfigError::Validation(format!(
					"{} must be greater than 0",
					name
				)));
			}
		}

		if let Some(miners) = &self.miners.broadcast {
			validate_miners("miners.broadcast", miners)?;
		}
		if let Some(miners) = &self.miners.query {
			validate_miners("miners.query", miners)?;
		}

		if self.explorer.url.trim().is_empty() {
			return Err(ConfigError::Validation("explorer.url cannot be empty".into()));
		}
		if let Some(secondary) = &self.secondary_explorer {
			if secondary.url.trim().is_empty() {
				return Err(ConfigError::Validation(
					"secondary_explorer.url cannot be empty".into(),
				));
			}
		}
		if let Some(proxy) = &self.node_proxy {
			if proxy.url.trim().is_empty() {
				return Err(ConfigError::Validation(
					"node_proxy.url cannot be empty".into(),
				));
			}
		}

		for (index, verifier) in self.merkle_verifiers.iter().enumerate() {
			if verifier.url.trim().is_empty() {
				return Err(ConfigError::Validation(format!(
					"merkle_verifiers[{}].url cannot be empty",
					index
				)));
			}
		}

		Ok(())
	}
}

fn validate_miners(section: &str, miners: &[Miner]) -> Result<(), ConfigError> {
	let mut seen = HashSet::new();
	for miner in miners {
		if miner.miner_id.trim().is_empty() {
			return Err(ConfigError::Validation(format!(
				"{}: miner '{}' has an empty miner_id",
				section, miner.name
			)));
		}
		if miner.url.trim().is_empty() {
			return Err(ConfigError::Validation(format!(
				"{}: miner '{}' has an empty url",
				section, miner.name
			)));
		}
		if !seen.insert(miner.miner_id.as_str()) {
			return Err(ConfigError::Validation(format!(
				"{}: duplicate miner_id '{}'",
				section, miner.miner_id
			)));
		}
	}
	Ok(())
}

/// Parses TOML after resolving environment variables, then validates.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chainstate_types::MinerApi;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("CHAINSTATE_TEST_HOST", "localhost");
		std::env::set_var("CHAINSTATE_TEST_PORT", "8080");

		let input = "url = \"http://${CHAINSTATE_TEST_HOST}:${CHAINSTATE_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "url = \"http://localhost:8080\"");

		std::env::remove_var("CHAINSTATE_TEST_HOST");
		std::env::remove_var("CHAINSTATE_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "api_key = \"${CHAINSTATE_MISSING_KEY:-fallback}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "api_key = \"fallback\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let result = resolve_env_vars("api_key = \"${CHAINSTATE_MISSING_KEY}\"");
		assert!(result.unwrap_err().to_string().contains("CHAINSTATE_MISSING_KEY"));
	}

	#[test]
	fn test_empty_config_uses_defaults() {
		let config: Config = "".parse().unwrap();

		assert_eq!(config.network, Network::MainNet);
		assert_eq!(config.query_timeout(), Duration::from_secs(10));
		assert_eq!(config.fee_probe_timeout(), Duration::from_secs(5));
		assert!(config.validate_fee_quotes);
		assert_eq!(config.race_stragglers, StragglerPolicy::Detach);
		assert_eq!(config.explorer.url, DEFAULT_EXPLORER_URL);
		assert_eq!(config.broadcast_miners(), default_miners());
		assert!(config.node_proxy_endpoint().is_none());
	}

	#[test]
	fn test_full_config() {
		std::env::set_var("CHAINSTATE_TEST_PROXY_KEY", "proxy-secret");

		let config_str = r#"
network = "test"
excluded_providers = ["secondary_explorer"]
query_timeout_seconds = 4
validate_fee_quotes = false
merkle_stragglers = "abort"

[[miners.broadcast]]
miner_id = "m1"
name = "Taal"
url = "https://arc.taal.com"
api = "arc"
token = "taal-token"

[explorer]
url = "https://explorer.example"

[node_proxy]
url = "https://node.example"
api_key = "${CHAINSTATE_TEST_PROXY_KEY}"

[[merkle_verifiers]]
url = "https://headers.example"
token = "verifier-token"
"#;

		let config: Config = config_str.parse().unwrap();
		assert_eq!(config.network, Network::TestNet);
		assert!(config.is_excluded(ProviderFamily::SecondaryExplorer));
		assert!(!config.is_excluded(ProviderFamily::Miner));
		assert_eq!(config.query_timeout_seconds, 4);
		assert!(!config.validate_fee_quotes);
		assert_eq!(config.merkle_stragglers, StragglerPolicy::Abort);

		let broadcast = config.broadcast_miners();
		assert_eq!(broadcast.len(), 1);
		assert_eq!(broadcast[0].api, MinerApi::Arc);
		assert_eq!(broadcast[0].token.as_ref().unwrap().expose_secret(), "taal-token");
		// Query list not overridden
		assert_eq!(config.query_miners(), default_miners());

		let proxy = config.node_proxy_endpoint().unwrap();
		assert_eq!(proxy.credential().unwrap().expose_secret(), "proxy-secret");
		assert_eq!(config.merkle_verifiers.len(), 1);

		std::env::remove_var("CHAINSTATE_TEST_PROXY_KEY");
	}

	#[test]
	fn test_node_proxy_without_key_is_inactive() {
		let config: Config = r#"
[node_proxy]
url = "https://node.example"
api_key = ""
"#
		.parse()
		.unwrap();
		assert!(config.node_proxy.is_some());
		assert!(config.node_proxy_endpoint().is_none());
	}

	#[test]
	fn test_unknown_excluded_provider_rejected() {
		let result = r#"excluded_providers = ["bitails"]"#.parse::<Config>();
		assert!(matches!(result, Err(ConfigError::Parse(_))));
	}

	#[test]
	fn test_zero_timeout_rejected() {
		let result = "query_timeout_seconds = 0".parse::<Config>();
		let err = result.unwrap_err();
		assert!(err.to_string().contains("query_timeout_seconds"));
	}

	#[test]
	fn test_duplicate_miner_ids_rejected() {
		let config_str = r#"
[[miners.query]]
miner_id = "same"
name = "A"
url = "https://a.example"

[[miners.query]]
miner_id = "same"
name = "B"
url = "https://b.example"
"#;
		let err = config_str.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("duplicate miner_id"));
	}

	#[tokio::test]
	async fn test_from_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("chainstate.toml");
		std::fs::write(&path, "network = \"stn\"\nmerkle_timeout_seconds = 3\n").unwrap();

		let config = Config::from_file(&path).await.unwrap();
		assert_eq!(config.network, Network::StressTestNet);
		assert_eq!(config.merkle_timeout(), Duration::from_secs(3));
	}

	#[tokio::test]
	async fn test_from_missing_file() {
		let result = Config::from_file("/nonexistent/chainstate.toml").await;
		assert!(matches!(result, Err(ConfigError::Io(_))));
	}

	#[test]
	fn test_sample_config_parses() {
		let config: Config = include_str!("../../../config/chainstate.toml").parse().unwrap();

		let broadcast = config.broadcast_miners();
		assert_eq!(broadcast.len(), 2);
		assert_eq!(broadcast[1].api, MinerApi::Arc);
		assert_eq!(config.query_miners().len(), 3);
		assert_eq!(config.merkle_verifiers.len(), 1);
		assert_eq!(config.race_stragglers, StragglerPolicy::Detach);
	}
}
