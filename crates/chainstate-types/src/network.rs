//! Network selection.
//!
//! The active network gates which provider families may participate in an
//! operation: miner submission and raw-node proxies only serve the main and
//! test networks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Blockchain network the engine talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
	#[default]
	#[serde(rename = "main", alias = "mainnet")]
	MainNet,
	#[serde(rename = "test", alias = "testnet")]
	TestNet,
	#[serde(rename = "stn", alias = "stresstestnet")]
	StressTestNet,
}

impl Network {
	/// Short name used in configuration files.
	pub fn as_str(&self) -> &'static str {
		match self {
			Network::MainNet => "main",
			Network::TestNet => "test",
			Network::StressTestNet => "stn",
		}
	}

	/// Whether miner-submission and raw-node-proxy providers serve this network.
	pub fn supports_miners(&self) -> bool {
		matches!(self, Network::MainNet | Network::TestNet)
	}
}

impl fmt::Display for Network {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned for an unknown network name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown network '{0}'")]
pub struct ParseNetworkError(pub String);

impl FromStr for Network {
	type Err = ParseNetworkError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"main" | "mainnet" => Ok(Network::MainNet),
			"test" | "testnet" => Ok(Network::TestNet),
			"stn" | "stresstestnet" => Ok(Network::StressTestNet),
			_ => Err(ParseNetworkError(s.to_string())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_miner_family_gating() {
		assert!(Network::MainNet.supports_miners());
		assert!(Network::TestNet.supports_miners());
		assert!(!Network::StressTestNet.supports_miners());
	}

	#[test]
	fn test_parse_aliases() {
		assert_eq!("mainnet".parse::<Network>().unwrap(), Network::MainNet);
		assert_eq!("TEST".parse::<Network>().unwrap(), Network::TestNet);
		assert_eq!("stn".parse::<Network>().unwrap(), Network::StressTestNet);
		assert!("regtest".parse::<Network>().is_err());
	}
}
