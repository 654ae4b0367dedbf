//! Provider family names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The families of third-party providers the engine can fan out to.
///
/// Families are what the exclusion list names; a family can hold several
/// provider instances (one per configured miner, for example).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFamily {
	/// Miner-submission APIs, one provider per miner.
	Miner,
	/// Primary block explorer.
	Explorer,
	/// Secondary block explorer, query only.
	SecondaryExplorer,
	/// Raw-node JSON-RPC proxy, credential gated.
	NodeProxy,
}

impl ProviderFamily {
	pub fn as_str(&self) -> &'static str {
		match self {
			ProviderFamily::Miner => "miner",
			ProviderFamily::Explorer => "explorer",
			ProviderFamily::SecondaryExplorer => "secondary_explorer",
			ProviderFamily::NodeProxy => "node_proxy",
		}
	}
}

impl fmt::Display for ProviderFamily {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider family '{0}'")]
pub struct ParseProviderFamilyError(pub String);

impl FromStr for ProviderFamily {
	type Err = ParseProviderFamilyError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"miner" => Ok(ProviderFamily::Miner),
			"explorer" => Ok(ProviderFamily::Explorer),
			"secondary_explorer" => Ok(ProviderFamily::SecondaryExplorer),
			"node_proxy" => Ok(ProviderFamily::NodeProxy),
			_ => Err(ParseProviderFamilyError(s.to_string())),
		}
	}
}
