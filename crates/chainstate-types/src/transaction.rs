//! Transaction status types.
//!
//! `TransactionInfo` is what every provider hands back for a queried
//! transaction, normalized across miners, explorers and node proxies.
//! `RequiredIn` is the caller's minimum acceptable inclusion level.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Shortest transaction id accepted by broadcast and query operations.
pub const MIN_TX_ID_LENGTH: usize = 50;

/// Status of a transaction as reported by a single provider.
///
/// Built fresh for every provider response and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInfo {
	/// Hash of the block containing the transaction, empty while in the mempool.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub block_hash: String,
	/// Height of the containing block, zero while in the mempool.
	#[serde(default)]
	pub block_height: u64,
	/// Number of confirmations reported by the provider.
	#[serde(default, skip_serializing_if = "is_zero")]
	pub confirmations: u64,
	/// Transaction id as echoed back by the provider.
	pub id: String,
	/// Identifier of the miner that acknowledged the transaction, if any.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub miner_id: String,
	/// Name of the provider that produced this record.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub provider: String,
	/// Merkle proof of inclusion, when the provider supplies one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub merkle_proof: Option<serde_json::Value>,
}

fn is_zero(value: &u64) -> bool {
	*value == 0
}

impl TransactionInfo {
	/// Returns true when the provider reports the transaction inside a block.
	pub fn is_mined(&self) -> bool {
		!self.block_hash.is_empty()
	}
}

/// Minimum inclusion level a queried transaction must have reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredIn {
	/// Any acknowledgment counts, mempool or confirmed.
	InMempool,
	/// The transaction must be in a block with at least one confirmation.
	OnChain,
}

impl RequiredIn {
	/// Canonical name used in configuration and on the command line.
	pub fn as_str(&self) -> &'static str {
		match self {
			RequiredIn::InMempool => "mempool",
			RequiredIn::OnChain => "onchain",
		}
	}
}

impl fmt::Display for RequiredIn {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when a requirement name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized requirement '{0}', expected 'mempool' or 'onchain'")]
pub struct ParseRequiredInError(pub String);

impl FromStr for RequiredIn {
	type Err = ParseRequiredInError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"mempool" | "in_mempool" => Ok(RequiredIn::InMempool),
			"onchain" | "on_chain" => Ok(RequiredIn::OnChain),
			_ => Err(ParseRequiredInError(s.to_string())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_wire_shape_omits_empty_fields() {
		let info = TransactionInfo {
			id: "abc".to_string(),
			block_height: 0,
			..Default::default()
		};
		let json = serde_json::to_value(&info).unwrap();
		let object = json.as_object().unwrap();

		assert_eq!(object.get("id").unwrap(), "abc");
		assert_eq!(object.get("block_height").unwrap(), 0);
		assert!(!object.contains_key("block_hash"));
		assert!(!object.contains_key("confirmations"));
		assert!(!object.contains_key("miner_id"));
		assert!(!object.contains_key("merkle_proof"));
	}

	#[test]
	fn test_wire_shape_parses_provider_record() {
		let json = r#"{
			"block_hash": "0000000000000000025b8e9a0b3e5a7c",
			"block_height": 723229,
			"confirmations": 319,
			"id": "deadbeef",
			"provider": "Taal"
		}"#;
		let info: TransactionInfo = serde_json::from_str(json).unwrap();

		assert!(info.is_mined());
		assert_eq!(info.block_height, 723229);
		assert_eq!(info.confirmations, 319);
		assert_eq!(info.provider, "Taal");
		assert!(info.miner_id.is_empty());
	}

	#[test]
	fn test_required_in_parsing() {
		assert_eq!("mempool".parse::<RequiredIn>().unwrap(), RequiredIn::InMempool);
		assert_eq!("OnChain".parse::<RequiredIn>().unwrap(), RequiredIn::OnChain);
		assert_eq!("on_chain".parse::<RequiredIn>().unwrap(), RequiredIn::OnChain);

		let err = "confirmed".parse::<RequiredIn>().unwrap_err();
		assert!(err.to_string().contains("confirmed"));
	}
}
