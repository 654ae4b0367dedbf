//! Provider collaborators for the chainstate engine.
//!
//! Each third-party service the engine talks to is reached through one of
//! the interfaces below. The engine only depends on these traits; concrete
//! HTTP wrappers and in-process mocks live under `implementations`.
//! Implementations must be safe for concurrent use, since a single client
//! instance is shared across every in-flight operation.

use async_trait::async_trait;
use chainstate_types::{Fee, MerkleRootConfirmationRequest, MerkleRootsVerification, Miner};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub(crate) mod http;

	pub mod explorer;
	pub mod merkle;
	pub mod miner;
	pub mod mock;
	pub mod node_proxy;
}

/// Errors a provider call can end with.
///
/// The `Display` text carries the provider's own wording, which the engine
/// classifies to tell "already accepted" apart from real failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
	/// The request never produced a response.
	#[error("Network error: {0}")]
	Network(String),
	/// The provider answered with a non-success HTTP status.
	#[error("HTTP {status}: {message}")]
	Http { status: u16, message: String },
	/// The provider does not know the transaction.
	#[error("Transaction not found")]
	NotFound,
	/// The provider answered but refused the transaction.
	#[error("Rejected: {0}")]
	Rejected(String),
	/// The provider returned a record for a different transaction.
	#[error("Transaction id mismatch: expected {expected}, got {actual}")]
	IdMismatch { expected: String, actual: String },
	/// The response body could not be decoded.
	#[error("Decode error: {0}")]
	Decode(String),
	/// The call did not finish before the operation deadline.
	#[error("Timed out")]
	Timeout,
	/// The provider could not be built from its configuration.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Outcome of submitting a transaction to a miner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResponse {
	pub tx_id: String,
	pub miner_id: String,
	/// Whether the miner reported the submission as accepted.
	pub accepted: bool,
	/// The miner's own description of the result.
	pub description: String,
}

/// Status of a transaction as reported by a miner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinerTransactionStatus {
	pub tx_id: String,
	pub miner_id: String,
	pub block_hash: String,
	pub block_height: u64,
	pub confirmations: u64,
	/// Whether the miner reported the lookup as successful.
	pub found: bool,
	pub description: String,
	pub merkle_proof: Option<serde_json::Value>,
}

/// Status of a transaction as reported by a block explorer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerTransaction {
	pub tx_id: String,
	pub block_hash: String,
	pub block_height: u64,
	pub confirmations: u64,
}

/// Status of a transaction as reported by a raw-node proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTransaction {
	pub tx_id: String,
	pub block_hash: String,
	pub block_height: u64,
	pub confirmations: u64,
}

/// Miner-submission API, shared by every configured miner.
#[async_trait]
pub trait MinerClient: Send + Sync {
	/// Submits a raw transaction to `miner`.
	async fn submit_transaction(
		&self,
		miner: &Miner,
		tx_hex: &str,
	) -> Result<SubmissionResponse, ProviderError>;

	/// Looks up a transaction on `miner`.
	async fn query_transaction(
		&self,
		miner: &Miner,
		tx_id: &str,
	) -> Result<MinerTransactionStatus, ProviderError>;

	/// Fetches the standard mining fee from a fee-quote miner.
	async fn fee_quote(&self, miner: &Miner) -> Result<Fee, ProviderError>;

	/// Fetches the mining fee from a policy-quote miner.
	async fn policy_quote(&self, miner: &Miner) -> Result<Fee, ProviderError>;
}

/// Block-explorer API. Used for both the primary and secondary explorer.
#[async_trait]
pub trait ExplorerClient: Send + Sync {
	/// Name used in provider-qualified messages.
	fn name(&self) -> &str;

	/// Broadcasts a raw transaction, returning the id the explorer reports.
	async fn broadcast_tx(&self, tx_hex: &str) -> Result<String, ProviderError>;

	/// Looks up a transaction by id.
	async fn get_tx_by_hash(&self, tx_id: &str) -> Result<ExplorerTransaction, ProviderError>;
}

/// Raw-node JSON-RPC proxy.
#[async_trait]
pub trait NodeProxyClient: Send + Sync {
	fn name(&self) -> &str;

	/// `sendrawtransaction`, returning the transaction id.
	async fn send_raw_transaction(&self, tx_hex: &str) -> Result<String, ProviderError>;

	/// Verbose `getrawtransaction`.
	async fn get_transaction(&self, tx_id: &str) -> Result<NodeTransaction, ProviderError>;
}

/// Merkle-root verification service.
#[async_trait]
pub trait MerkleRootsClient: Send + Sync {
	fn name(&self) -> &str;

	async fn verify_merkle_roots(
		&self,
		roots: &[MerkleRootConfirmationRequest],
	) -> Result<MerkleRootsVerification, ProviderError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_error_text_keeps_provider_wording() {
		let err = ProviderError::Rejected("257: txn-already-known".to_string());
		assert_eq!(err.to_string(), "Rejected: 257: txn-already-known");

		let err = ProviderError::Http {
			status: 400,
			message: "Missing inputs".to_string(),
		};
		assert!(err.to_string().contains("Missing inputs"));
	}
}
