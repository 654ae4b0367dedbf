//! Merkle-root verification payloads.
//!
//! Roots are checked against an independent chain-tracking service. The
//! field names follow that service's JSON (camelCase).

use serde::{Deserialize, Serialize};

/// A merkle root together with the height of the block it claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleRootConfirmationRequest {
	pub merkle_root: String,
	pub block_height: u64,
}

impl MerkleRootConfirmationRequest {
	pub fn new(merkle_root: impl Into<String>, block_height: u64) -> Self {
		Self {
			merkle_root: merkle_root.into(),
			block_height,
		}
	}
}

/// Verdict for a batch or a single root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfirmationState {
	Confirmed,
	Invalid,
	UnableToVerify,
}

/// Per-root result returned by a verification service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleRootConfirmation {
	pub merkle_root: String,
	pub block_height: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub hash: Option<String>,
	pub confirmation: ConfirmationState,
}

/// Batch result returned by a verification service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleRootsVerification {
	pub confirmation_state: ConfirmationState,
	#[serde(default)]
	pub confirmations: Vec<MerkleRootConfirmation>,
}

impl MerkleRootsVerification {
	pub fn all_confirmed(&self) -> bool {
		self.confirmation_state == ConfirmationState::Confirmed
	}

	/// Roots that the service did not confirm.
	pub fn unconfirmed_roots(&self) -> Vec<String> {
		self.confirmations
			.iter()
			.filter(|c| c.confirmation != ConfirmationState::Confirmed)
			.map(|c| c.merkle_root.clone())
			.collect()
	}
}
