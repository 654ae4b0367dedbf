//! Multi-provider transaction engine.
//!
//! This crate coordinates every third-party provider the engine knows about
//! (miners, block explorers, a raw-node proxy and merkle-root verification
//! services) to broadcast transactions, query their state and verify merkle
//! roots. Providers are reached through the traits in `chainstate-providers`
//! and composed into a [`ChainstateClient`] by [`ChainstateBuilder`].

use chainstate_types::{ParseRequiredInError, MIN_TX_ID_LENGTH};
use thiserror::Error;

pub mod builder;
pub mod classify;
pub mod engine;
pub mod fanout;
pub mod health;
pub mod provider;
pub mod registry;
pub mod requirement;

#[cfg(test)]
pub(crate) mod test_support;

pub use builder::ChainstateBuilder;
pub use classify::{classify, classify_broadcast_error, ErrorClass, PatternTable};
pub use engine::ChainstateClient;
pub use fanout::FirstSuccess;
pub use health::{MinerHealthManager, MinerSelection};
pub use provider::Provider;
pub use registry::{Operation, ProviderClients};
pub use requirement::satisfies;

/// Errors returned by engine operations.
#[derive(Debug, Error)]
pub enum ChainstateError {
	#[error("Invalid transaction id: must be at least {min} characters", min = MIN_TX_ID_LENGTH)]
	InvalidTransactionId,
	#[error("Invalid transaction hex: must not be empty")]
	InvalidTransactionHex,
	#[error("Invalid requirement: {0}")]
	InvalidRequirement(String),
	/// No provider returned a record satisfying the requirement in time.
	#[error("Transaction not found")]
	TransactionNotFound,
	/// Every provider failed; carries one `name: message` entry per provider.
	#[error("Broadcast failed: {0}")]
	BroadcastFailed(String),
	#[error("No providers available for {0}")]
	NoProviders(Operation),
	#[error("No broadcast miners available")]
	NoBroadcastMiners,
	#[error("No query miners available")]
	NoQueryMiners,
	#[error("No merkle-root verification providers configured")]
	NoMerkleVerifiers,
	#[error("Merkle roots not confirmed: {}", .0.join(", "))]
	MerkleRootsNotConfirmed(Vec<String>),
	#[error("Merkle-root verification failed: {0}")]
	MerkleVerification(String),
	#[error("Configuration error: {0}")]
	Config(String),
}

impl From<ParseRequiredInError> for ChainstateError {
	fn from(err: ParseRequiredInError) -> Self {
		ChainstateError::InvalidRequirement(err.to_string())
	}
}

impl From<chainstate_config::ConfigError> for ChainstateError {
	fn from(err: chainstate_config::ConfigError) -> Self {
		ChainstateError::Config(err.to_string())
	}
}

/// Rejects ids too short to be a transaction id.
pub(crate) fn validate_tx_id(id: &str) -> Result<(), ChainstateError> {
	if id.len() < MIN_TX_ID_LENGTH {
		return Err(ChainstateError::InvalidTransactionId);
	}
	Ok(())
}

pub(crate) fn validate_tx_hex(tx_hex: &str) -> Result<(), ChainstateError> {
	if tx_hex.trim().is_empty() {
		return Err(ChainstateError::InvalidTransactionHex);
	}
	Ok(())
}
