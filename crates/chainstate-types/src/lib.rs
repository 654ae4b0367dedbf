//! Common types for the chainstate broadcast and query engine.
//!
//! This crate holds the data model shared by the configuration layer, the
//! provider collaborators and the orchestration engine: transaction status
//! records, inclusion requirements, networks, miners and their fees, and the
//! merkle-root verification payloads.

/// Merkle-root verification request and response types.
pub mod merkle;
/// Miner descriptors and fee quotes.
pub mod miner;
/// Blockchain network selection.
pub mod network;
/// Provider family names used by the exclusion list.
pub mod provider;
/// Redacting wrapper for API keys and bearer tokens.
pub mod secret_string;
/// Transaction status records and inclusion requirements.
pub mod transaction;
/// Formatting helpers used in log output.
pub mod utils;

pub use merkle::{
	ConfirmationState, MerkleRootConfirmation, MerkleRootConfirmationRequest,
	MerkleRootsVerification,
};
pub use miner::{Fee, Miner, MinerApi, DEFAULT_FEE};
pub use network::{Network, ParseNetworkError};
pub use provider::{ParseProviderFamilyError, ProviderFamily};
pub use secret_string::SecretString;
pub use transaction::{ParseRequiredInError, RequiredIn, TransactionInfo, MIN_TX_ID_LENGTH};
pub use utils::{is_hex, truncate_id};
