//! Provider variants the coordinators fan out to.
//!
//! Each variant wraps one collaborator client and normalizes its answers:
//! broadcasts become `Ok(())` or a `ProviderError`, lookups become a
//! [`TransactionInfo`] tagged with the provider's name.

use chainstate_providers::{
	ExplorerClient, ExplorerTransaction, MinerClient, MinerTransactionStatus, NodeProxyClient,
	NodeTransaction, ProviderError,
};
use chainstate_types::{Miner, ProviderFamily, TransactionInfo};
use std::fmt;
use std::sync::Arc;

/// One provider taking part in an operation.
#[derive(Clone)]
pub enum Provider {
	/// A single miner reached through the shared miner client.
	MinerSubmission {
		client: Arc<dyn MinerClient>,
		miner: Arc<Miner>,
	},
	Explorer(Arc<dyn ExplorerClient>),
	SecondaryExplorer(Arc<dyn ExplorerClient>),
	RawNodeProxy(Arc<dyn NodeProxyClient>),
}

impl fmt::Debug for Provider {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Provider")
			.field("family", &self.family())
			.field("name", &self.name())
			.finish()
	}
}

impl Provider {
	/// Name used in logs, in aggregated errors and in `TransactionInfo::provider`.
	pub fn name(&self) -> &str {
		match self {
			Provider::MinerSubmission { miner, .. } => &miner.name,
			Provider::Explorer(client) | Provider::SecondaryExplorer(client) => client.name(),
			Provider::RawNodeProxy(client) => client.name(),
		}
	}

	pub fn family(&self) -> ProviderFamily {
		match self {
			Provider::MinerSubmission { .. } => ProviderFamily::Miner,
			Provider::Explorer(_) => ProviderFamily::Explorer,
			Provider::SecondaryExplorer(_) => ProviderFamily::SecondaryExplorer,
			Provider::RawNodeProxy(_) => ProviderFamily::NodeProxy,
		}
	}

	/// Submits `tx_hex` for transaction `id`.
	///
	/// A miner that answers but does not accept the transaction is reported as
	/// `Rejected` with the miner's own description, so its wording reaches the
	/// error classifier.
	pub async fn broadcast(&self, id: &str, tx_hex: &str) -> Result<(), ProviderError> {
		match self {
			Provider::MinerSubmission { client, miner } => {
				let response = client.submit_transaction(miner, tx_hex).await?;
				if !response.accepted {
					return Err(ProviderError::Rejected(response.description));
				}
				Ok(())
			}
			Provider::Explorer(client) | Provider::SecondaryExplorer(client) => {
				let reported = client.broadcast_tx(tx_hex).await?;
				check_id(id, &reported)
			}
			Provider::RawNodeProxy(client) => {
				let reported = client.send_raw_transaction(tx_hex).await?;
				check_id(id, &reported)
			}
		}
	}

	/// Looks up transaction `id`.
	///
	/// A record for a different, non-empty id is rejected with `IdMismatch`.
	pub async fn query(&self, id: &str) -> Result<TransactionInfo, ProviderError> {
		let info = match self {
			Provider::MinerSubmission { client, miner } => {
				let status = client.query_transaction(miner, id).await?;
				if !status.found {
					return Err(ProviderError::NotFound);
				}
				from_miner_status(status, &miner.name)
			}
			Provider::Explorer(client) | Provider::SecondaryExplorer(client) => {
				let tx = client.get_tx_by_hash(id).await?;
				from_explorer(tx, client.name())
			}
			Provider::RawNodeProxy(client) => {
				let tx = client.get_transaction(id).await?;
				from_node(tx, client.name())
			}
		};
		check_id(id, &info.id)?;
		Ok(info)
	}
}

fn check_id(expected: &str, actual: &str) -> Result<(), ProviderError> {
	if actual.is_empty() || actual == expected {
		return Ok(());
	}
	Err(ProviderError::IdMismatch {
		expected: expected.to_string(),
		actual: actual.to_string(),
	})
}

fn from_miner_status(status: MinerTransactionStatus, provider: &str) -> TransactionInfo {
	TransactionInfo {
		block_hash: status.block_hash,
		block_height: status.block_height,
		confirmations: status.confirmations,
		id: status.tx_id,
		miner_id: status.miner_id,
		provider: provider.to_string(),
		merkle_proof: status.merkle_proof,
	}
}

fn from_explorer(tx: ExplorerTransaction, provider: &str) -> TransactionInfo {
	TransactionInfo {
		block_hash: tx.block_hash,
		block_height: tx.block_height,
		confirmations: tx.confirmations,
		id: tx.tx_id,
		provider: provider.to_string(),
		..Default::default()
	}
}

fn from_node(tx: NodeTransaction, provider: &str) -> TransactionInfo {
	TransactionInfo {
		block_hash: tx.block_hash,
		block_height: tx.block_height,
		confirmations: tx.confirmations,
		id: tx.tx_id,
		provider: provider.to_string(),
		..Default::default()
	}
}
