//! The chainstate client.
//!
//! [`ChainstateClient`] is the entry point callers use once the builder has
//! validated the miners. Each operation checks its inputs, asks the registry
//! for the providers active under the current configuration and hands them
//! to the matching coordinator.

mod broadcast;
mod merkle;
mod query;

use crate::fanout::FirstSuccess;
use crate::registry::{active_providers, miner_client, MinerLists, Operation, ProviderClients};
use crate::{validate_tx_hex, validate_tx_id, ChainstateError};
use broadcast::BroadcastRequest;
use chainstate_config::Config;
use chainstate_types::{
	truncate_id, Fee, MerkleRootConfirmationRequest, Miner, Network, RequiredIn, TransactionInfo,
};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::instrument;

struct Inner {
	config: RwLock<Arc<Config>>,
	miners: MinerLists,
	fee_unit: Fee,
	clients: ProviderClients,
}

/// Broadcasts, queries and verifies through every configured provider.
///
/// Cheap to clone; clones share the same providers and configuration.
#[derive(Clone)]
pub struct ChainstateClient {
	inner: Arc<Inner>,
}

impl ChainstateClient {
	pub(crate) fn new(config: Config, miners: MinerLists, fee_unit: Fee, clients: ProviderClients) -> Self {
		Self {
			inner: Arc::new(Inner {
				config: RwLock::new(Arc::new(config)),
				miners,
				fee_unit,
				clients,
			}),
		}
	}

	/// Broadcasts a transaction to every active provider.
	///
	/// Succeeds if at least one provider accepted it, directly or after a
	/// mempool lookup resolved an ambiguous error.
	pub async fn broadcast(&self, id: &str, tx_hex: &str, timeout: Duration) -> Result<(), ChainstateError> {
		self.broadcast_observed(id, tx_hex, timeout, Arc::new(FirstSuccess::new()))
			.await
	}

	/// Like [`broadcast`](Self::broadcast), recording the first accepting
	/// provider in `first_success` as soon as it answers.
	#[instrument(skip_all, fields(tx_id = %truncate_id(id)))]
	pub async fn broadcast_observed(
		&self,
		id: &str,
		tx_hex: &str,
		timeout: Duration,
		first_success: Arc<FirstSuccess>,
	) -> Result<(), ChainstateError> {
		validate_tx_id(id)?;
		validate_tx_hex(tx_hex)?;

		let config = self.config();
		let providers = self.providers(&config, Operation::Broadcast);
		let fallback = self.providers(&config, Operation::Query);
		let request = BroadcastRequest {
			id: Arc::from(id),
			tx_hex: Arc::from(tx_hex),
			deadline: Instant::now() + timeout,
			fallback: fallback.into(),
			fallback_timeout: config.query_timeout(),
			first_success,
		};
		broadcast::broadcast(providers, request).await
	}

	/// Queries providers in priority order, returning the first record that
	/// satisfies `required_in`.
	#[instrument(skip_all, fields(tx_id = %truncate_id(id), %required_in))]
	pub async fn query_transaction(
		&self,
		id: &str,
		required_in: RequiredIn,
		timeout: Duration,
	) -> Result<TransactionInfo, ChainstateError> {
		validate_tx_id(id)?;

		let config = self.config();
		let providers = self.providers(&config, Operation::Query);
		query::query_ordered(&providers, id, required_in, Instant::now() + timeout).await
	}

	/// Queries every provider at once, returning whichever satisfying record
	/// arrives first.
	#[instrument(skip_all, fields(tx_id = %truncate_id(id), %required_in))]
	pub async fn query_transaction_fastest(
		&self,
		id: &str,
		required_in: RequiredIn,
		timeout: Duration,
	) -> Result<TransactionInfo, ChainstateError> {
		validate_tx_id(id)?;

		let config = self.config();
		let providers = self.providers(&config, Operation::Query);
		query::query_fastest(
			providers,
			id,
			required_in,
			Instant::now() + timeout,
			config.race_stragglers,
		)
		.await
	}

	/// Verifies a batch of merkle roots; the first service to answer decides.
	#[instrument(skip_all, fields(roots = roots.len()))]
	pub async fn verify_merkle_roots(
		&self,
		roots: Vec<MerkleRootConfirmationRequest>,
	) -> Result<(), ChainstateError> {
		let config = self.config();
		merkle::verify_merkle_roots(
			self.inner.clients.merkle_verifiers.clone(),
			roots,
			Instant::now() + config.merkle_timeout(),
			config.merkle_stragglers,
		)
		.await
	}

	/// Replaces the configuration used by subsequent operations.
	///
	/// Exclusions, network, timeouts and straggler policies take effect on the
	/// next call. Miner lists and the fee stay as validated at build time; a
	/// client built without a health check keeps its miners out.
	pub fn update_config(&self, config: Config) -> Result<(), ChainstateError> {
		config.validate()?;
		if !self.inner.miners.validated && miner_client(&config, &self.inner.clients).is_some() {
			tracing::warn!(
				network = %config.network,
				"Miners were not health-checked at build, they stay inactive"
			);
		}
		tracing::info!(network = %config.network, "Configuration updated");
		*self.inner.config.write() = Arc::new(config);
		Ok(())
	}

	pub fn config(&self) -> Arc<Config> {
		self.inner.config.read().clone()
	}

	pub fn network(&self) -> Network {
		self.inner.config.read().network
	}

	/// Fee selected by the miner health check.
	pub fn fee_unit(&self) -> Fee {
		self.inner.fee_unit
	}

	pub fn broadcast_miners(&self) -> Vec<Miner> {
		self.inner.miners.broadcast.iter().map(|m| Miner::clone(m)).collect()
	}

	pub fn query_miners(&self) -> Vec<Miner> {
		self.inner.miners.query.iter().map(|m| Miner::clone(m)).collect()
	}

	fn providers(&self, config: &Config, operation: Operation) -> Vec<crate::Provider> {
		active_providers(config, &self.inner.miners, &self.inner.clients, operation)
	}
}
