//! Builder for [`ChainstateClient`].
//!
//! Collaborator clients are injected here, one per provider family. Building
//! validates the configuration and runs the miner health check; a client is
//! only returned once both pass.

use crate::engine::ChainstateClient;
use crate::health::MinerHealthManager;
use crate::registry::{miner_client, MinerLists, ProviderClients};
use crate::ChainstateError;
use chainstate_config::Config;
use chainstate_providers::{ExplorerClient, MerkleRootsClient, MinerClient, NodeProxyClient};
use chainstate_types::{Miner, DEFAULT_FEE};
use std::sync::Arc;

/// Assembles a [`ChainstateClient`] from configuration and collaborators.
pub struct ChainstateBuilder {
	config: Config,
	clients: ProviderClients,
}

impl ChainstateBuilder {
	pub fn new(config: Config) -> Self {
		Self {
			config,
			clients: ProviderClients::default(),
		}
	}

	/// Sets the client shared by every miner-submission provider.
	pub fn with_miner_client(mut self, client: Arc<dyn MinerClient>) -> Self {
		self.clients.miner = Some(client);
		self
	}

	pub fn with_explorer(mut self, client: Arc<dyn ExplorerClient>) -> Self {
		self.clients.explorer = Some(client);
		self
	}

	pub fn with_secondary_explorer(mut self, client: Arc<dyn ExplorerClient>) -> Self {
		self.clients.secondary_explorer = Some(client);
		self
	}

	pub fn with_node_proxy(mut self, client: Arc<dyn NodeProxyClient>) -> Self {
		self.clients.node_proxy = Some(client);
		self
	}

	/// Adds a merkle-root verification service. May be called repeatedly.
	pub fn with_merkle_verifier(mut self, client: Arc<dyn MerkleRootsClient>) -> Self {
		self.clients.merkle_verifiers.push(client);
		self
	}

	/// Validates the configuration, health-checks the miners and returns the
	/// client.
	///
	/// The health check is skipped when miners cannot take part, either
	/// because the network has no miner APIs, the miner family is excluded or
	/// no miner client was supplied. Miners of such a client stay out of
	/// every operation for its lifetime.
	pub async fn build(self) -> Result<ChainstateClient, ChainstateError> {
		let Self { config, clients } = self;
		config.validate()?;

		let broadcast = config.broadcast_miners();
		let query = config.query_miners();

		let (miners, fee_unit) = match miner_client(&config, &clients) {
			Some(client) => {
				let manager = MinerHealthManager::new(
					client,
					config.fee_probe_timeout(),
					config.validate_fee_quotes,
				);
				let selection = manager.check(broadcast, query).await?;
				(
					MinerLists {
						broadcast: shared(selection.broadcast),
						query: shared(selection.query),
						validated: true,
					},
					selection.fee_unit,
				)
			}
			None => {
				tracing::info!(network = %config.network, "Miners inactive, skipping health check");
				(
					MinerLists {
						broadcast: shared(broadcast),
						query: shared(query),
						validated: false,
					},
					DEFAULT_FEE,
				)
			}
		};

		tracing::info!(
			network = %config.network,
			broadcast_miners = miners.broadcast.len(),
			query_miners = miners.query.len(),
			fee = %fee_unit,
			merkle_verifiers = clients.merkle_verifiers.len(),
			"Chainstate client ready"
		);
		Ok(ChainstateClient::new(config, miners, fee_unit, clients))
	}
}

fn shared(miners: Vec<Miner>) -> Vec<Arc<Miner>> {
	miners.into_iter().map(Arc::new).collect()
}
