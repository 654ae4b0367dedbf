//! Provider registry.
//!
//! Decides which providers take part in an operation. The list is rebuilt on
//! every call from the current configuration, so exclusion and network
//! changes apply to the next operation without rebuilding the client.

use crate::provider::Provider;
use chainstate_config::Config;
use chainstate_providers::{ExplorerClient, MerkleRootsClient, MinerClient, NodeProxyClient};
use chainstate_types::{Miner, ProviderFamily};
use std::fmt;
use std::sync::Arc;

/// Operation a provider list is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
	Broadcast,
	Query,
}

impl fmt::Display for Operation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Operation::Broadcast => f.write_str("broadcast"),
			Operation::Query => f.write_str("query"),
		}
	}
}

/// Collaborator clients injected into the engine.
///
/// A family without a client never takes part in any operation.
#[derive(Clone, Default)]
pub struct ProviderClients {
	pub miner: Option<Arc<dyn MinerClient>>,
	pub explorer: Option<Arc<dyn ExplorerClient>>,
	pub secondary_explorer: Option<Arc<dyn ExplorerClient>>,
	pub node_proxy: Option<Arc<dyn NodeProxyClient>>,
	pub merkle_verifiers: Vec<Arc<dyn MerkleRootsClient>>,
}

/// Miner lists, fixed once the client is built.
#[derive(Debug, Clone, Default)]
pub struct MinerLists {
	pub broadcast: Vec<Arc<Miner>>,
	pub query: Vec<Arc<Miner>>,
	/// Whether the lists passed the health check. Unchecked miners never
	/// take part, even if a later configuration makes the family eligible.
	pub validated: bool,
}

/// Builds the ordered provider list for `operation`.
///
/// Order: miners, explorer, secondary explorer (queries only), node proxy.
/// Miners and the node proxy need a network they serve; the node proxy also
/// needs its credential configured. Miners also need to have passed the
/// health check.
pub fn active_providers(
	config: &Config,
	miners: &MinerLists,
	clients: &ProviderClients,
	operation: Operation,
) -> Vec<Provider> {
	let mut providers = Vec::new();

	if let Some(client) = miner_client(config, clients).filter(|_| miners.validated) {
		let miners = match operation {
			Operation::Broadcast => &miners.broadcast,
			Operation::Query => &miners.query,
		};
		providers.extend(miners.iter().map(|miner| Provider::MinerSubmission {
			client: client.clone(),
			miner: miner.clone(),
		}));
	}

	if let Some(client) = enabled(config, ProviderFamily::Explorer, &clients.explorer) {
		providers.push(Provider::Explorer(client));
	}

	if operation == Operation::Query {
		if let Some(client) = enabled(config, ProviderFamily::SecondaryExplorer, &clients.secondary_explorer) {
			providers.push(Provider::SecondaryExplorer(client));
		}
	}

	let node_proxy = config
		.node_proxy_endpoint()
		.filter(|_| config.network.supports_miners())
		.and_then(|_| enabled(config, ProviderFamily::NodeProxy, &clients.node_proxy));
	if let Some(client) = node_proxy {
		providers.push(Provider::RawNodeProxy(client));
	}

	tracing::trace!(
		%operation,
		network = %config.network,
		providers = ?providers.iter().map(Provider::name).collect::<Vec<_>>(),
		"Active providers"
	);
	providers
}

/// The miner client, when miners may take part on the configured network.
pub(crate) fn miner_client(config: &Config, clients: &ProviderClients) -> Option<Arc<dyn MinerClient>> {
	if !config.network.supports_miners() {
		return None;
	}
	enabled(config, ProviderFamily::Miner, &clients.miner)
}

fn enabled<T: ?Sized>(config: &Config, family: ProviderFamily, client: &Option<Arc<T>>) -> Option<Arc<T>> {
	if config.is_excluded(family) {
		return None;
	}
	client.clone()
}
