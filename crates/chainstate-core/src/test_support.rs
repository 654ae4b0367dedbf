//! Shared fixtures for engine tests.

use crate::{ChainstateBuilder, ChainstateClient};
use async_trait::async_trait;
use chainstate_config::{Config, EndpointConfig, MinersConfig};
use chainstate_providers::implementations::mock::{
	MockExplorer, MockMerkleRoots, MockMinerClient, MockNodeProxy,
};
use chainstate_providers::{MinerClient, MinerTransactionStatus, ProviderError, SubmissionResponse};
use chainstate_types::{Fee, Miner, SecretString};
use mockall::mock;
use std::sync::Arc;

mock! {
	pub Miners {}

	#[async_trait]
	impl MinerClient for Miners {
		async fn submit_transaction(&self, miner: &Miner, tx_hex: &str) -> Result<SubmissionResponse, ProviderError>;
		async fn query_transaction(&self, miner: &Miner, tx_id: &str) -> Result<MinerTransactionStatus, ProviderError>;
		async fn fee_quote(&self, miner: &Miner) -> Result<Fee, ProviderError>;
		async fn policy_quote(&self, miner: &Miner) -> Result<Fee, ProviderError>;
	}
}

pub(crate) const TX_ID: &str = "b1f9d1e3a6c0f4c5f0c8a2b7e9d4a1c3b5e7f9a2c4d6e8f0a1b3c5d7e9f1a2b3";

pub(crate) fn taal() -> Miner {
	Miner::new("taal-id", "Taal", "https://taal.example")
}

pub(crate) fn mempool() -> Miner {
	Miner::new("mempool-id", "Mempool", "https://mempool.example")
}

/// Config with Taal and Mempool as miners and a keyed node proxy.
pub(crate) fn config() -> Config {
	Config {
		miners: MinersConfig {
			broadcast: Some(vec![taal(), mempool()]),
			query: Some(vec![taal(), mempool()]),
		},
		node_proxy: Some(EndpointConfig {
			url: "https://node.example".to_string(),
			api_key: Some(SecretString::from("node-key")),
		}),
		..Config::default()
	}
}

/// Miner client whose fee probes pass for both test miners.
pub(crate) fn healthy_miners() -> MockMinerClient {
	MockMinerClient::new()
		.with_fee("Taal", Ok(Fee::new(1, 20)))
		.with_fee("Mempool", Ok(Fee::new(1, 20)))
}

/// A miner status reporting the transaction in the mempool.
pub(crate) fn in_mempool(miner_id: &str) -> MinerTransactionStatus {
	MinerTransactionStatus {
		tx_id: TX_ID.to_string(),
		miner_id: miner_id.to_string(),
		found: true,
		..Default::default()
	}
}

/// One mock per provider family.
pub(crate) struct Mocks {
	pub miner: Arc<MockMinerClient>,
	pub explorer: Arc<MockExplorer>,
	pub secondary: Arc<MockExplorer>,
	pub node: Arc<MockNodeProxy>,
	pub merkle: Vec<Arc<MockMerkleRoots>>,
}

impl Mocks {
	pub fn new(miner: MockMinerClient) -> Self {
		Self {
			miner: Arc::new(miner),
			explorer: Arc::new(MockExplorer::new("explorer")),
			secondary: Arc::new(MockExplorer::new("secondary_explorer")),
			node: Arc::new(MockNodeProxy::new("node_proxy")),
			merkle: Vec::new(),
		}
	}

	pub fn explorer(mut self, explorer: MockExplorer) -> Self {
		self.explorer = Arc::new(explorer);
		self
	}

	pub fn secondary(mut self, explorer: MockExplorer) -> Self {
		self.secondary = Arc::new(explorer);
		self
	}

	pub fn node(mut self, node: MockNodeProxy) -> Self {
		self.node = Arc::new(node);
		self
	}

	pub fn merkle(mut self, verifier: MockMerkleRoots) -> Self {
		self.merkle.push(Arc::new(verifier));
		self
	}

	pub fn builder(&self, config: Config) -> ChainstateBuilder {
		let mut builder = ChainstateBuilder::new(config)
			.with_miner_client(self.miner.clone())
			.with_explorer(self.explorer.clone())
			.with_secondary_explorer(self.secondary.clone())
			.with_node_proxy(self.node.clone());
		for verifier in &self.merkle {
			builder = builder.with_merkle_verifier(verifier.clone());
		}
		builder
	}

	pub async fn client(&self, config: Config) -> ChainstateClient {
		self.builder(config).build().await.unwrap()
	}

	/// Calls received across every mock, fee probes included.
	pub fn total_calls(&self) -> usize {
		self.miner.calls().total()
			+ self.explorer.calls().total()
			+ self.secondary.calls().total()
			+ self.node.calls().total()
			+ self.merkle.iter().map(|m| m.calls().total()).sum::<usize>()
	}
}
