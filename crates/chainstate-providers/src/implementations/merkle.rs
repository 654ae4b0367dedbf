//! HTTP merkle-root verification client.

use super::http::{join_url, network_error, read_json};
use crate::{MerkleRootsClient, ProviderError};
use async_trait::async_trait;
use chainstate_config::MerkleVerifierConfig;
use chainstate_types::{MerkleRootConfirmationRequest, MerkleRootsVerification, SecretString};
use reqwest::header::AUTHORIZATION;

const VERIFY_PATH: &str = "/api/v1/chain/merkleroot/verify";

/// Posts merkle-root batches to a chain-tracking service with bearer auth.
#[derive(Debug, Clone)]
pub struct HttpMerkleRootsClient {
	name: String,
	url: String,
	token: SecretString,
	client: reqwest::Client,
}

impl HttpMerkleRootsClient {
	pub fn new(url: impl Into<String>, token: SecretString) -> Self {
		let url = url.into();
		Self {
			name: url.clone(),
			url,
			token,
			client: reqwest::Client::new(),
		}
	}

	/// Reuses an existing connection pool.
	pub fn with_client(mut self, client: reqwest::Client) -> Self {
		self.client = client;
		self
	}
}

#[async_trait]
impl MerkleRootsClient for HttpMerkleRootsClient {
	fn name(&self) -> &str {
		&self.name
	}

	async fn verify_merkle_roots(
		&self,
		roots: &[MerkleRootConfirmationRequest],
	) -> Result<MerkleRootsVerification, ProviderError> {
		let response = self
			.client
			.post(join_url(&self.url, VERIFY_PATH))
			.header(AUTHORIZATION, self.token.bearer())
			.json(roots)
			.send()
			.await
			.map_err(network_error)?;
		read_json(response).await
	}
}

/// Creates one client per configured verification service.
pub fn create_merkle_clients(configs: &[MerkleVerifierConfig]) -> Vec<HttpMerkleRootsClient> {
	configs
		.iter()
		.map(|config| HttpMerkleRootsClient::new(config.url.clone(), config.token.clone()))
		.collect()
}
