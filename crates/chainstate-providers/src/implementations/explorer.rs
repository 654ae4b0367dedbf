//! HTTP block-explorer client.
//!
//! Explorer urls are laid out as `{base}/{network}/...`. The same client type
//! backs the primary and the secondary explorer; only the name and base url
//! differ.

use super::http::{join_url, network_error, read_body, read_json};
use crate::{ExplorerClient, ExplorerTransaction, ProviderError};
use async_trait::async_trait;
use chainstate_config::EndpointConfig;
use chainstate_types::{Network, SecretString};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct ExplorerTxResponse {
	txid: String,
	#[serde(default)]
	blockhash: Option<String>,
	#[serde(default)]
	blockheight: Option<u64>,
	#[serde(default)]
	confirmations: Option<u64>,
}

impl From<ExplorerTxResponse> for ExplorerTransaction {
	fn from(response: ExplorerTxResponse) -> Self {
		Self {
			tx_id: response.txid,
			block_hash: response.blockhash.unwrap_or_default(),
			block_height: response.blockheight.unwrap_or_default(),
			confirmations: response.confirmations.unwrap_or_default(),
		}
	}
}

/// Broadcast returns the txid as a JSON string, or as bare text on some
/// deployments.
fn parse_broadcast_body(body: &str) -> String {
	let trimmed = body.trim();
	serde_json::from_str::<String>(trimmed).unwrap_or_else(|_| trimmed.trim_matches('"').to_string())
}

/// Block-explorer client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpExplorerClient {
	name: String,
	base_url: String,
	network: Network,
	api_key: Option<SecretString>,
	client: reqwest::Client,
}

impl HttpExplorerClient {
	pub fn new(name: impl Into<String>, base_url: impl Into<String>, network: Network) -> Self {
		Self {
			name: name.into(),
			base_url: base_url.into(),
			network,
			api_key: None,
			client: reqwest::Client::new(),
		}
	}

	pub fn with_api_key(mut self, api_key: SecretString) -> Self {
		self.api_key = Some(api_key);
		self
	}

	pub fn with_client(mut self, client: reqwest::Client) -> Self {
		self.client = client;
		self
	}

	fn url(&self, path: &str) -> String {
		join_url(&join_url(&self.base_url, self.network.as_str()), path)
	}

	fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
		match &self.api_key {
			Some(key) => request.header(AUTHORIZATION, key.expose_secret()),
			None => request,
		}
	}
}

#[async_trait]
impl ExplorerClient for HttpExplorerClient {
	fn name(&self) -> &str {
		&self.name
	}

	async fn broadcast_tx(&self, tx_hex: &str) -> Result<String, ProviderError> {
		let request = self
			.client
			.post(self.url("tx/raw"))
			.json(&json!({ "txhex": tx_hex }));
		let response = self.authorize(request).send().await.map_err(network_error)?;
		let body = read_body(response).await?;
		Ok(parse_broadcast_body(&body))
	}

	async fn get_tx_by_hash(&self, tx_id: &str) -> Result<ExplorerTransaction, ProviderError> {
		let request = self.client.get(self.url(&format!("tx/hash/{}", tx_id)));
		let response = self.authorize(request).send().await.map_err(network_error)?;
		let body: ExplorerTxResponse = read_json(response).await?;
		Ok(body.into())
	}
}

/// Creates an explorer client from its configuration section.
pub fn create_explorer(
	name: &str,
	config: &EndpointConfig,
	network: Network,
) -> HttpExplorerClient {
	let client = HttpExplorerClient::new(name, config.url.clone(), network);
	match config.credential() {
		Some(key) => client.with_api_key(key.clone()),
		None => client,
	}
}
