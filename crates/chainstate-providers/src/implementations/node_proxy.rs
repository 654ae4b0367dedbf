//! JSON-RPC raw-node proxy client.
//!
//! Talks to a hosted node through its JSON-RPC endpoint, authenticated by an
//! `api-key` header. The proxy only participates when a key is configured,
//! so construction requires one.

use super::http::{decode, network_error, read_body};
use crate::{NodeProxyClient, NodeTransaction, ProviderError};
use async_trait::async_trait;
use chainstate_config::EndpointConfig;
use chainstate_types::SecretString;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

const API_KEY_HEADER: &str = "api-key";

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
	result: Option<T>,
	error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
	code: i64,
	message: String,
}

#[derive(Debug, Deserialize)]
struct RawTransaction {
	txid: String,
	#[serde(default)]
	blockhash: Option<String>,
	#[serde(default)]
	blockheight: Option<u64>,
	#[serde(default)]
	confirmations: Option<u64>,
}

/// `-5` is bitcoind's "no such transaction" code.
const RPC_INVALID_ADDRESS_OR_KEY: i64 = -5;

fn unwrap_rpc<T>(response: RpcResponse<T>) -> Result<T, ProviderError> {
	if let Some(error) = response.error {
		if error.code == RPC_INVALID_ADDRESS_OR_KEY {
			return Err(ProviderError::NotFound);
		}
		return Err(ProviderError::Rejected(format!(
			"{}: {}",
			error.code, error.message
		)));
	}
	response
		.result
		.ok_or_else(|| ProviderError::Decode("JSON-RPC response has no result".to_string()))
}

/// Raw-node proxy client.
#[derive(Debug, Clone)]
pub struct JsonRpcNodeProxy {
	name: String,
	url: String,
	api_key: SecretString,
	client: reqwest::Client,
}

impl JsonRpcNodeProxy {
	pub fn new(name: impl Into<String>, url: impl Into<String>, api_key: SecretString) -> Self {
		Self {
			name: name.into(),
			url: url.into(),
			api_key,
			client: reqwest::Client::new(),
		}
	}

	/// Reuses an existing connection pool.
	pub fn with_client(mut self, client: reqwest::Client) -> Self {
		self.client = client;
		self
	}

	async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ProviderError> {
		let body = json!({
			"jsonrpc": "1.0",
			"id": "chainstate",
			"method": method,
			"params": params,
		});
		let response = self
			.client
			.post(&self.url)
			.header(API_KEY_HEADER, self.api_key.expose_secret())
			.json(&body)
			.send()
			.await
			.map_err(network_error)?;

		// bitcoind reports RPC errors with a 500 and a JSON body
		let text = match read_body(response).await {
			Ok(text) => text,
			Err(ProviderError::Http { message, .. }) if message.starts_with('{') => message,
			Err(e) => return Err(e),
		};
		unwrap_rpc(decode::<RpcResponse<T>>(&text)?)
	}
}

#[async_trait]
impl NodeProxyClient for JsonRpcNodeProxy {
	fn name(&self) -> &str {
		&self.name
	}

	async fn send_raw_transaction(&self, tx_hex: &str) -> Result<String, ProviderError> {
		self.call("sendrawtransaction", json!([tx_hex])).await
	}

	async fn get_transaction(&self, tx_id: &str) -> Result<NodeTransaction, ProviderError> {
		let raw: RawTransaction = self.call("getrawtransaction", json!([tx_id, 1])).await?;
		Ok(NodeTransaction {
			tx_id: raw.txid,
			block_hash: raw.blockhash.unwrap_or_default(),
			block_height: raw.blockheight.unwrap_or_default(),
			confirmations: raw.confirmations.unwrap_or_default(),
		})
	}
}

/// Creates the node proxy from its configuration section.
///
/// Fails with [`ProviderError::Configuration`] when no API key is configured.
pub fn create_node_proxy(name: &str, config: &EndpointConfig) -> Result<JsonRpcNodeProxy, ProviderError> {
	let key = config
		.credential()
		.ok_or_else(|| ProviderError::Configuration(format!("{} has no api_key", name)))?;
	Ok(JsonRpcNodeProxy::new(name, config.url.clone(), key.clone()))
}
