//! HTTP miner-submission client.
//!
//! Speaks both miner API families: the merchant API (signed JSON envelopes
//! whose `payload` field is itself a JSON document) and ARC (plain JSON).
//! The family is taken from each `Miner`, so one client serves every
//! configured miner.

use super::http::{decode, join_url, network_error, read_json};
use crate::{MinerClient, MinerTransactionStatus, ProviderError, SubmissionResponse};
use async_trait::async_trait;
use chainstate_types::{Fee, Miner, MinerApi};
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

const MAPI_SUCCESS: &str = "success";

#[derive(Debug, Deserialize)]
struct MapiEnvelope {
	payload: String,
}

impl MapiEnvelope {
	fn open<T: DeserializeOwned>(&self) -> Result<T, ProviderError> {
		decode(&self.payload)
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapiFeeQuote {
	fees: Vec<MapiFee>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapiFee {
	fee_type: String,
	mining_fee: Fee,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapiSubmitPayload {
	#[serde(default)]
	txid: String,
	return_result: String,
	#[serde(default)]
	result_description: String,
	#[serde(default)]
	miner_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapiQueryPayload {
	#[serde(default)]
	txid: String,
	return_result: String,
	#[serde(default)]
	result_description: String,
	#[serde(default)]
	block_hash: Option<String>,
	#[serde(default)]
	block_height: Option<u64>,
	#[serde(default)]
	confirmations: Option<u64>,
	#[serde(default)]
	miner_id: Option<String>,
	#[serde(default)]
	merkle_proof: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArcPolicyResponse {
	policy: ArcPolicy,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArcPolicy {
	mining_fee: Fee,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArcTxResponse {
	#[serde(default)]
	txid: String,
	#[serde(default)]
	tx_status: String,
	#[serde(default)]
	block_hash: Option<String>,
	#[serde(default)]
	block_height: Option<u64>,
	#[serde(default)]
	extra_info: Option<String>,
	#[serde(default)]
	merkle_path: Option<String>,
}

impl ArcTxResponse {
	/// ARC took the submission.
	fn accepted(&self) -> bool {
		!matches!(
			self.tx_status.as_str(),
			"" | "UNKNOWN" | "REJECTED" | "DOUBLE_SPEND_ATTEMPTED"
		)
	}

	/// The network has the transaction. Earlier statuses such as `RECEIVED`
	/// or `STORED` only mean ARC holds it.
	fn seen_on_network(&self) -> bool {
		matches!(self.tx_status.as_str(), "SEEN_ON_NETWORK" | "MINED")
	}

	fn description(&self) -> String {
		match &self.extra_info {
			Some(info) if !info.is_empty() => format!("{}: {}", self.tx_status, info),
			_ => self.tx_status.clone(),
		}
	}
}

fn standard_fee(quote: &MapiFeeQuote) -> Result<Fee, ProviderError> {
	quote
		.fees
		.iter()
		.find(|fee| fee.fee_type == "standard")
		.map(|fee| fee.mining_fee)
		.ok_or_else(|| ProviderError::Decode("fee quote has no standard fee".to_string()))
}

fn mapi_submission(payload: MapiSubmitPayload, miner: &Miner) -> SubmissionResponse {
	SubmissionResponse {
		tx_id: payload.txid,
		miner_id: payload.miner_id.unwrap_or_else(|| miner.miner_id.clone()),
		accepted: payload.return_result == MAPI_SUCCESS,
		description: payload.result_description,
	}
}

fn mapi_status(payload: MapiQueryPayload, miner: &Miner) -> MinerTransactionStatus {
	MinerTransactionStatus {
		tx_id: payload.txid,
		miner_id: payload.miner_id.unwrap_or_else(|| miner.miner_id.clone()),
		block_hash: payload.block_hash.unwrap_or_default(),
		block_height: payload.block_height.unwrap_or_default(),
		confirmations: payload.confirmations.unwrap_or_default(),
		found: payload.return_result == MAPI_SUCCESS,
		description: payload.result_description,
		merkle_proof: payload.merkle_proof,
	}
}

fn arc_status(response: ArcTxResponse, miner: &Miner) -> MinerTransactionStatus {
	let found = response.seen_on_network();
	let description = response.description();
	let block_hash = response.block_hash.unwrap_or_default();
	// ARC does not count confirmations; a mined transaction has at least one
	let confirmations = u64::from(!block_hash.is_empty());
	MinerTransactionStatus {
		tx_id: response.txid,
		miner_id: miner.miner_id.clone(),
		block_hash,
		block_height: response.block_height.unwrap_or_default(),
		confirmations,
		found,
		description,
		merkle_proof: response.merkle_path.map(serde_json::Value::String),
	}
}

/// Miner client over HTTP.
#[derive(Debug, Clone, Default)]
pub struct HttpMinerClient {
	client: reqwest::Client,
}

impl HttpMinerClient {
	pub fn new() -> Self {
		Self::default()
	}

	/// Reuses an existing connection pool.
	pub fn with_client(client: reqwest::Client) -> Self {
		Self { client }
	}

	fn request(&self, method: Method, miner: &Miner, path: &str) -> reqwest::RequestBuilder {
		let request = self.client.request(method, join_url(&miner.url, path));
		match miner.token.as_ref().filter(|token| !token.is_empty()) {
			Some(token) => request.header(AUTHORIZATION, token.bearer()),
			None => request,
		}
	}
}

#[async_trait]
impl MinerClient for HttpMinerClient {
	async fn submit_transaction(
		&self,
		miner: &Miner,
		tx_hex: &str,
	) -> Result<SubmissionResponse, ProviderError> {
		match miner.api {
			MinerApi::Mapi => {
				let response = self
					.request(Method::POST, miner, "/mapi/tx")
					.json(&json!({ "rawtx": tx_hex }))
					.send()
					.await
					.map_err(network_error)?;
				let envelope: MapiEnvelope = read_json(response).await?;
				Ok(mapi_submission(envelope.open()?, miner))
			}
			MinerApi::Arc => {
				let response = self
					.request(Method::POST, miner, "/v1/tx")
					.json(&json!({ "rawTx": tx_hex }))
					.send()
					.await
					.map_err(network_error)?;
				let body: ArcTxResponse = read_json(response).await?;
				Ok(SubmissionResponse {
					accepted: body.accepted(),
					description: body.description(),
					tx_id: body.txid,
					miner_id: miner.miner_id.clone(),
				})
			}
		}
	}

	async fn query_transaction(
		&self,
		miner: &Miner,
		tx_id: &str,
	) -> Result<MinerTransactionStatus, ProviderError> {
		match miner.api {
			MinerApi::Mapi => {
				let response = self
					.request(Method::GET, miner, &format!("/mapi/tx/{}", tx_id))
					.send()
					.await
					.map_err(network_error)?;
				let envelope: MapiEnvelope = read_json(response).await?;
				Ok(mapi_status(envelope.open()?, miner))
			}
			MinerApi::Arc => {
				let response = self
					.request(Method::GET, miner, &format!("/v1/tx/{}", tx_id))
					.send()
					.await
					.map_err(network_error)?;
				let body: ArcTxResponse = read_json(response).await?;
				Ok(arc_status(body, miner))
			}
		}
	}

	async fn fee_quote(&self, miner: &Miner) -> Result<Fee, ProviderError> {
		let response = self
			.request(Method::GET, miner, "/mapi/feeQuote")
			.send()
			.await
			.map_err(network_error)?;
		let envelope: MapiEnvelope = read_json(response).await?;
		standard_fee(&envelope.open()?)
	}

	async fn policy_quote(&self, miner: &Miner) -> Result<Fee, ProviderError> {
		let response = self
			.request(Method::GET, miner, "/v1/policy")
			.send()
			.await
			.map_err(network_error)?;
		let body: ArcPolicyResponse = read_json(response).await?;
		Ok(body.policy.mining_fee)
	}
}
