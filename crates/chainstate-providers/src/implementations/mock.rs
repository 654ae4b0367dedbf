//! In-process provider implementations for tests and local development.
//!
//! Every mock answers from a script set up through its builder methods and
//! records each call it receives, so tests can assert both the engine's
//! verdict and which providers it contacted. Unscripted lookups answer
//! `NotFound`; unscripted broadcasts and fee probes answer with a network
//! error.

use crate::{
	ExplorerClient, ExplorerTransaction, MerkleRootsClient, MinerClient, MinerTransactionStatus,
	NodeProxyClient, NodeTransaction, ProviderError, SubmissionResponse,
};
use async_trait::async_trait;
use chainstate_types::{
	ConfirmationState, Fee, MerkleRootConfirmationRequest, MerkleRootsVerification, Miner,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Kind of call a mock received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCall {
	Broadcast,
	Query,
	FeeQuote,
	PolicyQuote,
	VerifyMerkleRoots,
}

/// Thread-safe log of calls, keyed by the provider name that received them.
#[derive(Debug, Default)]
pub struct CallLog {
	calls: Mutex<Vec<(MockCall, String)>>,
}

impl CallLog {
	fn record(&self, call: MockCall, target: &str) {
		if let Ok(mut calls) = self.calls.lock() {
			calls.push((call, target.to_string()));
		}
	}

	/// Number of calls of `kind`, over every target.
	pub fn count(&self, kind: MockCall) -> usize {
		self.calls
			.lock()
			.map(|calls| calls.iter().filter(|(call, _)| *call == kind).count())
			.unwrap_or(0)
	}

	/// Number of calls of `kind` made against `target`.
	pub fn count_for(&self, kind: MockCall, target: &str) -> usize {
		self.calls
			.lock()
			.map(|calls| {
				calls
					.iter()
					.filter(|(call, name)| *call == kind && name == target)
					.count()
			})
			.unwrap_or(0)
	}

	pub fn total(&self) -> usize {
		self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
	}
}

fn unscripted() -> ProviderError {
	ProviderError::Network("mock response not scripted".to_string())
}

async fn delay(latency: Option<&Duration>) {
	if let Some(latency) = latency {
		tokio::time::sleep(*latency).await;
	}
}

/// Scripted miner client. Scripts are keyed by miner name.
#[derive(Debug, Default)]
pub struct MockMinerClient {
	submissions: HashMap<String, Result<SubmissionResponse, ProviderError>>,
	statuses: HashMap<String, Result<MinerTransactionStatus, ProviderError>>,
	fees: HashMap<String, Result<Fee, ProviderError>>,
	latency: HashMap<String, Duration>,
	calls: CallLog,
}

impl MockMinerClient {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_submission(
		mut self,
		miner: &str,
		response: Result<SubmissionResponse, ProviderError>,
	) -> Self {
		self.submissions.insert(miner.to_string(), response);
		self
	}

	/// Scripts an accepted submission for `tx_id`.
	pub fn accepting(self, miner: &str, tx_id: &str) -> Self {
		let response = SubmissionResponse {
			tx_id: tx_id.to_string(),
			miner_id: format!("{}-id", miner),
			accepted: true,
			description: String::new(),
		};
		self.with_submission(miner, Ok(response))
	}

	/// Scripts a refused submission carrying the miner's `description`.
	pub fn refusing(self, miner: &str, description: &str) -> Self {
		let response = SubmissionResponse {
			tx_id: String::new(),
			miner_id: format!("{}-id", miner),
			accepted: false,
			description: description.to_string(),
		};
		self.with_submission(miner, Ok(response))
	}

	pub fn with_status(
		mut self,
		miner: &str,
		response: Result<MinerTransactionStatus, ProviderError>,
	) -> Self {
		self.statuses.insert(miner.to_string(), response);
		self
	}

	pub fn with_fee(mut self, miner: &str, response: Result<Fee, ProviderError>) -> Self {
		self.fees.insert(miner.to_string(), response);
		self
	}

	pub fn with_latency(mut self, miner: &str, latency: Duration) -> Self {
		self.latency.insert(miner.to_string(), latency);
		self
	}

	pub fn calls(&self) -> &CallLog {
		&self.calls
	}

	fn quote(&self, miner: &Miner) -> Result<Fee, ProviderError> {
		self.fees
			.get(&miner.name)
			.cloned()
			.unwrap_or_else(|| Err(unscripted()))
	}
}

#[async_trait]
impl MinerClient for MockMinerClient {
	async fn submit_transaction(
		&self,
		miner: &Miner,
		_tx_hex: &str,
	) -> Result<SubmissionResponse, ProviderError> {
		self.calls.record(MockCall::Broadcast, &miner.name);
		delay(self.latency.get(&miner.name)).await;
		self.submissions
			.get(&miner.name)
			.cloned()
			.unwrap_or_else(|| Err(unscripted()))
	}

	async fn query_transaction(
		&self,
		miner: &Miner,
		_tx_id: &str,
	) -> Result<MinerTransactionStatus, ProviderError> {
		self.calls.record(MockCall::Query, &miner.name);
		delay(self.latency.get(&miner.name)).await;
		self.statuses
			.get(&miner.name)
			.cloned()
			.unwrap_or(Err(ProviderError::NotFound))
	}

	async fn fee_quote(&self, miner: &Miner) -> Result<Fee, ProviderError> {
		self.calls.record(MockCall::FeeQuote, &miner.name);
		delay(self.latency.get(&miner.name)).await;
		self.quote(miner)
	}

	async fn policy_quote(&self, miner: &Miner) -> Result<Fee, ProviderError> {
		self.calls.record(MockCall::PolicyQuote, &miner.name);
		delay(self.latency.get(&miner.name)).await;
		self.quote(miner)
	}
}

/// Scripted block explorer.
#[derive(Debug)]
pub struct MockExplorer {
	name: String,
	broadcast: Result<String, ProviderError>,
	transaction: Result<ExplorerTransaction, ProviderError>,
	latency: Option<Duration>,
	calls: CallLog,
}

impl MockExplorer {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			broadcast: Err(unscripted()),
			transaction: Err(ProviderError::NotFound),
			latency: None,
			calls: CallLog::default(),
		}
	}

	pub fn with_broadcast(mut self, response: Result<String, ProviderError>) -> Self {
		self.broadcast = response;
		self
	}

	pub fn with_transaction(mut self, response: Result<ExplorerTransaction, ProviderError>) -> Self {
		self.transaction = response;
		self
	}

	pub fn with_latency(mut self, latency: Duration) -> Self {
		self.latency = Some(latency);
		self
	}

	pub fn calls(&self) -> &CallLog {
		&self.calls
	}
}

#[async_trait]
impl ExplorerClient for MockExplorer {
	fn name(&self) -> &str {
		&self.name
	}

	async fn broadcast_tx(&self, _tx_hex: &str) -> Result<String, ProviderError> {
		self.calls.record(MockCall::Broadcast, &self.name);
		delay(self.latency.as_ref()).await;
		self.broadcast.clone()
	}

	async fn get_tx_by_hash(&self, _tx_id: &str) -> Result<ExplorerTransaction, ProviderError> {
		self.calls.record(MockCall::Query, &self.name);
		delay(self.latency.as_ref()).await;
		self.transaction.clone()
	}
}

/// Scripted raw-node proxy.
#[derive(Debug)]
pub struct MockNodeProxy {
	name: String,
	broadcast: Result<String, ProviderError>,
	transaction: Result<NodeTransaction, ProviderError>,
	latency: Option<Duration>,
	calls: CallLog,
}

impl MockNodeProxy {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			broadcast: Err(unscripted()),
			transaction: Err(ProviderError::NotFound),
			latency: None,
			calls: CallLog::default(),
		}
	}

	pub fn with_broadcast(mut self, response: Result<String, ProviderError>) -> Self {
		self.broadcast = response;
		self
	}

	pub fn with_transaction(mut self, response: Result<NodeTransaction, ProviderError>) -> Self {
		self.transaction = response;
		self
	}

	pub fn with_latency(mut self, latency: Duration) -> Self {
		self.latency = Some(latency);
		self
	}

	pub fn calls(&self) -> &CallLog {
		&self.calls
	}
}

#[async_trait]
impl NodeProxyClient for MockNodeProxy {
	fn name(&self) -> &str {
		&self.name
	}

	async fn send_raw_transaction(&self, _tx_hex: &str) -> Result<String, ProviderError> {
		self.calls.record(MockCall::Broadcast, &self.name);
		delay(self.latency.as_ref()).await;
		self.broadcast.clone()
	}

	async fn get_transaction(&self, _tx_id: &str) -> Result<NodeTransaction, ProviderError> {
		self.calls.record(MockCall::Query, &self.name);
		delay(self.latency.as_ref()).await;
		self.transaction.clone()
	}
}

/// Scripted merkle-root verification service.
#[derive(Debug)]
pub struct MockMerkleRoots {
	name: String,
	response: Result<MerkleRootsVerification, ProviderError>,
	latency: Option<Duration>,
	calls: CallLog,
}

impl MockMerkleRoots {
	/// A service that confirms every batch.
	pub fn confirming(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			response: Ok(MerkleRootsVerification {
				confirmation_state: ConfirmationState::Confirmed,
				confirmations: Vec::new(),
			}),
			latency: None,
			calls: CallLog::default(),
		}
	}

	pub fn with_response(mut self, response: Result<MerkleRootsVerification, ProviderError>) -> Self {
		self.response = response;
		self
	}

	pub fn with_latency(mut self, latency: Duration) -> Self {
		self.latency = Some(latency);
		self
	}

	pub fn calls(&self) -> &CallLog {
		&self.calls
	}
}

#[async_trait]
impl MerkleRootsClient for MockMerkleRoots {
	fn name(&self) -> &str {
		&self.name
	}

	async fn verify_merkle_roots(
		&self,
		_roots: &[MerkleRootConfirmationRequest],
	) -> Result<MerkleRootsVerification, ProviderError> {
		self.calls.record(MockCall::VerifyMerkleRoots, &self.name);
		delay(self.latency.as_ref()).await;
		self.response.clone()
	}
}
