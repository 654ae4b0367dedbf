//! Broadcast coordinator.
//!
//! Submits a transaction to every active provider at once and waits for all
//! of them before deciding. One acceptance is enough for success; when every
//! provider fails, the error lists each provider's message.

use super::query::query_ordered;
use crate::classify::{classify_broadcast_error, ErrorClass};
use crate::fanout::{FanOut, FirstSuccess};
use crate::provider::Provider;
use crate::registry::Operation;
use crate::ChainstateError;
use chainstate_providers::ProviderError;
use chainstate_types::RequiredIn;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// What one provider's broadcast task reports.
#[derive(Debug)]
struct Outcome {
	provider: String,
	error: Option<String>,
}

/// Per-call inputs shared by every broadcast task.
pub(crate) struct BroadcastRequest {
	pub id: Arc<str>,
	pub tx_hex: Arc<str>,
	pub deadline: Instant,
	/// Providers consulted when an error needs a mempool lookup.
	pub fallback: Arc<[Provider]>,
	/// Upper bound on a single mempool lookup.
	pub fallback_timeout: Duration,
	pub first_success: Arc<FirstSuccess>,
}

pub(crate) async fn broadcast(
	providers: Vec<Provider>,
	request: BroadcastRequest,
) -> Result<(), ChainstateError> {
	if providers.is_empty() {
		return Err(ChainstateError::NoProviders(Operation::Broadcast));
	}

	let request = Arc::new(request);
	let mut scope = FanOut::with_capacity(providers.len());
	for provider in providers {
		let request = request.clone();
		scope.spawn(async move { Some(broadcast_to(provider, &request).await) });
	}
	let outcomes = scope.drain().await;

	let accepted = outcomes.iter().filter(|o| o.error.is_none()).count();
	if accepted > 0 {
		tracing::info!(
			accepted,
			providers = outcomes.len(),
			first = request.first_success.get().unwrap_or_default(),
			"Transaction broadcast"
		);
		return Ok(());
	}

	let failures: Vec<String> = outcomes
		.into_iter()
		.filter_map(|o| o.error.map(|message| format!("{}: {}", o.provider, message)))
		.collect();
	tracing::warn!(failures = failures.len(), "Every provider rejected the broadcast");
	Err(ChainstateError::BroadcastFailed(failures.join("; ")))
}

async fn broadcast_to(provider: Provider, request: &BroadcastRequest) -> Outcome {
	let name = provider.name().to_string();
	let result = tokio::time::timeout_at(request.deadline, provider.broadcast(&request.id, &request.tx_hex))
		.await
		.unwrap_or(Err(ProviderError::Timeout));

	let error = match result {
		Ok(()) => {
			tracing::debug!(provider = %name, "Broadcast accepted");
			None
		}
		Err(e) => resolve_error(&name, e, request).await,
	};

	if error.is_none() && request.first_success.record(&name) {
		tracing::debug!(provider = %name, "First provider to accept");
	}
	Outcome {
		provider: name,
		error,
	}
}

/// Decides whether a broadcast error is a real failure, returning its message
/// if so.
async fn resolve_error(provider: &str, error: ProviderError, request: &BroadcastRequest) -> Option<String> {
	let message = error.to_string();
	match classify_broadcast_error(&message) {
		ErrorClass::SuccessEquivalent => {
			tracing::debug!(provider, error = %message, "Provider already has the transaction");
			None
		}
		ErrorClass::Questionable => {
			let deadline = request.deadline.min(Instant::now() + request.fallback_timeout);
			match query_ordered(&request.fallback, &request.id, RequiredIn::InMempool, deadline).await {
				Ok(info) => {
					tracing::debug!(
						provider,
						seen_by = %info.provider,
						error = %message,
						"Transaction found in mempool after ambiguous error"
					);
					None
				}
				Err(_) => {
					tracing::debug!(provider, error = %message, "Broadcast failed");
					Some(message)
				}
			}
		}
		ErrorClass::Failure => {
			tracing::debug!(provider, error = %message, "Broadcast failed");
			Some(message)
		}
	}
}
