//! Query coordinators.
//!
//! The ordered strategy asks providers one at a time in priority order and
//! stops at the first satisfying record, so miner data always outranks
//! explorer data. The race strategy asks every provider at once and takes
//! whichever satisfying record arrives first.

use crate::fanout::FanOut;
use crate::provider::Provider;
use crate::requirement::satisfies;
use crate::ChainstateError;
use chainstate_config::StragglerPolicy;
use chainstate_types::{RequiredIn, TransactionInfo};
use tokio::time::Instant;

/// Queries `providers` in order until one satisfies `required_in`.
pub(crate) async fn query_ordered(
	providers: &[Provider],
	id: &str,
	required_in: RequiredIn,
	deadline: Instant,
) -> Result<TransactionInfo, ChainstateError> {
	for provider in providers {
		match tokio::time::timeout_at(deadline, provider.query(id)).await {
			Ok(Ok(info)) if satisfies(required_in, id, &info) => {
				tracing::debug!(provider = %provider.name(), %required_in, "Requirement satisfied");
				return Ok(info);
			}
			Ok(Ok(_)) => {
				tracing::debug!(provider = %provider.name(), %required_in, "Requirement not met");
			}
			Ok(Err(e)) => {
				tracing::debug!(provider = %provider.name(), error = %e, "Query failed");
			}
			Err(_) => {
				tracing::debug!(provider = %provider.name(), "Query deadline reached");
				break;
			}
		}
	}
	Err(ChainstateError::TransactionNotFound)
}

/// Queries every provider concurrently and returns the first satisfying record.
pub(crate) async fn query_fastest(
	providers: Vec<Provider>,
	id: &str,
	required_in: RequiredIn,
	deadline: Instant,
	stragglers: StragglerPolicy,
) -> Result<TransactionInfo, ChainstateError> {
	let mut scope = FanOut::with_capacity(providers.len());
	for provider in providers {
		let id = id.to_string();
		scope.spawn(async move {
			match tokio::time::timeout_at(deadline, provider.query(&id)).await {
				Ok(Ok(info)) if satisfies(required_in, &id, &info) => Some(info),
				Ok(Ok(_)) => None,
				Ok(Err(e)) => {
					tracing::debug!(provider = %provider.name(), error = %e, "Query failed");
					None
				}
				Err(_) => None,
			}
		});
	}

	match scope.first(deadline, stragglers).await {
		Some(info) => {
			tracing::debug!(provider = %info.provider, %required_in, "Fastest satisfying provider");
			Ok(info)
		}
		None => Err(ChainstateError::TransactionNotFound),
	}
}
