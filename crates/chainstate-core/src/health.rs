//! Miner health checks.
//!
//! Run once while a client is built. Every broadcast miner is probed for its
//! fee concurrently; miners that fail the probe are dropped from the
//! broadcast list and the cheapest surviving fee becomes the client's fee.

use crate::fanout::FanOut;
use crate::ChainstateError;
use chainstate_providers::MinerClient;
use chainstate_types::{truncate_id, Fee, Miner, MinerApi, DEFAULT_FEE};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::instrument;

/// Miner lists and fee that survived the health check.
#[derive(Debug, Clone, PartialEq)]
pub struct MinerSelection {
	pub broadcast: Vec<Miner>,
	pub query: Vec<Miner>,
	pub fee_unit: Fee,
}

/// Probes miners and prunes the ones that do not answer.
pub struct MinerHealthManager {
	client: Arc<dyn MinerClient>,
	probe_timeout: Duration,
	validate_fee_quotes: bool,
}

impl MinerHealthManager {
	pub fn new(client: Arc<dyn MinerClient>, probe_timeout: Duration, validate_fee_quotes: bool) -> Self {
		Self {
			client,
			probe_timeout,
			validate_fee_quotes,
		}
	}

	/// Probes every broadcast miner and returns the surviving selection.
	///
	/// Fails if no broadcast miner survives or the query list is empty.
	#[instrument(skip_all, fields(broadcast = broadcast.len(), query = query.len()))]
	pub async fn check(
		&self,
		broadcast: Vec<Miner>,
		query: Vec<Miner>,
	) -> Result<MinerSelection, ChainstateError> {
		let deadline = Instant::now() + self.probe_timeout;
		let mut scope = FanOut::with_capacity(broadcast.len());
		for (position, miner) in broadcast.into_iter().enumerate() {
			let client = self.client.clone();
			scope.spawn(async move { Some((position, probe(client, miner, deadline).await)) });
		}

		let mut probed = scope.drain().await;
		// Keep the configured order
		probed.sort_by_key(|(position, _)| *position);

		let survivors: Vec<Miner> = probed
			.into_iter()
			.map(|(_, miner)| miner)
			.filter(|miner| miner.fee_unit.is_some())
			.collect();

		if survivors.is_empty() {
			return Err(ChainstateError::NoBroadcastMiners);
		}
		if query.is_empty() {
			return Err(ChainstateError::NoQueryMiners);
		}

		let fee_unit = if self.validate_fee_quotes {
			lowest_fee(&survivors).unwrap_or(DEFAULT_FEE)
		} else {
			DEFAULT_FEE
		};

		tracing::info!(
			miners = survivors.len(),
			fee = %fee_unit,
			"Miner health check complete"
		);
		Ok(MinerSelection {
			broadcast: survivors,
			query,
			fee_unit,
		})
	}
}

/// Requests the miner's fee with the call its API family supports.
///
/// The miner comes back with `fee_unit` set, or cleared if the probe failed.
async fn probe(client: Arc<dyn MinerClient>, mut miner: Miner, deadline: Instant) -> Miner {
	let request = async {
		match miner.api {
			MinerApi::Mapi => client.fee_quote(&miner).await,
			MinerApi::Arc => client.policy_quote(&miner).await,
		}
	};
	let fee = match tokio::time::timeout_at(deadline, request).await {
		Ok(Ok(fee)) if fee.is_valid() => Some(fee),
		Ok(Ok(fee)) => {
			tracing::warn!(miner = %miner.name, %fee, "Miner quoted an unusable fee");
			None
		}
		Ok(Err(e)) => {
			tracing::warn!(miner = %miner.name, error = %e, "Fee probe failed");
			None
		}
		Err(_) => {
			tracing::warn!(miner = %miner.name, "Fee probe timed out");
			None
		}
	};

	if let Some(fee) = fee {
		tracing::debug!(miner = %miner.name, miner_id = %truncate_id(&miner.miner_id), %fee, "Fee probe ok");
	}
	miner.fee_unit = fee;
	miner.fee_last_checked = Some(Utc::now());
	miner
}

fn lowest_fee(miners: &[Miner]) -> Option<Fee> {
	miners
		.iter()
		.filter_map(|miner| miner.fee_unit)
		.min_by(|a, b| a.cmp_rate(b))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{mempool, taal, MockMiners};
	use chainstate_providers::implementations::mock::{MockCall, MockMinerClient};
	use chainstate_providers::ProviderError;

	fn gorilla() -> Miner {
		Miner::new("gorilla-id", "GorillaPool", "https://gorilla.example").with_api(MinerApi::Arc)
	}

	fn manager(client: MockMinerClient) -> (Arc<MockMinerClient>, MinerHealthManager) {
		let client = Arc::new(client);
		let manager = MinerHealthManager::new(client.clone(), Duration::from_secs(5), true);
		(client, manager)
	}

	#[tokio::test]
	async fn test_every_probe_failing() {
		let (client, manager) = manager(
			MockMinerClient::new()
				.with_fee("Taal", Err(ProviderError::Network("refused".to_string())))
				.with_fee("Mempool", Err(ProviderError::Timeout)),
		);

		let result = manager.check(vec![taal(), mempool()], vec![taal()]).await;
		assert!(matches!(result, Err(ChainstateError::NoBroadcastMiners)));
		assert_eq!(client.calls().count(MockCall::FeeQuote), 2);
	}

	#[tokio::test]
	async fn test_failed_miners_are_pruned() {
		let (_, manager) = manager(
			MockMinerClient::new()
				.with_fee("Taal", Err(ProviderError::Timeout))
				.with_fee("Mempool", Ok(Fee::new(1, 2)))
				.with_fee("GorillaPool", Ok(Fee::new(1, 10))),
		);

		let selection = manager
			.check(vec![taal(), mempool(), gorilla()], vec![taal()])
			.await
			.unwrap();
		let names: Vec<_> = selection.broadcast.iter().map(|m| m.name.as_str()).collect();
		assert_eq!(names, vec!["Mempool", "GorillaPool"]);
		assert_eq!(selection.fee_unit, Fee::new(1, 10));
		assert!(selection.broadcast.iter().all(|m| m.fee_last_checked.is_some()));
		assert_eq!(selection.query.len(), 1);
	}

	#[tokio::test]
	async fn test_zero_byte_fee_is_a_failed_probe() {
		let (_, manager) = manager(
			MockMinerClient::new()
				.with_fee("Taal", Ok(Fee::new(1, 0)))
				.with_fee("Mempool", Ok(Fee::new(5, 1000))),
		);

		let selection = manager.check(vec![taal(), mempool()], vec![taal()]).await.unwrap();
		assert_eq!(selection.broadcast.len(), 1);
		assert_eq!(selection.broadcast[0].name, "Mempool");
	}

	#[tokio::test]
	async fn test_default_fee_without_validation() {
		let client = Arc::new(MockMinerClient::new().with_fee("Taal", Ok(Fee::new(1, 1000))));
		let manager = MinerHealthManager::new(client, Duration::from_secs(5), false);

		let selection = manager.check(vec![taal()], vec![taal()]).await.unwrap();
		assert_eq!(selection.fee_unit, DEFAULT_FEE);
		assert_eq!(selection.broadcast[0].fee_unit, Some(Fee::new(1, 1000)));
	}

	#[tokio::test]
	async fn test_empty_query_list() {
		let (_, manager) = manager(MockMinerClient::new().with_fee("Taal", Ok(Fee::new(1, 20))));
		let result = manager.check(vec![taal()], Vec::new()).await;
		assert!(matches!(result, Err(ChainstateError::NoQueryMiners)));
	}

	#[tokio::test(start_paused = true)]
	async fn test_slow_miner_times_out() {
		let (_, manager) = manager(
			MockMinerClient::new()
				.with_fee("Taal", Ok(Fee::new(1, 20)))
				.with_latency("Taal", Duration::from_secs(30))
				.with_fee("Mempool", Ok(Fee::new(1, 20))),
		);

		let selection = manager.check(vec![taal(), mempool()], vec![taal()]).await.unwrap();
		assert_eq!(selection.broadcast.len(), 1);
		assert_eq!(selection.broadcast[0].name, "Mempool");
	}

	#[tokio::test]
	async fn test_policy_quote_for_arc_miners() {
		let mut client = MockMiners::new();
		client.expect_fee_quote().never();
		client
			.expect_policy_quote()
			.times(1)
			.returning(|_| Ok(Fee::new(1, 20)));
		let manager = MinerHealthManager::new(Arc::new(client), Duration::from_secs(5), true);

		let selection = manager.check(vec![gorilla()], vec![gorilla()]).await.unwrap();
		assert_eq!(selection.broadcast[0].fee_unit, Some(Fee::new(1, 20)));
	}

	#[test]
	fn test_lowest_fee_compares_rates() {
		let mut a = taal();
		a.fee_unit = Some(Fee::new(50, 1000));
		let mut b = mempool();
		b.fee_unit = Some(Fee::new(1, 25));
		assert_eq!(lowest_fee(&[a, b]), Some(Fee::new(1, 25)));
	}
}
