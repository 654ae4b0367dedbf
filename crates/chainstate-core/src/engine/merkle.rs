//! Merkle-root verification.
//!
//! The batch goes to every verification service at once and the first
//! answer decides, whether it is a confirmation or an error.

use crate::fanout::FanOut;
use crate::ChainstateError;
use chainstate_config::StragglerPolicy;
use chainstate_providers::{MerkleRootsClient, ProviderError};
use chainstate_types::MerkleRootConfirmationRequest;
use std::sync::Arc;
use tokio::time::Instant;

pub(crate) async fn verify_merkle_roots(
	verifiers: Vec<Arc<dyn MerkleRootsClient>>,
	roots: Vec<MerkleRootConfirmationRequest>,
	deadline: Instant,
	stragglers: StragglerPolicy,
) -> Result<(), ChainstateError> {
	if verifiers.is_empty() {
		return Err(ChainstateError::NoMerkleVerifiers);
	}
	if roots.is_empty() {
		return Ok(());
	}

	let roots: Arc<[MerkleRootConfirmationRequest]> = roots.into();
	let mut scope = FanOut::with_capacity(verifiers.len());
	for verifier in verifiers {
		let roots = roots.clone();
		scope.spawn(async move {
			let result = tokio::time::timeout_at(deadline, verifier.verify_merkle_roots(&roots))
				.await
				.unwrap_or(Err(ProviderError::Timeout));
			Some((verifier.name().to_string(), result))
		});
	}

	let Some((verifier, result)) = scope.first(deadline, stragglers).await else {
		return Err(ChainstateError::MerkleVerification(
			"no verification service answered".to_string(),
		));
	};

	match result {
		Ok(response) if response.all_confirmed() => {
			tracing::debug!(%verifier, roots = roots.len(), "Merkle roots confirmed");
			Ok(())
		}
		Ok(response) => {
			tracing::warn!(
				%verifier,
				state = ?response.confirmation_state,
				"Merkle roots not confirmed"
			);
			Err(ChainstateError::MerkleRootsNotConfirmed(response.unconfirmed_roots()))
		}
		Err(e) => Err(ChainstateError::MerkleVerification(format!("{}: {}", verifier, e))),
	}
}
