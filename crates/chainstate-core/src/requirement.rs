//! Requirement evaluation for queried transactions.

use chainstate_types::{RequiredIn, TransactionInfo};

/// Decides whether `info` reports `id` at the `required_in` level or better.
///
/// `InMempool` accepts any acknowledgment of the same id, in the mempool or in
/// a block. `OnChain` requires a block hash and at least one confirmation and
/// does not compare ids.
pub fn satisfies(required_in: RequiredIn, id: &str, info: &TransactionInfo) -> bool {
	match required_in {
		RequiredIn::InMempool => {
			info.id == id && (!info.miner_id.is_empty() || !info.block_hash.is_empty())
		}
		RequiredIn::OnChain => !info.block_hash.is_empty() && info.confirmations > 0,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const ID: &str = "3b7f1a1c2e5d9f0a4b6c8d7e1f2a3b4c5d6e7f8091a2b3c4d5e6f708192a3b4c";

	#[test]
	fn test_in_mempool_requires_matching_id() {
		let info = TransactionInfo {
			id: ID.to_string(),
			miner_id: "m1".to_string(),
			..Default::default()
		};
		assert!(satisfies(RequiredIn::InMempool, ID, &info));

		let info = TransactionInfo {
			id: String::new(),
			miner_id: "m1".to_string(),
			..Default::default()
		};
		assert!(!satisfies(RequiredIn::InMempool, ID, &info));
	}

	#[test]
	fn test_in_mempool_accepts_block_hash_alone() {
		let info = TransactionInfo {
			id: ID.to_string(),
			block_hash: "h".to_string(),
			..Default::default()
		};
		assert!(satisfies(RequiredIn::InMempool, ID, &info));
	}

	#[test]
	fn test_in_mempool_needs_an_acknowledgment() {
		let info = TransactionInfo {
			id: ID.to_string(),
			provider: "explorer".to_string(),
			..Default::default()
		};
		assert!(!satisfies(RequiredIn::InMempool, ID, &info));
	}

	#[test]
	fn test_on_chain_ignores_id() {
		let info = TransactionInfo {
			block_hash: "h".to_string(),
			confirmations: 1,
			..Default::default()
		};
		assert!(satisfies(RequiredIn::OnChain, ID, &info));

		let info = TransactionInfo {
			id: "another".to_string(),
			..info
		};
		assert!(satisfies(RequiredIn::OnChain, ID, &info));
	}

	#[test]
	fn test_on_chain_needs_confirmation() {
		let info = TransactionInfo {
			id: ID.to_string(),
			block_hash: "h".to_string(),
			confirmations: 0,
			..Default::default()
		};
		assert!(!satisfies(RequiredIn::OnChain, ID, &info));

		let info = TransactionInfo {
			id: ID.to_string(),
			miner_id: "m1".to_string(),
			confirmations: 3,
			..Default::default()
		};
		assert!(!satisfies(RequiredIn::OnChain, ID, &info));
	}
}
