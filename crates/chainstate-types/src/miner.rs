//! Miner descriptors and fee quotes.

use crate::SecretString;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Fee used when fee-quote selection is disabled or produced nothing usable.
pub const DEFAULT_FEE: Fee = Fee {
	satoshis: 1,
	bytes: 20,
};

/// A fee rate expressed as satoshis per a number of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fee {
	pub satoshis: u64,
	pub bytes: u64,
}

impl Fee {
	pub const fn new(satoshis: u64, bytes: u64) -> Self {
		Self { satoshis, bytes }
	}

	/// A fee with a zero byte denominator cannot be compared or applied.
	pub fn is_valid(&self) -> bool {
		self.bytes > 0
	}

	/// Compares two rates without floating point.
	///
	/// Both fees must be valid; invalid fees sort after every valid one.
	pub fn cmp_rate(&self, other: &Fee) -> Ordering {
		match (self.is_valid(), other.is_valid()) {
			(true, true) => {
				let lhs = u128::from(self.satoshis) * u128::from(other.bytes);
				let rhs = u128::from(other.satoshis) * u128::from(self.bytes);
				lhs.cmp(&rhs)
			}
			(true, false) => Ordering::Less,
			(false, true) => Ordering::Greater,
			(false, false) => Ordering::Equal,
		}
	}

	/// Estimated fee in satoshis for a transaction of `size` bytes, rounded up.
	pub fn estimate(&self, size: u64) -> u64 {
		if !self.is_valid() {
			return 0;
		}
		(size * self.satoshis).div_ceil(self.bytes)
	}
}

impl fmt::Display for Fee {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} sat / {} bytes", self.satoshis, self.bytes)
	}
}

/// Which submission API a miner speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinerApi {
	/// Merchant API, publishes fee quotes.
	#[default]
	Mapi,
	/// ARC, publishes policy quotes.
	Arc,
}

/// A mining pool reachable through a miner-submission API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Miner {
	pub miner_id: String,
	pub name: String,
	pub url: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token: Option<SecretString>,
	#[serde(default)]
	pub api: MinerApi,
	/// Fee from the last successful probe, `None` once a probe has failed.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fee_unit: Option<Fee>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fee_last_checked: Option<DateTime<Utc>>,
}

impl Miner {
	pub fn new(miner_id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
		Self {
			miner_id: miner_id.into(),
			name: name.into(),
			url: url.into(),
			token: None,
			api: MinerApi::default(),
			fee_unit: None,
			fee_last_checked: None,
		}
	}

	pub fn with_api(mut self, api: MinerApi) -> Self {
		self.api = api;
		self
	}

	pub fn with_token(mut self, token: impl Into<SecretString>) -> Self {
		self.token = Some(token.into());
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_rate_comparison_is_exact() {
		let half = Fee::new(1, 2);
		let also_half = Fee::new(500, 1000);
		let twentieth = Fee::new(1, 20);

		assert_eq!(half.cmp_rate(&also_half), Ordering::Equal);
		assert_eq!(twentieth.cmp_rate(&half), Ordering::Less);
		assert_eq!(half.cmp_rate(&twentieth), Ordering::Greater);
	}

	#[test]
	fn test_invalid_fee_sorts_last() {
		let invalid = Fee::new(0, 0);
		assert!(!invalid.is_valid());
		assert_eq!(invalid.cmp_rate(&Fee::new(100, 1)), Ordering::Greater);
		assert_eq!(invalid.estimate(1000), 0);
	}

	#[test]
	fn test_estimate_rounds_up() {
		assert_eq!(DEFAULT_FEE.estimate(226), 12);
		assert_eq!(Fee::new(1, 2).estimate(10), 5);
	}
}
