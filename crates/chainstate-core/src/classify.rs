//! Provider error classification.
//!
//! Providers word the same outcome differently, so broadcast errors are
//! matched against versioned pattern tables instead of string literals
//! scattered through the coordinators. Matching is a case-insensitive
//! substring test; table order does not matter.
//!
//! These tables track provider wording. When a provider changes its error
//! text, add the new phrasing here and bump the table version.

/// A named, versioned list of error phrasings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternTable {
	pub name: &'static str,
	pub version: u32,
	pub patterns: &'static [&'static str],
}

impl PatternTable {
	/// Returns true if any pattern of the table occurs in `message`.
	pub fn matches(&self, message: &str) -> bool {
		classify(message, self.patterns)
	}
}

/// Phrasings meaning the transaction was already accepted.
pub const SUCCESS_EQUIVALENT: PatternTable = PatternTable {
	name: "success-equivalent",
	version: 1,
	patterns: &[
		"txn-already-known",
		"txn-already-in-mempool",
		"transaction already in the mempool",
		"already in the mempool",
		"already in mempool",
		"transaction already known",
		"already known",
	],
};

/// Phrasings ambiguous between an invalid transaction and one whose inputs
/// were already spent by this very transaction.
pub const QUESTIONABLE: PatternTable = PatternTable {
	name: "questionable",
	version: 1,
	patterns: &[
		"missing inputs",
		"missingorspent",
		"inputs missing",
		"missing-inputs",
	],
};

/// Returns true iff any of `patterns` is a case-insensitive substring of
/// `message`.
pub fn classify<S: AsRef<str>>(message: &str, patterns: &[S]) -> bool {
	let message = message.to_lowercase();
	patterns
		.iter()
		.any(|pattern| message.contains(&pattern.as_ref().to_lowercase()))
}

/// How a broadcast error is treated by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
	/// The provider already has the transaction; counts as success.
	SuccessEquivalent,
	/// Needs a mempool lookup before it can be called a failure.
	Questionable,
	Failure,
}

/// Classifies a provider's broadcast error text.
pub fn classify_broadcast_error(message: &str) -> ErrorClass {
	if SUCCESS_EQUIVALENT.matches(message) {
		ErrorClass::SuccessEquivalent
	} else if QUESTIONABLE.matches(message) {
		ErrorClass::Questionable
	} else {
		ErrorClass::Failure
	}
}
