//! Formatting helpers.

/// Truncates a transaction id for log output.
///
/// Shows only the first 8 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	match id.get(..8) {
		Some(prefix) if id.len() > 8 => format!("{}..", prefix),
		_ => id.to_string(),
	}
}

/// Returns true when `value` is a non-empty string of hex digits.
pub fn is_hex(value: &str) -> bool {
	!value.is_empty() && value.bytes().all(|b| b.is_ascii_hexdigit())
}
