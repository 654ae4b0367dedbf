//! Response handling shared by the HTTP providers.

use crate::ProviderError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

/// Maps a transport failure to a provider error.
pub(crate) fn network_error(err: reqwest::Error) -> ProviderError {
	if err.is_timeout() {
		ProviderError::Timeout
	} else {
		ProviderError::Network(err.to_string())
	}
}

/// Reads the body of `response`, mapping error statuses to provider errors.
///
/// The body text of a failed request is kept verbatim, since it usually holds
/// the provider's reason for refusing a transaction.
pub(crate) async fn read_body(response: reqwest::Response) -> Result<String, ProviderError> {
	let status = response.status();
	let body = response.text().await.map_err(network_error)?;

	if status == StatusCode::NOT_FOUND {
		return Err(ProviderError::NotFound);
	}
	if !status.is_success() {
		return Err(ProviderError::Http {
			status: status.as_u16(),
			message: body.trim().to_string(),
		});
	}
	Ok(body)
}

/// Reads and decodes a JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(
	response: reqwest::Response,
) -> Result<T, ProviderError> {
	let body = read_body(response).await?;
	decode(&body)
}

pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ProviderError> {
	serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))
}

/// Joins a base url and a path without doubling slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
	format!(
		"{}/{}",
		base.trim_end_matches('/'),
		path.trim_start_matches('/')
	)
}
