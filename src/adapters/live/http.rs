//! Shared request plumbing for the JSON-over-HTTP adapters.

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::ports::PortError;

/// Timeout for metadata lookups and tracker mutations.
pub(super) const METADATA_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for commit diffs.
pub(super) const DIFF_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout for model completions.
pub(super) const LLM_TIMEOUT: Duration = Duration::from_secs(120);

const ERROR_EXCERPT_CHARS: usize = 300;

/// Joins a base URL and a path without doubling the slash.
pub(super) fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Sends `request` and returns the status and body text.
async fn send(service: &str, request: RequestBuilder) -> Result<(StatusCode, String), PortError> {
    let response =
        request.send().await.map_err(|e| format!("{service} request failed: {e}"))?;
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| format!("failed to read {service} response: {e}"))?;
    Ok((status, body))
}

fn failure(service: &str, status: StatusCode, body: &str) -> PortError {
    let excerpt: String = body.chars().take(ERROR_EXCERPT_CHARS).collect();
    format!("{service} API error ({}): {excerpt}", status.as_u16()).into()
}

fn decode<T: DeserializeOwned>(service: &str, body: &str) -> Result<T, PortError> {
    serde_json::from_str(body)
        .map_err(|e| format!("failed to parse {service} response: {e}").into())
}

/// Sends `request` and decodes the JSON body. `Ok(None)` on 404.
pub(super) async fn fetch_optional<T: DeserializeOwned>(
    service: &str,
    request: RequestBuilder,
) -> Result<Option<T>, PortError> {
    let (status, body) = send(service, request).await?;
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(failure(service, status, &body));
    }
    decode(service, &body).map(Some)
}

/// Sends `request` and decodes the JSON body. A 404 is an error.
pub(super) async fn fetch<T: DeserializeOwned>(
    service: &str,
    request: RequestBuilder,
) -> Result<T, PortError> {
    let (status, body) = send(service, request).await?;
    if !status.is_success() {
        return Err(failure(service, status, &body));
    }
    decode(service, &body)
}

/// Sends `request` and discards the body of a successful response.
pub(super) async fn execute(service: &str, request: RequestBuilder) -> Result<(), PortError> {
    let (status, body) = send(service, request).await?;
    if status.is_success() {
        Ok(())
    } else {
        Err(failure(service, status, &body))
    }
}
