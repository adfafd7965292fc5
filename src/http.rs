//! Transport primitives shared by the GitHub and Notion clients.
//!
//! Every remote call goes through [`ReqwestHttpClient::execute`], which reads the whole body
//! and captures [`ResponseMetadata`] (status code and Retry-After hint) so callers can map
//! non-success statuses into the crate error taxonomy with consistent detail. Nothing here
//! retries; a response is returned exactly once per request.

// std
use std::ops::Deref;
// crates.io
use reqwest::{
	RequestBuilder,
	header::{HeaderMap, RETRY_AFTER},
};
use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::ConfigError};

/// User agent sent on every request; GitHub rejects requests without one.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Metadata captured from the most recent HTTP response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// HTTP status code.
	pub status: u16,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Fully buffered response returned by [`ReqwestHttpClient::execute`].
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// Status and retry hints.
	pub metadata: ResponseMetadata,
	/// Raw response body.
	pub body: String,
}
impl ApiResponse {
	/// Returns `true` for any 2xx status.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.metadata.status)
	}

	/// HTTP status code.
	pub fn status(&self) -> u16 {
		self.metadata.status
	}

	/// Decodes the body as JSON, reporting the failing path on mismatch.
	pub fn decode<T>(&self, operation: &'static str) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let de = &mut serde_json::Deserializer::from_str(&self.body);

		serde_path_to_error::deserialize(de)
			.map_err(|source| Error::MalformedResponse { operation, source })
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client with the crate user agent and a uniform request timeout.
	pub fn with_timeout(timeout: std::time::Duration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.user_agent(USER_AGENT)
			.timeout(timeout)
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self(client))
	}

	/// Sends the request and buffers the body.
	///
	/// Non-success statuses are returned as ordinary responses; only transport failures
	/// surface as errors here.
	pub async fn execute(&self, request: RequestBuilder) -> Result<ApiResponse> {
		let response = request.send().await?;
		let status = response.status().as_u16();
		let retry_after = parse_retry_after(response.headers());
		let body = response.text().await?;

		Ok(ApiResponse { metadata: ResponseMetadata { status, retry_after }, body })
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// Joins a base URL and a relative path without doubling slashes.
pub(crate) fn endpoint(base: &Url, path: &str) -> String {
	format!("{}/{}", base.as_str().trim_end_matches('/'), path.trim_start_matches('/'))
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
