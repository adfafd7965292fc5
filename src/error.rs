//! Crate-level error types shared by the credential broker and the document editor.

// self
use crate::{
	_prelude::*,
	notion::{AnchorKind, BlockId, SectionEditStage},
};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Expected failure modes (validation, missing anchors, remote rejections) are ordinary
/// variants; none of them are retried internally.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Malformed identifier or input, caught before any network call.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// GitHub App assertion or token exchange failed.
	#[error(transparent)]
	AuthExchange(#[from] AuthExchangeError),
	/// Append, insert, or delete was rejected by the document host.
	#[error(transparent)]
	RemoteWrite(#[from] RemoteWriteError),

	/// Well-formed identifier, but the remote host refused to return it.
	#[error("Remote host returned HTTP {status} for {resource}: {body}.")]
	NotFound {
		/// Resource label (usually the normalized identifier).
		resource: String,
		/// HTTP status code.
		status: u16,
		/// Raw remote response body.
		body: String,
	},
	/// Non-success on a read that is not a document block listing.
	#[error("Remote read of {resource} failed with HTTP {status}: {body}.")]
	RemoteRead {
		/// Resource label.
		resource: String,
		/// HTTP status code.
		status: u16,
		/// Raw remote response body.
		body: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Heading or text anchor is absent from the current document snapshot.
	#[error("No {kind} matching `{anchor}` exists in document {document}.")]
	AnchorNotFound {
		/// Document that was scanned.
		document: BlockId,
		/// Anchor text that was searched for.
		anchor: String,
		/// Whether a heading or any text block was expected.
		kind: AnchorKind,
	},
	/// Several blocks match the anchor and the editor is configured to reject duplicates.
	#[error("{matches} blocks match {kind} `{anchor}` in document {document}.")]
	AmbiguousAnchor {
		/// Document that was scanned.
		document: BlockId,
		/// Anchor text that was searched for.
		anchor: String,
		/// Whether a heading or any text block was expected.
		kind: AnchorKind,
		/// Number of matching blocks.
		matches: usize,
	},
	/// A section replacement failed after old content had already been deleted.
	///
	/// The document is left with the heading, any old blocks listed in `remaining`, and none of
	/// the new blocks. Re-read the document before deciding how to recover.
	#[error(
		"Section `{heading}` in document {document} was left partially edited during the {stage} stage ({} old blocks deleted, {} remaining).",
		.deleted.len(),
		.remaining.len()
	)]
	PartialSectionEdit {
		/// Document being edited.
		document: BlockId,
		/// Heading text of the section.
		heading: String,
		/// Stage that failed.
		stage: SectionEditStage,
		/// Old body blocks that were deleted before the failure.
		deleted: Vec<BlockId>,
		/// Old body blocks still present.
		remaining: Vec<BlockId>,
		/// Failure that interrupted the edit.
		#[source]
		source: Box<Error>,
	},
	/// Remote response body could not be decoded into the expected shape.
	#[error("Response for {operation} did not match the expected shape.")]
	MalformedResponse {
		/// Operation whose response failed to decode.
		operation: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Repository file is not UTF-8 text.
	#[error("File `{path}` is not valid UTF-8 text.")]
	BinaryContent {
		/// Repository path of the file.
		path: String,
	},
}
impl Error {
	/// Returns the upstream Retry-After hint, when the failure carried one.
	pub fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::RemoteRead { retry_after, .. } => *retry_after,
			Self::RemoteWrite(err) => err.retry_after,
			Self::PartialSectionEdit { source, .. } => source.retry_after(),
			_ => None,
		}
	}

	/// Returns `true` when the failure happened before any request was sent.
	pub fn is_local(&self) -> bool {
		matches!(self, Self::Validation(_) | Self::Config(_))
	}
}

/// Input rejected before any network call.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// The string does not contain a 32-hex-character identifier.
	#[error("`{input}` does not contain a 32-character hexadecimal identifier.")]
	MalformedId {
		/// Offending input.
		input: String,
	},
	/// Repository name is not `owner/name`.
	#[error("`{input}` is not a repository name of the form owner/name.")]
	InvalidRepository {
		/// Offending input.
		input: String,
	},
	/// GitHub App identifier is empty or contains whitespace.
	#[error("`{input}` is not a valid GitHub App identifier.")]
	InvalidAppId {
		/// Offending input.
		input: String,
	},
	/// Block template names a type this crate does not model.
	#[error("Block type `{kind}` is not supported.")]
	UnknownBlockType {
		/// Offending type string.
		kind: String,
	},
}

/// Configuration and construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Required environment variable is absent or empty.
	#[error("Required environment variable `{name}` is not set.")]
	MissingVar {
		/// Variable name.
		name: &'static str,
	},
	/// Environment variable is present but unusable.
	#[error("Environment variable `{name}` is invalid: {reason}.")]
	InvalidVar {
		/// Variable name.
		name: &'static str,
		/// Why the value was rejected.
		reason: String,
	},
	/// Base URL cannot be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// App private key is not a usable RSA PEM.
	#[error("GitHub App private key is not a valid RSA PEM.")]
	InvalidSigningKey {
		/// Underlying key parsing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// Secret cannot be encoded as an HTTP header value.
	#[error("Credential cannot be used as an HTTP header value.")]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	/// Token refresh margin must be strictly positive.
	#[error("Token safety margin must be strictly positive.")]
	NonPositiveSafetyMargin,
	/// Cached token lifetime must outlast the safety margin.
	#[error("Assumed token lifetime must exceed the safety margin.")]
	LifetimeWithinSafetyMargin,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<url::ParseError> for ConfigError {
	fn from(source: url::ParseError) -> Self {
		Self::InvalidBaseUrl { source }
	}
}

/// Stage of the GitHub App token exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExchangeStep {
	/// `GET /repos/{owner}/{repo}/installation`.
	InstallationLookup,
	/// `POST /app/installations/{id}/access_tokens`.
	TokenMint,
}
impl ExchangeStep {
	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::InstallationLookup => "installation_lookup",
			Self::TokenMint => "token_mint",
		}
	}
}
impl Display for ExchangeStep {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// GitHub App authentication failures. Never retried internally.
#[derive(Debug, ThisError)]
pub enum AuthExchangeError {
	/// The signed assertion could not be produced.
	#[error("Failed to sign the GitHub App assertion.")]
	Assertion {
		/// Signing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// GitHub answered an exchange step with a non-success status.
	#[error("GitHub rejected the {step} step with HTTP {status}: {body}.")]
	Rejected {
		/// Step that failed.
		step: ExchangeStep,
		/// HTTP status code.
		status: u16,
		/// Raw remote response body.
		body: String,
	},
}

/// Kind of document write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WriteOperation {
	/// `PATCH /blocks/{id}/children` without `after`.
	Append,
	/// `PATCH /blocks/{id}/children` with `after`.
	InsertAfter,
	/// `DELETE /blocks/{id}`.
	Delete,
	/// `POST /pages`.
	CreatePage,
}
impl WriteOperation {
	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Append => "append",
			Self::InsertAfter => "insert_after",
			Self::Delete => "delete",
			Self::CreatePage => "create_page",
		}
	}
}
impl Display for WriteOperation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// The document host rejected a write.
#[derive(Debug, ThisError)]
#[error("Document host rejected {operation} on {target} with HTTP {status}: {body}.")]
pub struct RemoteWriteError {
	/// Write that failed.
	pub operation: WriteOperation,
	/// Block, page, or database the write addressed.
	pub target: BlockId,
	/// HTTP status code.
	pub status: u16,
	/// Raw remote response body.
	pub body: String,
	/// Retry-After hint from upstream, if supplied.
	pub retry_after: Option<Duration>,
}

/// Transport-level failures (network, TLS, timeouts).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote host.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request exceeded the configured client timeout.
	#[error("Request timed out while calling the remote host.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout { source: Box::new(e) } } else { Self::network(e) }
	}
}
impl From<ReqwestError> for Error {
	fn from(e: ReqwestError) -> Self {
		if e.is_builder() {
			return ConfigError::http_client_build(e).into();
		}

		TransportError::from(e).into()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn block_id() -> BlockId {
		BlockId::parse("2d322f89689b8005a4e8c224ae074ddd").expect("Fixture id should parse.")
	}

	#[test]
	fn partial_edit_reports_counts_and_source() {
		let write = RemoteWriteError {
			operation: WriteOperation::Delete,
			target: block_id(),
			status: 429,
			body: "rate_limited".into(),
			retry_after: Some(Duration::seconds(3)),
		};
		let err = Error::PartialSectionEdit {
			document: block_id(),
			heading: "Usage".into(),
			stage: SectionEditStage::Delete,
			deleted: vec![block_id()],
			remaining: vec![block_id(), block_id()],
			source: Box::new(write.into()),
		};
		let message = err.to_string();

		assert!(message.contains("1 old blocks deleted, 2 remaining"), "{message}");
		assert_eq!(err.retry_after(), Some(Duration::seconds(3)));

		let source = StdError::source(&err).expect("Partial edit should expose its cause.");

		assert!(source.to_string().contains("rate_limited"));
	}

	#[test]
	fn validation_and_config_errors_are_local() {
		let validation: Error = ValidationError::MalformedId { input: "TO_FILL".into() }.into();
		let config: Error = ConfigError::NonPositiveSafetyMargin.into();
		let remote = Error::NotFound { resource: "page".into(), status: 404, body: "{}".into() };

		assert!(validation.is_local());
		assert!(config.is_local());
		assert!(!remote.is_local());
		assert!(validation.to_string().contains("TO_FILL"));
	}
}
