//! Installation access tokens and the redacted secret wrapper they carry.

// self
use crate::_prelude::*;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Freshness of a cached token relative to a safety margin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStatus {
	/// Token may be reused.
	Fresh,
	/// Token is still valid remotely but inside the renewal window.
	Renewing,
	/// Token is past its expiry instant.
	Expired,
}

/// Installation-scoped bearer token with its expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
	/// Bearer secret.
	pub token: TokenSecret,
	/// Instant the token was minted (local clock).
	pub issued_at: OffsetDateTime,
	/// Instant the remote host stops accepting the token.
	pub expires_at: OffsetDateTime,
}
impl AccessToken {
	/// Creates a token record.
	pub fn new(
		token: impl Into<String>,
		issued_at: OffsetDateTime,
		expires_at: OffsetDateTime,
	) -> Self {
		Self { token: TokenSecret::new(token), issued_at, expires_at }
	}

	/// Classifies the token at `now`, treating the final `safety_margin` as renewal time.
	pub fn status_at(&self, now: OffsetDateTime, safety_margin: Duration) -> TokenStatus {
		if now >= self.expires_at {
			return TokenStatus::Expired;
		}
		if now >= self.expires_at - safety_margin {
			return TokenStatus::Renewing;
		}

		TokenStatus::Fresh
	}

	/// Returns `true` while `now < expires_at - safety_margin`.
	pub fn is_reusable_at(&self, now: OffsetDateTime, safety_margin: Duration) -> bool {
		matches!(self.status_at(now, safety_margin), TokenStatus::Fresh)
	}

	/// Formats the `Authorization` header value.
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.token.expose())
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
