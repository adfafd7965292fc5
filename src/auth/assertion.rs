//! RS256 app assertions exchanged for installation tokens.

// crates.io
use jsonwebtoken::{Algorithm, EncodingKey, Header};
// self
use crate::{
	_prelude::*,
	auth::AppId,
	error::{AuthExchangeError, ConfigError},
};

/// Claims carried by a GitHub App assertion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
	/// Issued-at, in Unix seconds.
	pub iat: i64,
	/// Expiry, in Unix seconds.
	pub exp: i64,
	/// Issuer (the app identifier).
	pub iss: String,
}
impl AssertionClaims {
	/// Builds claims back-dated by `backdate` to tolerate clock drift and valid for `lifetime`
	/// from `now`.
	pub fn new(app_id: &AppId, now: OffsetDateTime, backdate: Duration, lifetime: Duration) -> Self {
		Self {
			iat: (now - backdate).unix_timestamp(),
			exp: (now + lifetime).unix_timestamp(),
			iss: app_id.to_string(),
		}
	}
}

/// App identity and private key. Immutable for the life of the process.
///
/// The key only ever signs assertions; it is never sent to the remote host.
#[derive(Clone)]
pub struct SigningIdentity {
	app_id: AppId,
	key: EncodingKey,
}
impl SigningIdentity {
	/// Parses a PKCS#1 or PKCS#8 RSA private key in PEM form.
	pub fn from_rsa_pem(app_id: AppId, pem: &str) -> Result<Self, ConfigError> {
		let key = EncodingKey::from_rsa_pem(pem.as_bytes())
			.map_err(|source| ConfigError::InvalidSigningKey { source })?;

		Ok(Self { app_id, key })
	}

	/// Returns the app identifier.
	pub fn app_id(&self) -> &AppId {
		&self.app_id
	}

	/// Signs the claims with RS256.
	pub fn sign(&self, claims: &AssertionClaims) -> Result<String, AuthExchangeError> {
		jsonwebtoken::encode(&Header::new(Algorithm::RS256), claims, &self.key)
			.map_err(|source| AuthExchangeError::Assertion { source })
	}
}
impl Debug for SigningIdentity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SigningIdentity")
			.field("app_id", &self.app_id)
			.field("key", &"<redacted>")
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use jsonwebtoken::{DecodingKey, Validation};
	use time::macros;
	// self
	use super::*;

	const PRIVATE_KEY: &str = include_str!("../../tests/fixtures/app-key.pem");
	const PUBLIC_KEY: &str = include_str!("../../tests/fixtures/app-key.pub.pem");

	#[test]
	fn claims_are_backdated_and_short_lived() {
		let app_id = AppId::new("4242").expect("App id fixture should be valid.");
		let now = macros::datetime!(2025-01-01 12:00 UTC);
		let claims =
			AssertionClaims::new(&app_id, now, Duration::seconds(60), Duration::seconds(600));

		assert_eq!(claims.iat, now.unix_timestamp() - 60);
		assert_eq!(claims.exp, now.unix_timestamp() + 600);
		assert_eq!(claims.iss, "4242");
	}

	#[test]
	fn signed_assertion_verifies_with_public_key() {
		let app_id = AppId::new("4242").expect("App id fixture should be valid.");
		let identity = SigningIdentity::from_rsa_pem(app_id.clone(), PRIVATE_KEY)
			.expect("Fixture key should parse.");
		let claims = AssertionClaims::new(
			&app_id,
			OffsetDateTime::now_utc(),
			Duration::seconds(60),
			Duration::seconds(600),
		);
		let jwt = identity.sign(&claims).expect("Signing should succeed.");
		let key = DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes())
			.expect("Fixture public key should parse.");
		let decoded = jsonwebtoken::decode::<AssertionClaims>(
			&jwt,
			&key,
			&Validation::new(Algorithm::RS256),
		)
		.expect("Assertion should verify.");

		assert_eq!(decoded.header.alg, Algorithm::RS256);
		assert_eq!(decoded.claims, claims);
	}

	#[test]
	fn garbage_keys_are_rejected_and_debug_redacts() {
		let app_id = AppId::new("1").expect("App id fixture should be valid.");

		assert!(matches!(
			SigningIdentity::from_rsa_pem(app_id.clone(), "not a key"),
			Err(ConfigError::InvalidSigningKey { .. })
		));

		let identity =
			SigningIdentity::from_rsa_pem(app_id, PRIVATE_KEY).expect("Fixture key should parse.");

		assert!(format!("{identity:?}").contains("<redacted>"));
	}
}
