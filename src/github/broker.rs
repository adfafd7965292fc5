//! Installation token exchange with a single cached token and a singleflight guard.
//!
//! The exchange is two requests: look up the app installation covering the repository, then
//! mint an installation token with a freshly signed assertion. The token is reused until it
//! enters the configured safety margin before expiry. Concurrent callers wait on one guard so
//! only one of them performs the exchange; the rest reuse its result.

// crates.io
use reqwest::{
	Method, RequestBuilder,
	header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue, USER_AGENT},
};
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, AssertionClaims, RepositoryName, SigningIdentity},
	clock::{Clock, SystemClock},
	error::{AuthExchangeError, ConfigError, ExchangeStep},
	http::{self, ReqwestHttpClient, endpoint},
	obs::{self, OperationKind},
	store::{MemoryTokenCache, TokenCache},
};

/// Default API root.
pub const GITHUB_BASE_URL: &str = "https://api.github.com";
/// REST API version pinned on every request.
pub const GITHUB_API_VERSION: &str = "2022-11-28";
/// Media type requested on every request.
pub const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

const GITHUB_API_VERSION_HEADER: &str = "x-github-api-version";

/// Timing rules for assertions and cached tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenPolicy {
	/// How far `iat` is back-dated to absorb clock drift.
	pub assertion_backdate: Duration,
	/// Assertion validity from now.
	pub assertion_lifetime: Duration,
	/// Lifetime assumed when the mint response carries no expiry.
	pub assumed_token_lifetime: Duration,
	/// Window before expiry in which a cached token is no longer handed out.
	pub safety_margin: Duration,
}
impl TokenPolicy {
	/// Checks that the margin is positive and shorter than the assumed lifetime.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if !self.safety_margin.is_positive() {
			return Err(ConfigError::NonPositiveSafetyMargin);
		}
		if self.assumed_token_lifetime <= self.safety_margin {
			return Err(ConfigError::LifetimeWithinSafetyMargin);
		}

		Ok(())
	}
}
impl Default for TokenPolicy {
	fn default() -> Self {
		Self {
			assertion_backdate: Duration::seconds(60),
			assertion_lifetime: Duration::minutes(10),
			assumed_token_lifetime: Duration::hours(1),
			safety_margin: Duration::minutes(5),
		}
	}
}

/// Mints and caches installation tokens for one GitHub App.
///
/// Clones share the cache and the exchange guard. One cached token serves every repository,
/// so a broker must only be used with repositories covered by the same installation.
#[derive(Clone)]
pub struct CredentialBroker {
	http: ReqwestHttpClient,
	base_url: Url,
	identity: SigningIdentity,
	policy: TokenPolicy,
	cache: Arc<dyn TokenCache>,
	clock: Arc<dyn Clock>,
	exchange_guard: Arc<AsyncMutex<()>>,
}
impl CredentialBroker {
	/// Creates a broker against [`GITHUB_BASE_URL`] with an in-memory cache and the system clock.
	pub fn new(http: ReqwestHttpClient, identity: SigningIdentity) -> Self {
		let base_url = Url::parse(GITHUB_BASE_URL).expect("Default base URL should parse.");

		Self {
			http,
			base_url,
			identity,
			policy: TokenPolicy::default(),
			cache: Arc::new(MemoryTokenCache::default()),
			clock: Arc::new(SystemClock),
			exchange_guard: Arc::new(AsyncMutex::new(())),
		}
	}

	/// Points the broker at a different API root (GitHub Enterprise, mock servers).
	pub fn with_base_url(mut self, base_url: Url) -> Self {
		self.base_url = base_url;

		self
	}

	/// Overrides the timing policy after validating it.
	pub fn with_policy(mut self, policy: TokenPolicy) -> Result<Self, ConfigError> {
		policy.validate()?;

		self.policy = policy;

		Ok(self)
	}

	/// Replaces the token cache.
	pub fn with_cache(mut self, cache: Arc<dyn TokenCache>) -> Self {
		self.cache = cache;

		self
	}

	/// Replaces the clock used for freshness decisions.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Returns the active timing policy.
	pub fn policy(&self) -> &TokenPolicy {
		&self.policy
	}

	/// Returns an installation token, reusing the cached one while it is fresh.
	///
	/// Exchange failures are returned as [`Error::AuthExchange`] with the remote body and are
	/// never retried here.
	pub async fn get_token(&self, repo: &RepositoryName) -> Result<AccessToken> {
		obs::observe(OperationKind::TokenExchange, "get_token", async {
			let _singleflight = self.exchange_guard.lock().await;
			let now = self.clock.now();

			if let Some(token) =
				self.cache.load().filter(|token| token.is_reusable_at(now, self.policy.safety_margin))
			{
				obs::record_operation_step(OperationKind::TokenExchange, "cache_hit", repo);

				return Ok(token);
			}

			let token = self.exchange(repo, now).await?;

			self.cache.store(token.clone());

			Ok(token)
		})
		.await
	}

	/// Returns headers for an authenticated repository request.
	pub async fn authenticated_headers(&self, repo: &RepositoryName) -> Result<HeaderMap> {
		let token = self.get_token(repo).await?;
		let mut authorization = HeaderValue::from_str(&token.bearer()).map_err(ConfigError::from)?;

		authorization.set_sensitive(true);

		let mut headers = HeaderMap::new();

		headers.insert(AUTHORIZATION, authorization);
		headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
		headers.insert(
			HeaderName::from_static(GITHUB_API_VERSION_HEADER),
			HeaderValue::from_static(GITHUB_API_VERSION),
		);
		headers.insert(USER_AGENT, HeaderValue::from_static(http::USER_AGENT));

		Ok(headers)
	}

	pub(crate) fn http(&self) -> &ReqwestHttpClient {
		&self.http
	}

	pub(crate) fn url(&self, path: &str) -> String {
		endpoint(&self.base_url, path)
	}

	async fn exchange(&self, repo: &RepositoryName, now: OffsetDateTime) -> Result<AccessToken> {
		#[derive(Deserialize)]
		struct Installation {
			id: u64,
		}
		#[derive(Deserialize)]
		struct MintedToken {
			token: String,
			#[serde(default)]
			expires_at: Option<String>,
		}

		let claims = AssertionClaims::new(
			self.identity.app_id(),
			now,
			self.policy.assertion_backdate,
			self.policy.assertion_lifetime,
		);
		let assertion = self.identity.sign(&claims)?;
		let installation = self
			.app_request(Method::GET, &format!("repos/{repo}/installation"), &assertion)
			.await
			.and_then(|response| check_step(ExchangeStep::InstallationLookup, response))?
			.decode::<Installation>(ExchangeStep::InstallationLookup.as_str())?;

		obs::record_operation_step(OperationKind::TokenExchange, "installation", &installation.id);

		let minted = self
			.app_request(
				Method::POST,
				&format!("app/installations/{}/access_tokens", installation.id),
				&assertion,
			)
			.await
			.and_then(|response| check_step(ExchangeStep::TokenMint, response))?
			.decode::<MintedToken>(ExchangeStep::TokenMint.as_str())?;
		let expires_at = minted
			.expires_at
			.as_deref()
			.and_then(|raw| OffsetDateTime::parse(raw, &Rfc3339).ok())
			.unwrap_or(now + self.policy.assumed_token_lifetime);

		Ok(AccessToken::new(minted.token, now, expires_at))
	}

	async fn app_request(
		&self,
		method: Method,
		path: &str,
		assertion: &str,
	) -> Result<http::ApiResponse> {
		let request: RequestBuilder = self
			.http
			.request(method, self.url(path))
			.bearer_auth(assertion)
			.header(ACCEPT, GITHUB_MEDIA_TYPE)
			.header(GITHUB_API_VERSION_HEADER, GITHUB_API_VERSION);

		self.http.execute(request).await
	}
}
impl Debug for CredentialBroker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialBroker")
			.field("base_url", &self.base_url.as_str())
			.field("identity", &self.identity)
			.field("policy", &self.policy)
			.finish_non_exhaustive()
	}
}

fn check_step(step: ExchangeStep, response: http::ApiResponse) -> Result<http::ApiResponse> {
	if response.is_success() {
		return Ok(response);
	}

	Err(AuthExchangeError::Rejected { step, status: response.status(), body: response.body }.into())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::AppId;

	const PRIVATE_KEY: &str = include_str!("../../tests/fixtures/app-key.pem");

	#[test]
	fn default_policy_is_valid() {
		let policy = TokenPolicy::default();

		assert_eq!(policy.safety_margin, Duration::minutes(5));
		assert_eq!(policy.assumed_token_lifetime, Duration::minutes(60));
		assert!(policy.validate().is_ok());
	}

	#[test]
	fn policy_rejects_non_positive_or_oversized_margins() {
		let zero = TokenPolicy { safety_margin: Duration::ZERO, ..Default::default() };
		let oversized = TokenPolicy { safety_margin: Duration::hours(2), ..Default::default() };

		assert!(matches!(zero.validate(), Err(ConfigError::NonPositiveSafetyMargin)));
		assert!(matches!(oversized.validate(), Err(ConfigError::LifetimeWithinSafetyMargin)));

		let identity = SigningIdentity::from_rsa_pem(
			AppId::new("4242").expect("App id fixture should be valid."),
			PRIVATE_KEY,
		)
		.expect("Fixture key should parse.");
		let broker = CredentialBroker::new(ReqwestHttpClient::default(), identity);

		assert!(broker.with_policy(zero).is_err());
	}

	#[test]
	fn debug_output_omits_key_material() {
		let identity = SigningIdentity::from_rsa_pem(
			AppId::new("4242").expect("App id fixture should be valid."),
			PRIVATE_KEY,
		)
		.expect("Fixture key should parse.");
		let rendered = format!("{:?}", CredentialBroker::new(ReqwestHttpClient::default(), identity));

		assert!(rendered.contains("api.github.com"), "{rendered}");
		assert!(!rendered.contains("PRIVATE KEY"), "{rendered}");
	}
}
