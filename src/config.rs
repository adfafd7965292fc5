//! Environment-driven settings and the constructors that turn them into clients.
//!
//! [`Settings::from_env`] loads an optional `.env` file first, then reads process variables.
//! [`Settings::from_lookup`] runs the same parsing over any lookup function.

// self
use crate::{
	_prelude::*,
	auth::{AppId, SigningIdentity, TokenSecret},
	error::ConfigError,
	github::{CredentialBroker, GITHUB_BASE_URL, RepoReader},
	http::ReqwestHttpClient,
	notion::{BlockId, DocumentEditor, NOTION_BASE_URL, NotionClient},
};

/// Default per-request timeout, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Process configuration for both halves of the crate.
#[derive(Clone, Debug)]
pub struct Settings {
	/// Notion integration secret.
	pub notion_api_key: TokenSecret,
	/// Database new pages are created in, when configured.
	pub notion_database_id: Option<BlockId>,
	/// GitHub App identifier.
	pub github_app_id: AppId,
	/// GitHub App private key in PEM form.
	pub github_private_key: TokenSecret,
	/// Notion API root.
	pub notion_base_url: Url,
	/// GitHub API root.
	pub github_base_url: Url,
	/// Uniform request timeout.
	pub http_timeout: std::time::Duration,
	/// Verbose diagnostics requested.
	pub debug: bool,
	/// Deployment label (`development` by default).
	pub environment: String,
}
impl Settings {
	/// Reads settings from `.env` (if present) and the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		dotenvy::dotenv().ok();

		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Reads settings through `lookup`. Empty values count as unset.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |name: &'static str| lookup(name).filter(|value| !value.trim().is_empty());
		let require = |name: &'static str| get(name).ok_or(ConfigError::MissingVar { name });
		let invalid = |name: &'static str, reason: String| ConfigError::InvalidVar { name, reason };
		let notion_database_id = get("NOTION_DATABASE_ID")
			.map(|raw| BlockId::parse(raw).map_err(|e| invalid("NOTION_DATABASE_ID", e.to_string())))
			.transpose()?;
		let github_app_id = AppId::new(require("GITHUB_APP_ID")?.trim())
			.map_err(|e| invalid("GITHUB_APP_ID", e.to_string()))?;
		let github_private_key =
			TokenSecret::new(require("GITHUB_PRIVATE_KEY")?.replace("\\n", "\n"));
		let parse_url = |name: &'static str, default: &str| {
			let raw = get(name).unwrap_or_else(|| default.to_owned());

			Url::parse(raw.trim()).map_err(|e| invalid(name, e.to_string()))
		};
		let http_timeout = match get("HTTP_TIMEOUT_SECS") {
			Some(raw) => match raw.trim().parse::<u64>() {
				Ok(secs) if secs > 0 => secs,
				_ => return Err(invalid("HTTP_TIMEOUT_SECS", format!("`{raw}` is not a positive integer"))),
			},
			None => DEFAULT_HTTP_TIMEOUT_SECS,
		};

		Ok(Self {
			notion_api_key: TokenSecret::new(require("NOTION_API_KEY")?),
			notion_database_id,
			github_app_id,
			github_private_key,
			notion_base_url: parse_url("NOTION_BASE_URL", NOTION_BASE_URL)?,
			github_base_url: parse_url("GITHUB_BASE_URL", GITHUB_BASE_URL)?,
			http_timeout: std::time::Duration::from_secs(http_timeout),
			debug: get("DEBUG").is_some_and(|raw| {
				matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
			}),
			environment: get("ENVIRONMENT").unwrap_or_else(|| "development".into()),
		})
	}

	/// Builds the shared HTTP client with the configured timeout.
	pub fn http_client(&self) -> Result<ReqwestHttpClient, ConfigError> {
		ReqwestHttpClient::with_timeout(self.http_timeout)
	}

	/// Parses the app private key.
	pub fn signing_identity(&self) -> Result<SigningIdentity, ConfigError> {
		SigningIdentity::from_rsa_pem(self.github_app_id.clone(), self.github_private_key.expose())
	}

	/// Builds a credential broker with default token policy and an in-memory cache.
	pub fn credential_broker(&self, http: ReqwestHttpClient) -> Result<CredentialBroker, ConfigError> {
		Ok(CredentialBroker::new(http, self.signing_identity()?)
			.with_base_url(self.github_base_url.clone()))
	}

	/// Builds a repository reader on a fresh broker.
	pub fn repo_reader(&self, http: ReqwestHttpClient) -> Result<RepoReader, ConfigError> {
		Ok(RepoReader::new(self.credential_broker(http)?))
	}

	/// Builds the Notion transport.
	pub fn notion_client(&self, http: ReqwestHttpClient) -> NotionClient {
		NotionClient::new(http, self.notion_api_key.expose())
			.with_base_url(self.notion_base_url.clone())
	}

	/// Builds a document editor with the default anchor policy.
	pub fn document_editor(&self, http: ReqwestHttpClient) -> DocumentEditor {
		DocumentEditor::new(self.notion_client(http))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const PRIVATE_KEY: &str = include_str!("../tests/fixtures/app-key.pem");

	fn lookup<'a>(vars: &'a [(&'static str, String)]) -> impl Fn(&str) -> Option<String> + 'a {
		move |name| vars.iter().find(|(key, _)| *key == name).map(|(_, value)| value.clone())
	}

	fn base_vars() -> Vec<(&'static str, String)> {
		vec![
			("NOTION_API_KEY", "secret_abc".into()),
			("GITHUB_APP_ID", "4242".into()),
			("GITHUB_PRIVATE_KEY", PRIVATE_KEY.replace('\n', "\\n")),
		]
	}

	#[test]
	fn defaults_apply_and_escaped_keys_are_expanded() {
		let vars = base_vars();
		let settings = Settings::from_lookup(lookup(&vars)).expect("Settings should load.");

		assert_eq!(settings.notion_base_url.as_str(), "https://api.notion.com/v1");
		assert_eq!(settings.github_base_url.as_str(), "https://api.github.com/");
		assert_eq!(settings.http_timeout, std::time::Duration::from_secs(30));
		assert_eq!(settings.environment, "development");
		assert!(!settings.debug);
		assert!(settings.notion_database_id.is_none());
		assert!(settings.signing_identity().is_ok());
		assert!(!format!("{settings:?}").contains("secret_abc"));
	}

	#[test]
	fn missing_and_invalid_values_are_reported_by_name() {
		let vars = vec![("GITHUB_APP_ID", "4242".into()), ("GITHUB_PRIVATE_KEY", "pem".into())];
		let err = Settings::from_lookup(lookup(&vars)).expect_err("API key is required.");

		assert!(matches!(err, ConfigError::MissingVar { name: "NOTION_API_KEY" }));

		let mut vars = base_vars();

		vars.push(("NOTION_DATABASE_ID", "TO_FILL".into()));

		let err = Settings::from_lookup(lookup(&vars)).expect_err("Placeholders must be rejected.");

		assert!(matches!(err, ConfigError::InvalidVar { name: "NOTION_DATABASE_ID", .. }));

		let mut vars = base_vars();

		vars.push(("HTTP_TIMEOUT_SECS", "0".into()));

		let err = Settings::from_lookup(lookup(&vars)).expect_err("Zero timeout must be rejected.");

		assert!(matches!(err, ConfigError::InvalidVar { name: "HTTP_TIMEOUT_SECS", .. }));
	}

	#[test]
	fn overrides_are_parsed() {
		let mut vars = base_vars();

		vars.extend([
			("NOTION_DATABASE_ID", "Docs-2d322f89689b8005a4e8c224ae074ddd".into()),
			("NOTION_BASE_URL", "http://127.0.0.1:8080/v1".into()),
			("HTTP_TIMEOUT_SECS", "5".into()),
			("DEBUG", "Yes".into()),
			("ENVIRONMENT", "production".into()),
		]);

		let settings = Settings::from_lookup(lookup(&vars)).expect("Settings should load.");

		assert_eq!(
			settings.notion_database_id.as_deref(),
			Some("2d322f89-689b-8005-a4e8-c224ae074ddd")
		);
		assert_eq!(settings.notion_client(ReqwestHttpClient::default()).base_url().as_str(), "http://127.0.0.1:8080/v1");
		assert_eq!(settings.http_timeout, std::time::Duration::from_secs(5));
		assert!(settings.debug);
		assert_eq!(settings.environment, "production");
	}
}
