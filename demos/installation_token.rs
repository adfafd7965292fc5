//! Mints a GitHub App installation token through the credential broker and shows that a
//! second call inside the validity window is served from the in-memory cache.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use docdelta::{auth::RepositoryName, config::Settings};

const PRIVATE_KEY: &str = include_str!("../tests/fixtures/app-key.pem");

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let installation = server
		.mock_async(|when, then| {
			when.method(GET).path("/repos/hack-ink/docdelta/installation");
			then.status(200).header("content-type", "application/json").body("{\"id\":77}");
		})
		.await;
	let mint = server
		.mock_async(|when, then| {
			when.method(POST).path("/app/installations/77/access_tokens");
			then.status(201)
				.header("content-type", "application/json")
				.body("{\"token\":\"ghs_demo\",\"expires_at\":\"2099-01-01T00:00:00Z\"}");
		})
		.await;
	let settings = Settings::from_lookup(|name| match name {
		"NOTION_API_KEY" => Some("secret_demo".into()),
		"GITHUB_APP_ID" => Some("4242".into()),
		"GITHUB_PRIVATE_KEY" => Some(PRIVATE_KEY.into()),
		"GITHUB_BASE_URL" => Some(server.base_url()),
		_ => None,
	})?;
	let broker = settings.credential_broker(settings.http_client()?)?;
	let repo = RepositoryName::new("hack-ink/docdelta")?;
	let token = broker.get_token(&repo).await?;
	let cached = broker.get_token(&repo).await?;

	println!("Installation token expires at {}.", token.expires_at);
	println!("Second call reused the cached token: {}.", token.token.expose() == cached.token.expose());

	installation.assert_calls_async(1).await;
	mint.assert_calls_async(1).await;

	Ok(())
}
