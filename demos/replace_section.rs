//! Replaces the body of a document section with new blocks, using a mock document host.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use docdelta::{config::Settings, notion::BlockSpec};

const PRIVATE_KEY: &str = include_str!("../tests/fixtures/app-key.pem");
const DOC: &str = "2d322f89-689b-8005-a4e8-c224ae074ddd";
const HEADING: &str = "00000000-0000-0000-0000-000000000001";
const OLD_BODY: &str = "00000000-0000-0000-0000-000000000002";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let listing = server
		.mock_async(|when, then| {
			when.method(GET).path(format!("/blocks/{DOC}/children"));
			then.status(200).header("content-type", "application/json").body(format!(
				"{{\"results\":[\
					{{\"id\":\"{HEADING}\",\"type\":\"heading_2\",\"heading_2\":{{\"rich_text\":[{{\"plain_text\":\"Usage\"}}]}}}},\
					{{\"id\":\"{OLD_BODY}\",\"type\":\"paragraph\",\"paragraph\":{{\"rich_text\":[{{\"plain_text\":\"Outdated.\"}}]}}}}\
				],\"has_more\":false}}"
			));
		})
		.await;
	let delete = server
		.mock_async(|when, then| {
			when.method(DELETE).path(format!("/blocks/{OLD_BODY}"));
			then.status(200).header("content-type", "application/json").body("{}");
		})
		.await;
	let insert = server
		.mock_async(|when, then| {
			when.method(PATCH).path(format!("/blocks/{DOC}/children"));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"results\":[{\"id\":\"00000000-0000-0000-0000-000000000003\"},{\"id\":\"00000000-0000-0000-0000-000000000004\"}]}");
		})
		.await;
	let settings = Settings::from_lookup(|name| match name {
		"NOTION_API_KEY" => Some("secret_demo".into()),
		"NOTION_BASE_URL" => Some(server.base_url()),
		"GITHUB_APP_ID" => Some("4242".into()),
		"GITHUB_PRIVATE_KEY" => Some(PRIVATE_KEY.into()),
		_ => None,
	})?;
	let editor = settings.document_editor(settings.http_client()?);
	let outcome = editor
		.replace_section(
			DOC,
			"Usage",
			vec![BlockSpec::paragraph("Run the bot on every merge."), BlockSpec::code_in("cargo run", "bash")],
		)
		.await?;

	println!(
		"Replaced `{}`: {} old block(s) removed, {} inserted.",
		outcome.heading_text, outcome.deleted_count, outcome.replaced_count
	);

	listing.assert_async().await;
	delete.assert_async().await;
	insert.assert_async().await;

	Ok(())
}
