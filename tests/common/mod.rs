#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde_json::{Value, json};
use time::{OffsetDateTime, macros};
// self
use docdelta::{
	auth::{AppId, RepositoryName, SigningIdentity},
	clock::ManualClock,
	github::CredentialBroker,
	http::ReqwestHttpClient,
	notion::{DocumentEditor, NotionClient},
	url::Url,
};

pub const DOC: &str = "2d322f89-689b-8005-a4e8-c224ae074ddd";
pub const NOTION_KEY: &str = "secret_integration";
pub const PRIVATE_KEY: &str = include_str!("../fixtures/app-key.pem");
pub const T0: OffsetDateTime = macros::datetime!(2030-01-01 00:00 UTC);

/// Deterministic dashed block id ending in `n`.
pub fn id(n: u16) -> String {
	format!("00000000-0000-0000-0000-{n:012x}")
}

pub fn block(n: u16, kind: &str, text: &str) -> Value {
	json!({
		"object": "block",
		"id": id(n),
		"type": kind,
		"has_children": false,
		kind: {
			"rich_text": [{ "type": "text", "text": { "content": text }, "plain_text": text }],
		},
	})
}

pub fn listing(blocks: Vec<Value>) -> Value {
	json!({ "object": "list", "results": blocks, "has_more": false, "next_cursor": null })
}

pub fn created(ids: &[u16]) -> Value {
	json!({
		"object": "list",
		"results": ids.iter().map(|n| json!({ "object": "block", "id": id(*n) })).collect::<Vec<_>>(),
	})
}

pub fn base_url(server: &MockServer) -> Url {
	Url::parse(&server.base_url()).expect("Mock server URL should parse.")
}

pub fn editor(server: &MockServer) -> DocumentEditor {
	DocumentEditor::new(
		NotionClient::new(ReqwestHttpClient::default(), NOTION_KEY).with_base_url(base_url(server)),
	)
}

pub async fn mock_listing(server: &MockServer, blocks: Vec<Value>) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(GET)
				.path(format!("/blocks/{DOC}/children"))
				.header("authorization", format!("Bearer {NOTION_KEY}"))
				.header("notion-version", "2022-06-28");
			then.status(200).header("content-type", "application/json").json_body(listing(blocks));
		})
		.await
}

pub fn repo() -> RepositoryName {
	RepositoryName::new("hack-ink/docdelta").expect("Repository fixture should be valid.")
}

pub fn broker(server: &MockServer, clock: &ManualClock) -> CredentialBroker {
	let identity = SigningIdentity::from_rsa_pem(
		AppId::new("4242").expect("App id fixture should be valid."),
		PRIVATE_KEY,
	)
	.expect("Fixture key should parse.");

	CredentialBroker::new(ReqwestHttpClient::default(), identity)
		.with_base_url(base_url(server))
		.with_clock(Arc::new(clock.clone()))
}

pub async fn mock_installation(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/repos/hack-ink/docdelta/installation")
				.header("accept", "application/vnd.github+json")
				.header("x-github-api-version", "2022-11-28");
			then.status(200).header("content-type", "application/json").json_body(json!({ "id": 77 }));
		})
		.await
}

pub async fn mock_mint(server: &MockServer, body: Value) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST).path("/app/installations/77/access_tokens");
			then.status(201).header("content-type", "application/json").json_body(body);
		})
		.await
}
