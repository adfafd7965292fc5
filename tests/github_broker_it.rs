mod common;

// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::Duration;
// self
use common::*;
use docdelta::{
	clock::ManualClock,
	error::{AuthExchangeError, Error, ExchangeStep},
	github::RepoReader,
};

#[tokio::test]
async fn cached_token_is_reused_within_safety_margin() {
	let server = MockServer::start_async().await;
	let clock = ManualClock::new(T0);
	let installation = mock_installation(&server).await;
	let mint = mock_mint(
		&server,
		json!({ "token": "ghs_first", "expires_at": "2030-01-01T01:00:00Z" }),
	)
	.await;
	let broker = broker(&server, &clock);
	let first = broker.get_token(&repo()).await.expect("First exchange should succeed.");

	clock.advance(Duration::minutes(50));

	let second = broker.get_token(&repo()).await.expect("Cached token should be returned.");

	assert_eq!(first.token.expose(), "ghs_first");
	assert_eq!(first.token.expose(), second.token.expose());
	assert_eq!(second.expires_at, time::macros::datetime!(2030-01-01 01:00 UTC));

	installation.assert_calls_async(1).await;
	mint.assert_calls_async(1).await;
}

#[tokio::test]
async fn token_is_reminted_once_inside_safety_margin() {
	let server = MockServer::start_async().await;
	let clock = ManualClock::new(T0);
	let installation = mock_installation(&server).await;
	let mint = mock_mint(&server, json!({ "token": "ghs_rotating" })).await;
	let broker = broker(&server, &clock);
	let first = broker.get_token(&repo()).await.expect("First exchange should succeed.");

	assert_eq!(first.expires_at, T0 + Duration::hours(1));

	clock.advance(Duration::minutes(56));

	let second = broker.get_token(&repo()).await.expect("Renewal should succeed.");

	assert_eq!(second.issued_at, T0 + Duration::minutes(56));
	assert_eq!(second.expires_at, T0 + Duration::minutes(116));

	installation.assert_calls_async(2).await;
	mint.assert_calls_async(2).await;
}

#[tokio::test]
async fn concurrent_callers_share_one_exchange() {
	let server = MockServer::start_async().await;
	let clock = ManualClock::new(T0);
	let _installation = mock_installation(&server).await;
	let mint = mock_mint(&server, json!({ "token": "ghs_shared" })).await;
	let broker = broker(&server, &clock);
	let other = broker.clone();
	let repo = repo();
	let (first, second) = tokio::join!(broker.get_token(&repo), other.get_token(&repo));

	assert_eq!(
		first.expect("First caller should succeed.").token.expose(),
		second.expect("Second caller should succeed.").token.expose()
	);

	mint.assert_calls_async(1).await;
}

#[tokio::test]
async fn rejected_installation_lookup_surfaces_remote_body() {
	let server = MockServer::start_async().await;
	let clock = ManualClock::new(T0);
	let _installation = server
		.mock_async(|when, then| {
			when.method(GET).path("/repos/hack-ink/docdelta/installation");
			then.status(404).body("{\"message\":\"Not Found\"}");
		})
		.await;
	let mint = mock_mint(&server, json!({ "token": "never" })).await;
	let err = broker(&server, &clock)
		.get_token(&repo())
		.await
		.expect_err("Missing installations should fail.");

	match err {
		Error::AuthExchange(AuthExchangeError::Rejected { step, status, body }) => {
			assert_eq!(step, ExchangeStep::InstallationLookup);
			assert_eq!(status, 404);
			assert!(body.contains("Not Found"));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	mint.assert_calls_async(0).await;
}

#[tokio::test]
async fn rejected_mint_is_not_cached() {
	let server = MockServer::start_async().await;
	let clock = ManualClock::new(T0);
	let installation = mock_installation(&server).await;
	let _mint = server
		.mock_async(|when, then| {
			when.method(POST).path("/app/installations/77/access_tokens");
			then.status(401).body("{\"message\":\"A JSON web token could not be decoded\"}");
		})
		.await;
	let broker = broker(&server, &clock);

	for _ in 0..2 {
		let err = broker.get_token(&repo()).await.expect_err("Mint rejection should surface.");

		assert!(
			matches!(
				err,
				Error::AuthExchange(AuthExchangeError::Rejected { step: ExchangeStep::TokenMint, status: 401, .. })
			),
			"{err:?}"
		);
	}

	installation.assert_calls_async(2).await;
}

#[tokio::test]
async fn authenticated_headers_carry_installation_token() {
	let server = MockServer::start_async().await;
	let clock = ManualClock::new(T0);
	let _installation = mock_installation(&server).await;
	let _mint = mock_mint(&server, json!({ "token": "ghs_headers" })).await;
	let headers = broker(&server, &clock)
		.authenticated_headers(&repo())
		.await
		.expect("Headers should be produced.");

	assert_eq!(headers["authorization"], "Bearer ghs_headers");
	assert_eq!(headers["accept"], "application/vnd.github+json");
	assert_eq!(headers["x-github-api-version"], "2022-11-28");
	assert!(headers["user-agent"].to_str().expect("User agent should be ASCII.").starts_with("docdelta/"));
}

#[tokio::test]
async fn repo_reader_decodes_files_and_walks_directories() {
	let server = MockServer::start_async().await;
	let clock = ManualClock::new(T0);
	let _installation = mock_installation(&server).await;
	let mint = mock_mint(&server, json!({ "token": "ghs_reader" })).await;
	let readme = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/repos/hack-ink/docdelta/contents/README.md")
				.query_param("ref", "main")
				.header("authorization", "Bearer ghs_reader");
			then.status(200).json_body(json!({
				"type": "file",
				"path": "README.md",
				"sha": "abc",
				"size": 12,
				"encoding": "base64",
				"content": "aGVsbG8s\nIHdvcmxk\n",
			}));
		})
		.await;
	let _root = server
		.mock_async(|when, then| {
			when.method(GET).path("/repos/hack-ink/docdelta/contents").query_param("ref", "main");
			then.status(200).json_body(json!([
				{ "name": "src", "path": "src", "type": "dir", "sha": "t1" },
				{ "name": "README.md", "path": "README.md", "type": "file", "size": 12, "sha": "abc" },
			]));
		})
		.await;
	let _src = server
		.mock_async(|when, then| {
			when.method(GET).path("/repos/hack-ink/docdelta/contents/src").query_param("ref", "main");
			then.status(200).json_body(json!([
				{ "name": "lib.rs", "path": "src/lib.rs", "type": "file", "size": 40, "sha": "def" },
			]));
		})
		.await;
	let reader = RepoReader::new(broker(&server, &clock));
	let file = reader.read_file(&repo(), "README.md", "main").await.expect("File should decode.");

	assert_eq!(file.content, "hello, world");

	let files = reader
		.list_files_recursive(&repo(), "main", "")
		.await
		.expect("Recursive listing should succeed.");
	let paths = files.iter().map(|file| file.path.as_str()).collect::<Vec<_>>();

	assert_eq!(paths, vec!["README.md", "src/lib.rs"]);

	readme.assert_calls_async(1).await;
	mint.assert_calls_async(1).await;
}

#[tokio::test]
async fn repo_reader_rejects_binary_files_and_maps_read_failures() {
	let server = MockServer::start_async().await;
	let clock = ManualClock::new(T0);
	let _installation = mock_installation(&server).await;
	let _mint = mock_mint(&server, json!({ "token": "ghs_reader" })).await;
	let _logo = server
		.mock_async(|when, then| {
			when.method(GET).path("/repos/hack-ink/docdelta/contents/logo.png");
			then.status(200).json_body(json!({
				"path": "logo.png",
				"sha": "png",
				"size": 4,
				"content": "/w==",
			}));
		})
		.await;
	let _missing = server
		.mock_async(|when, then| {
			when.method(GET).path("/repos/hack-ink/docdelta/commits/deadbeef");
			then.status(422).body("{\"message\":\"No commit found\"}");
		})
		.await;
	let reader = RepoReader::new(broker(&server, &clock));
	let err = reader
		.read_file(&repo(), "logo.png", "main")
		.await
		.expect_err("Non-UTF-8 content should be rejected.");

	assert!(matches!(err, Error::BinaryContent { ref path } if path == "logo.png"), "{err:?}");

	let err = reader.commit(&repo(), "deadbeef").await.expect_err("Unknown commits should fail.");

	assert!(matches!(err, Error::RemoteRead { status: 422, .. }), "{err:?}");
}

#[tokio::test]
async fn repo_reader_compares_refs() {
	let server = MockServer::start_async().await;
	let clock = ManualClock::new(T0);
	let _installation = mock_installation(&server).await;
	let _mint = mock_mint(&server, json!({ "token": "ghs_reader" })).await;
	let _compare = server
		.mock_async(|when, then| {
			when.method(GET).path("/repos/hack-ink/docdelta/compare/main...feature");
			then.status(200).json_body(json!({
				"total_commits": 2,
				"ahead_by": 2,
				"behind_by": 0,
				"html_url": "https://github.com/hack-ink/docdelta/compare/main...feature",
				"files": [
					{ "filename": "src/lib.rs", "status": "modified", "additions": 3, "deletions": 1, "changes": 4, "patch": "@@" },
				],
			}));
		})
		.await;
	let comparison = RepoReader::new(broker(&server, &clock))
		.compare(&repo(), "main", "feature")
		.await
		.expect("Comparison should decode.");

	assert_eq!(comparison.ahead_by, 2);
	assert_eq!(comparison.files[0].filename, "src/lib.rs");
	assert_eq!(comparison.files[0].patch.as_deref(), Some("@@"));
}
