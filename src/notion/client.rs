//! REST transport for the document host.
//!
//! [`NotionClient`] knows the endpoints, headers, pagination, and chunking rules, and maps
//! non-success statuses into the crate error taxonomy. It never re-reads or composes
//! operations; that is the editor's job.

// crates.io
use reqwest::{Method, RequestBuilder};
use serde::{Deserializer, de::Error as _};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{RemoteWriteError, WriteOperation},
	http::{ApiResponse, ReqwestHttpClient, endpoint},
	notion::{Block, BlockId, BlockSpec},
};

/// Default API root.
pub const NOTION_BASE_URL: &str = "https://api.notion.com/v1";
/// API version pinned on every request.
pub const NOTION_VERSION: &str = "2022-06-28";
/// Largest page size and child batch the host accepts.
pub const MAX_CHILDREN_PER_REQUEST: usize = 100;

const NOTION_VERSION_HEADER: &str = "Notion-Version";

/// Authenticated client for the block and page endpoints.
#[derive(Clone, Debug)]
pub struct NotionClient {
	http: ReqwestHttpClient,
	base_url: Url,
	api_key: TokenSecret,
}
impl NotionClient {
	/// Creates a client against [`NOTION_BASE_URL`].
	pub fn new(http: ReqwestHttpClient, api_key: impl Into<String>) -> Self {
		let base_url = Url::parse(NOTION_BASE_URL).expect("Default base URL should parse.");

		Self { http, base_url, api_key: TokenSecret::new(api_key) }
	}

	/// Points the client at a different API root (mock servers, proxies).
	pub fn with_base_url(mut self, base_url: Url) -> Self {
		self.base_url = base_url;

		self
	}

	/// Returns the API root requests are sent to.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Lists every top-level child of `parent`, following pagination to the end.
	///
	/// Any non-success status is reported as [`Error::NotFound`]: the identifier was
	/// well-formed but the host would not return it (unshared page, wrong id, revoked key).
	pub async fn list_children(&self, parent: &BlockId) -> Result<Vec<Block>> {
		#[derive(Deserialize)]
		struct ChildrenPage {
			results: Vec<Block>,
			#[serde(default)]
			has_more: bool,
			#[serde(default)]
			next_cursor: Option<String>,
		}

		let path = format!("blocks/{parent}/children");
		let page_size = MAX_CHILDREN_PER_REQUEST.to_string();
		let mut blocks = Vec::new();
		let mut cursor = None::<String>;

		loop {
			let mut query = vec![("page_size", page_size.as_str())];

			if let Some(cursor) = cursor.as_deref() {
				query.push(("start_cursor", cursor));
			}

			let response = self.http.execute(self.request(Method::GET, &path).query(&query)).await?;

			if !response.is_success() {
				return Err(Error::NotFound {
					resource: parent.to_string(),
					status: response.status(),
					body: response.body,
				});
			}

			let page = response.decode::<ChildrenPage>("list_children")?;

			blocks.extend(page.results);

			match page.next_cursor {
				Some(next) if page.has_more => cursor = Some(next),
				_ => break,
			}
		}

		Ok(blocks)
	}

	/// Creates `blocks` under `parent`, either at the end or as siblings right after `after`.
	///
	/// The `after` field is what makes the new blocks siblings of the anchor; without it the
	/// host appends to the end of `parent`. Batches above [`MAX_CHILDREN_PER_REQUEST`] are
	/// split, and sibling inserts chain each batch after the last block the previous batch
	/// created. Returns the number of blocks sent; an empty slice sends nothing.
	pub async fn append_children(
		&self,
		parent: &BlockId,
		blocks: &[BlockSpec],
		after: Option<&BlockId>,
	) -> Result<usize> {
		#[derive(Deserialize)]
		struct AppendResponse {
			#[serde(deserialize_with = "last_created")]
			results: BlockId,
		}

		let operation = if after.is_some() { WriteOperation::InsertAfter } else { WriteOperation::Append };
		let path = format!("blocks/{parent}/children");
		let mut after = after.cloned();
		let mut chunks = blocks.chunks(MAX_CHILDREN_PER_REQUEST).peekable();

		while let Some(chunk) = chunks.next() {
			let mut body = json!({ "children": chunk });

			if let Some(anchor) = &after {
				body["after"] = json!(anchor);
			}

			let response = self.http.execute(self.request(Method::PATCH, &path).json(&body)).await?;

			if !response.is_success() {
				return Err(write_error(operation, parent, response));
			}
			if after.is_some() && chunks.peek().is_some() {
				after = Some(response.decode::<AppendResponse>("append_children")?.results);
			}
		}

		Ok(blocks.len())
	}

	/// Deletes (archives) a single block.
	pub async fn delete_block(&self, block: &BlockId) -> Result<()> {
		let response =
			self.http.execute(self.request(Method::DELETE, &format!("blocks/{block}"))).await?;

		if !response.is_success() {
			return Err(write_error(WriteOperation::Delete, block, response));
		}

		Ok(())
	}

	/// Builds an authenticated request relative to the API root.
	pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
		self.http
			.request(method, endpoint(&self.base_url, path))
			.bearer_auth(self.api_key.expose())
			.header(NOTION_VERSION_HEADER, NOTION_VERSION)
	}

	/// Sends a read and decodes the body, mapping non-success into [`Error::RemoteRead`].
	pub(crate) async fn read<T>(
		&self,
		request: RequestBuilder,
		resource: &str,
		operation: &'static str,
	) -> Result<T>
	where
		T: serde::de::DeserializeOwned,
	{
		let response = self.http.execute(request).await?;

		if !response.is_success() {
			return Err(Error::RemoteRead {
				resource: resource.to_owned(),
				status: response.status(),
				body: response.body,
				retry_after: response.metadata.retry_after,
			});
		}

		response.decode(operation)
	}

	/// Sends a write and returns the raw response, mapping non-success into
	/// [`RemoteWriteError`].
	pub(crate) async fn write(
		&self,
		request: RequestBuilder,
		operation: WriteOperation,
		target: &BlockId,
	) -> Result<ApiResponse> {
		let response = self.http.execute(request).await?;

		if !response.is_success() {
			return Err(write_error(operation, target, response));
		}

		Ok(response)
	}
}

fn write_error(operation: WriteOperation, target: &BlockId, response: ApiResponse) -> Error {
	RemoteWriteError {
		operation,
		target: target.clone(),
		status: response.metadata.status,
		retry_after: response.metadata.retry_after,
		body: response.body,
	}
	.into()
}

fn last_created<'de, D>(deserializer: D) -> Result<BlockId, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	struct Created {
		id: BlockId,
	}

	Vec::<Created>::deserialize(deserializer)?
		.pop()
		.map(|created| created.id)
		.ok_or_else(|| D::Error::invalid_length(0, &"at least one created block"))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn debug_output_redacts_api_key() {
		let client = NotionClient::new(ReqwestHttpClient::default(), "secret_abc123");
		let rendered = format!("{client:?}");

		assert!(!rendered.contains("secret_abc123"), "{rendered}");
		assert_eq!(client.base_url().as_str(), "https://api.notion.com/v1");
	}

	#[test]
	fn append_response_yields_last_created_block() {
		#[derive(Debug, Deserialize)]
		struct AppendResponse {
			#[serde(deserialize_with = "last_created")]
			results: BlockId,
		}

		let parsed: AppendResponse = serde_json::from_value(json!({
			"object": "list",
			"results": [
				{ "object": "block", "id": "00000000-0000-0000-0000-000000000001" },
				{ "object": "block", "id": "00000000-0000-0000-0000-000000000002" },
			],
		}))
		.expect("Append response should parse.");

		assert_eq!(&*parsed.results, "00000000-0000-0000-0000-000000000002");
		assert!(serde_json::from_value::<AppendResponse>(json!({ "results": [] })).is_err());
	}
}
