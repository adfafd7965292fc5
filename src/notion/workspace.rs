//! Workspace-level reads and page creation.

// crates.io
use reqwest::Method;
use serde::{Deserializer, de::Error as _};
// self
use crate::{
	_prelude::*,
	error::WriteOperation,
	notion::{BlockId, MAX_CHILDREN_PER_REQUEST, NotionClient, flatten_rich_text},
	obs::{self, OperationKind},
};

/// Page returned by a search or database query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageSummary {
	/// Page identifier.
	pub id: BlockId,
	/// Plain-text title (`Untitled` when empty).
	pub title: String,
	/// Public URL, when the host reported one.
	pub url: Option<String>,
	/// Creation timestamp as reported by the host.
	pub created_time: Option<String>,
}

/// Database visible to the integration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DatabaseSummary {
	/// Database identifier.
	pub id: BlockId,
	/// Plain-text title (`Untitled` when empty).
	pub title: String,
	/// Public URL, when the host reported one.
	pub url: Option<String>,
}

/// Page created by [`NotionClient::create_page`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CreatedPage {
	/// New page identifier.
	pub id: BlockId,
	/// Public URL, when the host reported one.
	pub url: Option<String>,
	/// Title the page was created with.
	pub title: String,
}

const UNTITLED: &str = "Untitled";

#[derive(Deserialize)]
struct RawObject {
	id: BlockId,
	#[serde(default)]
	url: Option<String>,
	#[serde(default)]
	created_time: Option<String>,
	#[serde(default)]
	title: Option<Value>,
	#[serde(default)]
	properties: serde_json::Map<String, Value>,
}
impl RawObject {
	// Databases carry `title` at the top level; pages carry it in their title-typed property.
	fn title(&self) -> String {
		let text = match &self.title {
			Some(runs) => flatten_rich_text(runs),
			None => self
				.properties
				.values()
				.find(|property| property.get("type").and_then(Value::as_str) == Some("title"))
				.and_then(|property| property.get("title"))
				.map(flatten_rich_text)
				.unwrap_or_default(),
		};

		if text.is_empty() { UNTITLED.to_owned() } else { text }
	}

	fn into_page(self) -> PageSummary {
		PageSummary { title: self.title(), id: self.id, url: self.url, created_time: self.created_time }
	}

	fn into_database(self) -> DatabaseSummary {
		DatabaseSummary { title: self.title(), id: self.id, url: self.url }
	}
}

#[derive(Deserialize)]
struct ObjectList {
	results: Vec<RawObject>,
}

fn title_property<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	struct Property {
		#[serde(rename = "type")]
		kind: String,
	}

	BTreeMap::<String, Property>::deserialize(deserializer)?
		.into_iter()
		.find(|(_, property)| property.kind == "title")
		.map(|(key, _)| key)
		.ok_or_else(|| D::Error::missing_field("title property"))
}

impl NotionClient {
	/// Creates an empty page in `database`, titled `title`.
	///
	/// The database schema is read first to find the name of its title property, which
	/// differs between databases (`Name`, `Title`, ...).
	pub async fn create_page(&self, database: impl AsRef<str>, title: &str) -> Result<CreatedPage> {
		obs::observe(OperationKind::CreatePage, "create_page", async {
			#[derive(Deserialize)]
			struct Schema {
				#[serde(rename = "properties", deserialize_with = "title_property")]
				title_key: String,
			}
			#[derive(Deserialize)]
			struct Created {
				id: BlockId,
				#[serde(default)]
				url: Option<String>,
			}

			let database = BlockId::parse(database)?;
			let Schema { title_key } = self
				.read(
					self.request(Method::GET, &format!("databases/{database}")),
					&database,
					"retrieve_database",
				)
				.await?;

			obs::record_operation_step(OperationKind::CreatePage, "title_property", &title_key);

			let mut properties = serde_json::Map::new();

			properties.insert(title_key, json!({ "title": [{ "text": { "content": title } }] }));

			let body = json!({ "parent": { "database_id": database }, "properties": properties });
			let response = self
				.write(self.request(Method::POST, "pages").json(&body), WriteOperation::CreatePage, &database)
				.await?;
			let created = response.decode::<Created>("create_page")?;

			Ok(CreatedPage { id: created.id, url: created.url, title: title.to_owned() })
		})
		.await
	}

	/// Returns the first page whose title equals `title` exactly, if any.
	pub async fn search_page_by_title(&self, title: &str) -> Result<Option<PageSummary>> {
		obs::observe(OperationKind::WorkspaceRead, "search_page_by_title", async {
			let body = json!({
				"query": title,
				"filter": { "property": "object", "value": "page" },
				"page_size": MAX_CHILDREN_PER_REQUEST,
			});
			let found = self
				.read::<ObjectList>(self.request(Method::POST, "search").json(&body), "search", "search_pages")
				.await?;

			Ok(found.results.into_iter().map(RawObject::into_page).find(|page| page.title == title))
		})
		.await
	}

	/// Lists databases shared with the integration (first page of results).
	pub async fn list_databases(&self) -> Result<Vec<DatabaseSummary>> {
		obs::observe(OperationKind::WorkspaceRead, "list_databases", async {
			let body = json!({
				"filter": { "property": "object", "value": "database" },
				"page_size": MAX_CHILDREN_PER_REQUEST,
			});
			let found = self
				.read::<ObjectList>(
					self.request(Method::POST, "search").json(&body),
					"search",
					"search_databases",
				)
				.await?;

			Ok(found.results.into_iter().map(RawObject::into_database).collect())
		})
		.await
	}

	/// Lists up to `page_size` pages of `database`, newest first.
	pub async fn query_database(
		&self,
		database: impl AsRef<str>,
		page_size: usize,
	) -> Result<Vec<PageSummary>> {
		obs::observe(OperationKind::WorkspaceRead, "query_database", async {
			let database = BlockId::parse(database)?;
			let body = json!({
				"page_size": page_size.clamp(1, MAX_CHILDREN_PER_REQUEST),
				"sorts": [{ "timestamp": "created_time", "direction": "descending" }],
			});
			let found = self
				.read::<ObjectList>(
					self.request(Method::POST, &format!("databases/{database}/query")).json(&body),
					&database,
					"query_database",
				)
				.await?;

			Ok(found.results.into_iter().map(RawObject::into_page).collect())
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn titles_come_from_database_title_or_page_title_property() {
		let database: RawObject = serde_json::from_value(json!({
			"object": "database",
			"id": "2d322f89689b8005a4e8c224ae074ddd",
			"title": [{ "type": "text", "text": { "content": "Docs" }, "plain_text": "Docs" }],
			"properties": { "Name": { "type": "title", "title": {} } },
		}))
		.expect("Database object should parse.");

		assert_eq!(database.into_database().title, "Docs");

		let page: RawObject = serde_json::from_value(json!({
			"object": "page",
			"id": "2d322f89-689b-8005-a4e8-c224ae074dde",
			"url": "https://www.notion.so/ReadMe-2d322f89689b8005a4e8c224ae074dde",
			"properties": {
				"Status": { "type": "select", "select": null },
				"Name": { "type": "title", "title": [{ "plain_text": "ReadMe" }] },
			},
		}))
		.expect("Page object should parse.");
		let page = page.into_page();

		assert_eq!(page.title, "ReadMe");
		assert_eq!(&*page.id, "2d322f89-689b-8005-a4e8-c224ae074dde");

		let untitled: RawObject = serde_json::from_value(json!({
			"id": "2d322f89689b8005a4e8c224ae074ddf",
			"title": [],
		}))
		.expect("Untitled database should parse.");

		assert_eq!(untitled.into_database().title, UNTITLED);
	}
}
