//! Read-only repository endpoints authenticated through the [`CredentialBroker`].

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{
	Deserializer,
	de::{DeserializeOwned, Error as _},
};
// self
use crate::{
	_prelude::*,
	auth::RepositoryName,
	github::CredentialBroker,
	obs::{self, OperationKind},
};

/// Largest page the search endpoint returns.
pub const MAX_SEARCH_RESULTS: usize = 100;

/// File touched by a commit or comparison.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
	/// Repository path.
	pub filename: String,
	/// `added`, `modified`, `removed`, `renamed`, ...
	pub status: String,
	/// Added lines.
	#[serde(default)]
	pub additions: u64,
	/// Removed lines.
	#[serde(default)]
	pub deletions: u64,
	/// Total changed lines.
	#[serde(default)]
	pub changes: u64,
	/// Unified diff, absent for binary or oversized files.
	#[serde(default)]
	pub patch: Option<String>,
}

/// Difference between two refs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
	/// Commits between base and head.
	pub total_commits: u64,
	/// Commits head has that base lacks.
	pub ahead_by: u64,
	/// Commits base has that head lacks.
	pub behind_by: u64,
	/// Browser URL of the comparison.
	pub html_url: String,
	/// Files changed between the refs.
	#[serde(default)]
	pub files: Vec<ChangedFile>,
}

/// Directory listing entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
	/// File or directory name.
	pub name: String,
	/// Repository path.
	pub path: String,
	/// `file`, `dir`, `symlink`, or `submodule`.
	#[serde(rename = "type")]
	pub kind: String,
	/// Size in bytes (0 for directories).
	#[serde(default)]
	pub size: u64,
	/// Blob or tree SHA.
	pub sha: String,
}
impl ContentEntry {
	/// Returns `true` for directories.
	pub fn is_dir(&self) -> bool {
		self.kind == "dir"
	}

	/// Returns `true` for regular files.
	pub fn is_file(&self) -> bool {
		self.kind == "file"
	}
}

/// Decoded text file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileContent {
	/// Repository path.
	pub path: String,
	/// Blob SHA.
	pub sha: String,
	/// Size in bytes.
	pub size: u64,
	/// UTF-8 text.
	pub content: String,
}

/// Single code search hit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeHit {
	/// File name.
	pub name: String,
	/// Repository path.
	pub path: String,
	/// Blob SHA.
	pub sha: String,
	/// Browser URL.
	pub html_url: String,
}

/// Code search results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSearch {
	/// Total matches reported by the host (may exceed `items`).
	pub total_count: u64,
	/// Returned hits.
	pub items: Vec<CodeHit>,
}

/// Commit metadata with its changed files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
	/// Commit SHA.
	pub sha: String,
	/// Full commit message.
	pub message: String,
	/// Author name.
	pub author: Option<String>,
	/// Author timestamp as reported by the host.
	pub date: Option<String>,
	/// Browser URL.
	pub html_url: String,
	/// Files changed by the commit.
	pub files: Vec<ChangedFile>,
}

/// File found by [`RepoReader::list_files_recursive`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileEntry {
	/// Repository path.
	pub path: String,
	/// Size in bytes.
	pub size: u64,
	/// Blob SHA.
	pub sha: String,
}

/// Typed repository reads.
#[derive(Clone, Debug)]
pub struct RepoReader {
	broker: CredentialBroker,
}
impl RepoReader {
	/// Creates a reader that authenticates through `broker`.
	pub fn new(broker: CredentialBroker) -> Self {
		Self { broker }
	}

	/// Returns the broker backing this reader.
	pub fn broker(&self) -> &CredentialBroker {
		&self.broker
	}

	/// Compares two refs (`base...head`).
	pub async fn compare(&self, repo: &RepositoryName, base: &str, head: &str) -> Result<Comparison> {
		obs::observe(OperationKind::RepositoryRead, "compare", async {
			self.get(repo, &format!("repos/{repo}/compare/{base}...{head}"), &[], "compare").await
		})
		.await
	}

	/// Lists one directory at `git_ref`. An empty `path` lists the repository root.
	pub async fn list_directory(
		&self,
		repo: &RepositoryName,
		git_ref: &str,
		path: &str,
	) -> Result<Vec<ContentEntry>> {
		obs::observe(OperationKind::RepositoryRead, "list_directory", async {
			self.get(repo, &contents_path(repo, path), &[("ref", git_ref)], "list_directory").await
		})
		.await
	}

	/// Reads a text file at `git_ref`.
	///
	/// Fails with [`Error::BinaryContent`] when the decoded bytes are not UTF-8.
	pub async fn read_file(
		&self,
		repo: &RepositoryName,
		path: &str,
		git_ref: &str,
	) -> Result<FileContent> {
		#[derive(Deserialize)]
		struct RawFile {
			path: String,
			sha: String,
			#[serde(default)]
			size: u64,
			#[serde(deserialize_with = "base64_bytes")]
			content: Vec<u8>,
		}

		obs::observe(OperationKind::RepositoryRead, "read_file", async {
			let raw = self
				.get::<RawFile>(repo, &contents_path(repo, path), &[("ref", git_ref)], "read_file")
				.await?;
			let content = String::from_utf8(raw.content)
				.map_err(|_| Error::BinaryContent { path: raw.path.clone() })?;

			Ok(FileContent { path: raw.path, sha: raw.sha, size: raw.size, content })
		})
		.await
	}

	/// Searches code inside `repo`, returning at most `max_results` hits.
	pub async fn search_code(
		&self,
		repo: &RepositoryName,
		query: &str,
		max_results: usize,
	) -> Result<CodeSearch> {
		obs::observe(OperationKind::RepositoryRead, "search_code", async {
			let q = format!("{query} repo:{repo}");
			let per_page = max_results.clamp(1, MAX_SEARCH_RESULTS).to_string();
			let mut found = self
				.get::<CodeSearch>(
					repo,
					"search/code",
					&[("q", q.as_str()), ("per_page", per_page.as_str())],
					"search_code",
				)
				.await?;

			found.items.truncate(max_results);

			Ok(found)
		})
		.await
	}

	/// Fetches a single commit.
	pub async fn commit(&self, repo: &RepositoryName, sha: &str) -> Result<CommitInfo> {
		#[derive(Deserialize)]
		struct RawCommit {
			sha: String,
			html_url: String,
			commit: RawCommitDetail,
			#[serde(default)]
			files: Vec<ChangedFile>,
		}
		#[derive(Deserialize)]
		struct RawCommitDetail {
			message: String,
			#[serde(default)]
			author: Option<RawSignature>,
		}
		#[derive(Deserialize)]
		struct RawSignature {
			#[serde(default)]
			name: Option<String>,
			#[serde(default)]
			date: Option<String>,
		}

		obs::observe(OperationKind::RepositoryRead, "commit", async {
			let raw = self
				.get::<RawCommit>(repo, &format!("repos/{repo}/commits/{sha}"), &[], "commit")
				.await?;
			let (author, date) =
				raw.commit.author.map(|author| (author.name, author.date)).unwrap_or_default();

			Ok(CommitInfo {
				sha: raw.sha,
				message: raw.commit.message,
				author,
				date,
				html_url: raw.html_url,
				files: raw.files,
			})
		})
		.await
	}

	/// Lists every file under `path`, depth-first, directories expanded in listing order.
	pub async fn list_files_recursive(
		&self,
		repo: &RepositoryName,
		git_ref: &str,
		path: &str,
	) -> Result<Vec<FileEntry>> {
		let mut pending = vec![path.to_owned()];
		let mut files = Vec::new();

		while let Some(dir) = pending.pop() {
			let entries = self.list_directory(repo, git_ref, &dir).await?;
			let mut subdirs = Vec::new();

			for entry in entries {
				if entry.is_dir() {
					subdirs.push(entry.path);
				} else if entry.is_file() {
					files.push(FileEntry { path: entry.path, size: entry.size, sha: entry.sha });
				}
			}

			pending.extend(subdirs.into_iter().rev());
		}

		Ok(files)
	}

	async fn get<T>(
		&self,
		repo: &RepositoryName,
		path: &str,
		query: &[(&str, &str)],
		operation: &'static str,
	) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let headers = self.broker.authenticated_headers(repo).await?;
		let request = self.broker.http().get(self.broker.url(path)).headers(headers).query(query);
		let response = self.broker.http().execute(request).await?;

		if !response.is_success() {
			return Err(Error::RemoteRead {
				resource: path.to_owned(),
				status: response.status(),
				body: response.body,
				retry_after: response.metadata.retry_after,
			});
		}

		response.decode(operation)
	}
}

fn contents_path(repo: &RepositoryName, path: &str) -> String {
	match path.trim_matches('/') {
		"" => format!("repos/{repo}/contents"),
		path => format!("repos/{repo}/contents/{path}"),
	}
}

// The host wraps base64 bodies at 60 columns.
fn base64_bytes<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
	D: Deserializer<'de>,
{
	let encoded = String::deserialize(deserializer)?;
	let compact = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect::<String>();

	STANDARD.decode(compact).map_err(D::Error::custom)
}
