//! Anchor-relative edits over a live document.
//!
//! Every operation validates its identifiers before any request, re-reads the document when
//! it needs an anchor, and then mutates. Nothing is cached between calls. Mutations on the same
//! document are serialized inside one [`DocumentEditor`] (and its clones); writers in other
//! processes are not detected.

// self
use crate::{
	_prelude::*,
	notion::{
		AnchorKind, AnchorPolicy, Block, BlockId, BlockSpec, NotionClient, SectionEditStage,
		SectionEntry, read_sections, section_body_range,
	},
	obs::{self, OperationKind},
};

/// One or more block specs; a single spec is treated as a batch of one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockBatch(pub Vec<BlockSpec>);
impl BlockBatch {
	/// Number of blocks in the batch.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when the batch holds no blocks.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl From<BlockSpec> for BlockBatch {
	fn from(value: BlockSpec) -> Self {
		Self(vec![value])
	}
}
impl From<Vec<BlockSpec>> for BlockBatch {
	fn from(value: Vec<BlockSpec>) -> Self {
		Self(value)
	}
}
impl<const N: usize> From<[BlockSpec; N]> for BlockBatch {
	fn from(value: [BlockSpec; N]) -> Self {
		Self(value.into())
	}
}
impl FromIterator<BlockSpec> for BlockBatch {
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = BlockSpec>,
	{
		Self(iter.into_iter().collect())
	}
}

/// Result of an append or insert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
	/// Number of blocks sent to the host.
	pub count: usize,
}

/// Result of a section replacement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReplaceOutcome {
	/// Heading whose body was replaced.
	pub heading_text: String,
	/// Old body blocks removed.
	pub deleted_count: usize,
	/// New body blocks inserted.
	pub replaced_count: usize,
}

/// Stateless editor composing [`NotionClient`] calls into anchor-relative edits.
#[derive(Clone, Debug)]
pub struct DocumentEditor {
	client: NotionClient,
	anchor_policy: AnchorPolicy,
	guards: Arc<Mutex<HashMap<BlockId, Arc<AsyncMutex<()>>>>>,
}
impl DocumentEditor {
	/// Creates an editor using [`AnchorPolicy::FirstMatch`].
	pub fn new(client: NotionClient) -> Self {
		Self { client, anchor_policy: AnchorPolicy::default(), guards: Default::default() }
	}

	/// Overrides how duplicate anchors are resolved.
	pub fn with_anchor_policy(mut self, anchor_policy: AnchorPolicy) -> Self {
		self.anchor_policy = anchor_policy;

		self
	}

	/// Returns the underlying transport (workspace reads and page creation live there).
	pub fn client(&self) -> &NotionClient {
		&self.client
	}

	/// Returns the active duplicate-anchor policy.
	pub fn anchor_policy(&self) -> AnchorPolicy {
		self.anchor_policy
	}

	/// Fetches the document's top-level blocks in order.
	pub async fn get_blocks(&self, document: impl AsRef<str>) -> Result<Vec<Block>> {
		obs::observe(OperationKind::ListBlocks, "get_blocks", async {
			let document = BlockId::parse(document)?;

			self.client.list_children(&document).await
		})
		.await
	}

	/// Lists headings and body text with their 1-based section numbers.
	pub async fn read_sections(&self, document: impl AsRef<str>) -> Result<Vec<SectionEntry>> {
		obs::observe(OperationKind::ListBlocks, "read_sections", async {
			let document = BlockId::parse(document)?;
			let blocks = self.client.list_children(&document).await?;

			Ok(read_sections(&blocks))
		})
		.await
	}

	/// Appends blocks to the end of the document, preserving their order.
	///
	/// Not transactional: a failure may leave some blocks appended. An empty batch is a no-op.
	pub async fn append_blocks(
		&self,
		document: impl AsRef<str>,
		blocks: impl Into<BlockBatch>,
	) -> Result<WriteOutcome> {
		let blocks: BlockBatch = blocks.into();

		obs::observe(OperationKind::AppendBlocks, "append_blocks", async {
			let document = BlockId::parse(document)?;

			if blocks.is_empty() {
				return Ok(WriteOutcome { count: 0 });
			}

			let guard = self.guard(&document);
			let _held = guard.lock().await;
			let count = self.client.append_children(&document, &blocks.0, None).await?;

			Ok(WriteOutcome { count })
		})
		.await
	}

	/// Inserts blocks as siblings right after `anchor` inside `parent`'s child list.
	///
	/// The new blocks are never nested under the anchor.
	pub async fn insert_after_block_id(
		&self,
		parent: impl AsRef<str>,
		anchor: impl AsRef<str>,
		blocks: impl Into<BlockBatch>,
	) -> Result<WriteOutcome> {
		let blocks: BlockBatch = blocks.into();

		obs::observe(OperationKind::InsertAfterBlock, "insert_after_block_id", async {
			let parent = BlockId::parse(parent)?;
			let anchor = BlockId::parse(anchor)?;
			let guard = self.guard(&parent);
			let _held = guard.lock().await;

			self.insert_after(&parent, &anchor, &blocks).await
		})
		.await
	}

	/// Inserts blocks right after the block whose flattened text equals `anchor_text`.
	///
	/// Matching is exact: case and whitespace count. Fails with [`Error::AnchorNotFound`]
	/// without writing anything when no block matches.
	pub async fn insert_after_text(
		&self,
		document: impl AsRef<str>,
		anchor_text: &str,
		blocks: impl Into<BlockBatch>,
	) -> Result<WriteOutcome> {
		let blocks: BlockBatch = blocks.into();

		obs::observe(OperationKind::InsertAfterText, "insert_after_text", async {
			let document = BlockId::parse(document)?;
			let guard = self.guard(&document);
			let _held = guard.lock().await;
			let snapshot = self.client.list_children(&document).await?;
			let index = self
				.anchor_policy
				.locate(&snapshot, anchor_text, AnchorKind::Text)
				.into_result(&document, anchor_text, AnchorKind::Text)?;

			self.insert_after(&document, &snapshot[index].id, &blocks).await
		})
		.await
	}

	/// Replaces everything between the heading `heading_text` and the next heading.
	///
	/// Issues one read, one delete per old body block, then one sibling insert after the
	/// heading. There is no rollback: if anything fails after the first delete succeeded the
	/// error is [`Error::PartialSectionEdit`], listing which old blocks are gone. An empty
	/// batch only clears the section.
	pub async fn replace_section(
		&self,
		document: impl AsRef<str>,
		heading_text: &str,
		blocks: impl Into<BlockBatch>,
	) -> Result<ReplaceOutcome> {
		let blocks: BlockBatch = blocks.into();

		obs::observe(OperationKind::ReplaceSection, "replace_section", async {
			let document = BlockId::parse(document)?;
			let guard = self.guard(&document);
			let _held = guard.lock().await;
			let snapshot = self.client.list_children(&document).await?;
			let heading = self
				.anchor_policy
				.locate(&snapshot, heading_text, AnchorKind::Heading)
				.into_result(&document, heading_text, AnchorKind::Heading)?;
			let heading_id = snapshot[heading].id.clone();
			let body = snapshot[section_body_range(&snapshot, heading)]
				.iter()
				.map(|block| block.id.clone())
				.collect::<Vec<_>>();
			let partial = |stage: SectionEditStage, done: usize, source: Error| -> Error {
				if done == 0 {
					return source;
				}

				Error::PartialSectionEdit {
					document: document.clone(),
					heading: heading_text.to_owned(),
					stage,
					deleted: body[..done].to_vec(),
					remaining: body[done..].to_vec(),
					source: Box::new(source),
				}
			};

			for (done, block) in body.iter().enumerate() {
				obs::record_operation_step(OperationKind::ReplaceSection, "delete", block);

				if let Err(e) = self.client.delete_block(block).await {
					return Err(partial(SectionEditStage::Delete, done, e));
				}
			}

			if !blocks.is_empty() {
				obs::record_operation_step(OperationKind::ReplaceSection, "insert", &heading_id);

				if let Err(e) = self.client.append_children(&document, &blocks.0, Some(&heading_id)).await
				{
					return Err(partial(SectionEditStage::Insert, body.len(), e));
				}
			}

			Ok(ReplaceOutcome {
				heading_text: heading_text.to_owned(),
				deleted_count: body.len(),
				replaced_count: blocks.len(),
			})
		})
		.await
	}

	async fn insert_after(
		&self,
		parent: &BlockId,
		anchor: &BlockId,
		blocks: &BlockBatch,
	) -> Result<WriteOutcome> {
		if blocks.is_empty() {
			return Ok(WriteOutcome { count: 0 });
		}

		let count = self.client.append_children(parent, &blocks.0, Some(anchor)).await?;

		Ok(WriteOutcome { count })
	}

	fn guard(&self, document: &BlockId) -> Arc<AsyncMutex<()>> {
		let mut guards = self.guards.lock();

		guards.entry(document.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}
}
