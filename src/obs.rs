//! Optional observability helpers for broker and editor operations.
//!
//! # Feature Flags
//!
//! - `tracing` (default) emits spans named `docdelta.operation` with the `operation` and
//!   `stage` (call site) fields, plus one event per finished operation.
//! - `metrics` increments the `docdelta_operation_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Remote operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Installation token lookup (cache hit or exchange).
	TokenExchange,
	/// Any GitHub repository read.
	RepositoryRead,
	/// Document block listing.
	ListBlocks,
	/// Append at the end of a document.
	AppendBlocks,
	/// Sibling insert after a known block id.
	InsertAfterBlock,
	/// Sibling insert after the block carrying an exact text.
	InsertAfterText,
	/// Replace the body of a section.
	ReplaceSection,
	/// Page creation in a database.
	CreatePage,
	/// Search, schema, and database queries.
	WorkspaceRead,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::TokenExchange => "token_exchange",
			OperationKind::RepositoryRead => "repository_read",
			OperationKind::ListBlocks => "list_blocks",
			OperationKind::AppendBlocks => "append_blocks",
			OperationKind::InsertAfterBlock => "insert_after_block",
			OperationKind::InsertAfterText => "insert_after_text",
			OperationKind::ReplaceSection => "replace_section",
			OperationKind::CreatePage => "create_page",
			OperationKind::WorkspaceRead => "workspace_read",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to a public operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside an operation span and records attempt + final outcome.
pub(crate) async fn observe<T, Fut>(kind: OperationKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = OperationSpan::new(kind, stage);

	record_operation_outcome(kind, OperationOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_operation_outcome(kind, OperationOutcome::Success),
		Err(err) => {
			record_operation_failure(kind, stage, err);
			record_operation_outcome(kind, OperationOutcome::Failure);
		},
	}

	result
}
