//! Notion-shaped block-tree document editing.
//!
//! A document is the ordered top-level child list of a page. Sections are not stored: a
//! section is a heading block plus every following block up to the next heading of any level
//! (or the end of the page), recomputed from a fresh read on every call.
//!
//! - [`id`] normalizes dash-optional identifiers and rejects placeholders before any request.
//! - [`block`] models outgoing [`BlockSpec`] values and incoming [`Block`] snapshots.
//! - [`section`] is the pure projection from a block list to numbered sections and anchors.
//! - [`client`] is the REST transport; [`editor`] composes it into anchor-relative edits.
//! - [`workspace`] covers page creation, search, and database queries.

pub mod block;
pub mod client;
pub mod editor;
pub mod id;
pub mod section;
pub mod workspace;

pub use block::*;
pub use client::*;
pub use editor::*;
pub use id::*;
pub use section::*;
pub use workspace::*;
