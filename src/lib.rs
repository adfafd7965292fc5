//! GitHub App credential broker and Notion block-tree document editor. Mints short-lived
//! installation tokens for repository reads and applies anchor-relative edits to structured
//! documentation pages.
//!
//! The two halves are independent. [`github::CredentialBroker`] exchanges an app signing key
//! for cached installation tokens, and [`notion::DocumentEditor`] reads a page as an ordered
//! block sequence and exposes insert-after, replace-section, and append primitives over it.
//!
//! Neither half holds a local copy of remote state beyond the token cache. Every editor
//! operation re-reads the page before mutating, and no operation retries internally; callers
//! own the retry policy. The editor serializes its own writes per document, but concurrent
//! writers in other processes are not detected, so run at most one mutator per document.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod github;
pub mod http;
pub mod notion;
pub mod obs;
pub mod store;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Value, json};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
