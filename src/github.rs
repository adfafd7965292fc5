//! GitHub App authentication and typed repository reads.
//!
//! [`CredentialBroker`] turns the app's signing key into a cached installation token and
//! produces ready-to-send request headers. [`RepoReader`] uses those headers for the
//! read-only repository endpoints a documentation bot needs.

pub mod broker;
pub mod repo;

pub use broker::*;
pub use repo::*;
