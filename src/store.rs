//! Token cache contract and the built-in in-memory implementation.
//!
//! A cache holds at most one installation token. It is owned by a single
//! [`CredentialBroker`](crate::github::CredentialBroker) and shared by every repository that
//! broker serves, which is only correct when one app installation covers all of them.
//! Tokens are never persisted or revoked; dropping the cache discards them.

pub mod memory;

pub use memory::MemoryTokenCache;

// self
use crate::auth::AccessToken;

/// Storage contract for the broker's cached installation token.
///
/// Implementations only need interior mutability; the broker serializes the check-then-set
/// sequence itself.
pub trait TokenCache
where
	Self: Send + Sync,
{
	/// Returns the cached token, if any.
	fn load(&self) -> Option<AccessToken>;

	/// Replaces the cached token.
	fn store(&self, token: AccessToken);

	/// Discards the cached token.
	fn clear(&self);
}
