//! Thread-safe in-memory [`TokenCache`].

// self
use crate::{_prelude::*, auth::AccessToken, store::TokenCache};

/// Process-local cache slot. Clones share the same slot.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenCache(Arc<RwLock<Option<AccessToken>>>);
impl TokenCache for MemoryTokenCache {
	fn load(&self) -> Option<AccessToken> {
		self.0.read().clone()
	}

	fn store(&self, token: AccessToken) {
		*self.0.write() = Some(token);
	}

	fn clear(&self) {
		self.0.write().take();
	}
}
