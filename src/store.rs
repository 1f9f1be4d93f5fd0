//! Key-value storage contracts, change feeds, and the namespaced credential store.
//!
//! A [`KeyValueStore`] is the client's only persistence dependency. Several execution
//! contexts (browser tabs, processes, engine instances) may share one backend; a backend that
//! can observe writes made by *other* contexts exposes them through [`KeyValueStore::watch`]
//! so every engine converges on the same authorization.

pub mod credential;
pub mod memory;

pub use credential::CredentialStore;
pub use memory::MemoryStore;

// crates.io
use tokio::sync::broadcast::{Receiver, error::RecvError};
// self
use crate::_prelude::*;

/// Synchronous key-value backend holding JSON strings.
pub trait KeyValueStore
where
	Self: Send + Sync,
{
	/// Reads the raw value stored under `key`.
	fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

	/// Stores `value` under `key`, replacing any prior value.
	fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

	/// Removes `key`; removing a missing key succeeds.
	fn remove(&self, key: &str) -> Result<(), StoreError>;

	/// Subscribes to writes performed by other contexts sharing this backend.
	///
	/// Backends without a notification channel return `None`; engines then only observe
	/// their own writes.
	fn watch(&self) -> Option<ChangeFeed> {
		None
	}
}

/// Error type produced by [`KeyValueStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced while encoding a value.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Identifier of the execution context that performed a write.
pub type ContextId = u64;

/// Write observed on a shared backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreChange {
	/// Context that performed the write.
	pub origin: ContextId,
	/// Changed key; `None` when the feed lagged and any key may have changed.
	pub key: Option<String>,
	/// New raw value; `None` for removals.
	pub new_value: Option<String>,
}
impl StoreChange {
	/// Returns `true` when the change may affect `key`.
	pub fn affects(&self, key: &str) -> bool {
		self.key.as_deref().is_none_or(|changed| changed == key)
	}
}

/// Stream of changes made by other contexts.
#[derive(Debug)]
pub struct ChangeFeed {
	local: ContextId,
	receiver: Receiver<StoreChange>,
}
impl ChangeFeed {
	/// Wraps a broadcast receiver, skipping changes that originate from `local`.
	pub fn new(local: ContextId, receiver: Receiver<StoreChange>) -> Self {
		Self { local, receiver }
	}

	/// Waits for the next foreign change; returns `None` once the backend is gone.
	pub async fn next(&mut self) -> Option<StoreChange> {
		loop {
			match self.receiver.recv().await {
				Ok(change) if change.origin == self.local => continue,
				Ok(change) => return Some(change),
				Err(RecvError::Lagged(skipped)) => {
					tracing::warn!(skipped, "Store change feed lagged; forcing a resync.");

					return Some(StoreChange { origin: self.local, key: None, new_value: None });
				},
				Err(RecvError::Closed) => return None,
			}
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn lagged_changes_affect_every_key() {
		let lagged = StoreChange { origin: 1, key: None, new_value: None };
		let targeted = StoreChange { origin: 1, key: Some("a".into()), new_value: None };

		assert!(lagged.affects("anything"));
		assert!(targeted.affects("a"));
		assert!(!targeted.affects("b"));
	}
}
