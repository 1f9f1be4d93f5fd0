//! Thread-safe in-memory [`KeyValueStore`] with cross-context change notifications.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use tokio::sync::broadcast::{self, Sender};
// self
use crate::{
	_prelude::*,
	store::{ChangeFeed, ContextId, KeyValueStore, StoreChange, StoreError},
};

const CHANGE_CAPACITY: usize = 64;

#[derive(Debug)]
struct Shared {
	entries: RwLock<HashMap<String, String>>,
	changes: Sender<StoreChange>,
	next_context: AtomicU64,
}

/// In-process backend; [`MemoryStore::sibling`] opens another context on the same data, the
/// way a second tab shares an origin's storage.
#[derive(Clone, Debug)]
pub struct MemoryStore {
	context: ContextId,
	shared: Arc<Shared>,
}
impl MemoryStore {
	/// Opens a new context over the same entries and change channel.
	pub fn sibling(&self) -> Self {
		let context = self.shared.next_context.fetch_add(1, Ordering::Relaxed);

		Self { context, shared: self.shared.clone() }
	}

	/// Returns this context's identifier.
	pub fn context(&self) -> ContextId {
		self.context
	}

	/// Number of stored keys across all contexts.
	pub fn len(&self) -> usize {
		self.shared.entries.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn publish(&self, key: &str, new_value: Option<String>) {
		// No receivers is not an error.
		let _ = self.shared.changes.send(StoreChange {
			origin: self.context,
			key: Some(key.to_owned()),
			new_value,
		});
	}
}
impl Default for MemoryStore {
	fn default() -> Self {
		let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
		let shared = Shared {
			entries: RwLock::new(HashMap::new()),
			changes,
			next_context: AtomicU64::new(1),
		};

		Self { context: 0, shared: Arc::new(shared) }
	}
}
impl KeyValueStore for MemoryStore {
	fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
		Ok(self.shared.entries.read().get(key).cloned())
	}

	fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
		self.shared.entries.write().insert(key.to_owned(), value.clone());
		self.publish(key, Some(value));

		Ok(())
	}

	fn remove(&self, key: &str) -> Result<(), StoreError> {
		if self.shared.entries.write().remove(key).is_some() {
			self.publish(key, None);
		}

		Ok(())
	}

	fn watch(&self) -> Option<ChangeFeed> {
		Some(ChangeFeed::new(self.context, self.shared.changes.subscribe()))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn siblings_share_entries() {
		let first = MemoryStore::default();
		let second = first.sibling();

		first.set("k", "v".into()).expect("Memory writes should succeed.");

		assert_ne!(first.context(), second.context());
		assert_eq!(second.get("k").expect("Memory reads should succeed."), Some("v".into()));

		second.remove("k").expect("Memory removals should succeed.");

		assert!(first.is_empty());
	}

	#[tokio::test]
	async fn watch_skips_own_writes() {
		let first = MemoryStore::default();
		let second = first.sibling();
		let mut feed = first.watch().expect("Memory store should expose a change feed.");

		first.set("own", "1".into()).expect("Memory writes should succeed.");
		second.set("foreign", "2".into()).expect("Memory writes should succeed.");

		let change = feed.next().await.expect("Foreign change should be delivered.");

		assert_eq!(change.origin, second.context());
		assert_eq!(change.key.as_deref(), Some("foreign"));
		assert_eq!(change.new_value.as_deref(), Some("2"));
	}
}
