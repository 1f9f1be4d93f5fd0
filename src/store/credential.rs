//! Namespaced, typed view over a [`KeyValueStore`] holding the session's authorization and
//! refresh strategy.

// self
use crate::{
	_prelude::*,
	model::{Authorization, RefreshStrategy},
	store::{ChangeFeed, KeyValueStore, StoreError},
};

/// Storage name of the authorization blob.
pub const AUTHORIZATION_ITEM: &str = "authdeck_authorization";
/// Storage name of the refresh-strategy blob.
pub const REFRESH_STRATEGY_ITEM: &str = "authdeck_refresh_strategy";

/// Prefix-namespaced credential persistence.
///
/// Reads never fail: malformed JSON, unexpected shapes, and backend read errors are logged and
/// reported as absent values.
#[derive(Clone)]
pub struct CredentialStore {
	backend: Arc<dyn KeyValueStore>,
	prefix: String,
}
impl CredentialStore {
	/// Wraps a backend; `prefix` lets several independent clients share one backend.
	pub fn new(backend: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
		Self { backend, prefix: prefix.into() }
	}

	/// Returns the namespaced key for an item name.
	pub fn item_name(&self, name: &str) -> String {
		format!("{}{name}", self.prefix)
	}

	/// Namespaced key of the authorization blob.
	pub fn authorization_key(&self) -> String {
		self.item_name(AUTHORIZATION_ITEM)
	}

	/// Reads the stored authorization, if it has string `type` and non-empty `credentials`.
	pub fn authorization(&self) -> Option<Authorization> {
		let raw = self.read(AUTHORIZATION_ITEM)?;

		Self::parse_authorization(Some(&raw))
	}

	/// Parses a raw authorization blob, e.g. one delivered by a [`ChangeFeed`].
	pub fn parse_authorization(raw: Option<&str>) -> Option<Authorization> {
		parse_json::<Authorization>(raw?, AUTHORIZATION_ITEM)?.into_active()
	}

	/// Persists or removes the authorization.
	pub fn set_authorization(&self, value: Option<&Authorization>) -> Result<(), StoreError> {
		self.set_or_remove(AUTHORIZATION_ITEM, value)
	}

	/// Reads the stored refresh strategy, if it has a string `name`.
	pub fn refresh_strategy(&self) -> Option<RefreshStrategy> {
		let raw = self.read(REFRESH_STRATEGY_ITEM)?;

		parse_json(&raw, REFRESH_STRATEGY_ITEM)
	}

	/// Persists or removes the refresh strategy.
	pub fn set_refresh_strategy(&self, value: Option<&RefreshStrategy>) -> Result<(), StoreError> {
		self.set_or_remove(REFRESH_STRATEGY_ITEM, value)
	}

	/// Subscribes to foreign writes on the backend.
	pub fn watch(&self) -> Option<ChangeFeed> {
		self.backend.watch()
	}

	fn read(&self, name: &str) -> Option<String> {
		let key = self.item_name(name);

		match self.backend.get(&key) {
			Ok(raw) => raw,
			Err(e) => {
				tracing::warn!(key = %key, error = %e, "Failed to read stored credential item.");

				None
			},
		}
	}

	fn set_or_remove<T>(&self, name: &str, value: Option<&T>) -> Result<(), StoreError>
	where
		T: Serialize,
	{
		let key = self.item_name(name);

		match value {
			Some(value) => {
				let raw = serde_json::to_string(value).map_err(|e| StoreError::Serialization {
					message: format!("Failed to serialize {key}: {e}"),
				})?;

				self.backend.set(&key, raw)
			},
			None => self.backend.remove(&key),
		}
	}
}
impl Debug for CredentialStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialStore").field("prefix", &self.prefix).finish()
	}
}

fn parse_json<T>(raw: &str, name: &str) -> Option<T>
where
	T: for<'de> Deserialize<'de>,
{
	match serde_json::from_str(raw) {
		Ok(value) => Some(value),
		Err(e) => {
			tracing::warn!(item = name, error = %e, "Ignoring malformed stored credential item.");

			None
		},
	}
}
