//! Bearer authorization issued by the server and cached by the client.

// self
use crate::{
	_prelude::*,
	model::{Credentials, timestamp},
};

/// Bearer credential plus its optional expiry.
///
/// An authorization without credentials (or with empty credentials) is treated as
/// "not authenticated" everywhere; use [`Authorization::into_active`] to normalize.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
	/// Scheme used in the `authorization` header (e.g. `Bearer`).
	#[serde(rename = "type")]
	pub kind: String,
	/// Credential string; absent means the authorization is empty.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub credentials: Option<Credentials>,
	/// Expiry instant, carried as UNIX milliseconds.
	#[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp::option")]
	pub expires_at: Option<OffsetDateTime>,
}
impl Authorization {
	/// Creates a non-expiring authorization.
	pub fn new(kind: impl Into<String>, credentials: impl Into<String>) -> Self {
		Self { kind: kind.into(), credentials: Some(Credentials::new(credentials)), expires_at: None }
	}

	/// Sets the expiry instant.
	pub fn with_expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Returns `true` when no usable credential is present.
	pub fn is_empty(&self) -> bool {
		self.credentials.as_ref().is_none_or(Credentials::is_empty)
	}

	/// Drops empty authorizations so callers only keep usable ones.
	pub fn into_active(self) -> Option<Self> {
		if self.is_empty() { None } else { Some(self) }
	}

	/// Formats the `authorization` header value (`"{type} {credentials}"`).
	pub fn header_value(&self) -> Option<String> {
		let credentials = self.credentials.as_ref().filter(|c| !c.is_empty())?;

		Some(format!("{} {}", self.kind, credentials.expose()))
	}

	/// Parses an `authorization` header value of the form `"{type} {credentials}"`.
	pub fn from_header_value(value: &str) -> Option<Self> {
		let (kind, credentials) = value.trim().split_once(' ')?;
		let credentials = credentials.trim();

		if kind.is_empty() || credentials.is_empty() {
			return None;
		}

		Some(Self::new(kind, credentials))
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn wire_shape_uses_type_and_millis() {
		let authorization = Authorization::new("Bearer", "abc")
			.with_expires_at(datetime!(2025-11-10 12:00 UTC));
		let value =
			serde_json::to_value(&authorization).expect("Authorization should serialize.");

		assert_eq!(
			value,
			json!({ "type": "Bearer", "credentials": "abc", "expiresAt": 1_762_776_000_000_i64 })
		);

		let decoded: Authorization =
			serde_json::from_value(value).expect("Authorization should decode.");

		assert_eq!(decoded, authorization);
	}

	#[test]
	fn missing_or_blank_credentials_are_empty() {
		let missing: Authorization = serde_json::from_value(json!({ "type": "Bearer" }))
			.expect("Authorization without credentials should decode.");
		let blank = Authorization::new("Bearer", "");

		assert!(missing.is_empty());
		assert!(missing.clone().into_active().is_none());
		assert!(blank.is_empty());
		assert_eq!(missing.header_value(), None);
	}

	#[test]
	fn header_value_round_trips() {
		let authorization = Authorization::new("Bearer", "token-1");
		let header = authorization.header_value().expect("Header should be produced.");

		assert_eq!(header, "Bearer token-1");
		assert_eq!(Authorization::from_header_value(&header), Some(authorization));
		assert_eq!(Authorization::from_header_value("Bearer"), None);
	}
}
