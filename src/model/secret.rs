//! Redacting wrapper for bearer credentials.

// self
use crate::_prelude::*;

/// Credential string that stays out of logs and debug output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(String);
impl Credentials {
	/// Wraps a new credential string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner credential. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the credential carries no characters.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl AsRef<str> for Credentials {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Credentials").field(&"<redacted>").finish()
	}
}
impl Display for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn credential_formatters_redact() {
		let credentials = Credentials::new("super-secret");

		assert_eq!(format!("{credentials:?}"), "Credentials(\"<redacted>\")");
		assert_eq!(format!("{credentials}"), "<redacted>");
		assert_eq!(credentials.expose(), "super-secret");
	}
}
