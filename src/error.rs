//! Crate-level error types shared by the session engine, the transport, and the strategy
//! registry.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used for failures reported by pluggable collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (network, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Endpoint answered with a body that does not match the expected JSON shape.
	#[error("The {endpoint} endpoint returned a malformed response.")]
	MalformedResponse {
		/// Endpoint label (`strategies`, `authenticate`, `unauthenticate`, `user`).
		endpoint: &'static str,
		/// Structured parsing failure, including the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// No strategy is registered under the requested name.
	#[error("Unknown authentication strategy {name}.")]
	UnknownStrategy {
		/// Requested strategy name.
		name: String,
	},
	/// The strategy exists but lacks the requested capability.
	#[error("Authentication strategy {strategy} does not support {operation}.")]
	UnsupportedOperation {
		/// Strategy name.
		strategy: String,
		/// Capability label (`store`, `unauthenticate`).
		operation: &'static str,
	},
	/// A strategy implementation reported a failure.
	#[error("Authentication strategy {strategy} failed.")]
	Strategy {
		/// Strategy name.
		strategy: String,
		/// Failure reported by the strategy.
		#[source]
		source: BoxError,
	},
	/// The registry cannot build a listing without a primary strategy.
	#[error("No primary strategy specified.")]
	NoPrimaryStrategy,
	/// Registration was rejected.
	#[error("Invalid strategy registration: {reason}.")]
	InvalidRegistration {
		/// Human-readable rejection reason.
		reason: String,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A URL could not be parsed or joined.
	#[error("URL is invalid.")]
	InvalidUrl(#[from] url::ParseError),
	/// The base URL cannot carry relative endpoint paths.
	#[error("Base URL `{url}` must be an absolute http(s) URL.")]
	UnsupportedBaseUrl {
		/// Offending URL.
		url: String,
	},
	/// A duration setting is out of range.
	#[error("The {setting} setting must be {requirement}.")]
	InvalidDuration {
		/// Setting name.
		setting: &'static str,
		/// Requirement that was violated.
		requirement: &'static str,
	},
	/// The engine was built without a base URL.
	#[error("A base URL is required.")]
	MissingBaseUrl,
	/// No transport was supplied and no default transport is compiled in.
	#[error("A transport is required when the `reqwest` feature is disabled.")]
	MissingTransport,
	/// Callback URLs need a configured redirect target.
	#[error("Set the callback redirect URL before building callback URLs.")]
	MissingCallbackRedirect,
	/// A payload could not be serialized to JSON.
	#[error("Payload could not be serialized.")]
	Serialize(#[from] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, timeout).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Endpoint label.
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request did not complete within the configured timeout.
	#[error("The {endpoint} endpoint did not answer within {timeout}.")]
	Timeout {
		/// Endpoint label.
		endpoint: &'static str,
		/// Timeout that elapsed.
		timeout: Duration,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn store_error_converts_with_source() {
		let store_error = StoreError::Backend { message: "quota exceeded".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("quota exceeded"));

		let source =
			StdError::source(&error).expect("Storage errors should expose the store error.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn registry_errors_render_names() {
		let unknown = Error::UnknownStrategy { name: "password".into() };
		let unsupported =
			Error::UnsupportedOperation { strategy: "password".into(), operation: "store" };

		assert_eq!(unknown.to_string(), "Unknown authentication strategy password.");
		assert_eq!(
			unsupported.to_string(),
			"Authentication strategy password does not support store."
		);
	}
}
