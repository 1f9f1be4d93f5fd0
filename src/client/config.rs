//! Client configuration and its validating builder.

// self
use crate::{_prelude::*, error::ConfigError};

/// Settings for a [`SessionEngine`](crate::client::SessionEngine).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// Base URL the contract's relative endpoints resolve against; always ends in `/`.
	pub base_url: Url,
	/// Storage namespace prefix.
	pub prefix: String,
	/// Upper bound for a single network call.
	pub request_timeout: Duration,
	/// Exclusive upper bound of the random early-refresh margin.
	pub refresh_jitter: Duration,
}
impl ClientConfig {
	/// Default network timeout.
	pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::seconds(5);
	/// Default refresh jitter window.
	pub const DEFAULT_REFRESH_JITTER: Duration = Duration::seconds(30);
	/// Largest accepted refresh jitter window.
	pub const MAX_REFRESH_JITTER: Duration = Duration::days(1);

	/// Creates a builder.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Builds a configuration with defaults for everything but the base URL.
	pub fn new(base_url: &str) -> Result<Self, ConfigError> {
		Self::builder().base_url(Url::parse(base_url)?).build()
	}

	/// Resolves a contract path (e.g. `strategies`) against the base URL.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		Ok(self.base_url.join(path)?)
	}

	/// Resolves `authenticate/{name}`, percent-encoding the strategy name as one segment.
	pub fn authenticate_endpoint(&self, strategy: &str) -> Result<Url, ConfigError> {
		let mut url = self.endpoint("authenticate/")?;

		url.path_segments_mut()
			.map_err(|_| ConfigError::UnsupportedBaseUrl { url: self.base_url.to_string() })?
			.pop_if_empty()
			.push(strategy);

		Ok(url)
	}
}

/// Builder for [`ClientConfig`].
#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
	base_url: Option<Url>,
	prefix: String,
	request_timeout: Duration,
	refresh_jitter: Duration,
}
impl ClientConfigBuilder {
	/// Sets the base URL.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Sets the storage prefix.
	pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = prefix.into();

		self
	}

	/// Overrides the network timeout (defaults to 5 seconds).
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Overrides the refresh jitter window (defaults to 30 seconds; zero disables jitter; at
	/// most one day).
	pub fn refresh_jitter(mut self, jitter: Duration) -> Self {
		self.refresh_jitter = jitter;

		self
	}

	/// Validates and builds the configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let mut base_url = self.base_url.ok_or(ConfigError::MissingBaseUrl)?;

		if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedBaseUrl { url: base_url.to_string() });
		}
		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());

			base_url.set_path(&path);
		}
		if !self.request_timeout.is_positive() {
			return Err(ConfigError::InvalidDuration {
				setting: "request_timeout",
				requirement: "positive",
			});
		}
		if self.refresh_jitter.is_negative() || self.refresh_jitter > ClientConfig::MAX_REFRESH_JITTER
		{
			return Err(ConfigError::InvalidDuration {
				setting: "refresh_jitter",
				requirement: "between zero and one day",
			});
		}

		Ok(ClientConfig {
			base_url,
			prefix: self.prefix,
			request_timeout: self.request_timeout,
			refresh_jitter: self.refresh_jitter,
		})
	}
}
impl Default for ClientConfigBuilder {
	fn default() -> Self {
		Self {
			base_url: None,
			prefix: String::new(),
			request_timeout: ClientConfig::DEFAULT_REQUEST_TIMEOUT,
			refresh_jitter: ClientConfig::DEFAULT_REFRESH_JITTER,
		}
	}
}
