//! Per-call dispatch context and the HTTP adapter contract.

// self
use crate::{_prelude::*, model::Authorization};

/// Cookie attributes forwarded to [`HttpAdapter::set_cookie`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CookieOptions {
	/// Hide the cookie from scripts.
	pub http_only: bool,
	/// Restrict the cookie to same-site requests.
	pub same_site: bool,
	/// Only send the cookie over TLS.
	pub secure: bool,
	/// Expiry; `None` makes it a session cookie.
	pub expires_at: Option<OffsetDateTime>,
}

/// Host-framework bridge available to strategies invoked over HTTP.
pub trait HttpAdapter
where
	Self: Send + Sync,
{
	/// Reads a request cookie.
	fn cookie(&self, name: &str) -> Option<String>;

	/// Sets a response cookie.
	fn set_cookie(&self, name: &str, value: &str, options: &CookieOptions);

	/// Clears a cookie on the client.
	fn clear_cookie(&self, name: &str);

	/// Every value of a request header, in order.
	fn request_header(&self, name: &str) -> Vec<String>;

	/// Replaces a response header; an empty list removes it.
	fn set_response_header(&self, name: &str, values: Vec<String>);

	/// Parses the `authorization` request header as `"{type} {credentials}"`.
	fn authorization(&self) -> Option<Authorization> {
		self.request_header("authorization")
			.first()
			.and_then(|value| Authorization::from_header_value(value))
	}
}

/// Where a dispatch originated.
#[derive(Clone)]
pub enum Origin {
	/// An HTTP request handled by the host framework.
	Http(Arc<dyn HttpAdapter>),
	/// A direct call from server code.
	Programmatic,
}
impl Debug for Origin {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Http(_) => f.write_str("Http(..)"),
			Self::Programmatic => f.write_str("Programmatic"),
		}
	}
}

/// Input for one dispatch; built fresh per call and never persisted.
#[derive(Clone, Debug)]
pub struct Context {
	/// Origin of the call.
	pub origin: Origin,
	/// Strategy to route to; unnamed contexts are probed against every strategy.
	pub strategy_name: Option<String>,
	/// Strategy payload.
	pub payload: Value,
	/// Authorization presented by the caller.
	pub authorization: Option<Authorization>,
}
impl Context {
	/// Context for a direct server-side call.
	pub fn programmatic(strategy_name: Option<&str>, payload: Value) -> Self {
		Self {
			origin: Origin::Programmatic,
			strategy_name: strategy_name.map(ToOwned::to_owned),
			payload,
			authorization: None,
		}
	}

	/// Context for an HTTP request; the authorization is read from the adapter.
	pub fn http(adapter: Arc<dyn HttpAdapter>, strategy_name: Option<&str>, payload: Value) -> Self {
		let authorization = adapter.authorization();

		Self {
			origin: Origin::Http(adapter),
			strategy_name: strategy_name.map(ToOwned::to_owned),
			payload,
			authorization,
		}
	}

	/// Overrides the presented authorization.
	pub fn with_authorization(mut self, authorization: Authorization) -> Self {
		self.authorization = Some(authorization);

		self
	}

	/// HTTP adapter, when the call came over HTTP.
	pub fn adapter(&self) -> Option<&dyn HttpAdapter> {
		match &self.origin {
			Origin::Http(adapter) => Some(adapter.as_ref()),
			Origin::Programmatic => None,
		}
	}
}
