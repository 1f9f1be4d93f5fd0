//! Transport primitives for the JSON contract.
//!
//! The session engine depends on [`AuthTransport`] only. Implementations execute one request and
//! hand back the status plus raw body; the engine owns URL building, JSON encoding, timeouts, and
//! response decoding so every transport behaves identically.

// self
#[cfg(feature = "reqwest")] use crate::error::ConfigError;
use crate::_prelude::*;

/// Boxed future returned by [`AuthTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TransportResponse, TransportFailure>> + 'a + Send>>;

/// Opaque transport failure reported by an [`AuthTransport`].
pub type TransportFailure = Box<dyn StdError + Send + Sync>;

/// Abstraction over HTTP stacks able to carry the JSON contract.
///
/// Implementations must be `Send + Sync + 'static` so engines can share them across spawned
/// refresh tasks, and the returned futures must be `Send`.
pub trait AuthTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes `request` and returns the raw response.
	fn send(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// HTTP methods used by the contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
}
impl Method {
	/// Returns the method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
		}
	}
}

/// Outbound request built by the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportRequest {
	/// Request method.
	pub method: Method,
	/// Absolute target URL.
	pub url: Url,
	/// Header name/value pairs.
	pub headers: Vec<(String, String)>,
	/// JSON body, if any.
	pub body: Option<Vec<u8>>,
}
impl TransportRequest {
	/// Creates a `GET` request.
	pub fn get(url: Url) -> Self {
		Self { method: Method::Get, url, headers: Vec::new(), body: None }
	}

	/// Creates a `POST` request without a body.
	pub fn post(url: Url) -> Self {
		Self { method: Method::Post, url, headers: Vec::new(), body: None }
	}

	/// Creates a `POST` request carrying a JSON body.
	pub fn post_json(url: Url, body: Vec<u8>) -> Self {
		Self {
			method: Method::Post,
			url,
			headers: vec![("content-type".into(), "application/json".into())],
			body: Some(body),
		}
	}

	/// Appends a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Looks up a header value (case-insensitive).
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
	}
}

/// Raw response returned by a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw body bytes.
	pub body: Vec<u8>,
}

impl TransportResponse {
	/// Builds a response carrying a JSON body.
	pub fn json(status: u16, body: &Value) -> Self {
		Self { status, body: body.to_string().into_bytes() }
	}
}

/// Boxed handler serving requests inside the current process.
pub type LoopbackHandler = Arc<dyn Fn(TransportRequest) -> TransportFuture<'static> + Send + Sync>;

/// In-process transport: every request is handed to a local handler.
///
/// Useful when the strategy registry and the session engine share a process, and for tests
/// that need to script the contract without a socket. Requests are recorded in order.
#[derive(Clone)]
pub struct LoopbackTransport {
	handler: LoopbackHandler,
	requests: Arc<Mutex<Vec<TransportRequest>>>,
}
impl LoopbackTransport {
	/// Wraps an async handler.
	pub fn new<F, Fut>(handler: F) -> Self
	where
		F: 'static + Send + Sync + Fn(TransportRequest) -> Fut,
		Fut: 'static + Send + Future<Output = Result<TransportResponse, TransportFailure>>,
	{
		Self {
			handler: Arc::new(move |request| -> TransportFuture<'static> {
				Box::pin(handler(request))
			}),
			requests: Arc::default(),
		}
	}

	/// Requests served so far, oldest first.
	pub fn requests(&self) -> Vec<TransportRequest> {
		self.requests.lock().clone()
	}
}
impl AuthTransport for LoopbackTransport {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
		self.requests.lock().push(request.clone());

		(self.handler)(request)
	}
}
impl Debug for LoopbackTransport {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoopbackTransport").field("served", &self.requests.lock().len()).finish()
	}
}

/// `user-agent` sent by [`ReqwestTransport::new`].
pub const USER_AGENT: &str = concat!("authdeck/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a client identifying itself with [`USER_AGENT`].
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().user_agent(USER_AGENT).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl AuthTransport for ReqwestTransport {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let method = match request.method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
			};
			let mut builder = client.request(method, request.url);

			for (name, value) in request.headers {
				builder = builder.header(name, value);
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(TransportResponse { status, body })
		})
	}
}
