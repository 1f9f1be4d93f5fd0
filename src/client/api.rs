//! Typed calls for the four contract endpoints.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	client::ClientConfig,
	error::{ConfigError, TransportError},
	http::{AuthTransport, TransportRequest, TransportResponse},
	model::{AuthResult, Authorization, RefreshStrategy, StrategiesResult, UserResult},
};

/// Endpoint client shared by every engine operation.
///
/// Response bodies are decoded regardless of the HTTP status; failures are reported through
/// the `ok`/`error` fields of the contract.
#[derive(Clone)]
pub(crate) struct ApiClient {
	config: ClientConfig,
	transport: Arc<dyn AuthTransport>,
}
impl ApiClient {
	pub(crate) fn new(config: ClientConfig, transport: Arc<dyn AuthTransport>) -> Self {
		Self { config, transport }
	}

	pub(crate) fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// `GET ./strategies`
	pub(crate) async fn strategies(&self) -> Result<StrategiesResult> {
		let request = TransportRequest::get(self.config.endpoint("strategies")?);

		self.call("strategies", request).await
	}

	/// `POST ./authenticate/{name}`
	///
	/// A `None` payload is sent without a body.
	pub(crate) async fn authenticate(
		&self,
		name: &str,
		payload: Option<&Value>,
	) -> Result<AuthResult> {
		let url = self.config.authenticate_endpoint(name)?;
		let request = match payload {
			Some(payload) => TransportRequest::post_json(
				url,
				serde_json::to_vec(payload).map_err(ConfigError::from)?,
			),
			None => TransportRequest::post(url),
		};

		self.call("authenticate", request).await
	}

	/// `POST ./unauthenticate`; the acknowledgement body is ignored.
	pub(crate) async fn unauthenticate(&self, descriptor: Option<&RefreshStrategy>) -> Result<()> {
		let body = serde_json::to_vec(&[descriptor]).map_err(ConfigError::from)?;
		let request = TransportRequest::post_json(self.config.endpoint("unauthenticate")?, body);

		self.send("unauthenticate", request).await?;

		Ok(())
	}

	/// `GET ./user`
	pub(crate) async fn user<U>(&self, authorization: &Authorization) -> Result<UserResult<U>>
	where
		U: DeserializeOwned,
	{
		let mut request = TransportRequest::get(self.config.endpoint("user")?);

		if let Some(value) = authorization.header_value() {
			request = request.with_header("authorization", value);
		}

		self.call("user", request).await
	}

	async fn call<T>(&self, endpoint: &'static str, request: TransportRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self.send(endpoint, request).await?;
		let mut deserializer = serde_json::Deserializer::from_slice(&response.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::MalformedResponse { endpoint, source })
	}

	async fn send(
		&self,
		endpoint: &'static str,
		request: TransportRequest,
	) -> Result<TransportResponse> {
		let timeout = self.config.request_timeout;

		match tokio::time::timeout(timeout.unsigned_abs(), self.transport.send(request)).await {
			Ok(Ok(response)) => {
				tracing::debug!(endpoint, status = response.status, "Endpoint answered.");

				Ok(response)
			},
			Ok(Err(source)) => Err(TransportError::Network { endpoint, source }.into()),
			Err(_) => Err(TransportError::Timeout { endpoint, timeout }.into()),
		}
	}
}
impl Debug for ApiClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient").field("base_url", &self.config.base_url.as_str()).finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::http::LoopbackTransport;

	fn api(transport: LoopbackTransport) -> ApiClient {
		let config =
			ClientConfig::new("https://auth.example/api").expect("Client config should build.");

		ApiClient::new(config, Arc::new(transport))
	}

	#[tokio::test]
	async fn unauthenticate_posts_null_descriptor() {
		let transport = LoopbackTransport::new(|_| async {
			Ok(TransportResponse { status: 204, body: Vec::new() })
		});
		let client = api(transport.clone());

		client.unauthenticate(None).await.expect("Unauthenticate should succeed.");

		let requests = transport.requests();

		assert_eq!(requests.len(), 1);
		assert_eq!(requests[0].url.as_str(), "https://auth.example/api/unauthenticate");
		assert_eq!(requests[0].body.as_deref(), Some(&b"[null]"[..]));
	}

	#[tokio::test]
	async fn user_sends_authorization_header() {
		let transport = LoopbackTransport::new(|_| async {
			Ok(TransportResponse::json(200, &json!({ "ok": true, "user": { "id": 7 } })))
		});
		let client = api(transport.clone());
		let result: UserResult = client
			.user(&Authorization::new("Bearer", "t1"))
			.await
			.expect("User lookup should succeed.");

		assert_eq!(result.user, Some(json!({ "id": 7 })));
		assert_eq!(transport.requests()[0].header("authorization"), Some("Bearer t1"));
	}

	#[tokio::test]
	async fn malformed_body_reports_json_path() {
		let transport = LoopbackTransport::new(|_| async {
			Ok(TransportResponse::json(200, &json!({ "ok": true, "strategies": [{ "name": 1 }] })))
		});
		let err = api(transport).strategies().await.expect_err("Decoding should fail.");
		let Error::MalformedResponse { endpoint, source } = err else {
			panic!("Unexpected error: {err:?}");
		};

		assert_eq!(endpoint, "strategies");
		assert_eq!(source.path().to_string(), "strategies[0].name");
	}

	#[tokio::test(start_paused = true)]
	async fn slow_transport_times_out() {
		let transport = LoopbackTransport::new(|_| std::future::pending());
		let err = api(transport).strategies().await.expect_err("Request should time out.");

		assert!(matches!(
			err,
			Error::Transport(TransportError::Timeout { endpoint: "strategies", .. })
		));
	}
}
