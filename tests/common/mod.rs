#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use authdeck::{
	client::{ClientConfig, EventKind, Listener, MemoryNavigator, SessionEngine, SessionEvent},
	http::{LoopbackTransport, TransportRequest, TransportResponse},
	serde_json::Value,
	store::KeyValueStore,
	url::Url,
};
use parking_lot::Mutex;

pub const BASE_URL: &str = "https://auth.example/api/";

/// Builds an engine over `transport` and `store` with a zero refresh jitter.
pub fn engine_over(
	transport: LoopbackTransport,
	store: Arc<dyn KeyValueStore>,
	navigator: Arc<MemoryNavigator>,
) -> SessionEngine {
	let config = ClientConfig::builder()
		.base_url(Url::parse(BASE_URL).expect("Base URL fixture should parse."))
		.refresh_jitter(time::Duration::ZERO)
		.build()
		.expect("Client config should build.");

	SessionEngine::builder(config)
		.transport(transport)
		.store(store)
		.navigator(navigator)
		.build()
		.expect("Session engine should build.")
}

/// Loopback transport answering every request with `route(path, body)` as `200` JSON.
pub fn scripted<F>(route: F) -> LoopbackTransport
where
	F: 'static + Send + Sync + Fn(&str, &Value) -> Value,
{
	let route = Arc::new(route);

	LoopbackTransport::new(move |request: TransportRequest| {
		let answer = route(request.url.path(), &body(&request));

		async move { Ok(TransportResponse::json(200, &answer)) }
	})
}

pub fn body(request: &TransportRequest) -> Value {
	request
		.body
		.as_deref()
		.map(|raw| serde_json::from_slice(raw).expect("Request body should be JSON."))
		.unwrap_or(Value::Null)
}

pub fn navigator_at(url: &str) -> Arc<MemoryNavigator> {
	Arc::new(MemoryNavigator::at(Url::parse(url).expect("Navigator URL fixture should parse.")))
}

pub fn record(engine: &SessionEngine, kind: EventKind) -> Arc<Mutex<Vec<SessionEvent>>> {
	let seen = Arc::new(Mutex::new(Vec::new()));
	let sink = seen.clone();
	let listener: Listener = Arc::new(move |event: &SessionEvent| sink.lock().push(event.clone()));

	engine.on(kind, &listener);

	seen
}

/// Yields until `condition` holds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
	for _ in 0..1_000 {
		if condition() {
			return;
		}

		tokio::task::yield_now().await;
	}

	panic!("Condition should hold eventually.");
}

/// Yields until the engine has no queued or running operation.
pub async fn settle(engine: &SessionEngine) {
	eventually(|| !engine.is_loading()).await;
}
