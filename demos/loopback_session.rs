//! Walks a session through login, a timer-driven refresh, and logout with the strategy registry
//! and the session engine sharing one process.
//!
//! 1. Register a `password` strategy and a `session` strategy that renews what it issued.
//! 2. Serve the JSON contract from the registry through a [`LoopbackTransport`].
//! 3. Log in, wait for the refresh timer to renew the short-lived session, then log out.

// std
use std::{
	collections::HashMap,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};
// crates.io
use color_eyre::Result;
use parking_lot::Mutex;
use serde_json::{Value, json};
use time::{Duration, OffsetDateTime};
// self
use authdeck::{
	client::{ClientConfig, EventKind, Listener, SessionEngine, SessionEvent},
	http::{LoopbackTransport, TransportFailure, TransportRequest, TransportResponse},
	model::{Authorization, RefreshStrategy},
	server::{
		AuthenticationOutcome, Context, Strategy, StrategyFuture, StrategyRegistry,
		UnauthenticateCapability,
	},
};

const SESSION_TTL: Duration = Duration::seconds(2);

fn issued_for(user: &str) -> AuthenticationOutcome<String> {
	AuthenticationOutcome::done(user.to_owned())
		.with_expires_at(OffsetDateTime::now_utc() + SESSION_TTL)
		.with_refresh_strategy(RefreshStrategy::new("session", json!({ "user": user })))
}

struct Password;
impl Strategy<String> for Password {
	fn authenticate<'a>(
		&'a self,
		context: &'a Context,
	) -> StrategyFuture<'a, Option<AuthenticationOutcome<String>>> {
		Box::pin(async move {
			let field = |name: &str| context.payload.get(name).and_then(Value::as_str);

			match (field("username"), field("password")) {
				(Some(user), Some("correct horse")) => Ok(Some(issued_for(user))),
				_ => Ok(None),
			}
		})
	}

	fn label(&self) -> Option<String> {
		Some("Username & password".into())
	}
}

struct Session;
impl Strategy<String> for Session {
	fn authenticate<'a>(
		&'a self,
		context: &'a Context,
	) -> StrategyFuture<'a, Option<AuthenticationOutcome<String>>> {
		Box::pin(async move {
			Ok(context.payload.get("user").and_then(Value::as_str).map(issued_for))
		})
	}

	fn unauthenticate_capability(&self) -> Option<&dyn UnauthenticateCapability> {
		Some(self)
	}
}
impl UnauthenticateCapability for Session {
	fn unauthenticate<'a>(&'a self, context: &'a Context) -> StrategyFuture<'a, ()> {
		Box::pin(async move {
			println!("Server revoked the session described by {}.", context.payload);

			Ok(())
		})
	}
}

/// Answers the four endpoints from `registry`, tracking which user each issued credential belongs
/// to.
fn serve(registry: StrategyRegistry<String>) -> LoopbackTransport {
	let registry = Arc::new(registry);
	let issued = Arc::new(AtomicUsize::new(0));
	let sessions = Arc::new(Mutex::new(HashMap::<String, String>::new()));

	LoopbackTransport::new(move |request: TransportRequest| {
		let (registry, issued, sessions) = (registry.clone(), issued.clone(), sessions.clone());

		async move {
			let path = request.url.path().trim_start_matches("/api/").to_owned();
			let payload = match request.body.as_deref() {
				Some(raw) => serde_json::from_slice::<Value>(raw)?,
				None => Value::Null,
			};
			let answer = match path.as_str() {
				"strategies" => serde_json::to_value(registry.list_strategies()?)?,
				"user" => {
					let user = request
						.header("authorization")
						.and_then(Authorization::from_header_value)
						.and_then(|authorization| authorization.credentials)
						.and_then(|credentials| sessions.lock().get(credentials.expose()).cloned());

					serde_json::to_value(registry.user_result(user.as_ref())?)?
				},
				"unauthenticate" => {
					if let Some(descriptor) = payload.get(0).filter(|d| !d.is_null()) {
						let name = descriptor.get("name").and_then(Value::as_str).unwrap_or_default();

						registry.unauthenticate(name, descriptor["payload"].clone()).await?;
					}

					Value::Null
				},
				_ => {
					let name = path.trim_start_matches("authenticate/");
					let result = match registry.authenticate(name, payload).await? {
						Some(outcome) => {
							let authorization = outcome.user.clone().map(|user| {
								let credentials =
									format!("session-{}", issued.fetch_add(1, Ordering::SeqCst));

								sessions.lock().insert(credentials.clone(), user);

								Authorization::new("Bearer", credentials)
							});

							outcome.into_result(authorization)
						},
						None => registry.error_result("Invalid credentials."),
					};

					serde_json::to_value(result)?
				},
			};

			Ok::<_, TransportFailure>(TransportResponse::json(200, &answer))
		}
	})
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let mut registry = StrategyRegistry::new();

	registry.register("password", Password)?;
	registry.register("session", Session)?;

	let config = ClientConfig::builder()
		.base_url("https://auth.example/api/".parse()?)
		.refresh_jitter(Duration::milliseconds(500))
		.build()?;
	let engine: SessionEngine = SessionEngine::builder(config).transport(serve(registry)).build()?;
	let errors: Listener = Arc::new(|event: &SessionEvent| {
		if let SessionEvent::Error { message } = event {
			eprintln!("Session error: {message}");
		}
	});

	engine.on(EventKind::Error, &errors);

	let listing = engine.bootstrap().await?;

	println!("Primary strategy: {}.", listing.primary);

	let rejected = engine
		.authenticate("password", Some(json!({ "username": "ada", "password": "tr0ub4dor" })))
		.await?;

	println!("Wrong password answered with: {:?}.", rejected.error);

	engine
		.authenticate("password", Some(json!({ "username": "ada", "password": "correct horse" })))
		.await?;
	engine.update_user().await?;

	println!("Logged in as {:?} with {:?}.", engine.user(), engine.authorization_header());

	// The timer fires up to the jitter window before expiry; give it a margin past that.
	tokio::time::sleep((SESSION_TTL + Duration::milliseconds(250)).unsigned_abs()).await;
	engine.update_user().await?;

	println!("After the refresh timer fired: {:?}.", engine.authorization_header());

	engine.unauthenticate().await?;

	println!("Logged out; authorization is {:?}.", engine.authorization());

	Ok(())
}
