mod common;

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use authdeck::{
	error::{BoxError, ConfigError, Error},
	model::{Action, Authorization, Component, InputType, RefreshStrategy},
	server::{
		AuthenticationOutcome, Context, StoreCapability, Strategy, StrategyFuture, StrategyRegistry,
		UnauthenticateCapability,
	},
	url::Url,
};
use parking_lot::Mutex;
use serde_json::{Value, json};

/// Accepts `{user}` payloads; counts every probe.
#[derive(Default)]
struct Password {
	probes: Arc<AtomicUsize>,
}
impl Strategy<String> for Password {
	fn authenticate<'a>(
		&'a self,
		context: &'a Context,
	) -> StrategyFuture<'a, Option<AuthenticationOutcome<String>>> {
		Box::pin(async move {
			self.probes.fetch_add(1, Ordering::SeqCst);

			let Some(user) = context.payload.get("user").and_then(Value::as_str) else {
				return Ok(None);
			};

			Ok(Some(AuthenticationOutcome::done(user.to_owned())))
		})
	}

	fn label(&self) -> Option<String> {
		Some("Username & password".into())
	}
}

/// Accepts `{token}` payloads and supports both optional capabilities.
#[derive(Default)]
struct Token {
	probes: Arc<AtomicUsize>,
	stored: Mutex<Vec<String>>,
	revoked: Mutex<Vec<Value>>,
}
impl Strategy<String> for Token {
	fn authenticate<'a>(
		&'a self,
		context: &'a Context,
	) -> StrategyFuture<'a, Option<AuthenticationOutcome<String>>> {
		Box::pin(async move {
			self.probes.fetch_add(1, Ordering::SeqCst);

			match context.payload.get("token").and_then(Value::as_str) {
				Some("bad") => Err(BoxError::from("token signature mismatch")),
				Some(token) => Ok(Some(AuthenticationOutcome::done(format!("owner-of-{token}")))),
				None => Ok(None),
			}
		})
	}

	fn action(&self) -> Option<Action> {
		Some(Action::redirect("https://idp.example/authorize"))
	}

	fn store_capability(&self) -> Option<&dyn StoreCapability<String>> {
		Some(self)
	}

	fn unauthenticate_capability(&self) -> Option<&dyn UnauthenticateCapability> {
		Some(self)
	}
}
impl StoreCapability<String> for Token {
	fn store<'a>(&'a self, _: &'a Context, user: &'a String) -> StrategyFuture<'a, ()> {
		Box::pin(async move {
			self.stored.lock().push(user.clone());

			Ok(())
		})
	}
}
impl UnauthenticateCapability for Token {
	fn unauthenticate<'a>(&'a self, context: &'a Context) -> StrategyFuture<'a, ()> {
		Box::pin(async move {
			self.revoked.lock().push(context.payload.clone());

			Ok(())
		})
	}
}

fn registry() -> (StrategyRegistry<String>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
	let password = Password::default();
	let token = Token::default();
	let (password_probes, token_probes) = (password.probes.clone(), token.probes.clone());
	let mut registry = StrategyRegistry::new();

	registry.register("password", password).expect("Password registration should succeed.");
	registry.register("token", token).expect("Token registration should succeed.");

	(registry, password_probes, token_probes)
}

#[test]
fn blank_names_are_rejected() {
	let mut registry = StrategyRegistry::<String>::new();
	let err = registry.register("  ", Password::default()).expect_err("Blank name should fail.");

	assert!(matches!(err, Error::InvalidRegistration { .. }));
	assert!(matches!(registry.list_strategies(), Err(Error::NoPrimaryStrategy)));
}

#[test]
fn first_registered_is_primary_and_replacement_keeps_position() {
	let (mut registry, _, _) = registry();

	registry.register("password", Password::default()).expect("Replacement should succeed.");

	assert_eq!(registry.primary(), Some("password"));
	assert_eq!(registry.names().collect::<Vec<_>>(), ["password", "token"]);
	assert!(matches!(
		registry.set_primary("missing"),
		Err(Error::UnknownStrategy { name }) if name == "missing"
	));

	registry.set_primary("token").expect("Known strategy should become primary.");

	assert_eq!(registry.primary(), Some("token"));
}

#[test]
fn listing_uses_labels_actions_and_secondary() {
	let (mut registry, _, _) = registry();

	registry.set_secondary(["token", "ghost"]);

	let listing = registry.list_strategies().expect("Listing should succeed.");

	assert_eq!(
		serde_json::to_value(&listing).expect("Listing should serialize."),
		json!({
			"ok": true,
			"primary": "password",
			"secondary": ["token", "ghost"],
			"strategies": [
				{ "name": "password", "label": "Username & password" },
				{
					"name": "token",
					"label": "token",
					"action": { "type": "redirect", "url": "https://idp.example/authorize" }
				}
			]
		})
	);
}

#[tokio::test]
async fn unnamed_dispatch_probes_in_registration_order() {
	let (registry, password_probes, token_probes) = registry();
	let outcome = registry
		.dispatch(&Context::programmatic(None, json!({ "token": "t1" })))
		.await
		.expect("Dispatch should succeed.")
		.expect("Token strategy should apply.");

	assert_eq!(outcome.user.as_deref(), Some("owner-of-t1"));
	assert_eq!(password_probes.load(Ordering::SeqCst), 1);
	assert_eq!(token_probes.load(Ordering::SeqCst), 1);

	let first = registry
		.dispatch(&Context::programmatic(None, json!({ "user": "ada", "token": "t1" })))
		.await
		.expect("Dispatch should succeed.")
		.expect("Password strategy should apply.");

	assert_eq!(first.user.as_deref(), Some("ada"));
	assert_eq!(token_probes.load(Ordering::SeqCst), 1);

	let none = registry
		.dispatch(&Context::programmatic(None, json!({})))
		.await
		.expect("Dispatch should succeed.");

	assert!(none.is_none());
}

#[tokio::test]
async fn named_dispatch_targets_one_strategy() {
	let (registry, password_probes, _) = registry();
	let outcome =
		registry.authenticate("token", json!({ "user": "ada" })).await.expect("Dispatch should succeed.");

	assert!(outcome.is_none());
	assert_eq!(password_probes.load(Ordering::SeqCst), 0);
	assert!(matches!(
		registry.authenticate("missing", Value::Null).await,
		Err(Error::UnknownStrategy { .. })
	));

	let err = registry
		.authenticate("token", json!({ "token": "bad" }))
		.await
		.expect_err("Strategy failure should propagate.");

	assert!(matches!(err, Error::Strategy { ref strategy, .. } if strategy == "token"));
}

#[tokio::test]
async fn optional_capabilities() {
	let (registry, _, _) = registry();
	let context = Context::programmatic(Some("token"), Value::Null);

	registry.store("token", &context, &"ada".to_owned()).await.expect("Store should succeed.");
	registry
		.unauthenticate("token", json!({ "token": "t1" }))
		.await
		.expect("Unauthenticate should succeed.");
	registry
		.unauthenticate("password", Value::Null)
		.await
		.expect("Missing capability should be a no-op.");

	assert!(matches!(
		registry.store("password", &context, &"ada".to_owned()).await,
		Err(Error::UnsupportedOperation { operation: "store", .. })
	));
	assert!(matches!(
		registry.unauthenticate("missing", Value::Null).await,
		Err(Error::UnknownStrategy { .. })
	));
}

#[test]
fn callback_url_requires_redirect_target() {
	let (mut registry, _, _) = registry();

	assert!(matches!(
		registry.build_callback_url("token", Value::Null),
		Err(Error::Config(ConfigError::MissingCallbackRedirect))
	));

	registry.set_callback_redirect_url(
		Url::parse("https://app.example/login?authdeck_callback=stale&tab=2")
			.expect("Fixture URL should parse."),
	);

	let url = registry
		.build_callback_url("token", json!({ "token": "t1" }))
		.expect("Callback URL should build.");
	let pairs: Vec<_> = url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();

	assert_eq!(pairs.len(), 2);
	assert_eq!(pairs[0], ("tab".to_owned(), "2".to_owned()));
	assert_eq!(
		serde_json::from_str::<Value>(&pairs[1].1).expect("Callback should be JSON."),
		json!({ "name": "token", "payload": { "token": "t1" } })
	);
}

#[test]
fn user_result_applies_display_hook() {
	let (mut registry, _, _) = registry();
	let ada = "ada".to_owned();

	assert_eq!(registry.user_result(Some(&ada)).expect("User result should build.").user, Some(json!("ada")));

	registry.set_display_user(|user: &String| json!({ "displayName": user.to_uppercase() }));

	let result = registry.user_result(Some(&ada)).expect("User result should build.");

	assert_eq!(result.user, Some(json!({ "displayName": "ADA" })));
	assert!(registry.user_result(None).expect("Empty result should build.").user.is_none());
}

/// Two-step strategy: asks for a code, then verifies it against the echoed state.
struct Otp;
impl Strategy<String> for Otp {
	fn authenticate<'a>(
		&'a self,
		context: &'a Context,
	) -> StrategyFuture<'a, Option<AuthenticationOutcome<String>>> {
		Box::pin(async move {
			let payload = &context.payload;

			match (payload.get("state").and_then(Value::as_str), payload.get("code")) {
				(Some("otp-1"), Some(code)) if code == "123456" => Ok(Some(
					AuthenticationOutcome::done("ada".to_owned())
						.with_expires_at(time::OffsetDateTime::now_utc() + time::Duration::hours(1))
						.with_refresh_strategy(RefreshStrategy::new("otp", json!({ "renew": true }))),
				)),
				_ => Ok(Some(
					AuthenticationOutcome::pending().with_state("otp-1").with_action(Action::render([
						Component::input("code", "code", InputType::Text, "One-time code"),
						Component::submit("verify", "Verify"),
					])),
				)),
			}
		})
	}
}

#[tokio::test]
async fn client_and_registry_complete_a_multi_step_exchange() {
	let mut registry = StrategyRegistry::<String>::new();

	registry.register("otp", Otp).expect("Registration should succeed.");

	let registry = Arc::new(registry);
	let sessions = Arc::new(AtomicUsize::new(0));
	let transport = authdeck::http::LoopbackTransport::new(move |request| {
		let registry = registry.clone();
		let sessions = sessions.clone();

		async move {
			let path = request.url.path().trim_start_matches("/api/").to_owned();
			let answer = match path.as_str() {
				"strategies" => serde_json::to_value(registry.list_strategies()?)?,
				"user" => {
					let user = request
						.header("authorization")
						.and_then(Authorization::from_header_value)
						.map(|_| "ada".to_owned());

					serde_json::to_value(registry.user_result(user.as_ref())?)?
				},
				"unauthenticate" => Value::Null,
				_ => {
					let name = path.trim_start_matches("authenticate/");
					let payload = common::body(&request);
					let result = match registry.authenticate(name, payload).await? {
						Some(outcome) => {
							let issued = outcome.done.then(|| {
								let id = sessions.fetch_add(1, Ordering::SeqCst);

								Authorization::new("Bearer", format!("session-{id}"))
							});

							outcome.into_result(issued)
						},
						None => registry.error_result("Invalid credentials."),
					};

					serde_json::to_value(result)?
				},
			};

			Ok::<_, authdeck::http::TransportFailure>(authdeck::http::TransportResponse::json(
				200, &answer,
			))
		}
	});
	let engine = common::engine_over(
		transport.clone(),
		Arc::new(authdeck::store::MemoryStore::default()),
		common::navigator_at("https://app.example/"),
	);
	let renders = common::record(&engine, authdeck::client::EventKind::Render);

	engine.bootstrap().await.expect("Bootstrap should succeed.");

	let challenge = engine.authenticate("otp", None).await.expect("Challenge should succeed.");

	assert_eq!(challenge.done, Some(false));
	assert_eq!(renders.lock().len(), 1);
	assert!(engine.authorization().is_none());

	engine
		.authenticate("otp", Some(json!({ "code": "123456" })))
		.await
		.expect("Verification should succeed.");
	common::settle(&engine).await;

	assert_eq!(engine.authorization_header().as_deref(), Some("Bearer session-0"));
	assert_eq!(engine.user(), Some(json!("ada")));
	assert!(engine.continuation_state().is_none());
	assert!(engine.is_refresh_armed());
}
