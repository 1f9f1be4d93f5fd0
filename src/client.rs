//! Client session engine.
//!
//! [`SessionEngine`] owns the session's authorization, continuation state, cached user, and
//! sorted strategy list. Every operation that talks to the server goes through one FIFO
//! [`OperationQueue`], so at most one request is in flight and responses are applied in the order
//! the operations were issued. Whenever the authorization changes the engine re-plans its single
//! refresh timer and refreshes the cached user.
//!
//! ```no_run
//! use authdeck::client::{ClientConfig, SessionEngine};
//!
//! # async fn demo() -> authdeck::error::Result<()> {
//! let config = ClientConfig::new("https://app.example/api/auth/")?;
//! let engine: SessionEngine = SessionEngine::builder(config).build()?;
//!
//! engine.bootstrap().await?;
//! engine.authenticate("password", Some(serde_json::json!({ "username": "ada" }))).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod events;
pub mod navigator;
pub mod queue;
pub mod scheduler;

mod api;
mod authenticate;
mod bootstrap;
mod reaction;
mod strategies;
mod unauthenticate;
mod user;

pub use authenticate::with_continuation;
pub use config::*;
pub use events::*;
pub use navigator::{MemoryNavigator, Navigator};
pub use queue::OperationQueue;
pub use strategies::display_order;

// std
use std::marker::PhantomData;
// crates.io
use serde::de::DeserializeOwned;
use tokio::{task::JoinHandle, time::Instant};
// self
use crate::{
	_prelude::*,
	client::{
		api::ApiClient,
		scheduler::{Jitter, RefreshScheduler},
	},
	http::AuthTransport,
	model::{AuthResult, Authorization, StrategiesResult, StrategyInfo},
	obs::OperationKind,
	store::{CredentialStore, KeyValueStore, MemoryStore},
};

/// Boxed future used where engine operations spawn one another.
pub type OperationFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a + Send>>;

/// Bounds required of the user type decoded from `./user`.
pub trait SessionUser
where
	Self: 'static + Clone + Debug + Send + Sync + DeserializeOwned,
{
}
impl<T> SessionUser for T where T: 'static + Clone + Debug + Send + Sync + DeserializeOwned {}

/// Client half of the protocol.
///
/// Cloning is cheap and every clone drives the same session.
pub struct SessionEngine<U = Value> {
	inner: Arc<EngineInner<U>>,
}
impl<U> SessionEngine<U>
where
	U: SessionUser,
{
	/// Starts building an engine for `config`.
	pub fn builder(config: ClientConfig) -> SessionEngineBuilder<U> {
		SessionEngineBuilder::new(config)
	}

	/// Consumes a pending callback or restores the stored session, starts cross-context sync,
	/// then loads the strategy listing.
	pub async fn bootstrap(&self) -> Result<StrategiesResult> {
		self.inner.bootstrap().await
	}

	/// Reloads and re-sorts the strategy listing.
	pub async fn update_strategies(&self) -> Result<StrategiesResult> {
		self.inner.update_strategies().await
	}

	/// Runs one step of `name`, echoing the continuation state when the strategy is unchanged.
	pub async fn authenticate(&self, name: &str, payload: Option<Value>) -> Result<AuthResult> {
		let ticket = self.inner.queue.ticket();

		self.inner
			.clone()
			.authenticate_queued(ticket, name.to_owned(), payload, OperationKind::Authenticate)
			.await
	}

	/// Logs out. A no-op without an authorization.
	pub async fn unauthenticate(&self) -> Result<()> {
		self.inner.unauthenticate().await
	}

	/// Refreshes the cached user from `./user`.
	pub async fn update_user(&self) -> Result<()> {
		self.inner.update_user_queued().await
	}

	/// Cached user, if the session is bound to one.
	pub fn user(&self) -> Option<U> {
		self.inner.state.lock().user.clone()
	}

	/// Strategies in display order.
	pub fn strategies(&self) -> Vec<StrategyInfo> {
		self.inner.state.lock().strategies.clone()
	}

	/// Current authorization.
	pub fn authorization(&self) -> Option<Authorization> {
		self.inner.state.lock().authorization.clone()
	}

	/// Continuation state held for the next step of the last strategy.
	pub fn continuation_state(&self) -> Option<String> {
		self.inner.state.lock().continuation.clone()
	}

	/// Strategy used by the most recent authenticate call.
	pub fn last_strategy(&self) -> Option<String> {
		self.inner.state.lock().last_strategy.clone()
	}

	/// `true` while any operation is queued or running.
	pub fn is_loading(&self) -> bool {
		self.inner.queue.is_busy()
	}

	/// `authorization` header value for host requests.
	pub fn authorization_header(&self) -> Option<String> {
		self.inner.state.lock().authorization.as_ref().and_then(Authorization::header_value)
	}

	/// Headers a host should attach to its own API requests.
	pub fn request_headers(&self) -> Vec<(String, String)> {
		self.authorization_header()
			.map(|value| ("authorization".to_owned(), value))
			.into_iter()
			.collect()
	}

	/// `true` while a refresh timer is pending.
	pub fn is_refresh_armed(&self) -> bool {
		self.inner.scheduler.is_armed()
	}

	/// Instant the pending refresh timer fires at.
	pub fn refresh_deadline(&self) -> Option<Instant> {
		self.inner.scheduler.deadline()
	}

	/// Registers a listener; registering the same listener twice is a no-op.
	pub fn on(&self, kind: EventKind, listener: &Listener) -> bool {
		self.inner.events.on(kind, listener)
	}

	/// Removes a listener.
	pub fn off(&self, kind: EventKind, listener: &Listener) -> bool {
		self.inner.events.off(kind, listener)
	}
}
impl<U> Clone for SessionEngine<U> {
	fn clone(&self) -> Self {
		Self { inner: self.inner.clone() }
	}
}
impl<U> Debug for SessionEngine<U>
where
	U: Debug,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.inner.state.lock();

		f.debug_struct("SessionEngine")
			.field("api", &self.inner.api)
			.field("authenticated", &state.authorization.is_some())
			.field("user", &state.user)
			.field("busy", &self.inner.queue.is_busy())
			.finish()
	}
}

/// Builder for [`SessionEngine`].
pub struct SessionEngineBuilder<U = Value> {
	config: ClientConfig,
	transport: Option<Arc<dyn AuthTransport>>,
	store: Option<Arc<dyn KeyValueStore>>,
	navigator: Option<Arc<dyn Navigator>>,
	_user: PhantomData<fn() -> U>,
}
impl<U> SessionEngineBuilder<U>
where
	U: SessionUser,
{
	/// Creates a builder; unset collaborators fall back to defaults in [`Self::build`].
	pub fn new(config: ClientConfig) -> Self {
		Self { config, transport: None, store: None, navigator: None, _user: PhantomData }
	}

	/// Uses `transport` for every request.
	pub fn transport(mut self, transport: impl AuthTransport) -> Self {
		self.transport = Some(Arc::new(transport));

		self
	}

	/// Persists credentials in `store` (defaults to a private [`MemoryStore`]).
	pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
		self.store = Some(store);

		self
	}

	/// Routes location reads and navigation through `navigator` (defaults to an empty
	/// [`MemoryNavigator`]).
	pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
		self.navigator = Some(navigator);

		self
	}

	/// Builds the engine. Nothing runs until [`SessionEngine::bootstrap`].
	pub fn build(self) -> Result<SessionEngine<U>> {
		let transport = match self.transport {
			Some(transport) => transport,
			None => default_transport()?,
		};
		let store = self.store.unwrap_or_else(|| Arc::new(MemoryStore::default()));
		let navigator = self.navigator.unwrap_or_else(|| Arc::new(MemoryNavigator::default()));
		let events = Arc::new(EventHub::default());
		let busy_events = events.clone();
		let queue = Arc::new(OperationQueue::with_observer(Arc::new(move |busy| {
			busy_events.emit(&SessionEvent::LoadingStateChange { busy });
		})));
		let inner = EngineInner {
			credentials: CredentialStore::new(store, self.config.prefix.clone()),
			jitter: Jitter::new(self.config.refresh_jitter),
			api: ApiClient::new(self.config, transport),
			navigator,
			queue,
			scheduler: RefreshScheduler::default(),
			events,
			state: Mutex::new(SessionState::default()),
			watcher: Mutex::new(None),
		};

		tracing::debug!(base_url = %inner.api.config().base_url, "Session engine built.");

		Ok(SessionEngine { inner: Arc::new(inner) })
	}
}
impl<U> Debug for SessionEngineBuilder<U> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionEngineBuilder")
			.field("config", &self.config)
			.field("transport", &self.transport.is_some())
			.field("store", &self.store.is_some())
			.field("navigator", &self.navigator.is_some())
			.finish()
	}
}

#[cfg(feature = "reqwest")]
fn default_transport() -> Result<Arc<dyn AuthTransport>> {
	Ok(Arc::new(crate::http::ReqwestTransport::new()?))
}
#[cfg(not(feature = "reqwest"))]
fn default_transport() -> Result<Arc<dyn AuthTransport>> {
	Err(crate::error::ConfigError::MissingTransport.into())
}

struct SessionState<U> {
	authorization: Option<Authorization>,
	continuation: Option<String>,
	last_strategy: Option<String>,
	user: Option<U>,
	strategies: Vec<StrategyInfo>,
}
impl<U> Default for SessionState<U> {
	fn default() -> Self {
		Self {
			authorization: None,
			continuation: None,
			last_strategy: None,
			user: None,
			strategies: Vec::new(),
		}
	}
}

struct EngineInner<U> {
	api: ApiClient,
	credentials: CredentialStore,
	navigator: Arc<dyn Navigator>,
	queue: Arc<OperationQueue>,
	scheduler: RefreshScheduler,
	events: Arc<EventHub>,
	jitter: Jitter,
	state: Mutex<SessionState<U>>,
	watcher: Mutex<Option<JoinHandle<()>>>,
}
impl<U> Drop for EngineInner<U> {
	fn drop(&mut self) {
		if let Some(watcher) = self.watcher.get_mut().take() {
			watcher.abort();
		}

		self.scheduler.cancel();
	}
}
