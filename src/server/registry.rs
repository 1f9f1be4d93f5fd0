//! Named strategy registry and the dispatch protocol.

// self
use crate::{
	_prelude::*,
	client::navigator::{CALLBACK_PARAM, strip_callback},
	error::ConfigError,
	model::{AuthResult, CallbackRequest, StrategiesResult, StrategyInfo, UserResult},
	obs::{self, OperationKind},
	server::{AuthenticationOutcome, Context, Strategy},
};

/// Projection applied to users before they are returned by `./user`.
pub type DisplayUser<U> = Arc<dyn Fn(&U) -> Value + Send + Sync>;

/// Registry of named strategies.
///
/// Configure it once at startup (`&mut self` methods), then share it (`Arc`) for dispatch.
pub struct StrategyRegistry<U> {
	strategies: Vec<(String, Arc<dyn Strategy<U>>)>,
	primary: Option<String>,
	secondary: Vec<String>,
	callback_redirect_url: Option<Url>,
	display_user: Option<DisplayUser<U>>,
}
impl<U> StrategyRegistry<U>
where
	U: 'static + Send + Sync,
{
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self {
			strategies: Vec::new(),
			primary: None,
			secondary: Vec::new(),
			callback_redirect_url: None,
			display_user: None,
		}
	}

	/// Registers `strategy` under `name`.
	///
	/// Re-registering a name replaces the strategy in place, keeping its listing position. The
	/// first registered strategy becomes the primary one.
	pub fn register<S>(&mut self, name: impl Into<String>, strategy: S) -> Result<()>
	where
		S: 'static + Strategy<U>,
	{
		let name = name.into();

		if name.trim().is_empty() {
			return Err(Error::InvalidRegistration { reason: "strategy must have a name".into() });
		}

		let strategy: Arc<dyn Strategy<U>> = Arc::new(strategy);

		match self.strategies.iter_mut().find(|(existing, _)| *existing == name) {
			Some((_, slot)) => *slot = strategy,
			None => self.strategies.push((name.clone(), strategy)),
		}

		if self.primary.is_none() {
			self.primary = Some(name);
		}

		Ok(())
	}

	/// Promotes a registered strategy to primary.
	pub fn set_primary(&mut self, name: &str) -> Result<()> {
		self.lookup(name)?;
		self.primary = Some(name.to_owned());

		Ok(())
	}

	/// Declares secondary strategies in preference order. Unknown names are tolerated; clients
	/// skip them when sorting.
	pub fn set_secondary<I, S>(&mut self, names: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.secondary = names.into_iter().map(Into::into).collect();
	}

	/// Sets the URL external providers redirect back to.
	pub fn set_callback_redirect_url(&mut self, url: Url) {
		self.callback_redirect_url = Some(url);
	}

	/// Sets the projection used by [`Self::user_result`].
	pub fn set_display_user<F>(&mut self, display: F)
	where
		F: 'static + Send + Sync + Fn(&U) -> Value,
	{
		self.display_user = Some(Arc::new(display));
	}

	/// Current primary strategy name.
	pub fn primary(&self) -> Option<&str> {
		self.primary.as_deref()
	}

	/// Registered names in registration order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.strategies.iter().map(|(name, _)| name.as_str())
	}

	/// Builds the callback URL that hands `{name, payload}` back to the client.
	pub fn build_callback_url(&self, name: &str, payload: Value) -> Result<Url> {
		let base = self.callback_redirect_url.as_ref().ok_or(ConfigError::MissingCallbackRedirect)?;
		let callback = serde_json::to_string(&CallbackRequest { name: name.to_owned(), payload })
			.map_err(ConfigError::from)?;
		let mut url = strip_callback(base);

		url.query_pairs_mut().append_pair(CALLBACK_PARAM, &callback);

		Ok(url)
	}

	/// Routes `context` to a strategy.
	///
	/// A named context goes to that strategy only. An unnamed context probes every strategy
	/// in registration order and the first outcome wins.
	pub async fn dispatch(&self, context: &Context) -> Result<Option<AuthenticationOutcome<U>>> {
		obs::observe(OperationKind::Dispatch, "dispatch", async {
			if let Some(name) = context.strategy_name.as_deref() {
				return self.run(name, self.lookup(name)?, context).await;
			}

			for (name, strategy) in &self.strategies {
				tracing::trace!(strategy = %name, "Probing strategy.");

				if let Some(outcome) = self.run(name, strategy, context).await? {
					return Ok(Some(outcome));
				}
			}

			Ok(None)
		})
		.await
	}

	/// Authenticates programmatically against `name`.
	pub async fn authenticate(
		&self,
		name: &str,
		payload: Value,
	) -> Result<Option<AuthenticationOutcome<U>>> {
		self.dispatch(&Context::programmatic(Some(name), payload)).await
	}

	/// Tears down what `name` issued; strategies without the capability do nothing.
	pub async fn unauthenticate(&self, name: &str, payload: Value) -> Result<()> {
		let strategy = self.lookup(name)?;
		let Some(capability) = strategy.unauthenticate_capability() else {
			tracing::debug!(strategy = name, "Strategy has no unauthenticate capability.");

			return Ok(());
		};
		let context = Context::programmatic(Some(name), payload);

		obs::observe(OperationKind::Dispatch, "unauthenticate", async {
			capability.unauthenticate(&context).await.map_err(|source| Error::Strategy {
				strategy: name.to_owned(),
				source,
			})
		})
		.await
	}

	/// Persists `user` through `name`'s store capability.
	pub async fn store(&self, name: &str, context: &Context, user: &U) -> Result<()> {
		let strategy = self.lookup(name)?;
		let capability = strategy.store_capability().ok_or_else(|| {
			Error::UnsupportedOperation { strategy: name.to_owned(), operation: "store" }
		})?;

		obs::observe(OperationKind::Store, "store", async {
			capability
				.store(context, user)
				.await
				.map_err(|source| Error::Strategy { strategy: name.to_owned(), source })
		})
		.await
	}

	/// Public listing served by `./strategies`.
	pub fn list_strategies(&self) -> Result<StrategiesResult> {
		let primary = self
			.primary
			.as_deref()
			.filter(|name| self.lookup(name).is_ok())
			.ok_or(Error::NoPrimaryStrategy)?;
		let strategies = self
			.strategies
			.iter()
			.map(|(name, strategy)| StrategyInfo {
				name: name.clone(),
				label: strategy.label().unwrap_or_else(|| name.clone()),
				action: strategy.action(),
			})
			.collect();

		Ok(StrategiesResult {
			ok: true,
			error: None,
			primary: primary.to_owned(),
			secondary: (!self.secondary.is_empty()).then(|| self.secondary.clone()),
			strategies,
		})
	}

	/// Canonical inline error result.
	pub fn error_result(&self, text: impl Into<String>) -> AuthResult {
		AuthResult::error(text)
	}

	fn lookup(&self, name: &str) -> Result<&Arc<dyn Strategy<U>>> {
		self.strategies
			.iter()
			.find(|(existing, _)| existing == name)
			.map(|(_, strategy)| strategy)
			.ok_or_else(|| Error::UnknownStrategy { name: name.to_owned() })
	}

	async fn run(
		&self,
		name: &str,
		strategy: &Arc<dyn Strategy<U>>,
		context: &Context,
	) -> Result<Option<AuthenticationOutcome<U>>> {
		strategy
			.authenticate(context)
			.await
			.map_err(|source| Error::Strategy { strategy: name.to_owned(), source })
	}
}
impl<U> StrategyRegistry<U>
where
	U: 'static + Send + Sync + Serialize,
{
	/// Body served by `./user`, projected through the display hook when one is set.
	pub fn user_result(&self, user: Option<&U>) -> Result<UserResult> {
		let user = match (user, &self.display_user) {
			(None, _) => None,
			(Some(user), Some(display)) => Some(display(user)),
			(Some(user), None) => Some(serde_json::to_value(user).map_err(ConfigError::from)?),
		};

		Ok(UserResult { ok: true, error: None, user })
	}
}
impl<U> Default for StrategyRegistry<U>
where
	U: 'static + Send + Sync,
{
	fn default() -> Self {
		Self::new()
	}
}
impl<U> Debug for StrategyRegistry<U> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StrategyRegistry")
			.field("strategies", &self.strategies.iter().map(|(name, _)| name).collect::<Vec<_>>())
			.field("primary", &self.primary)
			.field("secondary", &self.secondary)
			.field("callback_redirect_url", &self.callback_redirect_url)
			.finish()
	}
}
