//! Capability-tagged strategy contract.
//!
//! Every strategy can authenticate. Persisting a session and tearing one down are optional
//! capabilities, exposed through [`Strategy::store_capability`] and
//! [`Strategy::unauthenticate_capability`] so the registry can tell "unsupported" apart from
//! "did nothing".

// self
use crate::{
	_prelude::*,
	error::BoxError,
	model::{Action, AuthResult, Authorization, RefreshStrategy},
	server::Context,
};

/// Boxed future returned by strategy hooks.
pub type StrategyFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BoxError>> + 'a + Send>>;

/// Pluggable verification method registered under a name.
pub trait Strategy<U>
where
	Self: Send + Sync,
{
	/// Attempts to authenticate `context`.
	///
	/// `None` means the strategy does not apply; unnamed dispatch then probes the next one.
	fn authenticate<'a>(
		&'a self,
		context: &'a Context,
	) -> StrategyFuture<'a, Option<AuthenticationOutcome<U>>>;

	/// Inline action advertised in the listing so clients can skip a round trip.
	fn action(&self) -> Option<Action> {
		None
	}

	/// Display label; the registry falls back to the strategy name.
	fn label(&self) -> Option<String> {
		None
	}

	/// Session persistence, if supported.
	fn store_capability(&self) -> Option<&dyn StoreCapability<U>> {
		None
	}

	/// Session teardown, if supported.
	fn unauthenticate_capability(&self) -> Option<&dyn UnauthenticateCapability> {
		None
	}
}

/// Persists a verified user into a session.
pub trait StoreCapability<U>
where
	Self: Send + Sync,
{
	/// Stores `user` for `context`.
	fn store<'a>(&'a self, context: &'a Context, user: &'a U) -> StrategyFuture<'a, ()>;
}

/// Destroys whatever a strategy issued.
pub trait UnauthenticateCapability
where
	Self: Send + Sync,
{
	/// Tears down the session described by `context`'s payload.
	fn unauthenticate<'a>(&'a self, context: &'a Context) -> StrategyFuture<'a, ()>;
}

/// Result of one authenticate step.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthenticationOutcome<U> {
	/// Whether the exchange is complete.
	pub done: bool,
	/// Client effect for this step.
	pub action: Option<Action>,
	/// Opaque continuation state for the next step.
	pub state: Option<String>,
	/// Verified user, once known.
	pub user: Option<U>,
	/// Expiry of the session this outcome establishes.
	pub expires_at: Option<OffsetDateTime>,
	/// Descriptor the client should use to renew the session.
	pub refresh_strategy: Option<RefreshStrategy>,
	/// Strategy hint that the host should renew the session it issues for this outcome.
	///
	/// The registry never acts on it and it is not part of the wire result; hosts read it before
	/// calling [`AuthenticationOutcome::into_result`].
	pub is_refresh_needed: bool,
}
impl<U> AuthenticationOutcome<U> {
	/// Completed exchange for `user`.
	pub fn done(user: U) -> Self {
		Self { done: true, user: Some(user), ..Self::pending() }
	}

	/// Incomplete exchange with no effect yet.
	pub fn pending() -> Self {
		Self {
			done: false,
			action: None,
			state: None,
			user: None,
			expires_at: None,
			refresh_strategy: None,
			is_refresh_needed: false,
		}
	}

	/// Attaches a client action.
	pub fn with_action(mut self, action: Action) -> Self {
		self.action = Some(action);

		self
	}

	/// Attaches continuation state.
	pub fn with_state(mut self, state: impl Into<String>) -> Self {
		self.state = Some(state.into());

		self
	}

	/// Sets the session expiry.
	pub fn with_expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets the refresh descriptor.
	pub fn with_refresh_strategy(mut self, descriptor: RefreshStrategy) -> Self {
		self.refresh_strategy = Some(descriptor);

		self
	}

	/// Sets [`AuthenticationOutcome::is_refresh_needed`].
	pub fn refresh_needed(mut self) -> Self {
		self.is_refresh_needed = true;

		self
	}

	/// Converts the outcome into the wire result, attaching the host-issued `authorization`.
	///
	/// The authorization inherits the outcome's expiry unless it carries its own.
	pub fn into_result(self, authorization: Option<Authorization>) -> AuthResult {
		let expires_at = self.expires_at;
		let authorization = authorization.map(|mut authorization| {
			authorization.expires_at = authorization.expires_at.or(expires_at);

			authorization
		});

		AuthResult {
			ok: true,
			done: Some(self.done),
			error: None,
			action: self.action,
			authorization,
			state: self.state,
			refresh_strategy: self.refresh_strategy,
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn into_result_carries_expiry_onto_authorization() {
		let expires_at = datetime!(2025-11-10 12:00:00 UTC);
		let outcome = AuthenticationOutcome::done("ada")
			.with_expires_at(expires_at)
			.with_refresh_strategy(RefreshStrategy::new("refresh", json!({ "token": "r1" })));
		let result = outcome.into_result(Some(Authorization::new("Bearer", "s1")));
		let authorization = result.authorization.expect("Authorization should be attached.");

		assert!(result.ok);
		assert_eq!(result.done, Some(true));
		assert_eq!(authorization.expires_at, Some(expires_at));
		assert_eq!(result.refresh_strategy.map(|d| d.name), Some("refresh".into()));
	}

	#[test]
	fn refresh_hint_stays_with_the_host() {
		let outcome = AuthenticationOutcome::done("ada").refresh_needed();

		assert!(outcome.is_refresh_needed);
		assert!(!AuthenticationOutcome::done("ada").is_refresh_needed);

		let wire = serde_json::to_value(outcome.into_result(None))
			.expect("Outcome result should serialize.");

		assert_eq!(wire, json!({ "ok": true, "done": true }));
	}

	#[test]
	fn pending_outcome_keeps_state_and_action() {
		let outcome = AuthenticationOutcome::<()>::pending()
			.with_state("step-2")
			.with_action(Action::redirect("https://idp.example/authorize"));
		let result = outcome.into_result(None);

		assert_eq!(result.done, Some(false));
		assert_eq!(result.state.as_deref(), Some("step-2"));
		assert!(result.authorization.is_none());
		assert!(matches!(result.action, Some(Action::Redirect { .. })));
	}
}
