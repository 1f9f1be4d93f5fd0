//! Authenticate steps, multi-step continuation, and refresh cycles.

// crates.io
use serde_json::Map;
// self
use super::{EngineInner, OperationFuture, SessionUser};
use crate::{
	_prelude::*,
	client::{SessionEvent, queue::Ticket},
	model::{Action, AuthResult, Authorization},
	obs::{self, OperationKind},
};

pub(super) const AUTHENTICATE_FAILED: &str = "Unable to complete authentication.";

/// Builds the outgoing payload for a step, echoing the continuation `state` if one is held.
///
/// Object payloads are merged over `{state}` so caller fields win; a missing or `null` payload
/// becomes `{state}`; any other payload is sent unchanged. `None` means the step has no body.
pub fn with_continuation(state: Option<&str>, payload: Option<Value>) -> Option<Value> {
	let Some(state) = state else {
		return payload;
	};
	let mut merged = Map::new();

	merged.insert("state".into(), Value::String(state.into()));

	let outgoing = match payload {
		None | Some(Value::Null) => Value::Object(merged),
		Some(Value::Object(fields)) => {
			merged.extend(fields);

			Value::Object(merged)
		},
		Some(other) => other,
	};

	Some(outgoing)
}

impl<U> EngineInner<U>
where
	U: SessionUser,
{
	/// Runs one authenticate step once `ticket` is served.
	pub(super) fn authenticate_queued(
		self: Arc<Self>,
		ticket: Ticket,
		name: String,
		payload: Option<Value>,
		kind: OperationKind,
	) -> OperationFuture<'static, Result<AuthResult>> {
		Box::pin(async move {
			let _permit = ticket.acquire().await;
			let result = obs::observe(kind, "authenticate", self.exchange(&name, payload)).await;

			if result.is_err() {
				self.events.emit(&SessionEvent::Error { message: AUTHENTICATE_FAILED.into() });
			}

			result
		})
	}

	/// Starts a refresh cycle from the stored descriptor, taking its queue place immediately.
	pub(super) fn start_refresh(self: &Arc<Self>) {
		let Some(descriptor) = self.credentials.refresh_strategy() else {
			tracing::debug!("No refresh strategy stored; skipping refresh.");

			return;
		};
		let ticket = self.queue.ticket();
		let refresh = self.clone().authenticate_queued(
			ticket,
			descriptor.name,
			Some(descriptor.payload),
			OperationKind::Refresh,
		);

		tokio::spawn(async move {
			if let Err(e) = refresh.await {
				tracing::warn!(error = %e, "Background refresh failed.");
			}
		});
	}

	async fn exchange(self: &Arc<Self>, name: &str, payload: Option<Value>) -> Result<AuthResult> {
		let outgoing = {
			let mut state = self.state.lock();

			if state.last_strategy.as_deref() != Some(name) {
				state.continuation = None;
			}

			state.last_strategy = Some(name.to_owned());

			with_continuation(state.continuation.as_deref(), payload)
		};
		let result = self.api.authenticate(name, outgoing.as_ref()).await?;

		self.state.lock().continuation = result.state.clone();
		self.credentials.set_refresh_strategy(result.refresh_strategy.as_ref())?;
		self.install_authorization(
			result.authorization.clone().and_then(Authorization::into_active),
		)?;

		match &result.action {
			Some(Action::Redirect { url }) => self.navigator.navigate(url),
			Some(Action::Render { payload }) =>
				self.events.emit(&SessionEvent::Render(payload.clone())),
			None => (),
		}

		Ok(result)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn payload_fields_win_over_state() {
		let merged =
			with_continuation(Some("s1"), Some(json!({ "code": "123", "state": "override" })));

		assert_eq!(merged, Some(json!({ "state": "override", "code": "123" })));
	}

	#[test]
	fn missing_payload_carries_state_alone() {
		assert_eq!(with_continuation(Some("s1"), None), Some(json!({ "state": "s1" })));
		assert_eq!(with_continuation(Some("s1"), Some(Value::Null)), Some(json!({ "state": "s1" })));
	}

	#[test]
	fn without_state_payload_is_untouched() {
		assert_eq!(with_continuation(None, None), None);
		assert_eq!(with_continuation(None, Some(Value::Null)), Some(Value::Null));
		assert_eq!(with_continuation(None, Some(json!([1, 2]))), Some(json!([1, 2])));
		assert_eq!(with_continuation(Some("s1"), Some(json!("raw"))), Some(json!("raw")));
	}
}
