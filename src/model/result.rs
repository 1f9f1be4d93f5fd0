//! Response bodies exchanged over the JSON contract.

// self
use crate::{
	_prelude::*,
	model::{Action, Authorization, Component, InlineComponent, ParagraphMode},
};

/// Saved strategy name/payload pair used to silently renew a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefreshStrategy {
	/// Strategy to invoke.
	pub name: String,
	/// Payload forwarded verbatim.
	#[serde(default)]
	pub payload: Value,
}
impl RefreshStrategy {
	/// Creates a descriptor.
	pub fn new(name: impl Into<String>, payload: Value) -> Self {
		Self { name: name.into(), payload }
	}
}

/// Body returned by `POST ./authenticate/{name}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
	/// Whether the step succeeded.
	pub ok: bool,
	/// Whether the exchange is complete.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub done: Option<bool>,
	/// Human-readable failure message.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	/// Client effect for this step.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub action: Option<Action>,
	/// New authorization; absence clears the client's copy.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub authorization: Option<Authorization>,
	/// Opaque continuation state to echo on the next call.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state: Option<String>,
	/// Descriptor used for the next silent refresh.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_strategy: Option<RefreshStrategy>,
}
impl AuthResult {
	/// Builds the canonical inline error result: `ok=false`, the message, and a render action
	/// with one error paragraph holding one text child.
	pub fn error(text: impl Into<String>) -> Self {
		let text = text.into();
		let paragraph = Component::paragraph("error_paragraph", Some(ParagraphMode::Error), [
			InlineComponent::text("error_text", text.clone()),
		]);

		Self {
			ok: false,
			error: Some(text),
			action: Some(Action::render([paragraph])),
			..Default::default()
		}
	}
}

/// Public description of one registered strategy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyInfo {
	/// Registry key.
	pub name: String,
	/// Display label.
	pub label: String,
	/// Inline action the client may use without another round trip.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub action: Option<Action>,
}

/// Body returned by `GET ./strategies`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategiesResult {
	/// Whether the listing succeeded.
	pub ok: bool,
	/// Human-readable failure message.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	/// Primary strategy name.
	#[serde(default)]
	pub primary: String,
	/// Declared secondary strategy names, in preference order.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub secondary: Option<Vec<String>>,
	/// Every registered strategy, in registration order.
	#[serde(default)]
	pub strategies: Vec<StrategyInfo>,
}

/// Body returned by `GET ./user`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "U: Deserialize<'de>"))]
pub struct UserResult<U = Value> {
	/// Whether the lookup succeeded.
	pub ok: bool,
	/// Human-readable failure message.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	/// Materialized user; absent when the session is not (yet) bound to one.
	#[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
	pub user: Option<U>,
}

/// Pending out-of-band callback carried in the `authdeck_callback` query parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallbackRequest {
	/// Strategy to resume.
	pub name: String,
	/// Payload forwarded to the strategy.
	#[serde(default)]
	pub payload: Value,
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn error_result_renders_single_error_paragraph() {
		let value = serde_json::to_value(AuthResult::error("Invalid password."))
			.expect("Error result should serialize.");

		assert_eq!(
			value,
			json!({
				"ok": false,
				"error": "Invalid password.",
				"action": {
					"type": "render",
					"payload": [{
						"type": "paragraph",
						"id": "error_paragraph",
						"mode": "error",
						"children": [{ "type": "text", "id": "error_text", "label": "Invalid password." }]
					}]
				}
			})
		);
	}

	#[test]
	fn auth_result_tolerates_sparse_bodies() {
		let result: AuthResult =
			serde_json::from_value(json!({ "ok": true, "state": "step-2", "done": false }))
				.expect("Sparse result should decode.");

		assert_eq!(result.state.as_deref(), Some("step-2"));
		assert_eq!(result.done, Some(false));
		assert!(result.authorization.is_none());
		assert!(result.refresh_strategy.is_none());
	}

	#[test]
	fn refresh_strategy_uses_camel_case_key() {
		let result: AuthResult = serde_json::from_value(json!({
			"ok": true,
			"refreshStrategy": { "name": "refresh", "payload": { "token": "r1" } }
		}))
		.expect("Result with refresh strategy should decode.");

		assert_eq!(
			result.refresh_strategy,
			Some(RefreshStrategy::new("refresh", json!({ "token": "r1" })))
		);
	}
}
