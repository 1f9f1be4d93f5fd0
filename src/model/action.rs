//! Declarative client actions and the component tree they render.
//!
//! The server never renders UI. It returns an [`Action`] telling the host either to navigate
//! ([`Action::Redirect`]) or to display a form/message described by [`Component`] nodes
//! ([`Action::Render`]). Every node carries an `id` so hosts can key their widgets.

// self
use crate::_prelude::*;

/// Instruction returned to the client after a strategy step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Action {
	/// Display the component tree.
	Render {
		/// Top-level components, in display order.
		payload: Vec<Component>,
	},
	/// Navigate to the URL.
	Redirect {
		/// Target URL; may be relative to the host's current location.
		url: String,
	},
}
impl Action {
	/// Builds a render action from the provided components.
	pub fn render(payload: impl IntoIterator<Item = Component>) -> Self {
		Self::Render { payload: payload.into_iter().collect() }
	}

	/// Builds a redirect action.
	pub fn redirect(url: impl Into<String>) -> Self {
		Self::Redirect { url: url.into() }
	}
}

/// Renderable node of a login form description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Component {
	/// Text or password input.
	Input(InputComponent),
	/// Submit button.
	Submit(SubmitComponent),
	/// Hyperlink.
	Link(LinkComponent),
	/// Plain text run.
	Text(TextComponent),
	/// Paragraph grouping inline links and text.
	Paragraph(ParagraphComponent),
}
impl Component {
	/// Returns the node identifier.
	pub fn id(&self) -> &str {
		match self {
			Self::Input(c) => c.id.as_str(),
			Self::Submit(c) => c.id.as_str(),
			Self::Link(c) => c.id.as_str(),
			Self::Text(c) => c.id.as_str(),
			Self::Paragraph(c) => c.id.as_str(),
		}
	}

	/// Builds an input node.
	pub fn input(
		id: impl Into<String>,
		name: impl Into<String>,
		input_type: InputType,
		label: impl Into<String>,
	) -> Self {
		Self::Input(InputComponent {
			id: id.into(),
			name: name.into(),
			input_type,
			label: label.into(),
		})
	}

	/// Builds a submit node.
	pub fn submit(id: impl Into<String>, label: impl Into<String>) -> Self {
		Self::Submit(SubmitComponent { id: id.into(), label: label.into() })
	}

	/// Builds a standalone link node.
	pub fn link(id: impl Into<String>, href: impl Into<String>, label: impl Into<String>) -> Self {
		InlineComponent::link(id, href, label).into()
	}

	/// Builds a standalone text node.
	pub fn text(id: impl Into<String>, label: impl Into<String>) -> Self {
		InlineComponent::text(id, label).into()
	}

	/// Builds a paragraph node.
	pub fn paragraph(
		id: impl Into<String>,
		mode: Option<ParagraphMode>,
		children: impl IntoIterator<Item = InlineComponent>,
	) -> Self {
		Self::Paragraph(ParagraphComponent {
			id: id.into(),
			children: children.into_iter().collect(),
			mode,
		})
	}
}
impl From<InlineComponent> for Component {
	fn from(value: InlineComponent) -> Self {
		match value {
			InlineComponent::Link(c) => Self::Link(c),
			InlineComponent::Text(c) => Self::Text(c),
		}
	}
}

/// Node allowed inside a [`ParagraphComponent`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InlineComponent {
	/// Hyperlink.
	Link(LinkComponent),
	/// Plain text run.
	Text(TextComponent),
}
impl InlineComponent {
	/// Builds an inline link.
	pub fn link(id: impl Into<String>, href: impl Into<String>, label: impl Into<String>) -> Self {
		Self::Link(LinkComponent { id: id.into(), href: href.into(), label: label.into() })
	}

	/// Builds an inline text run.
	pub fn text(id: impl Into<String>, label: impl Into<String>) -> Self {
		Self::Text(TextComponent { id: id.into(), label: label.into() })
	}
}

/// Input field description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputComponent {
	/// Node identifier.
	pub id: String,
	/// Payload field name the host submits the value under.
	pub name: String,
	/// Input flavor.
	pub input_type: InputType,
	/// Visible label.
	pub label: String,
}

/// Input flavors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
	/// Plain text.
	Text,
	/// Masked password entry.
	Password,
}

/// Submit button description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitComponent {
	/// Node identifier.
	pub id: String,
	/// Button caption.
	pub label: String,
}

/// Hyperlink description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkComponent {
	/// Node identifier.
	pub id: String,
	/// Link target.
	pub href: String,
	/// Link caption.
	pub label: String,
}

/// Text run description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextComponent {
	/// Node identifier.
	pub id: String,
	/// Text content.
	pub label: String,
}

/// Paragraph description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphComponent {
	/// Node identifier.
	pub id: String,
	/// Inline children, in display order.
	pub children: Vec<InlineComponent>,
	/// Visual emphasis.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub mode: Option<ParagraphMode>,
}

/// Paragraph emphasis modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParagraphMode {
	#[default]
	/// No emphasis.
	Default,
	/// Warning emphasis.
	Warning,
	/// Success emphasis.
	Success,
	/// Error emphasis.
	Error,
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn render_action_uses_type_tags_and_camel_case_fields() {
		let action = Action::render([
			Component::input("login_name", "login", InputType::Text, "Login"),
			Component::paragraph(
				"hint",
				Some(ParagraphMode::Warning),
				[InlineComponent::text("hint_text", "Forgot it? "), InlineComponent::link(
					"hint_link",
					"/reset",
					"Reset",
				)],
			),
		]);
		let value = serde_json::to_value(&action).expect("Render action should serialize.");

		assert_eq!(
			value,
			json!({
				"type": "render",
				"payload": [
					{ "type": "input", "id": "login_name", "name": "login", "inputType": "text", "label": "Login" },
					{
						"type": "paragraph",
						"id": "hint",
						"mode": "warning",
						"children": [
							{ "type": "text", "id": "hint_text", "label": "Forgot it? " },
							{ "type": "link", "id": "hint_link", "href": "/reset", "label": "Reset" }
						]
					}
				]
			})
		);
	}

	#[test]
	fn paragraph_rejects_block_children() {
		let raw = json!({
			"type": "paragraph",
			"id": "p",
			"children": [{ "type": "submit", "id": "s", "label": "Go" }]
		});

		assert!(serde_json::from_value::<Component>(raw).is_err());
	}

	#[test]
	fn redirect_action_decodes() {
		let action: Action =
			serde_json::from_value(json!({ "type": "redirect", "url": "https://idp.example/auth" }))
				.expect("Redirect action should decode.");

		assert_eq!(action, Action::redirect("https://idp.example/auth"));
	}
}
