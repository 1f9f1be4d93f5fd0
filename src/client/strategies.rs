//! Strategy listing and display ordering.

// std
use std::collections::HashSet;
// self
use super::{EngineInner, SessionUser};
use crate::{
	_prelude::*,
	client::SessionEvent,
	model::{StrategiesResult, StrategyInfo},
	obs::{self, OperationKind},
};

pub(super) const STRATEGIES_FAILED: &str = "Unable to fetch authentication strategies.";

/// Orders a listing for display: primary, declared secondaries, then strategies carrying an
/// inline action. Names are deduplicated and unknown names skipped.
pub fn display_order(listing: &StrategiesResult) -> Vec<StrategyInfo> {
	let primary = Some(listing.primary.as_str()).filter(|name| !name.is_empty());
	let secondary = listing.secondary.iter().flatten().map(String::as_str);
	let inline = listing.strategies.iter().filter(|s| s.action.is_some()).map(|s| s.name.as_str());
	let mut seen = HashSet::new();

	primary
		.into_iter()
		.chain(secondary)
		.chain(inline)
		.filter(|name| seen.insert(*name))
		.filter_map(|name| listing.strategies.iter().find(|s| s.name == name).cloned())
		.collect()
}

impl<U> EngineInner<U>
where
	U: SessionUser,
{
	pub(super) async fn update_strategies(&self) -> Result<StrategiesResult> {
		let _permit = self.queue.ticket().acquire().await;
		let result = obs::observe(OperationKind::UpdateStrategies, "update_strategies", async {
			self.state.lock().strategies.clear();

			let listing = self.api.strategies().await?;

			if listing.ok {
				self.state.lock().strategies = display_order(&listing);
			}

			Ok::<_, Error>(listing)
		})
		.await;

		if result.is_err() {
			self.events.emit(&SessionEvent::Error { message: STRATEGIES_FAILED.into() });
		}

		result
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::model::Action;

	fn info(name: &str, inline: bool) -> StrategyInfo {
		StrategyInfo {
			name: name.into(),
			label: name.to_uppercase(),
			action: inline.then(|| Action::redirect(format!("https://idp.example/{name}"))),
		}
	}

	fn names(order: &[StrategyInfo]) -> Vec<&str> {
		order.iter().map(|s| s.name.as_str()).collect()
	}

	#[test]
	fn primary_then_secondary_then_inline() {
		let listing = StrategiesResult {
			ok: true,
			primary: "a".into(),
			secondary: Some(vec!["c".into()]),
			strategies: vec![info("a", false), info("b", true), info("c", false), info("d", false)],
			..Default::default()
		};

		assert_eq!(names(&display_order(&listing)), ["a", "c", "b"]);
	}

	#[test]
	fn unknown_and_duplicate_names_are_skipped() {
		let listing: StrategiesResult = serde_json::from_value(json!({
			"ok": true,
			"primary": "a",
			"secondary": ["ghost", "a", "b"],
			"strategies": [
				{ "name": "a", "label": "A" },
				{ "name": "b", "label": "B", "action": { "type": "redirect", "url": "https://x" } }
			]
		}))
		.expect("Listing should decode.");

		assert_eq!(names(&display_order(&listing)), ["a", "b"]);
	}

	#[test]
	fn empty_primary_is_ignored() {
		let listing = StrategiesResult {
			ok: true,
			strategies: vec![info("a", false), info("b", true)],
			..Default::default()
		};

		assert_eq!(names(&display_order(&listing)), ["b"]);
	}
}
