//! Host navigation hooks and the out-of-band callback protocol.
//!
//! After an external redirect (e.g. a third-party identity provider) the host lands back on a
//! URL whose [`CALLBACK_PARAM`] query parameter holds `{name, payload}` JSON. The engine
//! consumes it exactly once, strips it from the URL without navigating, and resumes the named
//! strategy.

// self
use crate::{_prelude::*, model::CallbackRequest};

/// Query parameter carrying a pending callback.
pub const CALLBACK_PARAM: &str = "authdeck_callback";

/// Host effects the engine needs: reading and rewriting the current location, and navigating.
pub trait Navigator
where
	Self: Send + Sync,
{
	/// Current location, if the host has one.
	fn current_url(&self) -> Option<Url>;

	/// Rewrites the current location without reloading (history replace).
	fn replace_url(&self, url: Url);

	/// Navigates away; terminal effect of a redirect action.
	fn navigate(&self, url: &str);
}

/// Headless navigator that records effects.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
	location: RwLock<Option<Url>>,
	navigations: Mutex<Vec<String>>,
}
impl MemoryNavigator {
	/// Creates a navigator positioned at `url`.
	pub fn at(url: Url) -> Self {
		Self { location: RwLock::new(Some(url)), navigations: Mutex::default() }
	}

	/// Every URL passed to [`Navigator::navigate`], oldest first.
	pub fn navigations(&self) -> Vec<String> {
		self.navigations.lock().clone()
	}
}
impl Navigator for MemoryNavigator {
	fn current_url(&self) -> Option<Url> {
		self.location.read().clone()
	}

	fn replace_url(&self, url: Url) {
		*self.location.write() = Some(url);
	}

	fn navigate(&self, url: &str) {
		self.navigations.lock().push(url.to_owned());
	}
}

/// Extracts a pending callback from `url`, if one is present and well-formed.
pub fn parse_callback(url: &Url) -> Option<CallbackRequest> {
	let (_, raw) = url.query_pairs().find(|(key, _)| key == CALLBACK_PARAM)?;

	match serde_json::from_str(&raw) {
		Ok(callback) => Some(callback),
		Err(e) => {
			tracing::warn!(error = %e, "Ignoring malformed callback parameter.");

			None
		},
	}
}

/// Returns `url` without the callback parameter, keeping other pairs and the fragment.
pub fn strip_callback(url: &Url) -> Url {
	let retained: Vec<(String, String)> = url
		.query_pairs()
		.filter(|(key, _)| key != CALLBACK_PARAM)
		.map(|(key, value)| (key.into_owned(), value.into_owned()))
		.collect();
	let mut stripped = url.clone();

	if retained.is_empty() {
		stripped.set_query(None);
	} else {
		stripped.query_pairs_mut().clear().extend_pairs(retained);
	}

	stripped
}

/// Consumes the pending callback: parses it and rewrites the location without it.
pub fn take_callback(navigator: &dyn Navigator) -> Option<CallbackRequest> {
	let url = navigator.current_url()?;
	let callback = parse_callback(&url)?;

	navigator.replace_url(strip_callback(&url));

	Some(callback)
}
