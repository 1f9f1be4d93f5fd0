//! Lifecycle events emitted by the session engine.

// self
use crate::{_prelude::*, model::Component};

/// Event names listeners subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
	/// The cached user identity changed.
	AuthenticationStateChange,
	/// The operation queue went idle→busy or busy→idle.
	LoadingStateChange,
	/// An operation failed.
	Error,
	/// A component tree should be displayed.
	Render,
}

/// Payload delivered to listeners.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
	/// The cached user identity changed; read it from the engine.
	AuthenticationStateChange,
	/// Busy flag after the transition.
	LoadingStateChange {
		/// Whether operations are outstanding.
		busy: bool,
	},
	/// Human-readable failure; never a raw transport error.
	Error {
		/// Message suitable for display.
		message: String,
	},
	/// Component tree returned by the server.
	Render(Vec<Component>),
}
impl SessionEvent {
	/// Returns the event's kind.
	pub fn kind(&self) -> EventKind {
		match self {
			Self::AuthenticationStateChange => EventKind::AuthenticationStateChange,
			Self::LoadingStateChange { .. } => EventKind::LoadingStateChange,
			Self::Error { .. } => EventKind::Error,
			Self::Render(_) => EventKind::Render,
		}
	}
}

/// Shared listener handle; identity (the allocation) is what deduplicates registrations.
pub type Listener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// Per-kind listener sets.
#[derive(Default)]
pub struct EventHub {
	listeners: RwLock<HashMap<EventKind, Vec<Listener>>>,
}
impl EventHub {
	/// Registers `listener`; returns `false` if it was already registered for `kind`.
	pub fn on(&self, kind: EventKind, listener: &Listener) -> bool {
		let mut listeners = self.listeners.write();
		let set = listeners.entry(kind).or_default();

		if set.iter().any(|existing| same_listener(existing, listener)) {
			return false;
		}

		set.push(listener.clone());

		true
	}

	/// Unregisters `listener`; returns `false` if it was not registered for `kind`.
	pub fn off(&self, kind: EventKind, listener: &Listener) -> bool {
		let mut listeners = self.listeners.write();
		let Some(set) = listeners.get_mut(&kind) else {
			return false;
		};
		let before = set.len();

		set.retain(|existing| !same_listener(existing, listener));

		set.len() != before
	}

	/// Number of listeners registered for `kind`.
	pub fn listener_count(&self, kind: EventKind) -> usize {
		self.listeners.read().get(&kind).map_or(0, Vec::len)
	}

	/// Delivers `event` to every listener of its kind.
	pub fn emit(&self, event: &SessionEvent) {
		// Snapshot so listeners may (un)register while being called.
		let targets = self.listeners.read().get(&event.kind()).cloned().unwrap_or_default();

		for listener in targets {
			listener(event);
		}
	}
}
impl Debug for EventHub {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let listeners = self.listeners.read();
		let counts: HashMap<_, _> = listeners.iter().map(|(k, v)| (*k, v.len())).collect();

		f.debug_struct("EventHub").field("listeners", &counts).finish()
	}
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
	std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;

	fn counting_listener() -> (Listener, Arc<AtomicUsize>) {
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = calls.clone();
		let listener: Listener = Arc::new(move |_: &SessionEvent| {
			counter.fetch_add(1, Ordering::SeqCst);
		});

		(listener, calls)
	}

	#[test]
	fn registering_twice_is_a_no_op() {
		let hub = EventHub::default();
		let (listener, calls) = counting_listener();

		assert!(hub.on(EventKind::AuthenticationStateChange, &listener));
		assert!(!hub.on(EventKind::AuthenticationStateChange, &listener));

		hub.emit(&SessionEvent::AuthenticationStateChange);

		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert_eq!(hub.listener_count(EventKind::AuthenticationStateChange), 1);
	}

	#[test]
	fn events_only_reach_their_kind() {
		let hub = EventHub::default();
		let (listener, calls) = counting_listener();

		hub.on(EventKind::Render, &listener);
		hub.emit(&SessionEvent::Error { message: "boom".into() });

		assert_eq!(calls.load(Ordering::SeqCst), 0);

		hub.emit(&SessionEvent::Render(Vec::new()));

		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn off_removes_listener() {
		let hub = EventHub::default();
		let (listener, calls) = counting_listener();

		hub.on(EventKind::Error, &listener);

		assert!(hub.off(EventKind::Error, &listener));
		assert!(!hub.off(EventKind::Error, &listener));

		hub.emit(&SessionEvent::Error { message: "ignored".into() });

		assert_eq!(calls.load(Ordering::SeqCst), 0);
	}
}
