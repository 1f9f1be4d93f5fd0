//! Proactive refresh scheduling with a randomized early margin.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use rand::Rng;
use tokio::{
	task::JoinHandle,
	time::{Instant, sleep_until},
};
// self
use crate::_prelude::*;

/// What the engine should do for a freshly installed authorization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshPlan {
	/// No expiry: never refresh proactively.
	NonExpiring,
	/// Already inside the refresh window: refresh now.
	Immediate,
	/// Refresh once the delay elapses.
	After(Duration),
}
impl RefreshPlan {
	/// Computes `expires_at - now - jitter` and classifies it. Arithmetic that leaves the
	/// representable range counts as already due.
	pub fn compute(
		expires_at: Option<OffsetDateTime>,
		now: OffsetDateTime,
		jitter: Duration,
	) -> Self {
		let Some(expires_at) = expires_at else {
			return Self::NonExpiring;
		};
		let remaining = (expires_at - now).checked_sub(jitter);

		match remaining {
			Some(remaining) if !remaining.is_negative() => Self::After(remaining),
			_ => Self::Immediate,
		}
	}
}

/// Uniform random early margin in `[0, max)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Jitter {
	max: Duration,
}
impl Jitter {
	/// Creates a jitter source; non-positive windows always yield zero.
	pub fn new(max: Duration) -> Self {
		Self { max }
	}

	/// Returns the exclusive upper bound.
	pub fn max(&self) -> Duration {
		self.max
	}

	/// Draws one sample.
	pub fn sample(&self) -> Duration {
		let max_ms = self.max.whole_milliseconds();

		if max_ms <= 0 {
			return Duration::ZERO;
		}

		let max_ms = i64::try_from(max_ms).unwrap_or(i64::MAX);

		Duration::milliseconds(rand::rng().random_range(0..max_ms))
	}
}

#[derive(Debug)]
struct Armed {
	generation: u64,
	deadline: Instant,
	handle: JoinHandle<()>,
}

/// Owner of the single pending refresh timer.
#[derive(Debug, Default)]
pub struct RefreshScheduler {
	slot: Arc<Mutex<Option<Armed>>>,
	generation: AtomicU64,
}
impl RefreshScheduler {
	/// Arms a one-shot timer, cancelling any previous one. `on_fire` runs after the timer has
	/// removed itself from the scheduler, so it may re-arm or cancel freely.
	pub fn arm<F>(&self, delay: Duration, on_fire: F)
	where
		F: 'static + Send + FnOnce(),
	{
		let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
		let delay = delay.unsigned_abs();
		let deadline = Instant::now() + delay;
		let slot = Arc::downgrade(&self.slot);
		// Held across the spawn so the timer cannot observe the slot before it is filled.
		let mut armed = self.slot.lock();
		let handle = tokio::spawn(async move {
			sleep_until(deadline).await;

			let Some(slot) = slot.upgrade() else {
				return;
			};

			{
				let mut armed = slot.lock();

				if armed.as_ref().is_none_or(|armed| armed.generation != generation) {
					return;
				}

				// Detach rather than abort; this task is the one running.
				armed.take();
			}

			on_fire();
		});

		if let Some(previous) = armed.replace(Armed { generation, deadline, handle }) {
			previous.handle.abort();
		}
	}

	/// Cancels the pending timer, if any.
	pub fn cancel(&self) {
		if let Some(armed) = self.slot.lock().take() {
			armed.handle.abort();
		}
	}

	/// Returns `true` while a timer is pending.
	pub fn is_armed(&self) -> bool {
		self.slot.lock().is_some()
	}

	/// Instant the pending timer fires at.
	pub fn deadline(&self) -> Option<Instant> {
		self.slot.lock().as_ref().map(|armed| armed.deadline)
	}
}
impl Drop for RefreshScheduler {
	fn drop(&mut self) {
		self.cancel();
	}
}
