//! FIFO operation serializer.
//!
//! Every authentication-affecting operation takes a [`Ticket`] (synchronously, which fixes its
//! place in line) and then waits for its [`Permit`]. Permits are granted strictly in ticket
//! order and only one exists at a time. Dropping a permit hands the queue to the next ticket;
//! dropping a ticket that was never served skips it.

// std
use std::collections::{BTreeSet, VecDeque};
// crates.io
use tokio::sync::Notify;
// self
use crate::_prelude::*;

/// Callback invoked on idle→busy (`true`) and busy→idle (`false`) transitions.
pub type BusyObserver = Arc<dyn Fn(bool) + Send + Sync>;

#[derive(Debug, Default)]
struct QueueState {
	next_ticket: u64,
	serving: u64,
	abandoned: BTreeSet<u64>,
	outstanding: usize,
	// Busy transitions not yet handed to the observer, oldest first.
	transitions: VecDeque<bool>,
	delivering: bool,
}

/// Serializes operations in FIFO order.
#[derive(Default)]
pub struct OperationQueue {
	state: Mutex<QueueState>,
	turn: Notify,
	observer: Option<BusyObserver>,
}
impl OperationQueue {
	/// Creates a queue that reports busy transitions to `observer`.
	pub fn with_observer(observer: BusyObserver) -> Self {
		Self { observer: Some(observer), ..Default::default() }
	}

	/// Takes a place in line.
	pub fn ticket(self: &Arc<Self>) -> Ticket {
		let number = {
			let mut state = self.state.lock();
			let number = state.next_ticket;

			state.next_ticket += 1;
			state.outstanding += 1;

			if state.outstanding == 1 {
				state.transitions.push_back(true);
			}

			number
		};

		self.deliver_transitions();

		Ticket { queue: self.clone(), number, served: false }
	}

	/// Returns `true` while any ticket or permit is outstanding.
	pub fn is_busy(&self) -> bool {
		self.outstanding() > 0
	}

	/// Number of outstanding tickets and permits.
	pub fn outstanding(&self) -> usize {
		self.state.lock().outstanding
	}

	fn is_turn(&self, number: u64) -> bool {
		self.state.lock().serving == number
	}

	fn finish(&self, number: u64) {
		{
			let mut guard = self.state.lock();
			let state = &mut *guard;

			if state.serving == number {
				state.serving += 1;

				while state.abandoned.remove(&state.serving) {
					state.serving += 1;
				}
			} else {
				state.abandoned.insert(number);
			}

			state.outstanding -= 1;

			if state.outstanding == 0 {
				state.transitions.push_back(false);
			}
		}

		self.turn.notify_waiters();
		self.deliver_transitions();
	}

	/// Hands queued transitions to the observer in the order they happened.
	///
	/// Only one caller delivers at a time; transitions recorded meanwhile (including by the
	/// observer itself) are drained by that caller, so the observer never sees them reordered
	/// and never runs under the state lock.
	fn deliver_transitions(&self) {
		{
			let mut state = self.state.lock();

			if state.delivering {
				return;
			}
			if self.observer.is_none() {
				state.transitions.clear();

				return;
			}

			state.delivering = true;
		}

		loop {
			let next = {
				let mut state = self.state.lock();
				let next = state.transitions.pop_front();

				if next.is_none() {
					state.delivering = false;
				}

				next
			};
			let Some(busy) = next else {
				break;
			};

			if let Some(observer) = &self.observer {
				observer(busy);
			}
		}
	}
}
impl Debug for OperationQueue {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OperationQueue").field("state", &*self.state.lock()).finish()
	}
}

/// Place in line; redeem with [`Ticket::acquire`].
#[derive(Debug)]
pub struct Ticket {
	queue: Arc<OperationQueue>,
	number: u64,
	served: bool,
}
impl Ticket {
	/// Waits until every earlier ticket has finished.
	pub async fn acquire(mut self) -> Permit {
		loop {
			let turn = self.queue.turn.notified();

			tokio::pin!(turn);
			turn.as_mut().enable();

			if self.queue.is_turn(self.number) {
				break;
			}

			turn.await;
		}

		self.served = true;

		Permit { queue: self.queue.clone(), number: self.number }
	}
}
impl Drop for Ticket {
	fn drop(&mut self) {
		if !self.served {
			self.queue.finish(self.number);
		}
	}
}

/// Exclusive right to run one operation; released on drop.
#[derive(Debug)]
pub struct Permit {
	queue: Arc<OperationQueue>,
	number: u64,
}
impl Drop for Permit {
	fn drop(&mut self) {
		self.queue.finish(self.number);
	}
}
