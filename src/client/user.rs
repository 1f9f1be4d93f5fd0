//! User lookup for the current authorization.

// self
use super::{EngineInner, OperationFuture, SessionUser};
use crate::{
	_prelude::*,
	client::{SessionEvent, queue::Ticket},
	model::UserResult,
	obs::{self, OperationKind},
};

impl<U> EngineInner<U>
where
	U: SessionUser,
{
	/// Refreshes the cached user; the queue place is taken before this returns.
	pub(super) fn update_user_queued(self: &Arc<Self>) -> OperationFuture<'static, Result<()>> {
		if self.state.lock().authorization.is_none() {
			self.set_user(None, true);

			return Box::pin(async { Ok(()) });
		}

		let ticket = self.queue.ticket();
		let inner = self.clone();

		Box::pin(async move { inner.fetch_user(ticket).await })
	}

	/// Fire-and-forget variant used by reactions.
	pub(super) fn spawn_update_user(self: &Arc<Self>) {
		let update = self.update_user_queued();

		tokio::spawn(async move {
			if let Err(e) = update.await {
				tracing::debug!(error = %e, "Background user lookup failed.");
			}
		});
	}

	pub(super) fn set_user(&self, user: Option<U>, notify: bool) {
		self.state.lock().user = user;

		if notify {
			self.events.emit(&SessionEvent::AuthenticationStateChange);
		}
	}

	async fn fetch_user(self: Arc<Self>, ticket: Ticket) -> Result<()> {
		let _permit = ticket.acquire().await;
		let result = obs::observe(OperationKind::FetchUser, "fetch_user", async {
			// The authorization may have been replaced or cleared while queued.
			let Some(authorization) = self.state.lock().authorization.clone() else {
				return Ok(None);
			};

			self.api.user::<U>(&authorization).await.map(Some)
		})
		.await;

		match result {
			Ok(Some(UserResult { ok: true, user: Some(user), .. })) => self.set_user(Some(user), true),
			Ok(Some(UserResult { ok: true, user: None, .. })) => self.start_refresh(),
			Ok(_) => self.set_user(None, false),
			Err(e) => {
				self.set_user(None, false);

				return Err(e);
			},
		}

		Ok(())
	}
}
