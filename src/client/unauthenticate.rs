//! Logout.

// self
use super::{EngineInner, SessionUser};
use crate::{
	_prelude::*,
	client::SessionEvent,
	obs::{self, OperationKind},
};

pub(super) const UNAUTHENTICATE_FAILED: &str = "Error while logging out.";

impl<U> EngineInner<U>
where
	U: SessionUser,
{
	/// Clears the session locally, then tells the server. Local state is never rolled back.
	pub(super) async fn unauthenticate(self: &Arc<Self>) -> Result<()> {
		if self.state.lock().authorization.is_none() {
			return Ok(());
		}

		let _permit = self.queue.ticket().acquire().await;

		if self.state.lock().authorization.is_none() {
			return Ok(());
		}

		let result = obs::observe(OperationKind::Unauthenticate, "unauthenticate", async {
			let descriptor = self.credentials.refresh_strategy();

			self.credentials.set_refresh_strategy(None)?;
			self.install_authorization(None)?;
			self.api.unauthenticate(descriptor.as_ref()).await
		})
		.await;

		if result.is_err() {
			self.events.emit(&SessionEvent::Error { message: UNAUTHENTICATE_FAILED.into() });
		}

		result
	}
}
