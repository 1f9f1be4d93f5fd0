//! The "authorization changed" reaction shared by every path that replaces the authorization.

// self
use super::{EngineInner, SessionUser};
use crate::{_prelude::*, client::scheduler::RefreshPlan, model::Authorization};

impl<U> EngineInner<U>
where
	U: SessionUser,
{
	/// Persists `authorization` (or its absence), adopts it, and runs the reaction.
	pub(super) fn install_authorization(
		self: &Arc<Self>,
		authorization: Option<Authorization>,
	) -> Result<()> {
		self.credentials.set_authorization(authorization.as_ref())?;
		self.adopt_authorization(authorization);

		Ok(())
	}

	/// Adopts an authorization that is already persisted (bootstrap, foreign writes).
	pub(super) fn adopt_authorization(self: &Arc<Self>, authorization: Option<Authorization>) {
		self.state.lock().authorization = authorization;
		self.on_authorization_changed();
	}

	fn on_authorization_changed(self: &Arc<Self>) {
		self.scheduler.cancel();

		let current = self.state.lock().authorization.as_ref().map(|a| a.expires_at);
		let Some(expires_at) = current else {
			self.set_user(None, true);

			return;
		};

		match RefreshPlan::compute(expires_at, OffsetDateTime::now_utc(), self.jitter.sample()) {
			RefreshPlan::NonExpiring => self.spawn_update_user(),
			RefreshPlan::Immediate => self.start_refresh(),
			RefreshPlan::After(delay) => {
				let engine = Arc::downgrade(self);

				self.spawn_update_user();
				self.scheduler.arm(delay, move || {
					if let Some(engine) = engine.upgrade() {
						engine.start_refresh();
					}
				});
			},
		}
	}
}
