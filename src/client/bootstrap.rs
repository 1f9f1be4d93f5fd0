//! Startup and cross-context synchronization.

// self
use super::{EngineInner, SessionUser};
use crate::{
	_prelude::*,
	client::navigator,
	model::StrategiesResult,
	obs::OperationKind,
	store::CredentialStore,
};

impl<U> EngineInner<U>
where
	U: SessionUser,
{
	pub(super) async fn bootstrap(self: &Arc<Self>) -> Result<StrategiesResult> {
		self.start_watcher();

		if let Some(callback) = navigator::take_callback(self.navigator.as_ref()) {
			let ticket = self.queue.ticket();
			let step = self.clone().authenticate_queued(
				ticket,
				callback.name,
				Some(callback.payload),
				OperationKind::Authenticate,
			);

			if let Err(e) = step.await {
				tracing::warn!(error = %e, "Callback authentication failed.");
			}
		} else {
			self.adopt_authorization(self.credentials.authorization());
		}

		self.update_strategies().await
	}

	/// Follows foreign writes to the authorization key. Idempotent.
	fn start_watcher(self: &Arc<Self>) {
		let mut watcher = self.watcher.lock();

		if watcher.is_some() {
			return;
		}

		let Some(mut feed) = self.credentials.watch() else {
			return;
		};
		let key = self.credentials.authorization_key();
		let weak = Arc::downgrade(self);

		*watcher = Some(tokio::spawn(async move {
			while let Some(change) = feed.next().await {
				if !change.affects(&key) {
					continue;
				}

				let Some(engine) = weak.upgrade() else {
					break;
				};
				let authorization = match change.key {
					Some(_) => CredentialStore::parse_authorization(change.new_value.as_deref()),
					// Lagged: any key may have changed, so re-read.
					None => engine.credentials.authorization(),
				};

				tracing::debug!(
					authenticated = authorization.is_some(),
					"Authorization changed in another context."
				);

				engine.adopt_authorization(authorization);
			}
		}));
	}
}
