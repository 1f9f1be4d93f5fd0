//! Observability helpers for client operations and server dispatch.
//!
//! # Feature Flags
//!
//! - Spans named `authdeck.operation` with the `operation` and `stage` (call site) fields are
//!   always emitted through `tracing`.
//! - Enable `metrics` to increment the `authdeck_operation_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Client strategy listing refresh.
	UpdateStrategies,
	/// Client authenticate step.
	Authenticate,
	/// Client logout.
	Unauthenticate,
	/// Client user lookup.
	FetchUser,
	/// Timer- or reaction-driven refresh.
	Refresh,
	/// Server-side strategy dispatch.
	Dispatch,
	/// Server-side session store.
	Store,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::UpdateStrategies => "update_strategies",
			OperationKind::Authenticate => "authenticate",
			OperationKind::Unauthenticate => "unauthenticate",
			OperationKind::FetchUser => "fetch_user",
			OperationKind::Refresh => "refresh",
			OperationKind::Dispatch => "dispatch",
			OperationKind::Store => "store",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside an operation span, recording attempt and outcome.
pub(crate) async fn observe<T, E, Fut>(
	kind: OperationKind,
	stage: &'static str,
	fut: Fut,
) -> Result<T, E>
where
	Fut: Future<Output = Result<T, E>>,
	E: Display,
{
	let span = OperationSpan::new(kind, stage);

	record_operation_outcome(kind, OperationOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_operation_outcome(kind, OperationOutcome::Success),
		Err(e) => {
			::tracing::debug!(operation = kind.as_str(), stage, error = %e, "Operation failed.");
			record_operation_outcome(kind, OperationOutcome::Failure);
		},
	}

	result
}
