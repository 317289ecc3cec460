//! Optional observability helpers for the relay flow.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `fcm_relay.flow` with the `stage` field and
//!   an event for every failed stage.
//! - Enable `metrics` to increment the `fcm_relay_flow_total` counter for every
//!   attempt/success/failure, labeled by `stage` + `outcome`.
//! - The `server` feature adds [`init_subscriber`], which installs a `tracing-subscriber` fmt
//!   layer filtered by `RUST_LOG`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Stages of a single notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
	/// Whole notification, from validation to delivery.
	Notification,
	/// Signing the JWT assertion.
	Assertion,
	/// Exchanging the assertion for an access token.
	TokenExchange,
	/// Posting the message to the push provider.
	Dispatch,
}
impl Stage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Stage::Notification => "notification",
			Stage::Assertion => "assertion",
			Stage::TokenExchange => "token_exchange",
			Stage::Dispatch => "dispatch",
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to a stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records the outcome of `stage` from a result and passes the result through.
pub fn observe<T, E>(stage: Stage, result: Result<T, E>) -> Result<T, E>
where
	E: Display,
{
	match &result {
		Ok(_) => record_outcome(stage, Outcome::Success),
		Err(err) => {
			record_outcome(stage, Outcome::Failure);
			log_failure(stage, err);
		},
	}

	result
}
