//! Optional observability helpers for collector operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to wrap every token exchange, request, and list stream in an
//!   `azure_collector.op` span carrying `op`, `target` (API path or audience), and the final
//!   `outcome`. Retries and producer panics are emitted as events inside those spans.
//! - Enable `metrics` to increment `azure_collector_op_total` (labeled by `op` and `outcome`) and
//!   `azure_collector_http_retry_total` (labeled by `reason`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Collector operations observed by spans and counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Token acquisition against the identity platform.
	Authenticate,
	/// A single logical API request (all attempts).
	Request,
	/// A streamed list call (every page).
	List,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Authenticate => "authenticate",
			OpKind::Request => "request",
			OpKind::List => "list",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Why the sender decided to retry a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RetryReason {
	/// The peer closed the connection before a response arrived.
	ConnectionClosed,
	/// HTTP 429 with a usable `Retry-After`.
	Throttled,
	/// HTTP 5xx.
	ServerError,
}
impl RetryReason {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RetryReason::ConnectionClosed => "connection_closed",
			RetryReason::Throttled => "throttled",
			RetryReason::ServerError => "server_error",
		}
	}
}
impl Display for RetryReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
