// self
use crate::{
	_prelude::*,
	obs::{self, OpKind, OpOutcome},
};

/// Future returned by [`OpSpan::instrument`].
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`OpSpan::instrument`].
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// One observed operation: a span (with `tracing`) plus the attempt and outcome counters.
///
/// `start` counts the attempt; `finish` records the outcome on both the span and the counter.
#[derive(Clone, Debug)]
pub struct OpSpan {
	kind: OpKind,
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Opens an operation against `target` (an API path, an audience, or a grant label).
	pub fn start(kind: OpKind, target: &str) -> Self {
		obs::record_op_outcome(kind, OpOutcome::Attempt);

		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"azure_collector.op",
				op = kind.as_str(),
				target,
				outcome = tracing::field::Empty
			);

			Self { kind, span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = target;

			Self { kind }
		}
	}

	/// Runs `fut` inside the span without holding an entered guard across awaits.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			tracing::Instrument::instrument(fut, self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Records how the operation ended.
	pub fn finish(&self, outcome: OpOutcome) {
		#[cfg(feature = "tracing")]
		self.span.record("outcome", outcome.as_str());

		obs::record_op_outcome(self.kind, outcome);
	}

	/// Records success or failure from `result` and hands it back.
	pub fn finish_with<T>(&self, result: Result<T>) -> Result<T> {
		self.finish(if result.is_ok() { OpOutcome::Success } else { OpOutcome::Failure });

		result
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrumented_futures_keep_their_output() {
		let span = OpSpan::start(OpKind::Request, "/v1.0/users");
		let result = span.instrument(async { Ok::<_, Error>(7_u8) }).await;

		assert_eq!(span.finish_with(result).expect("Result should pass through."), 7);
	}

	#[test]
	fn failures_pass_through_unchanged() {
		let span = OpSpan::start(OpKind::Authenticate, "https://graph.microsoft.com");
		let result = span.finish_with::<()>(Err(Error::InvalidClient {
			reason: "AADSTS7000215".into(),
		}));

		assert!(matches!(result, Err(Error::InvalidClient { .. })));
	}
}
