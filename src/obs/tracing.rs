// self
use crate::{_prelude::*, obs::OperationKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span builder used by broker and editor operations.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("docdelta.operation", operation = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a warning event describing a failed operation (when tracing is enabled).
pub fn record_operation_failure(kind: OperationKind, stage: &'static str, err: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(operation = kind.as_str(), stage, error = %err, "operation failed");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, stage, err);
	}
}

/// Emits a debug event for notable intermediate steps (when tracing is enabled).
pub fn record_operation_step(kind: OperationKind, step: &'static str, detail: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(operation = kind.as_str(), step, detail = %detail);
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, step, detail);
	}
}
