//! Terminal consumer of a pipeline.

use std::fmt;

use crate::pipeline::cancel::{CancelCause, CancelToken};
use crate::pipeline::stream::Stream;

/// How a sink finished.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Both streams closed without any cancellation.
    Exhausted,
    Cancelled(CancelCause),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkReport {
    pub outcome: Outcome,
    /// Results received.
    pub results: usize,
    /// Errors received.
    pub errors: usize,
}

impl SinkReport {
    pub fn is_exhausted(&self) -> bool {
        matches!(self.outcome, Outcome::Exhausted)
    }

    pub fn cause(&self) -> Option<&CancelCause> {
        match &self.outcome {
            Outcome::Exhausted => None,
            Outcome::Cancelled(cause) => Some(cause),
        }
    }
}

type ResultHandler<T> = Box<dyn FnMut(T) + Send>;

/// Drains a result stream and an error stream.
///
/// The first error cancels the whole pipeline through the shared token.
pub struct Sink<T> {
    on_result: Option<ResultHandler<T>>,
}

impl<T> Sink<T> {
    pub fn new() -> Self {
        Self { on_result: None }
    }

    /// Hand every result to `f` after it is logged.
    pub fn on_result<F>(mut self, f: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        self.on_result = Some(Box::new(f));
        self
    }

    /// Run until cancellation, or until both streams have closed.
    ///
    /// Once `results` closes, the error stream is still drained so that a
    /// failure from the last in-flight items is not lost.
    pub async fn run<E>(
        mut self,
        cancel: &CancelToken,
        mut results: Stream<T>,
        mut errors: Stream<E>,
    ) -> SinkReport
    where
        T: fmt::Debug,
        E: fmt::Display,
    {
        let mut report = SinkReport {
            outcome: Outcome::Exhausted,
            results: 0,
            errors: 0,
        };
        let mut results_open = true;
        let mut errors_open = true;

        loop {
            if let Some(cause) = cancel.cause() {
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::INFO, event = "parapipe.cancelled", stage = "sink", cause = %cause, "parapipe.cancelled");
                report.outcome = Outcome::Cancelled(cause);
                return report;
            }
            if !results_open && !errors_open {
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::INFO, event = "parapipe.sink.done", results = report.results, "parapipe.sink.done");
                return report;
            }

            tokio::select! {
                _ = cancel.cancelled() => {}
                msg = errors.recv(), if errors_open => match msg {
                    Some(error) => {
                        report.errors += 1;
                        #[cfg(feature = "tracing")]
                        tracing::event!(tracing::Level::ERROR, event = "parapipe.sink.error", error = %error, "parapipe.sink.error");
                        cancel.cancel_with(CancelCause::Failure {
                            message: error.to_string(),
                        });
                    }
                    None => errors_open = false,
                },
                msg = results.recv(), if results_open => match msg {
                    Some(value) => {
                        report.results += 1;
                        #[cfg(feature = "tracing")]
                        tracing::event!(tracing::Level::INFO, event = "parapipe.sink.result", value = ?value, "parapipe.sink.result");
                        if let Some(handler) = self.on_result.as_mut() {
                            handler(value);
                        }
                    }
                    None => results_open = false,
                },
            }
        }
    }
}

impl<T> Default for Sink<T> {
    fn default() -> Self {
        Self::new()
    }
}
