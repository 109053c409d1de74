//! # parapipe
//!
//! **Bounded-concurrency streaming pipelines on Tokio.**
//!
//! `parapipe` moves typed values through a chain of stages. Each stage runs
//! up to K transform invocations at once, sends successes downstream and
//! failures onto its own error stream. The error streams of all stages are
//! merged into the sink, and the first error the sink sees cancels the whole
//! pipeline.
//!
//! ---
//!
//! ## Core Model
//!
//! ```text
//! Source → Stage₁ → Stage₂ → … → Sink
//!            │        │           ▲
//!            └────────┴─ merge ───┘   (errors)
//! ```
//!
//! - [`VecSource`] emits a fixed list of items, in order.
//! - [`Stage`] is a bounded parallel map backed by a semaphore.
//! - [`merge`] fans N streams into one.
//! - [`Sink`] drains results and errors and owns the fail-fast decision.
//!
//! Every stream has a single owning producer handle; closing is the drop of
//! that handle, so a stream can neither close twice nor receive a send after
//! it closed. Every blocking point (send, receive, permit acquisition, drain)
//! races the shared [`CancelToken`].
//!
//! ---
//!
//! ## Example
//!
//! ```no_run
//! use parapipe::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> parapipe::error::Result<()> {
//!     let lower = Stage::new("lower", from_fn(|s: String| Ok::<_, String>(s.to_lowercase())))
//!         .parallelism(2);
//!     let check = Stage::new("check", |s: String| async move {
//!         if s == "foo" { Err(format!("refusing {s}")) } else { Ok(s.len()) }
//!     })
//!     .parallelism(2);
//!
//!     let report = Runtime::new()
//!         .source(VecSource::new(["FOO", "BAR", "BAX"].map(String::from)))?
//!         .stage(lower)?
//!         .stage(check)?
//!         .sink(Sink::new())
//!         .await?;
//!
//!     println!("{report:?}");
//!     Ok(())
//! }
//! ```
//!
//! ---
//!
//! ## Cancellation
//!
//! [`Flow::cancel_token`] returns the token shared by every component.
//! Cancelling it (for example on Ctrl-C) stops reading, dispatching and
//! sending everywhere; in-flight transforms are not aborted, their results
//! are dropped. Cancelling twice is the same as cancelling once.
//!
//! ---
//!
//! ## API Contracts
//!
//! - At most K invocations of a stage's transform run at any instant.
//! - No ordering across concurrent invocations or merged inputs.
//! - A transform error never stops its stage; only the sink cancels.
//! - A stage closes its streams only after every dispatched item has
//!   finished its send, so the last error of a run is never lost.
//! - Zero parallelism or zero capacity is rejected before anything runs.
//!
//! ---
//!
//! ## Observability
//!
//! With the default `tracing` feature, components emit structured events
//! such as `parapipe.stage.dispatch`, `parapipe.stage.failed`,
//! `parapipe.sink.error`, `parapipe.downstream.closed` and
//! `parapipe.cancelled`, inside `parapipe.stage` spans.
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("parapipe=debug")
//!     .init();
//! ```
//!
//! [`VecSource`]: source::VecSource
//! [`Stage`]: pipeline::stage::Stage
//! [`merge`]: pipeline::merge::merge
//! [`Sink`]: sink::Sink
//! [`CancelToken`]: pipeline::cancel::CancelToken
//! [`Flow::cancel_token`]: pipeline::runtime::Flow::cancel_token

// Public modules
pub mod error;
pub mod pipeline;
pub mod sink;
pub mod source;

pub mod prelude {
    //! Convenient imports for most `parapipe` users.

    pub use crate::pipeline::cancel::{CancelCause, CancelToken};
    pub use crate::pipeline::merge::merge;
    pub use crate::pipeline::runtime::{Flow, Runtime};
    pub use crate::pipeline::stage::Stage;
    pub use crate::pipeline::transform::{from_fn, Transform};
    pub use crate::sink::{Outcome, Sink, SinkReport};
    pub use crate::source::VecSource;
}
