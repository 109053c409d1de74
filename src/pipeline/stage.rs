//! Bounded parallel map with a separate error stream.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinHandle, JoinSet};

use crate::error::{Error, Result};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::stream::{self, SendOutcome, Stream, StreamSender, WeakStreamSender};
use crate::pipeline::task::{log_join, spawn_driver};
use crate::pipeline::transform::Transform;

pub struct Stage<T> {
    name: &'static str,
    transform: T,
    parallelism: Option<usize>,
}

enum Exit {
    Exhausted,
    Cancelled(&'static str),
}

impl<T> Stage<T> {
    pub fn new(name: &'static str, transform: T) -> Self {
        Self {
            name,
            transform,
            parallelism: None,
        }
    }

    /// Maximum number of concurrent transform invocations. Defaults to 1.
    pub fn parallelism(mut self, k: usize) -> Self {
        self.parallelism = Some(k);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn parallelism_hint(&self) -> Option<usize> {
        self.parallelism
    }

    /// Start the stage on `input`.
    ///
    /// Returns the result stream and the error stream. Both close once the
    /// input is exhausted and every dispatched item has been delivered, or
    /// once `cancel` fires.
    pub fn spawn<In>(
        self,
        cancel: &CancelToken,
        input: Stream<In>,
        capacity: usize,
    ) -> Result<(Stream<T::Output>, Stream<T::Error>)>
    where
        In: Send + 'static,
        T: Transform<In>,
    {
        let (out, errs, _driver) = self.launch(cancel, input, capacity)?;
        Ok((out, errs))
    }

    pub(crate) fn launch<In>(
        self,
        cancel: &CancelToken,
        input: Stream<In>,
        capacity: usize,
    ) -> Result<(Stream<T::Output>, Stream<T::Error>, JoinHandle<()>)>
    where
        In: Send + 'static,
        T: Transform<In>,
    {
        let k = checked_parallelism(self.name, self.parallelism.unwrap_or(1))?;
        let (out_tx, out_rx) = stream::channel(capacity)?;
        let (err_tx, err_rx) = stream::channel(capacity)?;

        let name = self.name;
        let driver = spawn_driver(
            name,
            drive(
                name,
                Arc::new(self.transform),
                k,
                input,
                out_tx,
                err_tx,
                cancel.clone(),
            ),
        );
        Ok((out_rx, err_rx, driver))
    }
}

pub(crate) fn checked_parallelism(stage: &'static str, k: usize) -> Result<u32> {
    if k == 0 || k > Semaphore::MAX_PERMITS {
        return Err(Error::InvalidParallelism { stage });
    }
    u32::try_from(k).map_err(|_| Error::InvalidParallelism { stage })
}

async fn drive<In, T>(
    name: &'static str,
    transform: Arc<T>,
    k: u32,
    mut input: Stream<In>,
    out: StreamSender<T::Output>,
    errs: StreamSender<T::Error>,
    cancel: CancelToken,
) where
    In: Send + 'static,
    T: Transform<In>,
{
    let permits = Arc::new(Semaphore::new(k as usize));
    // bounds finished items still waiting on a send
    let outbox = Arc::new(Semaphore::new(k as usize));
    let mut workers = JoinSet::new();

    let exit = 'read: loop {
        let item = tokio::select! {
            biased;
            _ = cancel.cancelled() => break 'read Exit::Cancelled("recv"),
            msg = input.recv() => match msg {
                Some(item) => item,
                None => break 'read Exit::Exhausted,
            },
        };

        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break 'read Exit::Cancelled("acquire"),
            permit = permits.clone().acquire_owned() => permit,
        };
        // the pool is never closed
        let Ok(permit) = permit else {
            break 'read Exit::Cancelled("acquire");
        };

        #[cfg(feature = "tracing")]
        tracing::event!(
            tracing::Level::TRACE,
            event = "parapipe.stage.dispatch",
            stage = name,
            in_flight = k as usize - permits.available_permits(),
            "parapipe.stage.dispatch"
        );

        workers.spawn(run_one(
            name,
            transform.clone(),
            item,
            permit,
            outbox.clone(),
            out.downgrade(),
            errs.downgrade(),
            cancel.clone(),
        ));

        while let Some(res) = workers.try_join_next() {
            log_join(name, res);
        }
    };

    match exit {
        Exit::Exhausted => {
            let drained = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                _ = drain(name, &permits, k, &mut workers) => true,
            };
            if drained {
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::DEBUG, event = "parapipe.stage.drained", stage = name, "parapipe.stage.drained");
            } else {
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::DEBUG, event = "parapipe.cancelled", stage = name, where_ = "drain", "parapipe.cancelled");
                workers.detach_all();
            }
        }
        Exit::Cancelled(where_) => {
            #[cfg(feature = "tracing")]
            tracing::event!(tracing::Level::DEBUG, event = "parapipe.cancelled", stage = name, where_ = where_, "parapipe.cancelled");
            #[cfg(not(feature = "tracing"))]
            let _ = where_;
            // in-flight invocations finish on their own; their weak handles
            // no longer upgrade once the streams are closed below
            workers.detach_all();
        }
    }

    out.close();
    errs.close();
}

/// Wait until no invocation holds a permit, then until every worker has
/// finished its send.
async fn drain(
    name: &'static str,
    permits: &Semaphore,
    k: u32,
    workers: &mut JoinSet<()>,
) {
    let _all = permits.acquire_many(k).await;
    while let Some(res) = workers.join_next().await {
        log_join(name, res);
    }
}

async fn run_one<In, T>(
    name: &'static str,
    transform: Arc<T>,
    item: In,
    permit: OwnedSemaphorePermit,
    outbox: Arc<Semaphore>,
    out: WeakStreamSender<T::Output>,
    errs: WeakStreamSender<T::Error>,
    cancel: CancelToken,
) where
    In: Send + 'static,
    T: Transform<In>,
{
    let result = transform.apply(item).await;

    // the invocation is over; keep its permit only while the outbox is full
    let slot = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        slot = outbox.acquire_owned() => slot.ok(),
    };
    drop(permit);
    let Some(_slot) = slot else {
        #[cfg(feature = "tracing")]
        tracing::event!(tracing::Level::DEBUG, event = "parapipe.cancelled", stage = name, where_ = "outbox", "parapipe.cancelled");
        return;
    };

    // the owner only lets go of the streams early when the stage was cancelled
    let outcome = match result {
        Ok(value) => match out.upgrade() {
            Some(out) => out.send(value, &cancel).await,
            None => SendOutcome::Cancelled,
        },
        Err(error) => {
            #[cfg(feature = "tracing")]
            tracing::event!(tracing::Level::DEBUG, event = "parapipe.stage.failed", stage = name, "parapipe.stage.failed");
            match errs.upgrade() {
                Some(errs) => errs.send(error, &cancel).await,
                None => SendOutcome::Cancelled,
            }
        }
    };

    match outcome {
        SendOutcome::Delivered => {}
        SendOutcome::Cancelled => {
            #[cfg(feature = "tracing")]
            tracing::event!(tracing::Level::DEBUG, event = "parapipe.cancelled", stage = name, where_ = "send", "parapipe.cancelled");
        }
        SendOutcome::Closed => {
            #[cfg(feature = "tracing")]
            tracing::event!(tracing::Level::INFO, event = "parapipe.downstream.closed", stage = name, "parapipe.downstream.closed");
        }
    }
    #[cfg(not(feature = "tracing"))]
    let _ = name;
}
