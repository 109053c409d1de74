use tokio::task::{JoinHandle, JoinSet};

use crate::error::Result;
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::stream::{self, SendOutcome, Stream, StreamSender};
use crate::pipeline::task::{log_join, spawn_driver};

/// Fan `streams` into one stream.
///
/// Values keep their per-input order but interleave freely across inputs.
/// The merged stream closes after every input has closed, or as soon as
/// `cancel` fires. Merging zero streams yields a closed stream.
pub fn merge<T>(cancel: &CancelToken, streams: Vec<Stream<T>>, capacity: usize) -> Result<Stream<T>>
where
    T: Send + 'static,
{
    let (merged, _barrier) = launch(cancel, streams, capacity)?;
    Ok(merged)
}

pub(crate) fn launch<T>(
    cancel: &CancelToken,
    streams: Vec<Stream<T>>,
    capacity: usize,
) -> Result<(Stream<T>, JoinHandle<()>)>
where
    T: Send + 'static,
{
    let (tx, rx) = stream::channel(capacity)?;

    let mut forwarders = JoinSet::new();
    for input in streams {
        forwarders.spawn(forward(input, tx.fork(), cancel.clone()));
    }

    let barrier = spawn_driver("merge", async move {
        let inputs = forwarders.len();
        while let Some(res) = forwarders.join_next().await {
            log_join("merge", res);
        }
        #[cfg(feature = "tracing")]
        tracing::event!(tracing::Level::DEBUG, event = "parapipe.merge.closed", inputs = inputs, "parapipe.merge.closed");
        #[cfg(not(feature = "tracing"))]
        let _ = inputs;
        tx.close();
    });

    Ok((rx, barrier))
}

async fn forward<T>(mut input: Stream<T>, out: StreamSender<T>, cancel: CancelToken)
where
    T: Send + 'static,
{
    while let Some(value) = input.recv_or_cancel(&cancel).await {
        match out.send(value, &cancel).await {
            SendOutcome::Delivered => {}
            SendOutcome::Cancelled => break,
            SendOutcome::Closed => {
                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::INFO, event = "parapipe.downstream.closed", stage = "merge", "parapipe.downstream.closed");
                break;
            }
        }
    }
}
