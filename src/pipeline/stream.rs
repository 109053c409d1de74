//! Owned, cancellation-aware channel ends.
//!
//! A [`StreamSender`] is the single producer handle of a stream. The stream
//! closes when the owner calls [`StreamSender::close`] or drops it. Tasks
//! that produce on the owner's behalf hold either a crate-private `fork`,
//! joined before the owner closes, or a weak handle, which never
//! keeps the stream open.

use std::fmt;

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::pipeline::cancel::CancelToken;

/// What happened to a value handed to [`StreamSender::send`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// Cancellation fired while the send was pending; the value was dropped.
    Cancelled,
    /// The receiving end is gone; the value was dropped.
    Closed,
}

impl SendOutcome {
    pub fn is_delivered(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Create a stream with room for `capacity` queued values.
pub fn channel<T>(capacity: usize) -> Result<(StreamSender<T>, Stream<T>)> {
    if capacity == 0 {
        return Err(Error::InvalidCapacity);
    }
    let (tx, rx) = mpsc::channel(capacity);
    Ok((StreamSender { tx }, Stream { rx }))
}

pub struct StreamSender<T> {
    tx: mpsc::Sender<T>,
}

impl<T> StreamSender<T> {
    /// Send `value`, racing `cancel`.
    ///
    /// A token that is already cancelled wins over a free slot.
    pub async fn send(&self, value: T, cancel: &CancelToken) -> SendOutcome {
        if cancel.is_cancelled() {
            return SendOutcome::Cancelled;
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => SendOutcome::Cancelled,
            res = self.tx.send(value) => match res {
                Ok(()) => SendOutcome::Delivered,
                Err(_) => SendOutcome::Closed,
            },
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Close the stream from the owner's side.
    pub fn close(self) {
        drop(self);
    }

    pub(crate) fn fork(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakStreamSender<T> {
        WeakStreamSender {
            tx: self.tx.downgrade(),
        }
    }
}

/// A producer handle that does not keep the stream open.
pub(crate) struct WeakStreamSender<T> {
    tx: mpsc::WeakSender<T>,
}

impl<T> WeakStreamSender<T> {
    /// `None` once the owner has closed the stream.
    pub(crate) fn upgrade(&self) -> Option<StreamSender<T>> {
        self.tx.upgrade().map(|tx| StreamSender { tx })
    }
}

/// Receiving end of a stream.
pub struct Stream<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> Stream<T> {
    /// Next value, or `None` once every producer handle is gone and the buffer is empty.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Like [`recv`](Self::recv), but gives up with `None` on cancellation.
    pub async fn recv_or_cancel(&mut self, cancel: &CancelToken) -> Option<T> {
        tokio::select! {
            _ = cancel.cancelled() => None,
            msg = self.rx.recv() => msg,
        }
    }

    /// Drain the stream into a `Vec` until it closes.
    pub async fn collect(mut self) -> Vec<T> {
        let mut out = Vec::new();
        while let Some(v) = self.rx.recv().await {
            out.push(v);
        }
        out
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream").finish_non_exhaustive()
    }
}

impl<T> fmt::Debug for StreamSender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSender")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}
