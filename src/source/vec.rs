use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::stream::{self, SendOutcome, Stream};
use crate::pipeline::task::spawn_driver;

/// Emits a fixed list of items, in order.
#[derive(Clone, Debug)]
pub struct VecSource<T> {
    items: Vec<T>,
}

impl<T> VecSource<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    /// Build a source after checking every item.
    ///
    /// The first item rejected by `check` is reported with its index.
    pub fn validated<F>(items: impl IntoIterator<Item = T>, check: F) -> Result<Self>
    where
        F: Fn(&T) -> std::result::Result<(), String>,
    {
        let items: Vec<T> = items.into_iter().collect();
        for (index, item) in items.iter().enumerate() {
            check(item).map_err(|reason| Error::InvalidInput { index, reason })?;
        }
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> VecSource<T>
where
    T: Send + 'static,
{
    pub fn spawn(self, cancel: &CancelToken, capacity: usize) -> Result<Stream<T>> {
        let (rx, _driver) = self.launch(cancel, capacity)?;
        Ok(rx)
    }

    pub(crate) fn launch(
        self,
        cancel: &CancelToken,
        capacity: usize,
    ) -> Result<(Stream<T>, JoinHandle<()>)> {
        let (tx, rx) = stream::channel(capacity)?;
        let cancel = cancel.clone();

        let driver = spawn_driver("source", async move {
            let total = self.items.len();
            let mut sent = 0usize;
            for item in self.items {
                match tx.send(item, &cancel).await {
                    SendOutcome::Delivered => sent += 1,
                    SendOutcome::Cancelled => {
                        #[cfg(feature = "tracing")]
                        tracing::event!(tracing::Level::DEBUG, event = "parapipe.cancelled", stage = "source", where_ = "send", "parapipe.cancelled");
                        break;
                    }
                    SendOutcome::Closed => {
                        #[cfg(feature = "tracing")]
                        tracing::event!(tracing::Level::INFO, event = "parapipe.downstream.closed", stage = "source", "parapipe.downstream.closed");
                        break;
                    }
                }
            }
            #[cfg(feature = "tracing")]
            tracing::event!(tracing::Level::DEBUG, event = "parapipe.source.done", sent = sent, total = total, "parapipe.source.done");
            #[cfg(not(feature = "tracing"))]
            let _ = (sent, total);
            tx.close();
        });

        Ok((rx, driver))
    }
}
