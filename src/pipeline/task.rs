use std::future::Future;

use tokio::task::JoinHandle;

/// Spawn a driver task, inside a `parapipe.stage` span when tracing is on.
pub(crate) fn spawn_driver<F>(stage: &'static str, fut: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    #[cfg(feature = "tracing")]
    {
        use tracing::Instrument;
        let span = tracing::info_span!("parapipe.stage", stage = stage);
        tokio::spawn(fut.instrument(span))
    }

    #[cfg(not(feature = "tracing"))]
    {
        let _ = stage;
        tokio::spawn(fut)
    }
}

/// Log a joined task that panicked.
pub(crate) fn log_join(stage: &'static str, res: Result<(), tokio::task::JoinError>) {
    if let Err(err) = res {
        #[cfg(feature = "tracing")]
        tracing::event!(tracing::Level::ERROR, event = "parapipe.task.panicked", stage = stage, error = %err, "parapipe.task.panicked");
        #[cfg(not(feature = "tracing"))]
        let _ = (stage, err);
    }
}
