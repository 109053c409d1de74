use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::config::StageConfig;
use crate::pipeline::merge;
use crate::pipeline::stage::{checked_parallelism, Stage};
use crate::pipeline::stream::Stream;
use crate::pipeline::transform::Transform;
use crate::sink::{Sink, SinkReport};
use crate::source::VecSource;

/// Pipeline configuration and entry point.
#[derive(Clone, Debug, Default)]
pub struct Runtime {
    config: StageConfig,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capacity of every stream. Defaults to 1.
    pub fn buffer(mut self, buffer: usize) -> Self {
        self.config.buffer = buffer;
        self
    }

    /// Parallelism for stages that do not set their own. Defaults to 1.
    pub fn concurrency(mut self, k: usize) -> Self {
        self.config.concurrency = k;
        self
    }

    /// Override the capacity of one stage's output and error streams.
    pub fn buffer_stage(mut self, stage: &'static str, buffer: usize) -> Self {
        let mut map: HashMap<_, _> = (*self.config.buffers).clone();
        map.insert(stage, buffer);
        self.config.buffers = Arc::new(map);
        self
    }

    /// Override the parallelism of one stage, whatever the stage itself asks for.
    pub fn concurrency_stage(mut self, stage: &'static str, k: usize) -> Self {
        let mut map: HashMap<_, _> = (*self.config.concurrencies).clone();
        map.insert(stage, k);
        self.config.concurrencies = Arc::new(map);
        self
    }

    /// Start describing a pipeline fed by `source`, with a fresh cancellation token.
    pub fn source<T, E>(&self, source: VecSource<T>) -> Result<Flow<T, E>>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        self.source_with_cancel(source, CancelToken::new())
    }

    /// Like [`source`](Self::source), sharing a caller-owned token.
    pub fn source_with_cancel<T, E>(
        &self,
        source: VecSource<T>,
        cancel: CancelToken,
    ) -> Result<Flow<T, E>>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        if self.config.buffer == 0 {
            return Err(Error::InvalidCapacity);
        }
        let buffer = self.config.buffer;
        Ok(Flow {
            config: self.config.clone(),
            cancel,
            launch: Box::new(move |launcher: &mut Launcher<E>| {
                let (rx, driver) = source.launch(&launcher.cancel, buffer)?;
                launcher.drivers.push(driver);
                Ok(rx)
            }),
        })
    }
}

struct Launcher<E> {
    cancel: CancelToken,
    errors: Vec<Stream<E>>,
    drivers: Vec<JoinHandle<()>>,
}

type Launch<T, E> = Box<dyn FnOnce(&mut Launcher<E>) -> Result<Stream<T>> + Send>;

/// A validated, not yet running pipeline whose current tail yields `T`.
///
/// Nothing is spawned until [`sink`](Flow::sink) is awaited, so a
/// configuration error never leaves a half-started pipeline behind.
pub struct Flow<T, E> {
    config: StageConfig,
    cancel: CancelToken,
    launch: Launch<T, E>,
}

impl<T, E> Flow<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// The token shared by every component of this pipeline.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Append a stage.
    pub fn stage<S>(self, stage: Stage<S>) -> Result<Flow<S::Output, E>>
    where
        S: Transform<T, Error = E>,
    {
        let name = stage.name();
        let k = self.config.concurrency_for(name, stage.parallelism_hint());
        checked_parallelism(name, k)?;
        let buffer = self.config.buffer_for(name);
        if buffer == 0 {
            return Err(Error::InvalidCapacity);
        }

        let stage = stage.parallelism(k);
        let prev = self.launch;
        Ok(Flow {
            config: self.config,
            cancel: self.cancel,
            launch: Box::new(move |launcher: &mut Launcher<E>| {
                let input = prev(&mut *launcher)?;
                let (out, errs, driver) = stage.launch(&launcher.cancel, input, buffer)?;
                launcher.errors.push(errs);
                launcher.drivers.push(driver);
                Ok(out)
            }),
        })
    }

    /// Start every component and drain the pipeline into `sink`.
    ///
    /// Returns once the sink has finished and every driver task has exited.
    pub async fn sink(self, sink: Sink<T>) -> Result<SinkReport>
    where
        T: fmt::Debug,
        E: fmt::Display,
    {
        let cancel = self.cancel;
        let mut launcher = Launcher {
            cancel: cancel.clone(),
            errors: Vec::new(),
            drivers: Vec::new(),
        };

        let started = (self.launch)(&mut launcher).and_then(|results| {
            let errors = std::mem::take(&mut launcher.errors);
            let (errors, barrier) = merge::launch(&cancel, errors, self.config.buffer)?;
            launcher.drivers.push(barrier);
            Ok((results, errors))
        });
        let (results, errors) = match started {
            Ok(streams) => streams,
            Err(err) => {
                cancel.cancel();
                return Err(err);
            }
        };

        let report = sink.run(&cancel, results, errors).await;

        // every driver is awaited; the first panic is reported
        let mut failed = None;
        for driver in launcher.drivers {
            if let Err(err) = driver.await {
                cancel.cancel();
                failed.get_or_insert(err);
            }
        }
        match failed {
            Some(err) => Err(Error::Join(err)),
            None => Ok(report),
        }
    }
}
