use std::collections::HashMap;
use std::sync::Arc;

pub(crate) const DEFAULT_BUFFER: usize = 1;
pub(crate) const DEFAULT_CONCURRENCY: usize = 1;

#[derive(Clone, Debug)]
pub(crate) struct StageConfig {
    pub buffer: usize,
    pub concurrency: usize,
    pub buffers: Arc<HashMap<&'static str, usize>>,
    pub concurrencies: Arc<HashMap<&'static str, usize>>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            buffer: DEFAULT_BUFFER,
            concurrency: DEFAULT_CONCURRENCY,
            buffers: Arc::default(),
            concurrencies: Arc::default(),
        }
    }
}

impl StageConfig {
    pub fn buffer_for(&self, stage: &'static str) -> usize {
        self.buffers.get(stage).copied().unwrap_or(self.buffer)
    }

    /// Runtime override, then the stage's own setting, then the runtime default.
    pub fn concurrency_for(&self, stage: &'static str, own: Option<usize>) -> usize {
        self.concurrencies
            .get(stage)
            .copied()
            .or(own)
            .unwrap_or(self.concurrency)
    }
}
