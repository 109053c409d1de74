pub mod cancel;
pub(crate) mod config;
pub mod merge;
pub mod runtime;
pub mod stage;
pub mod stream;
pub(crate) mod task;
pub mod transform;
