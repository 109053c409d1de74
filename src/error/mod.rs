use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Framework errors.
///
/// Transform failures are not represented here: they travel as values of the
/// transform's own error type on a stage's error stream.
#[derive(Error, Debug)]
pub enum Error {
    #[error("stage `{stage}`: parallelism must be at least 1")]
    InvalidParallelism { stage: &'static str },

    #[error("stream capacity must be at least 1")]
    InvalidCapacity,

    #[error("invalid input at index {index}: {reason}")]
    InvalidInput { index: usize, reason: String },

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    /// True for errors reported while assembling a pipeline, before any item moves.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::InvalidParallelism { .. } | Self::InvalidCapacity | Self::InvalidInput { .. }
        )
    }
}
