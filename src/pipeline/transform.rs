use std::future::{ready, Future, Ready};

use async_trait::async_trait;

/// Per-item work run by a [`Stage`](crate::pipeline::stage::Stage).
///
/// Implementations must not manage their own concurrency; the stage decides
/// how many invocations run at once. Any `Fn(In) -> Future<Output =
/// Result<O, E>>` closure is a transform.
#[async_trait]
pub trait Transform<In: Send + 'static>: Send + Sync + 'static {
    type Output: Send + 'static;
    type Error: Send + 'static;

    async fn apply(&self, input: In) -> Result<Self::Output, Self::Error>;
}

#[async_trait]
impl<In, O, E, F, Fut> Transform<In> for F
where
    In: Send + 'static,
    O: Send + 'static,
    E: Send + 'static,
    F: Fn(In) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, E>> + Send + 'static,
{
    type Output = O;
    type Error = E;

    async fn apply(&self, input: In) -> Result<O, E> {
        (self)(input).await
    }
}

/// Adapt a synchronous `In -> Result<O, E>` function into a transform.
pub fn from_fn<In, O, E, F>(f: F) -> impl Fn(In) -> Ready<Result<O, E>> + Send + Sync + 'static
where
    In: 'static,
    O: 'static,
    E: 'static,
    F: Fn(In) -> Result<O, E> + Send + Sync + 'static,
{
    move |input| ready(f(input))
}
