//! Remote action trait

use crate::source::WorkItem;
use async_trait::async_trait;
use std::future::Future;

/// Error returned by a single remote action invocation
pub type ActionError = Box<dyn std::error::Error + Send + Sync>;

/// A single-item remote operation (delete one record, upload one file)
///
/// Implementations are shared by every worker of a run, so `apply` must be
/// safe to call concurrently. Shared state such as an HTTP client belongs in
/// the implementation and must not be mutated after construction.
#[async_trait]
pub trait RemoteAction<I>: Send + Sync + 'static {
    /// Perform the external call for one item, returning a success message
    async fn apply(&self, item: &I) -> Result<String, ActionError>;
}

/// Remote action backed by an async closure, see [`action_fn`]
pub struct FnAction<F> {
    f: F,
}

/// Wrap an async closure as a [`RemoteAction`]
///
/// The returned future must own what it needs; clone from the item
/// before the `async move` block.
pub fn action_fn<F>(f: F) -> FnAction<F> {
    FnAction { f }
}

#[async_trait]
impl<I, F, Fut> RemoteAction<I> for FnAction<F>
where
    I: WorkItem,
    F: Fn(&I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, ActionError>> + Send,
{
    async fn apply(&self, item: &I) -> Result<String, ActionError> {
        (self.f)(item).await
    }
}
