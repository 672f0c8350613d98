//! Work source trait and the in-memory source

use crate::error::ListingError;
use async_trait::async_trait;
use std::fmt;

/// An opaque unit of work
///
/// Anything printable that can move between tasks qualifies. The `Display`
/// form identifies the item in logs and failure reports.
pub trait WorkItem: fmt::Display + fmt::Debug + Send + Sync + 'static {}

impl<T> WorkItem for T where T: fmt::Display + fmt::Debug + Send + Sync + 'static {}

/// Producer of the items a pipeline run processes
///
/// Sources are lazy, finite and not restartable. The pipeline calls
/// [`next_page`](WorkSource::next_page) until it returns `Ok(None)` or an
/// error; after either, the source is never polled again.
#[async_trait]
pub trait WorkSource: Send + 'static {
    type Item: WorkItem;

    /// Returns the source name used in logs (e.g., "cloudflare-dns")
    fn name(&self) -> &str;

    /// Fetch the next batch of items, `Ok(None)` once exhausted
    async fn next_page(&mut self) -> Result<Option<Vec<Self::Item>>, ListingError>;
}

/// A source over an already-known list of items
#[derive(Debug)]
pub struct VecSource<I> {
    name: String,
    items: Option<Vec<I>>,
}

impl<I> VecSource<I> {
    pub fn new(items: impl IntoIterator<Item = I>) -> Self {
        Self::named("memory", items)
    }

    pub fn named(name: impl Into<String>, items: impl IntoIterator<Item = I>) -> Self {
        Self {
            name: name.into(),
            items: Some(items.into_iter().collect()),
        }
    }

    /// Number of items not yet handed out
    pub fn len(&self) -> usize {
        self.items.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<I: WorkItem> WorkSource for VecSource<I> {
    type Item = I;

    fn name(&self) -> &str {
        &self.name
    }

    async fn next_page(&mut self) -> Result<Option<Vec<I>>, ListingError> {
        Ok(self.items.take().filter(|items| !items.is_empty()))
    }
}
