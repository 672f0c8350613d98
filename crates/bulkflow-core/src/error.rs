//! Pipeline error types

use crate::action::ActionError;
use crate::outcome::Summary;
use thiserror::Error;

/// The work source could not enumerate items
#[derive(Error, Debug)]
pub enum ListingError {
    #[error("Listing request failed: {0}")]
    Request(String),

    #[error("Listing failed at page {page}: {source}")]
    Page {
        page: u32,
        #[source]
        source: ActionError,
    },
}

impl ListingError {
    pub fn page(page: u32, source: impl Into<ActionError>) -> Self {
        Self::Page {
            page,
            source: source.into(),
        }
    }
}

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Listing failed: {0}")]
    Listing(#[from] ListingError),

    #[error("Item {item} failed: {source}")]
    Item {
        item: String,
        #[source]
        source: ActionError,
    },

    #[error("Cancelled by caller")]
    Cancelled,

    #[error("Aborted after {summary}: {cause}")]
    Aborted {
        summary: Summary,
        #[source]
        cause: Box<PipelineError>,
    },

    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

impl PipelineError {
    /// The error that stopped the run, looking through `Aborted`
    pub fn root_cause(&self) -> &PipelineError {
        match self {
            PipelineError::Aborted { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// Identifier of the item that stopped the run, if an item did
    pub fn failed_item(&self) -> Option<&str> {
        match self.root_cause() {
            PipelineError::Item { item, .. } => Some(item),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
