//! Errors of an end-to-end run.
//!
//! Only failures that leave nothing to compare against are fatal. A friend
//! whose crawl fails becomes a [`CrawlFailure`] in the report instead.

use crawler::CrawlError;
use data_loader::{DataError, Handle};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The viewer's own film log could not be crawled
    #[error("Failed to crawl the viewer profile of {handle}: {source}")]
    ViewerCrawl {
        handle: Handle,
        #[source]
        source: CrawlError,
    },

    /// The requested friend-relation mode is not recognized
    #[error(transparent)]
    InvalidMode(DataError),

    /// The viewer's friend list could not be crawled
    #[error("Failed to resolve friends of {handle}: {source}")]
    Relation {
        handle: Handle,
        #[source]
        source: CrawlError,
    },

    /// Filtering or ranking failed
    #[error(transparent)]
    Recommend(#[from] anyhow::Error),
}

/// Why a single friend is missing from the results.
#[derive(Error, Debug)]
pub enum FailureReason {
    #[error(transparent)]
    Crawl(#[from] CrawlError),

    #[error("cancelled before the crawl started")]
    Cancelled,

    #[error("crawl task ended abnormally: {0}")]
    Aborted(String),
}

impl FailureReason {
    pub fn is_cancelled(&self) -> bool {
        match self {
            FailureReason::Cancelled => true,
            FailureReason::Crawl(err) => err.is_cancelled(),
            FailureReason::Aborted(_) => false,
        }
    }
}

/// A friend whose profile could not be collected.
#[derive(Debug)]
pub struct CrawlFailure {
    pub handle: Handle,
    pub reason: FailureReason,
}
