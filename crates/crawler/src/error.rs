//! Crawl failures, scoped to the handle and page that broke.

use data_loader::{DataError, Handle, RelationKind};
use http_client::FetchError;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CrawlError {
    /// A film-log page could not be fetched (after retries, if transient)
    #[error("Failed to fetch page {page} of {handle}'s films: {source}")]
    FilmPage {
        handle: Handle,
        page: usize,
        #[source]
        source: FetchError,
    },

    /// A relation-listing page could not be fetched
    #[error("Failed to fetch page {page} of {handle}'s {kind}: {source}")]
    RelationPage {
        handle: Handle,
        kind: RelationKind,
        page: usize,
        #[source]
        source: FetchError,
    },

    /// A page URL or "next" link that does not resolve to an absolute URL
    #[error("Cannot resolve '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Unknown friend-relation mode; never retried
    #[error(transparent)]
    InvalidMode(#[from] DataError),
}

impl CrawlError {
    /// The underlying fetch failure, if any
    pub fn fetch_error(&self) -> Option<&FetchError> {
        match self {
            CrawlError::FilmPage { source, .. } | CrawlError::RelationPage { source, .. } => {
                Some(source)
            }
            CrawlError::InvalidUrl { .. } | CrawlError::InvalidMode(_) => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.fetch_error(), Some(FetchError::Cancelled { .. }))
    }
}
