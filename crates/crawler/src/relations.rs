//! Relation crawl: who a handle follows, who follows them, and the overlap.
//!
//! Relation listings paginate through a "next" link rather than a page
//! count, so pages are walked one after another until the link disappears.

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};
use url::Url;

use data_loader::{FriendSet, Handle, RelationKind, RelationMode, parser};

use crate::Crawler;
use crate::error::CrawlError;

impl Crawler {
    /// URL of the first page of a relation listing
    pub fn relation_url(&self, handle: &Handle, kind: RelationKind) -> String {
        format!("{}/{}/{}/", self.config.domain, handle, kind.path())
    }

    /// Walk every page of one relation listing.
    #[instrument(skip(self, handle), fields(handle = %handle))]
    pub async fn crawl_relation(
        &self,
        handle: &Handle,
        kind: RelationKind,
    ) -> Result<FriendSet, CrawlError> {
        let mut friends = FriendSet::new();
        let mut visited: HashSet<Url> = HashSet::new();
        let first = self.relation_url(handle, kind);
        let mut url = Url::parse(&first).map_err(|source| CrawlError::InvalidUrl {
            url: first.clone(),
            source,
        })?;

        loop {
            if !visited.insert(url.clone()) {
                warn!("{} - {} pagination revisits {}, stopping", handle, kind, url);
                break;
            }

            let html = self
                .fetcher
                .fetch(url.as_str())
                .await
                .map_err(|source| CrawlError::RelationPage {
                    handle: handle.clone(),
                    kind,
                    page: visited.len(),
                    source,
                })?;

            let page = parser::parse_relation_page(&html);
            debug!("{} - {} page {}: {} handle(s)", handle, kind, visited.len(), page.handles.len());
            friends.extend(page.handles);

            // "next" is resolved against the page it was found on
            match page.next {
                Some(href) => {
                    url = url.join(&href).map_err(|source| CrawlError::InvalidUrl {
                        url: href.clone(),
                        source,
                    })?
                }
                None => break,
            }
        }

        info!("{} - {} {} over {} page(s)", handle, friends.len(), kind, visited.len());
        Ok(friends)
    }

    /// Resolve a friend set for a typed mode.
    ///
    /// `Mutual` crawls both listings concurrently and intersects them.
    pub async fn resolve_friends(
        &self,
        handle: &Handle,
        mode: RelationMode,
    ) -> Result<FriendSet, CrawlError> {
        match mode {
            RelationMode::Following => self.crawl_relation(handle, RelationKind::Following).await,
            RelationMode::Followers => self.crawl_relation(handle, RelationKind::Followers).await,
            RelationMode::Mutual => {
                let (following, followers) = tokio::try_join!(
                    self.crawl_relation(handle, RelationKind::Following),
                    self.crawl_relation(handle, RelationKind::Followers),
                )?;
                let mutual = following.intersection(&followers);
                info!("{} - {} mutual friend(s)", handle, mutual.len());
                Ok(mutual)
            }
        }
    }

    /// Sorted friend handles for a mode given by name.
    ///
    /// Fails with `CrawlError::InvalidMode` before any request is made when
    /// `mode` is not `following`, `followers` or `mutual`.
    pub async fn list_friends(&self, handle: &Handle, mode: &str) -> Result<Vec<Handle>, CrawlError> {
        let mode: RelationMode = mode.parse()?;
        Ok(self.resolve_friends(handle, mode).await?.into_vec())
    }
}
