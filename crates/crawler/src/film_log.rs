//! Film-log crawl: every film a handle has logged.
//!
//! ## Algorithm
//! 1. Fetch and parse page 1, reading the pagination control for the total
//!    page count (1 when absent)
//! 2. Fetch pages 2..=N concurrently, at most `page_workers` in flight
//! 3. Concatenate records in page order and build the profile
//!
//! Any page that still fails after the fetcher's retries fails the whole
//! handle: a partial profile would skew similarity without anyone noticing.

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info, instrument};

use data_loader::{FilmRecord, Handle, Profile, parser};

use crate::Crawler;
use crate::error::CrawlError;

impl Crawler {
    /// URL of one page of a handle's film log (pages are 1-based)
    pub fn film_log_url(&self, handle: &Handle, page: usize) -> String {
        if page <= 1 {
            format!("{}/{}/films/", self.config.domain, handle)
        } else {
            format!("{}/{}/films/page/{}/", self.config.domain, handle, page)
        }
    }

    /// Crawl every page of `handle`'s film log into a profile.
    #[instrument(skip(self, handle), fields(handle = %handle))]
    pub async fn scrape_films(&self, handle: &Handle) -> Result<Profile, CrawlError> {
        let first = self.fetch_film_page(handle, 1).await?;
        let (mut records, total) = parser::parse_first_film_page(&first);
        info!("{} - scraping {} film page(s)", handle, total);

        let remaining: Vec<Vec<FilmRecord>> = stream::iter(2..=total)
            .map(|page| async move {
                let html = self.fetch_film_page(handle, page).await?;
                Ok::<_, CrawlError>(parser::parse_film_page(&html))
            })
            .buffered(self.config.page_workers.max(1))
            .try_collect()
            .await?;

        records.extend(remaining.into_iter().flatten());
        debug!("{} - parsed {} film record(s)", handle, records.len());

        Ok(Profile::from_records(handle.clone(), records))
    }

    async fn fetch_film_page(&self, handle: &Handle, page: usize) -> Result<String, CrawlError> {
        let url = self.film_log_url(handle, page);
        self.fetcher
            .fetch(&url)
            .await
            .map_err(|source| CrawlError::FilmPage {
                handle: handle.clone(),
                page,
                source,
            })
    }
}
