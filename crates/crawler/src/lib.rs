//! # Crawler Crate
//!
//! Turns a handle into the data the recommender needs by driving a
//! [`PageFetcher`] over the origin's pages.
//!
//! ## Components
//!
//! ### Film-log crawl
//! Every page of a handle's film log, fetched concurrently after the first
//! page reveals the page count, folded into a [`Profile`](data_loader::Profile).
//!
//! ### Relation crawl
//! The `following` and `followers` listings, walked through their "next"
//! links. Mutual friends are the intersection of the two.
//!
//! ## Example Usage
//!
//! ```ignore
//! use crawler::Crawler;
//! use http_client::{FetchConfig, Fetcher};
//! use std::sync::Arc;
//!
//! let fetcher = Arc::new(Fetcher::new(FetchConfig::default())?);
//! let crawler = Crawler::new(fetcher);
//!
//! let handle = "alice".parse()?;
//! let friends = crawler.list_friends(&handle, "mutual").await?;
//! let profile = crawler.scrape_films(&handle).await?;
//! ```

pub mod error;
mod film_log;
mod relations;

pub use error::CrawlError;

use std::sync::Arc;

use http_client::PageFetcher;

/// Origin the crawler targets unless configured otherwise
pub const DOMAIN: &str = "https://letterboxd.com";

/// Where to crawl and how wide to fan out within one handle.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Scheme and host, without a trailing slash
    pub domain: String,
    /// Film-log pages of one handle fetched at once
    pub page_workers: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            domain: DOMAIN.to_string(),
            page_workers: 100,
        }
    }
}

impl CrawlerConfig {
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_page_workers(mut self, workers: usize) -> Self {
        self.page_workers = workers.max(1);
        self
    }
}

/// Crawls profiles and friend lists through a shared fetcher.
///
/// Cheap to clone; clones share the fetcher (and therefore its connection
/// ceiling and cancellation token).
#[derive(Clone)]
pub struct Crawler {
    fetcher: Arc<dyn PageFetcher>,
    config: CrawlerConfig,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            config: CrawlerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CrawlerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }
}

/// Canned pages shared by the crawl tests.
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use http_client::FetchError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory origin: known URLs return their page, anything else is a 404.
    #[derive(Default)]
    pub(crate) struct StaticPages {
        pages: HashMap<String, String>,
        requests: Mutex<Vec<String>>,
    }

    impl StaticPages {
        pub(crate) fn with_page(mut self, url: &str, html: String) -> Self {
            self.pages.insert(url.to_string(), html);
            self
        }

        /// Every URL requested so far, in request order
        pub(crate) fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for StaticPages {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            self.pages.get(url).cloned().ok_or(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    /// Render a film-log page: `(id, star glyphs, liked)` per poster.
    pub(crate) fn film_page(films: &[(&str, Option<&str>, bool)], total_pages: Option<usize>) -> String {
        let mut html = String::from("<html><body><ul class=\"poster-list\">");
        for (id, stars, liked) in films {
            html.push_str(&format!(
                "<li><div class=\"film-poster\" data-target-link=\"/film/{id}/\"><img alt=\"{id}\"/></div>"
            ));
            if stars.is_some() || *liked {
                html.push_str("<p class=\"poster-viewingdata\">");
                if let Some(stars) = stars {
                    html.push_str(&format!("<span class=\"rating\">{stars}</span>"));
                }
                if *liked {
                    html.push_str("<span class=\"like\"></span>");
                }
                html.push_str("</p>");
            }
            html.push_str("</li>");
        }
        html.push_str("</ul>");
        if let Some(total) = total_pages {
            html.push_str("<div class=\"pagination\"><ul>");
            for page in 1..=total {
                html.push_str(&format!("<li class=\"paginate-page\"><a>{page}</a></li>"));
            }
            html.push_str("</ul></div>");
        }
        html.push_str("</body></html>");
        html
    }

    /// Render a relation-listing page with an optional next link.
    pub(crate) fn relation_page(handles: &[&str], next: Option<&str>) -> String {
        let mut html = String::from("<html><body><table class=\"person-table\">");
        for handle in handles {
            html.push_str(&format!(
                "<tr><td><a class=\"avatar -a40\" href=\"/{handle}/\"><img alt=\"{handle}\"/></a></td></tr>"
            ));
        }
        html.push_str("</table>");
        if let Some(next) = next {
            html.push_str(&format!("<div class=\"pagination\"><a class=\"next\" href=\"{next}\">Older</a></div>"));
        }
        html.push_str("</body></html>");
        html
    }

    #[test]
    fn test_config_trims_trailing_slash() {
        let config = CrawlerConfig::default().with_domain("https://films.test/");
        assert_eq!(config.domain, "https://films.test");
        assert_eq!(CrawlerConfig::default().with_page_workers(0).page_workers, 1);
    }

    #[test]
    fn test_default_domain() {
        let crawler = Crawler::new(Arc::new(StaticPages::default()));
        assert_eq!(crawler.config().domain, DOMAIN);
    }
}
