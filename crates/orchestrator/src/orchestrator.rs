//! # Recommendation Orchestrator
//!
//! This module coordinates the entire recommendation pipeline:
//! 1. Resolve the viewer's friends for the requested mode
//! 2. Crawl the viewer's own profile (the similarity baseline)
//! 3. Crawl every friend on a bounded pool of tasks, each computing its
//!    friend's similarity as soon as the profile arrives
//! 4. Merge the per-task results once every task has finished
//! 5. Filter, score and rank the unseen films
//!
//! A friend whose crawl fails is reported and skipped; only a failure to
//! crawl the viewer (or to resolve their friends) aborts the run.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crawler::{CrawlError, Crawler};
use data_loader::{Handle, Profile, RelationMode};
use pipeline::{Candidate, FriendProfile, FriendsMap, Recommender, pearson};

use crate::error::{CrawlFailure, FailureReason, PipelineError};

/// How wide the friend fan-out may go.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Friends crawled at once
    pub max_workers: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { max_workers: 100 }
    }
}

impl OrchestratorConfig {
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }
}

/// Everything collected by one friend crawl.
#[derive(Debug)]
pub struct ScrapeReport {
    pub viewer: Profile,
    pub friends: FriendsMap,
    /// Friends that could not be crawled, in handle order
    pub failures: Vec<CrawlFailure>,
}

/// Terminal state of a recommendation run.
///
/// The empty states are not errors: callers present them differently from
/// a failed crawl.
#[derive(Debug)]
pub enum RunOutcome {
    /// The viewer has no friends for the requested mode
    NoFriends { mode: RelationMode },
    /// Friends were crawled but none of their films are new to the viewer
    NothingToRecommend { report: ScrapeReport },
    Recommendations {
        candidates: Vec<Candidate>,
        report: ScrapeReport,
    },
}

/// Main orchestrator that coordinates the recommendation pipeline
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    crawler: Arc<Crawler>,
    config: OrchestratorConfig,
    cancel: CancellationToken,
}

impl RecommendationOrchestrator {
    pub fn new(crawler: Crawler) -> Self {
        Self {
            crawler: Arc::new(crawler),
            config: OrchestratorConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Stop starting friend crawls once `token` is cancelled.
    ///
    /// Pass the same token to the fetcher so requests already queued inside
    /// a crawl stop too.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn crawler(&self) -> &Crawler {
        &self.crawler
    }

    /// Sorted friend handles of `viewer` for a mode given by name.
    pub async fn list_friends(&self, viewer: &Handle, mode: &str) -> Result<Vec<Handle>, PipelineError> {
        let mode: RelationMode = mode.parse().map_err(PipelineError::InvalidMode)?;
        self.resolve_friends(viewer, mode).await
    }

    async fn resolve_friends(&self, viewer: &Handle, mode: RelationMode) -> Result<Vec<Handle>, PipelineError> {
        self.crawler
            .resolve_friends(viewer, mode)
            .await
            .map(|set| set.into_vec())
            .map_err(|source| match source {
                CrawlError::InvalidMode(err) => PipelineError::InvalidMode(err),
                source => PipelineError::Relation {
                    handle: viewer.clone(),
                    source,
                },
            })
    }

    /// Crawl the viewer, then every friend, scoring each friend against the viewer.
    ///
    /// Duplicate handles and the viewer's own handle are skipped.
    #[instrument(skip(self, viewer, friends), fields(viewer = %viewer, friends = friends.len()))]
    pub async fn scrape_friends(
        &self,
        viewer: &Handle,
        friends: &[Handle],
    ) -> Result<ScrapeReport, PipelineError> {
        let start_time = Instant::now();

        let viewer_profile = self
            .crawler
            .scrape_films(viewer)
            .await
            .map_err(|source| PipelineError::ViewerCrawl {
                handle: viewer.clone(),
                source,
            })?;
        info!(
            "Crawled viewer {}: {} film(s), {} rated",
            viewer,
            viewer_profile.len(),
            viewer_profile.rated_count()
        );

        let unique: BTreeSet<&Handle> = friends.iter().filter(|h| *h != viewer).collect();
        let baseline = Arc::new(viewer_profile);
        let permits = Arc::new(Semaphore::new(self.config.max_workers.max(1)));

        let tasks: Vec<(Handle, JoinHandle<Result<FriendProfile, FailureReason>>)> = unique
            .into_iter()
            .map(|handle| {
                let task = tokio::spawn(crawl_friend(
                    self.crawler.clone(),
                    handle.clone(),
                    baseline.clone(),
                    permits.clone(),
                    self.cancel.clone(),
                ));
                (handle.clone(), task)
            })
            .collect();

        let mut scraped = FriendsMap::new();
        let mut failures = Vec::new();

        for (handle, task) in tasks {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(join_err) => Err(FailureReason::Aborted(join_err.to_string())),
            };

            match outcome {
                Ok(friend) => {
                    scraped.insert(handle, friend);
                }
                Err(reason) => {
                    warn!("Skipping {}: {}", handle, reason);
                    failures.push(CrawlFailure { handle, reason });
                }
            }
        }

        info!(
            "Crawled {} friend(s) of {} ({} failed) in {:.2?}",
            scraped.len(),
            viewer,
            failures.len(),
            start_time.elapsed()
        );

        let viewer_profile = Arc::try_unwrap(baseline).unwrap_or_else(|shared| (*shared).clone());
        Ok(ScrapeReport {
            viewer: viewer_profile,
            friends: scraped,
            failures,
        })
    }

    /// Full run: resolve friends, crawl, rank.
    pub async fn run(
        &self,
        viewer: &Handle,
        mode: &str,
        recommender: &Recommender,
        top_n: Option<usize>,
    ) -> Result<RunOutcome, PipelineError> {
        let mode: RelationMode = mode.parse().map_err(PipelineError::InvalidMode)?;

        let friends = self.resolve_friends(viewer, mode).await?;
        if friends.is_empty() {
            info!("{} has no {} friends", viewer, mode);
            return Ok(RunOutcome::NoFriends { mode });
        }
        info!("{} has {} {} friend(s)", viewer, friends.len(), mode);

        let report = self.scrape_friends(viewer, &friends).await?;
        let candidates = recommender.recommend(&report.friends, &report.viewer, top_n)?;

        if candidates.is_empty() {
            return Ok(RunOutcome::NothingToRecommend { report });
        }
        Ok(RunOutcome::Recommendations { candidates, report })
    }
}

/// One worker: wait for a slot, crawl, score against the viewer.
async fn crawl_friend(
    crawler: Arc<Crawler>,
    handle: Handle,
    viewer: Arc<Profile>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
) -> Result<FriendProfile, FailureReason> {
    let _permit = permits
        .acquire_owned()
        .await
        .map_err(|_| FailureReason::Cancelled)?;

    if cancel.is_cancelled() {
        return Err(FailureReason::Cancelled);
    }

    let profile = crawler.scrape_films(&handle).await?;
    let similarity = pearson(&viewer, &profile);
    debug!("{} - similarity {:.3} over {} film(s)", handle, similarity, profile.len());

    Ok(FriendProfile {
        profile,
        similarity,
    })
}
