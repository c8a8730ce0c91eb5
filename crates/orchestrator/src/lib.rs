//! Orchestrator crate for the friend-taste recommender.
//!
//! This crate fans friend crawls out over a bounded pool of tasks and ties
//! crawling, similarity and ranking into a single run.

pub mod error;
pub mod orchestrator;

pub use error::{CrawlFailure, FailureReason, PipelineError};
pub use orchestrator::{OrchestratorConfig, RecommendationOrchestrator, RunOutcome, ScrapeReport};
