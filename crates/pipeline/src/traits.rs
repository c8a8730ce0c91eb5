//! Core traits for the candidate pipeline.
//!
//! This module defines the Filter trait that allows composable,
//! extensible filters to be applied to aggregated candidates.

use anyhow::Result;

use crate::types::{Candidate, ViewerContext};

/// Core trait for filtering candidates.
///
/// All filters must implement this trait to be used in the FilterPipeline.
///
/// ## Design Note
/// - `Send + Sync` allows filters to be shared with worker threads
/// - Filters take ownership of the Vec<Candidate> and return a filtered Vec
/// - Filters must keep the relative order of the candidates they retain
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of candidates.
    ///
    /// # Arguments
    /// * `candidates` - The candidates to filter (takes ownership)
    /// * `context` - What is known about the viewer
    fn apply(&self, candidates: Vec<Candidate>, context: &ViewerContext) -> Result<Vec<Candidate>>;
}
