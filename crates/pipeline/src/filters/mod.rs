//! Filter implementations for the candidate pipeline.
//!
//! This module contains all the concrete filter implementations
//! that can be composed into a FilterPipeline.

pub mod min_friends;

// Re-export for convenience
pub use min_friends::MinimumFriendsFilter;
