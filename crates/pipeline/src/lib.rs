//! Similarity scoring and recommendation aggregation over scraped profiles.
//!
//! This crate provides:
//! - `pearson` / `friend_similarity`: bounded, non-negative taste similarity
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//! - Recommender: similarity-weighted aggregation, scoring and ranking
//!
//! Everything here is synchronous CPU work over data that has already been
//! crawled; none of it blocks or touches the network.
//!
//! ## Architecture
//! The recommender processes candidates in stages:
//! 1. Friends' films the viewer has not seen are grouped by id into
//!    unscored candidates
//! 2. Filters remove unwanted candidates (too few friends by default)
//! 3. Survivors are normalized, scored and ranked
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{Recommender, Weights, friend_similarity};
//!
//! let closest = friend_similarity(&viewer, &friends);
//!
//! let ranked = Recommender::with_weights(Weights::default())
//!     .with_min_friends(2)
//!     .recommend(&friends, &viewer, Some(25))?;
//! ```

pub mod types;
pub mod similarity;
pub mod traits;
pub mod filters;
pub mod filter_pipeline;
pub mod recommend;

// Re-export main types
pub use types::{Candidate, FriendProfile, FriendsMap, ViewerContext, Weights};
pub use similarity::{friend_similarity, pearson};
pub use traits::Filter;
pub use filter_pipeline::FilterPipeline;
pub use recommend::{Recommender, recommend};
