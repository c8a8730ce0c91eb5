//! Filter to require a minimum amount of friend support.
//!
//! A film logged by a single friend is a weak signal; raising the
//! threshold trades coverage for confidence.

use crate::traits::Filter;
use crate::types::{Candidate, ViewerContext};
use anyhow::Result;
use tracing::debug;

/// Removes candidates logged by fewer than `min_friends` friends.
pub struct MinimumFriendsFilter {
    min_friends: usize,
}

impl MinimumFriendsFilter {
    /// Create a new MinimumFriendsFilter.
    ///
    /// # Arguments
    /// * `min_friends` - Friends that must have logged a film (typically 1)
    pub fn new(min_friends: usize) -> Self {
        Self { min_friends }
    }
}

impl Default for MinimumFriendsFilter {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Filter for MinimumFriendsFilter {
    fn name(&self) -> &str {
        "MinimumFriendsFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        _context: &ViewerContext,
    ) -> Result<Vec<Candidate>> {
        let before = candidates.len();
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| candidate.num_friends >= self.min_friends)
            .collect();

        debug!(
            "Dropped {} candidate(s) below {} friend(s)",
            before - filtered.len(),
            self.min_friends
        );
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::Handle;

    fn candidate(id: &str, num_friends: usize) -> Candidate {
        Candidate {
            id: id.to_string(),
            title: id.to_string(),
            link: format!("/film/{}/", id),
            pred_rating: 4.0,
            like_sum: 0.0,
            num_friends,
            score: 0.0,
        }
    }

    #[test]
    fn test_minimum_friends_filter() {
        let context = ViewerContext::new(Handle::new("viewer").unwrap());
        let candidates = vec![candidate("a", 1), candidate("b", 3), candidate("c", 2)];

        let filtered = MinimumFriendsFilter::new(2).apply(candidates, &context).unwrap();

        let ids: Vec<&str> = filtered.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_default_keeps_everything_logged() {
        let context = ViewerContext::new(Handle::new("viewer").unwrap());
        let candidates = vec![candidate("a", 1), candidate("b", 4)];

        let filtered = MinimumFriendsFilter::default().apply(candidates, &context).unwrap();
        assert_eq!(filtered.len(), 2);
    }
}
