//! Taste similarity between two rating profiles.
//!
//! ## Algorithm
//! 1. Inner-join both profiles' rated films by id (unrated entries are
//!    missing values, not zeros)
//! 2. Fewer than `MIN_OVERLAP` shared films, or a side whose overlapping
//!    ratings are all identical, scores 0
//! 3. Otherwise take the Pearson correlation of the aligned pairs and clamp
//!    it into `[0, 1]`: divergent taste is never penalized, only alignment
//!    rewarded

use data_loader::{Handle, Profile};
use rayon::prelude::*;
use tracing::debug;

use crate::types::FriendsMap;

/// Shared rated films required before a correlation means anything
pub const MIN_OVERLAP: usize = 3;

/// Pearson similarity of two profiles, in `[0, 1]`.
///
/// Pairs are summed in film-id order, so the result is symmetric and
/// identical inputs always give identical output.
pub fn pearson(a: &Profile, b: &Profile) -> f64 {
    let ratings_b = b.rating_index();
    let mut pairs: Vec<(&str, f64, f64)> = a
        .rating_index()
        .into_iter()
        .filter_map(|(id, x)| ratings_b.get(id).map(|&y| (id, x, y)))
        .collect();

    if pairs.len() < MIN_OVERLAP {
        return 0.0;
    }
    pairs.sort_unstable_by(|l, r| l.0.cmp(r.0));

    if is_constant(pairs.iter().map(|p| p.1)) || is_constant(pairs.iter().map(|p| p.2)) {
        return 0.0;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.2).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for &(_, x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let r = cov / (var_x * var_y).sqrt();
    if r.is_nan() { 0.0 } else { r.clamp(0.0, 1.0) }
}

fn is_constant(mut values: impl Iterator<Item = f64>) -> bool {
    match values.next() {
        Some(first) => values.all(|v| v == first),
        None => true,
    }
}

/// Rank every friend by similarity to `viewer`, most similar first.
///
/// The viewer's own handle is skipped if it appears among the friends.
/// Ties are ordered by handle.
pub fn friend_similarity(viewer: &Profile, friends: &FriendsMap) -> Vec<(Handle, f64)> {
    let mut ranked: Vec<(Handle, f64)> = friends
        .par_iter()
        .filter(|(handle, _)| *handle != viewer.handle())
        .map(|(handle, friend)| (handle.clone(), pearson(viewer, &friend.profile)))
        .collect();

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    debug!("{} - ranked {} friend(s) by similarity", viewer.handle(), ranked.len());
    ranked
}
