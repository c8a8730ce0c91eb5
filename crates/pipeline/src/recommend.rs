//! Similarity-weighted aggregation of friends' films into ranked candidates.
//!
//! ## Algorithm
//! 1. Group every (friend, film) entry by film id, in id order, skipping
//!    films the viewer has already rated
//! 2. Per film: `pred_rating` is the similarity-weighted mean of the rated
//!    entries (plain mean when those friends' similarities sum to 0, 0 when
//!    nobody rated it), `like_sum` sums the similarity of friends who liked
//!    it, `num_friends` counts every friend who logged it
//! 3. Run the filter pipeline (minimum friends by default)
//! 4. Min-max normalize `like_sum` and `num_friends` across the survivors
//! 5. Score: `rating * pred / 5 + like * norm(like_sum) + popularity * norm(num_friends)`
//! 6. Stable sort by score, descending, and keep the top `top_n`
//!
//! Grouping by id and sorting stably makes the ranking independent of the
//! order in which friends were crawled.

use std::collections::BTreeMap;

use anyhow::Result;
use data_loader::{FilmRecord, Profile, StarRating};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::filter_pipeline::FilterPipeline;
use crate::filters::MinimumFriendsFilter;
use crate::types::{Candidate, FriendsMap, ViewerContext, Weights};

/// One friend's entry for a film, tagged with that friend's similarity.
struct Entry<'a> {
    film: &'a FilmRecord,
    similarity: f64,
}

/// Turns a friends map into a ranked candidate list.
pub struct Recommender {
    weights: Weights,
    filters: FilterPipeline,
}

impl Recommender {
    /// Default weights and the default filter (at least one friend).
    pub fn new() -> Self {
        Self::with_weights(Weights::default())
    }

    pub fn with_weights(weights: Weights) -> Self {
        Self {
            weights,
            filters: default_filters(1),
        }
    }

    /// Require at least `min_friends` friends per candidate.
    pub fn with_min_friends(mut self, min_friends: usize) -> Self {
        self.filters = default_filters(min_friends);
        self
    }

    /// Replace the filter pipeline entirely.
    ///
    /// Films the viewer has seen are dropped before any filter runs, so a
    /// custom pipeline cannot let them back in.
    pub fn with_filters(mut self, filters: FilterPipeline) -> Self {
        self.filters = filters;
        self
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Rank the films `friends` logged that `viewer` has not seen.
    ///
    /// `top_n` of `None` or `Some(0)` returns every candidate. An empty
    /// result means there is nothing to recommend; it is not an error.
    pub fn recommend(
        &self,
        friends: &FriendsMap,
        viewer: &Profile,
        top_n: Option<usize>,
    ) -> Result<Vec<Candidate>> {
        let context = ViewerContext::from_profile(viewer);

        let candidates = aggregate(friends, &context);
        let grouped = candidates.len();
        let mut candidates = self.filters.apply(candidates, &context)?;

        if candidates.is_empty() {
            info!("{} - nothing left to recommend ({} unseen film(s) logged by friends)", viewer.handle(), grouped);
            return Ok(candidates);
        }

        self.score(&mut candidates);
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

        if let Some(n) = top_n.filter(|&n| n > 0) {
            candidates.truncate(n);
        }

        info!(
            "{} - {} recommendation(s) from {} unseen film(s)",
            viewer.handle(),
            candidates.len(),
            grouped
        );
        Ok(candidates)
    }

    fn score(&self, candidates: &mut [Candidate]) {
        let likes = normalize(&candidates.iter().map(|c| c.like_sum).collect::<Vec<_>>());
        let counts = normalize(
            &candidates
                .iter()
                .map(|c| c.num_friends as f64)
                .collect::<Vec<_>>(),
        );

        for ((candidate, like), count) in candidates.iter_mut().zip(likes).zip(counts) {
            candidate.score = self.weights.rating * candidate.pred_rating / StarRating::MAX
                + self.weights.like * like
                + self.weights.popularity * count;
        }
    }
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new()
    }
}

fn default_filters(min_friends: usize) -> FilterPipeline {
    FilterPipeline::new().add_filter(MinimumFriendsFilter::new(min_friends))
}

/// Rank unseen films with the default filters.
pub fn recommend(
    friends: &FriendsMap,
    viewer: &Profile,
    weights: Weights,
    top_n: Option<usize>,
) -> Result<Vec<Candidate>> {
    Recommender::with_weights(weights).recommend(friends, viewer, top_n)
}

/// Group every friend's films the viewer has not seen by id and compute
/// the unscored candidates.
pub fn aggregate(friends: &FriendsMap, viewer: &ViewerContext) -> Vec<Candidate> {
    let mut groups: BTreeMap<&str, Vec<Entry<'_>>> = BTreeMap::new();
    for friend in friends.values() {
        for film in friend.profile.films() {
            if viewer.seen.contains(&film.id) {
                continue;
            }
            groups.entry(film.id.as_str()).or_default().push(Entry {
                film,
                similarity: friend.similarity,
            });
        }
    }
    debug!("Grouped {} film(s) across {} friend(s)", groups.len(), friends.len());

    groups
        .into_par_iter()
        .map(|(_, entries)| candidate_from(&entries))
        .collect()
}

fn candidate_from(entries: &[Entry<'_>]) -> Candidate {
    let first = entries[0].film;

    let rated: Vec<(f64, f64)> = entries
        .iter()
        .filter_map(|e| e.film.rating.map(|r| (r.value(), e.similarity)))
        .collect();

    let sim_sum: f64 = rated.iter().map(|&(_, s)| s).sum();
    let pred_rating = if rated.is_empty() {
        0.0
    } else if sim_sum > 0.0 {
        rated.iter().map(|&(r, s)| r * s).sum::<f64>() / sim_sum
    } else {
        rated.iter().map(|&(r, _)| r).sum::<f64>() / rated.len() as f64
    };

    let like_sum = entries
        .iter()
        .filter(|e| e.film.liked)
        .map(|e| e.similarity)
        .sum();

    Candidate {
        id: first.id.clone(),
        title: first.title.clone(),
        link: first.link.clone(),
        pred_rating,
        like_sum,
        num_friends: entries.len(),
        score: 0.0,
    }
}

/// Min-max scale `values` into `[0, 1]`.
///
/// A column with a single distinct value is divided by its max instead
/// (0 when that max is 0).
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        return values
            .iter()
            .map(|&v| if max == 0.0 { 0.0 } else { v / max })
            .collect();
    }

    let range = max - min;
    values.iter().map(|&v| (v - min) / range).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FriendProfile;
    use data_loader::Handle;

    fn film(id: &str, rating: Option<f64>, liked: bool) -> FilmRecord {
        FilmRecord {
            id: id.to_string(),
            title: id.to_uppercase(),
            rating: rating.and_then(StarRating::new),
            liked,
            link: format!("/film/{}/", id),
        }
    }

    fn friends(entries: Vec<(&str, f64, Vec<FilmRecord>)>) -> FriendsMap {
        entries
            .into_iter()
            .map(|(handle, similarity, films)| {
                let handle = Handle::new(handle).unwrap();
                let profile = Profile::from_records(handle.clone(), films);
                (handle, FriendProfile { profile, similarity })
            })
            .collect()
    }

    fn viewer(films: Vec<FilmRecord>) -> Profile {
        Profile::from_records(Handle::new("viewer").unwrap(), films)
    }

    fn nothing_seen() -> ViewerContext {
        ViewerContext::new(Handle::new("viewer").unwrap())
    }

    #[test]
    fn test_normalize_min_max() {
        assert_eq!(normalize(&[1.0, 3.0, 2.0]), vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn test_normalize_single_value_divides_by_max() {
        assert_eq!(normalize(&[2.0, 2.0]), vec![1.0, 1.0]);
        assert_eq!(normalize(&[0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn test_weighted_prediction() {
        let map = friends(vec![
            ("f1", 0.8, vec![film("b", Some(4.0), true)]),
            ("f2", 0.2, vec![film("b", Some(2.0), false)]),
        ]);

        let candidates = aggregate(&map, &nothing_seen());
        assert_eq!(candidates.len(), 1);
        assert!((candidates[0].pred_rating - 3.6).abs() < 1e-9);
        assert!((candidates[0].like_sum - 0.8).abs() < 1e-9);
        assert_eq!(candidates[0].num_friends, 2);
    }

    #[test]
    fn test_zero_similarity_falls_back_to_plain_mean() {
        let map = friends(vec![
            ("f1", 0.0, vec![film("b", Some(4.0), false)]),
            ("f2", 0.0, vec![film("b", Some(3.0), true)]),
        ]);

        let candidates = aggregate(&map, &nothing_seen());
        assert_eq!(candidates[0].pred_rating, 3.5);
        assert_eq!(candidates[0].like_sum, 0.0);
    }

    #[test]
    fn test_unrated_entries_count_as_friends_only() {
        let map = friends(vec![
            ("f1", 0.5, vec![film("b", Some(4.0), false)]),
            ("f2", 0.5, vec![film("b", None, true)]),
            ("f3", 0.5, vec![film("c", None, true)]),
        ]);

        let candidates = aggregate(&map, &nothing_seen());
        assert_eq!(candidates[0].id, "b");
        assert_eq!(candidates[0].pred_rating, 4.0);
        assert_eq!(candidates[0].num_friends, 2);
        assert_eq!(candidates[0].like_sum, 0.5);
        assert_eq!(candidates[1].pred_rating, 0.0);
    }

    #[test]
    fn test_seen_films_are_excluded() {
        let map = friends(vec![(
            "f1",
            1.0,
            vec![film("a", Some(5.0), true), film("b", Some(3.0), false), film("c", Some(2.0), false)],
        )]);
        let viewer = viewer(vec![film("a", Some(1.0), false), film("c", None, true)]);

        let ranked = Recommender::new().recommend(&map, &viewer, None).unwrap();
        let ids: Vec<&str> = ranked.iter().map(|c| c.id.as_str()).collect();

        assert_eq!(ids, vec!["b", "c"], "unrated viewer entries are not seen");
    }

    #[test]
    fn test_custom_pipeline_still_excludes_seen_films() {
        let map = friends(vec![(
            "f1",
            1.0,
            vec![film("a", Some(5.0), true), film("b", Some(3.0), false)],
        )]);
        let viewer = viewer(vec![film("a", Some(2.0), false)]);

        let ranked = Recommender::new()
            .with_filters(FilterPipeline::new())
            .recommend(&map, &viewer, None)
            .unwrap();
        let ids: Vec<&str> = ranked.iter().map(|c| c.id.as_str()).collect();

        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn test_nothing_to_recommend_is_empty() {
        let map = friends(vec![("f1", 1.0, vec![film("a", Some(5.0), true)])]);
        let viewer = viewer(vec![film("a", Some(4.0), false)]);

        let ranked = recommend(&map, &viewer, Weights::default(), Some(10)).unwrap();
        assert!(ranked.is_empty());

        let ranked = recommend(&FriendsMap::new(), &viewer, Weights::default(), None).unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_scores_and_top_n() {
        let map = friends(vec![
            ("f1", 1.0, vec![film("x", Some(5.0), true), film("y", Some(3.0), false)]),
            ("f2", 0.5, vec![film("x", Some(4.0), false), film("z", Some(1.0), false)]),
        ]);
        let viewer = viewer(vec![]);

        let all = Recommender::new().recommend(&map, &viewer, Some(0)).unwrap();
        let ids: Vec<&str> = all.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);

        // x: pred (5*1 + 4*0.5)/1.5, likes max -> 1, friends max -> 1
        let expected_x = 5.0 * (7.0 / 1.5) / 5.0 + 1.0 + 1.0;
        assert!((all[0].score - expected_x).abs() < 1e-9);
        // y: pred 3, likes 0, friends min -> 0
        assert!((all[1].score - 3.0).abs() < 1e-9);

        let top = Recommender::new().recommend(&map, &viewer, Some(2)).unwrap();
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn test_ties_keep_grouping_order() {
        let map = friends(vec![(
            "f1",
            1.0,
            vec![film("m", Some(3.0), false), film("b", Some(3.0), false), film("k", Some(3.0), false)],
        )]);

        let ranked = Recommender::new().recommend(&map, &viewer(vec![]), None).unwrap();
        let ids: Vec<&str> = ranked.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "k", "m"]);
    }

    #[test]
    fn test_min_friends_applies_before_normalization() {
        let map = friends(vec![
            ("f1", 1.0, vec![film("x", Some(4.0), true), film("y", Some(5.0), true)]),
            ("f2", 1.0, vec![film("x", Some(4.0), true)]),
        ]);

        let ranked = Recommender::new()
            .with_min_friends(2)
            .recommend(&map, &viewer(vec![]), None)
            .unwrap();

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, "x");
        // single row: both normalized columns divide by their max
        assert!((ranked[0].score - (4.0 + 1.0 + 1.0)).abs() < 1e-9);
    }
}
