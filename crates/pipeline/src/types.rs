//! Values produced and consumed by the similarity and recommendation stages.

use std::collections::{BTreeMap, HashSet};

use data_loader::{FilmId, Handle, Profile};
use serde::Serialize;
use url::Url;

/// A friend's scraped profile together with their similarity to the viewer.
#[derive(Debug, Clone)]
pub struct FriendProfile {
    pub profile: Profile,
    /// Taste similarity to the viewer, in `[0, 1]`
    pub similarity: f64,
}

/// Friend handle -> profile and similarity.
///
/// A `BTreeMap` so every pass over friends visits them in handle order,
/// whatever order their crawls finished in.
pub type FriendsMap = BTreeMap<Handle, FriendProfile>;

/// Weights of the three terms in a candidate's composite score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    /// Weight of the predicted rating (scaled to `[0, 1]` by dividing by 5)
    pub rating: f64,
    /// Weight of the normalized similarity-weighted like count
    pub like: f64,
    /// Weight of the normalized number of friends who logged the film
    pub popularity: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            rating: 5.0,
            like: 1.0,
            popularity: 1.0,
        }
    }
}

impl Weights {
    pub fn with_rating(mut self, weight: f64) -> Self {
        self.rating = weight;
        self
    }

    pub fn with_like(mut self, weight: f64) -> Self {
        self.like = weight;
        self
    }

    pub fn with_popularity(mut self, weight: f64) -> Self {
        self.popularity = weight;
        self
    }
}

/// An unseen film aggregated across every friend who logged it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub id: FilmId,
    pub title: String,
    /// Site-relative link
    pub link: String,
    /// Similarity-weighted mean of friends' ratings
    pub pred_rating: f64,
    /// Sum of similarities of friends who liked the film
    pub like_sum: f64,
    /// Friends who logged the film, rated or not
    pub num_friends: usize,
    /// Composite score; 0 until the candidate has been scored
    pub score: f64,
}

impl Candidate {
    /// The film's link resolved against `domain`.
    ///
    /// A link that cannot be resolved is returned unchanged.
    pub fn absolute_link(&self, domain: &str) -> String {
        Url::parse(domain)
            .and_then(|base| base.join(&self.link))
            .map(String::from)
            .unwrap_or_else(|_| self.link.clone())
    }
}

/// What the filters know about the viewer.
#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub handle: Handle,
    /// Ids of films the viewer has rated
    pub seen: HashSet<FilmId>,
}

impl ViewerContext {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            seen: HashSet::new(),
        }
    }

    /// Context for `viewer`: every rated film counts as seen.
    pub fn from_profile(viewer: &Profile) -> Self {
        Self {
            handle: viewer.handle().clone(),
            seen: viewer.seen_ids().into_iter().map(str::to_string).collect(),
        }
    }
}
