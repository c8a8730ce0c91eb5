//! Core domain types for scraped film logs.
//!
//! This module defines the fixed-shape values that flow through the whole
//! pipeline:
//! - `Handle`: a normalized user identifier
//! - `StarRating`: a half-star rating in `[0, 5]`
//! - `FilmRecord`: one logged film
//! - `Profile`: every film logged by one handle
//! - `FriendSet`: a sorted, deduplicated set of handles
//! - `RelationKind` / `RelationMode`: which friend list to resolve

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::{DataError, Result};

// =============================================================================
// Type Aliases
// =============================================================================

/// Stable slug identifying a film on the origin site (e.g. `the-matrix`)
pub type FilmId = String;

// =============================================================================
// Handle
// =============================================================================

/// A user's unique identifier on the origin site.
///
/// Handles are normalized on construction: surrounding whitespace and
/// slashes are stripped and the result is lowercased, so `" /Alice/ "`
/// and `"alice"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Handle(String);

impl Handle {
    /// Normalize `raw` into a handle, rejecting blank input.
    pub fn new(raw: &str) -> Result<Self> {
        let normalized = raw
            .trim()
            .trim_matches('/')
            .trim()
            .to_lowercase();

        if normalized.is_empty() {
            return Err(DataError::InvalidHandle {
                raw: raw.to_string(),
            });
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Handle {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Handle {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<Handle> for String {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

impl Borrow<str> for Handle {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Ratings
// =============================================================================

/// A star rating in `[0, 5]`, in half-star steps.
///
/// A film without a rating is represented as `Option<StarRating>::None`
/// (the "unrated" sentinel) rather than a magic number, so it can never be
/// mistaken for a real low rating.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct StarRating(f64);

impl StarRating {
    pub const MAX: f64 = 5.0;

    /// Build a rating, returning `None` outside `[0, 5]` or off the half-star grid.
    pub fn new(value: f64) -> Option<Self> {
        let on_grid = (value * 2.0).fract() == 0.0;
        if (0.0..=Self::MAX).contains(&value) && on_grid {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Read a rating from its glyph rendering, e.g. `"★★★½"` -> 3.5.
    ///
    /// Counts filled stars and adds 0.5 for a half-star glyph. Text without
    /// any star glyph, or a count outside `[0, 5]`, is unrated (not clamped).
    pub fn from_glyphs(raw: &str) -> Option<Self> {
        let full = raw.matches('★').count();
        let half = raw.contains('½');
        if full == 0 && !half {
            return None;
        }

        let value = full as f64 + if half { 0.5 } else { 0.0 };
        Self::new(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for StarRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

// =============================================================================
// FilmRecord and Profile
// =============================================================================

/// One film from a user's log.
///
/// Produced by the page parser and never mutated afterwards; identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmRecord {
    pub id: FilmId,
    pub title: String,
    /// `None` is the unrated sentinel
    pub rating: Option<StarRating>,
    pub liked: bool,
    /// Site-relative path, e.g. `/film/the-matrix/`
    pub link: String,
}

impl FilmRecord {
    pub fn is_rated(&self) -> bool {
        self.rating.is_some()
    }
}

/// Every film logged by one handle.
///
/// Downstream code treats a profile as an unordered collection keyed by
/// film id. Duplicate ids (a pagination inconsistency on the origin) are
/// collapsed when the profile is built: the last record wins on value and
/// keeps the position where the id was first seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProfileRecords")]
pub struct Profile {
    handle: Handle,
    films: Vec<FilmRecord>,
    /// Film id -> index into `films`
    #[serde(skip)]
    positions: HashMap<FilmId, usize>,
}

/// Serialized shape of a profile; the id index is rebuilt on load.
#[derive(Deserialize)]
struct ProfileRecords {
    handle: Handle,
    films: Vec<FilmRecord>,
}

impl From<ProfileRecords> for Profile {
    fn from(raw: ProfileRecords) -> Self {
        Profile::from_records(raw.handle, raw.films)
    }
}

impl Profile {
    /// Build a profile from records in arrival order.
    pub fn from_records(handle: Handle, records: impl IntoIterator<Item = FilmRecord>) -> Self {
        let mut films: Vec<FilmRecord> = Vec::new();
        let mut positions: HashMap<FilmId, usize> = HashMap::new();

        for record in records {
            match positions.get(&record.id) {
                Some(&idx) => films[idx] = record,
                None => {
                    positions.insert(record.id.clone(), films.len());
                    films.push(record);
                }
            }
        }

        Self {
            handle,
            films,
            positions,
        }
    }

    /// An empty profile (a user who has logged nothing yet).
    pub fn empty(handle: Handle) -> Self {
        Self {
            handle,
            films: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn films(&self) -> &[FilmRecord] {
        &self.films
    }

    pub fn get(&self, id: &str) -> Option<&FilmRecord> {
        self.positions.get(id).map(|&idx| &self.films[idx])
    }

    pub fn len(&self) -> usize {
        self.films.len()
    }

    pub fn is_empty(&self) -> bool {
        self.films.is_empty()
    }

    /// Number of films carrying a real rating
    pub fn rated_count(&self) -> usize {
        self.films.iter().filter(|film| film.is_rated()).count()
    }

    /// Number of films marked as liked
    pub fn liked_count(&self) -> usize {
        self.films.iter().filter(|film| film.liked).count()
    }

    /// Mean of the rated films, `None` when nothing is rated
    pub fn mean_rating(&self) -> Option<f64> {
        let rated: Vec<f64> = self
            .films
            .iter()
            .filter_map(|film| film.rating.map(StarRating::value))
            .collect();

        if rated.is_empty() {
            return None;
        }
        Some(rated.iter().sum::<f64>() / rated.len() as f64)
    }
}

// =============================================================================
// Friend graph
// =============================================================================

/// Deduplicated, sorted set of handles.
///
/// Rust concept: `BTreeSet` keeps its elements ordered, so iteration is
/// always sorted and duplicates are impossible by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendSet(BTreeSet<Handle>);

impl FriendSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn insert(&mut self, handle: Handle) -> bool {
        self.0.insert(handle)
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.0.contains(handle)
    }

    /// Handles present in both sets (used for mutual friends).
    pub fn intersection(&self, other: &FriendSet) -> FriendSet {
        Self(self.0.intersection(&other.0).cloned().collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Handle> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sorted handles as a vector
    pub fn into_vec(self) -> Vec<Handle> {
        self.0.into_iter().collect()
    }
}

impl FromIterator<Handle> for FriendSet {
    fn from_iter<I: IntoIterator<Item = Handle>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Handle> for FriendSet {
    fn extend<I: IntoIterator<Item = Handle>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for FriendSet {
    type Item = Handle;
    type IntoIter = std::collections::btree_set::IntoIter<Handle>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A single relation listing that can be crawled directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    Following,
    Followers,
}

impl RelationKind {
    /// Path segment of the listing, e.g. `following`
    pub fn path(self) -> &'static str {
        match self {
            RelationKind::Following => "following",
            RelationKind::Followers => "followers",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Which friend list to resolve for a handle.
///
/// `Mutual` is not crawlable on its own: it is the intersection of the
/// `Following` and `Followers` listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RelationMode {
    Following,
    Followers,
    #[default]
    Mutual,
}

impl RelationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationMode::Following => "following",
            RelationMode::Followers => "followers",
            RelationMode::Mutual => "mutual",
        }
    }
}

impl fmt::Display for RelationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationMode {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "following" => Ok(RelationMode::Following),
            "followers" => Ok(RelationMode::Followers),
            "mutual" => Ok(RelationMode::Mutual),
            _ => Err(DataError::InvalidMode {
                mode: s.to_string(),
            }),
        }
    }
}
