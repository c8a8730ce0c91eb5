//! Id-keyed views over a profile.
//!
//! Similarity and recommendation both start by indexing a profile's rated
//! films by id. Unrated entries are left out, so they behave as missing
//! values rather than zeros.

use std::collections::{HashMap, HashSet};

use crate::types::{Profile, StarRating};

impl Profile {
    /// Map of film id -> rating for every rated film.
    ///
    /// Borrowing the ids keeps this cheap: the index lives no longer than
    /// the profile it was built from.
    pub fn rating_index(&self) -> HashMap<&str, f64> {
        self.films()
            .iter()
            .filter_map(|film| {
                film.rating
                    .map(StarRating::value)
                    .map(|rating| (film.id.as_str(), rating))
            })
            .collect()
    }

    /// Ids the owner counts as "seen": every rated film.
    pub fn seen_ids(&self) -> HashSet<&str> {
        self.films()
            .iter()
            .filter(|film| film.is_rated())
            .map(|film| film.id.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{FilmRecord, Handle, Profile, StarRating};

    fn film(id: &str, rating: Option<f64>) -> FilmRecord {
        FilmRecord {
            id: id.to_string(),
            title: id.to_uppercase(),
            rating: rating.and_then(StarRating::new),
            liked: false,
            link: format!("/film/{}/", id),
        }
    }

    #[test]
    fn test_rating_index_skips_unrated() {
        let profile = Profile::from_records(
            Handle::new("alice").unwrap(),
            vec![film("a", Some(4.0)), film("b", None), film("c", Some(1.5))],
        );

        let index = profile.rating_index();
        assert_eq!(index.len(), 2);
        assert_eq!(index["a"], 4.0);
        assert_eq!(index["c"], 1.5);
        assert!(!index.contains_key("b"));
    }

    #[test]
    fn test_seen_ids_excludes_unrated() {
        let profile = Profile::from_records(
            Handle::new("alice").unwrap(),
            vec![film("a", Some(4.0)), film("b", None)],
        );

        let seen = profile.seen_ids();
        assert!(seen.contains("a"));
        assert!(!seen.contains("b"));
    }
}
