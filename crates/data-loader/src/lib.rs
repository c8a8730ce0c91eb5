//! # Data Loader Crate
//!
//! This crate turns scraped film-log HTML into typed profiles.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Handle, FilmRecord, Profile, FriendSet)
//! - **parser**: Parse film-log and relation-listing pages into Rust structs
//! - **index**: Id-keyed rating views used by similarity and recommendation
//! - **error**: Error types for caller-supplied identifiers
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{parser, Handle, Profile};
//!
//! let (records, pages) = parser::parse_first_film_page(&html);
//! let profile = Profile::from_records(Handle::new("alice")?, records);
//!
//! println!("{} logged {} films over {} page(s)", profile.handle(), profile.len(), pages);
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataError, Result};
pub use parser::RelationPage;
pub use types::{
    // Type aliases
    FilmId,
    // Core types
    FilmRecord,
    FriendSet,
    Handle,
    Profile,
    StarRating,
    // Enums
    RelationKind,
    RelationMode,
};
