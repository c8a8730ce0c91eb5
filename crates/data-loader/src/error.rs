//! Error types for the data-loader crate.
//!
//! Page parsing itself never fails: malformed film elements degrade to
//! defaults or are skipped. The only hard errors here come from
//! caller-supplied values (handles and relation modes).

use thiserror::Error;

/// Errors raised while validating caller-supplied identifiers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// Friend-relation mode other than `following`, `followers` or `mutual`
    #[error("invalid relation mode '{mode}': expected following, followers or mutual")]
    InvalidMode { mode: String },

    /// Handle that is empty once whitespace and slashes are stripped
    #[error("invalid handle '{raw}'")]
    InvalidHandle { raw: String },
}

/// Instead of writing `Result<T, DataError>` everywhere,
/// we can write `Result<T>`
pub type Result<T> = std::result::Result<T, DataError>;
