//! Error types for consensus validation
//!
//! Two disjoint classes: a failing rule is an ordinary verdict carried in
//! [`crate::rulebook::RuleBookResult`] and never surfaces as an error; the
//! types here cover collaborator failures that abort a validation call.

use thiserror::Error;

/// Failure of the backing key-value store or of data read from it.
///
/// Always fatal to the operation in progress. Must never be folded into a
/// negative rule verdict: a transient infrastructure problem is not a
/// protocol violation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("backing store unavailable: {0}")]
    Unavailable(String),

    #[error("stored data corrupt: {0}")]
    Corrupt(String),
}

/// Fatal abort of a validation call.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A rule or the UTXO set could not reach a collaborator.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A rule was evaluated against a context missing one of its facts.
    /// Indicates a mis-assembled context, not a property of the candidate.
    #[error("required fact '{0}' missing from validation context")]
    MissingFact(&'static str),
}

pub type Result<T> = std::result::Result<T, ValidationError>;
