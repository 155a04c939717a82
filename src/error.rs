//! Crate error type.
//!
//! Infeasible configurations are not errors: selectors return a short [`crate::Selection`]
//! instead. Everything here is a caller contract violation detected before (or, for the
//! streaming selector, at) the offending input.

use thiserror::Error;

/// Errors reported by quota assignment and selection.
///
/// Category labels and identifiers are rendered with `Debug` so the enum stays non-generic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("no category can host {leftover} leftover slot(s)")]
    NoEligibleCategory { leftover: usize },

    #[error("category {category} has zero population")]
    EmptyCategory { category: String },

    #[error("cannot assign {k} slot(s) without any category")]
    NoCategories { k: usize },

    #[error("invalid quota for category {category}: floor {floor} > ceiling {ceiling}")]
    InvalidQuota {
        category: String,
        floor: usize,
        ceiling: usize,
    },

    #[error("category {category} has no quota")]
    UnknownCategory { category: String },

    #[error("duplicate identifier {id}")]
    DuplicateId { id: String },

    #[error("non-finite score for identifier {id}")]
    NonFiniteScore { id: String },

    #[error("items are not sorted by descending score at index {index}")]
    NotSorted { index: usize },

    #[error("warm-up ratio must be in (0, 1], got {ratio}")]
    InvalidWarmupRatio { ratio: f64 },

    #[error("category {category} received more items than its population count {count}")]
    PopulationExceeded { category: String, count: usize },

    #[error("selection already holds all {k} item(s)")]
    SelectionClosed { k: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn label<T: std::fmt::Debug>(value: &T) -> String {
    format!("{value:?}")
}
