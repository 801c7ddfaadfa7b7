//! Error kinds for the evaluation pipeline.
//!
//! Fatal vs. recoverable is carried by the type:
//! - `FeedError` aborts the run for a program (bad response shape, missing fields).
//! - `EvalError` only skips the partner being evaluated.
//! - `TermsError` is raised by the text primitives and mapped by the engine.

use thiserror::Error;

/// Upstream feed does not have the structure the engine needs. Aborts the run.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("the feed response is not a valid list: {0}")]
    NotACollection(String),

    /// One line per missing field, collected across every record.
    #[error("{}", .0.join("\n"))]
    MissingFields(Vec<String>),

    #[error("feed body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure of a single text primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TermsError {
    #[error("minimum purchase amount {raw:?} is not a decimal")]
    Amount { raw: String },

    #[error("invalid campaign date {raw:?}")]
    Date { raw: String },
}

/// Per-partner failure: the partner is skipped, the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("partner {partner}: minimum purchase amount {raw:?} is not a decimal")]
    Amount { partner: String, raw: String },

    #[error("partner {partner}: accrual ratio {raw:?} is not a decimal")]
    Ratio { partner: String, raw: String },
}

impl EvalError {
    pub fn partner(&self) -> &str {
        match self {
            EvalError::Amount { partner, .. } | EvalError::Ratio { partner, .. } => partner,
        }
    }
}
