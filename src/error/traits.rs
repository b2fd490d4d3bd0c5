//! Error classification for retry decisions.
//!
//! Callers feeding journal events into the engine use this to decide whether
//! a failed event should be re-queued (transient conditions such as the
//! service not being ready yet) or dead-lettered (permanent conditions such
//! as a fill against an unknown order).

use super::common::{EngineError, StoreError};

/// Coarse classification of an error for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// May resolve on retry (dependencies initializing, market data pending)
    Transient,
    /// Will not resolve on retry (unknown record, invalid transition)
    Permanent,
    /// Unexpected internal state
    Internal,
}

/// Trait for errors that can classify themselves.
pub trait ErrorClassification {
    /// Returns the category of this error
    fn category(&self) -> ErrorCategory;

    /// Returns true if re-submitting the same event may succeed
    fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Transient)
    }
}

impl ErrorClassification for StoreError {
    fn category(&self) -> ErrorCategory {
        match self {
            StoreError::NotFound { .. } => ErrorCategory::Permanent,
            StoreError::Cardinality { .. } => ErrorCategory::Internal,
            StoreError::Duplicate { .. } => ErrorCategory::Permanent,
        }
    }
}

impl ErrorClassification for EngineError {
    fn category(&self) -> ErrorCategory {
        match self {
            EngineError::NotReady => ErrorCategory::Transient,
            // Surfaced so the caller can retry once a book arrives.
            EngineError::MarketDataUnavailable { .. } => ErrorCategory::Transient,
            EngineError::UnsupportedTransition { .. } => ErrorCategory::Permanent,
            EngineError::NoOrderForFill { .. } => ErrorCategory::Permanent,
            EngineError::FillOnFilledOrder { .. } => ErrorCategory::Permanent,
            EngineError::InvalidStratTransition { .. } => ErrorCategory::Permanent,
            EngineError::ActivationBlocked { .. } => ErrorCategory::Permanent,
            EngineError::Store(e) => e.category(),
        }
    }
}
