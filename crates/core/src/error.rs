//! Error types for the lessonbank domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each storage concern
//! has its own error enum; `LessonError` is the controller-level taxonomy.

use thiserror::Error;

use crate::lesson::MemoryTier;

/// Controller-level errors surfaced to callers.
#[derive(Debug, Error)]
pub enum LessonError {
    /// Malformed lesson or patch request. Rejected before any write.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Durable store unavailable or write rejected. The cache was left
    /// untouched — no state exists where the cache has data the store lacks.
    #[error("Durable write failed: {0}")]
    DurableWrite(#[from] StoreError),

    /// Cache update failed after a successful durable write. Non-fatal for
    /// commits; surfaced only where the cache is the operation's subject.
    #[error("Cache write failed: {0}")]
    Cache(#[from] CacheError),

    /// Durable-store enumeration failed mid-rebuild. The cache was reset to
    /// empty (fail-safe) and `rebuilt` records had been reinserted before
    /// the failure.
    #[error("Rebuild failed after {rebuilt} records: {source}")]
    Rebuild {
        rebuilt: usize,
        #[source]
        source: StoreError,
    },

    /// No durable record with this ID.
    #[error("Lesson not found: {0}")]
    LessonNotFound(String),

    /// Promote called with a lower-residency target, or demote with a
    /// higher-residency one.
    #[error("Invalid tier transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: MemoryTier,
        to: MemoryTier,
    },
}

/// Result type alias using the controller error.
pub type Result<T> = std::result::Result<T, LessonError>;

/// Errors from durable-store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from fast-cache implementations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cache capacity exhausted: {0}")]
    Exhausted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_displays_message() {
        let err = LessonError::Validation {
            message: "confidence_score out of range: 1.5".into(),
        };
        assert!(err.to_string().contains("1.5"));
    }

    #[test]
    fn rebuild_error_reports_partial_count() {
        let err = LessonError::Rebuild {
            rebuilt: 7,
            source: StoreError::Unavailable("scan interrupted".into()),
        };
        assert!(err.to_string().contains("7"));
        assert!(err.to_string().contains("scan interrupted"));
    }

    #[test]
    fn transition_error_names_both_tiers() {
        let err = LessonError::InvalidTransition {
            id: "l-1".into(),
            from: MemoryTier::Tier3Archive,
            to: MemoryTier::Tier1Kernel,
        };
        let s = err.to_string();
        assert!(s.contains("tier_3_archive"));
        assert!(s.contains("tier_1_kernel"));
    }
}
