//! Storage traits — the durable store and the fast cache.
//!
//! The durable store owns the single authoritative record for every lesson,
//! including its tier tag. The fast cache is a strict projection: it holds a
//! lesson if and only if that lesson's tier is Tier-1 or Tier-2, and it is
//! mutated only through the controller (commit, promote/demote, rebuild).
//!
//! Implementations: in-memory and JSONL file backends live in
//! `lessonbank-store`; a real document store or key-value cache plugs in
//! behind the same traits.

use async_trait::async_trait;

use crate::error::{CacheError, StoreError};
use crate::lesson::{Lesson, MemoryTier};

/// Source-of-truth persistence for all lessons.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// The backend name (e.g., "in_memory", "jsonl").
    fn name(&self) -> &str;

    /// Persist a new lesson record. The lesson's id must be set and unique.
    async fn insert(&self, lesson: Lesson) -> Result<(), StoreError>;

    /// Fetch a lesson by ID.
    async fn get(&self, id: &str) -> Result<Option<Lesson>, StoreError>;

    /// Update the tier tag (and tool affinity) on an existing record,
    /// bumping its revision counter in place. The payload is untouched and
    /// the record is never re-created, preserving the one-record-per-id
    /// invariant.
    ///
    /// Returns the new revision, or `None` if no record has this ID.
    async fn update_tier(
        &self,
        id: &str,
        tier: MemoryTier,
        tool_affinity: Option<String>,
    ) -> Result<Option<u64>, StoreError>;

    /// Remove a record. Returns whether a record existed.
    async fn remove(&self, id: &str) -> Result<bool, StoreError>;

    /// Enumerate every record, ordered by `(created_at, id)`.
    ///
    /// Used by rebuild and by the archive-search path; the ordering makes
    /// both deterministic.
    async fn scan(&self) -> Result<Vec<Lesson>, StoreError>;

    /// Count records whose trigger pattern matches (case-insensitive).
    /// Feeds the rubric's frequency band when the caller does not supply a
    /// prior-occurrence count.
    async fn pattern_occurrences(&self, trigger_pattern: &str) -> Result<usize, StoreError>;
}

/// Ephemeral, rebuildable projection of Tier-1/Tier-2 lessons.
///
/// Two logical structures: an ordered kernel list and a map from tool name
/// to an ordered Tier-2 bucket. No lesson appears in more than one bucket.
#[async_trait]
pub trait FastCache: Send + Sync {
    /// The backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Append a lesson to the kernel (Tier-1) list.
    async fn insert_kernel(&self, lesson: Lesson) -> Result<(), CacheError>;

    /// Append a lesson to a tool's Tier-2 bucket, creating the bucket on
    /// first use.
    async fn insert_skill(&self, tool: &str, lesson: Lesson) -> Result<(), CacheError>;

    /// Remove a lesson from whichever bucket holds it. Returns whether a
    /// cached copy existed.
    async fn remove(&self, id: &str) -> Result<bool, CacheError>;

    /// The kernel list, in insertion order.
    async fn kernel(&self) -> Result<Vec<Lesson>, CacheError>;

    /// A tool's Tier-2 bucket, in insertion order. Empty if absent.
    async fn skill_bucket(&self, tool: &str) -> Result<Vec<Lesson>, CacheError>;

    /// Tool bucket names, in first-insertion order.
    async fn tools(&self) -> Result<Vec<String>, CacheError>;

    /// Total cached lessons across kernel and all buckets.
    async fn len(&self) -> Result<usize, CacheError>;

    /// Drop everything.
    async fn clear(&self) -> Result<(), CacheError>;
}
