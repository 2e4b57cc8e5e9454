//! Patch requests and operation results.
//!
//! A `PatchRequest` is what the upstream diagnosis pipeline hands the
//! controller: a proposed lesson plus the trace it was learned from.
//! The result types here are the controller's output contracts.

use serde::{Deserialize, Serialize};

use crate::lesson::{Lesson, MemoryTier};
use crate::trace::FailureTrace;

/// Advisory scheduling hint for a commit.
///
/// Recorded as metadata for external batch schedulers. It never gates the
/// two-phase write and never alters tier scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyStrategy {
    #[default]
    Immediate,
    Batched,
}

/// A proposed lesson commit from the diagnosis pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchRequest {
    /// The failure this patch was learned from. Carries the trace ID.
    pub trace: FailureTrace,

    /// Root-cause diagnosis text from the reasoning model.
    pub diagnosis: String,

    /// The lesson to commit. Tier and affinity may be unset; the controller
    /// fills them in.
    pub proposed_lesson: Lesson,

    /// Scheduling hint. Advisory only.
    #[serde(default)]
    pub apply_strategy: ApplyStrategy,

    /// Force a tier instead of consulting the rubric. Used for
    /// safety-critical hotfixes that must land in the kernel immediately.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced_tier: Option<MemoryTier>,

    /// Prior occurrences of this trigger pattern, if the caller already
    /// knows. Otherwise the controller counts them in the durable store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_occurrences: Option<u32>,
}

/// Score breakdown produced by the lesson rubric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RubricBreakdown {
    pub severity_score: u32,
    pub generality_score: u32,
    pub frequency_score: u32,
    /// Total retention score, 0–100.
    pub score: u32,
    /// Tier derived from the total score.
    pub tier: MemoryTier,
}

/// Outcome of a successful `commit_lesson`.
///
/// Validation and durable-write failures are surfaced as errors instead;
/// `cache_ok = false` means the lesson is durable but not yet cached and a
/// rebuild will self-heal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitResult {
    /// ID of the committed lesson.
    pub lesson_id: String,

    /// Tier the lesson landed in.
    pub tier: MemoryTier,

    /// Human-readable location: "kernel", "skill_cache/<tool>", or "archive".
    pub location: String,

    /// Tool the lesson was routed to, for Tier-2 commits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_affinity: Option<String>,

    /// The durable store accepted the record. Always true on success.
    pub durable_ok: bool,

    /// The fast cache accepted the projection (or the tier is not cacheable).
    pub cache_ok: bool,

    /// Rubric breakdown, absent when the tier was forced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<RubricBreakdown>,
}

/// Outcome of a cache rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildResult {
    /// Lessons reinserted into the cache (Tier-1 + Tier-2).
    pub rebuilt_count: usize,

    /// Number of Tier-2 tool buckets restored.
    pub tools_rebuilt: usize,

    /// Tool bucket names, in rebuild order.
    pub tool_list: Vec<String>,
}
