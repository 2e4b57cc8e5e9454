//! ArchiveRanker — the injected archive-search capability.
//!
//! Archive search is the only variable-latency step in retrieval, and the
//! only place where similarity computation happens. It is kept behind a
//! trait so a real embedding-based ranker can replace the keyword reference
//! implementation without touching the controller.

use async_trait::async_trait;

use crate::lesson::Lesson;

/// Ranks archived lessons by similarity to a task description.
///
/// # Contract
///
/// - Returns at most `k` of the given candidates, ordered by descending
///   similarity to `task`.
/// - Candidates with no measurable similarity are omitted.
/// - Ties are broken by higher `confidence_score`, then earlier
///   `created_at`, then ID — the ordering must be fully deterministic for
///   identical inputs.
#[async_trait]
pub trait ArchiveRanker: Send + Sync {
    async fn rank(&self, task: &str, candidates: &[Lesson], k: usize) -> Vec<Lesson>;
}
