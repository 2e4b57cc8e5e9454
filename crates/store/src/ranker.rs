//! Keyword-overlap archive ranker — the reference `ArchiveRanker`.
//!
//! Scores an archived lesson by the fraction of the task's content tokens
//! that also appear in the lesson's trigger pattern or rule text. This is
//! deliberately simple: the trait contract (top-K, similarity-ordered,
//! deterministic tie-break) is what the controller depends on, and a real
//! embedding-based ranker can replace this implementation wholesale.

use async_trait::async_trait;
use std::collections::BTreeSet;

use lessonbank_core::lesson::Lesson;
use lessonbank_core::ranker::ArchiveRanker;

/// Lowercased alphanumeric tokens of length >= 3.
fn tokenize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 3)
        .map(str::to_string)
        .collect()
}

/// Fraction of `query` tokens present in `text`, in [0, 1].
/// Returns 0.0 when either side has no tokens.
pub fn keyword_overlap(query: &str, text: &str) -> f32 {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return 0.0;
    }
    let text_tokens = tokenize(text);
    let shared = query_tokens.intersection(&text_tokens).count();
    shared as f32 / query_tokens.len() as f32
}

/// The reference ranker.
pub struct KeywordRanker;

impl KeywordRanker {
    pub fn new() -> Self {
        Self
    }
}

impl Default for KeywordRanker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArchiveRanker for KeywordRanker {
    async fn rank(&self, task: &str, candidates: &[Lesson], k: usize) -> Vec<Lesson> {
        let mut scored: Vec<(f32, &Lesson)> = candidates
            .iter()
            .filter_map(|lesson| {
                let haystack = format!("{} {}", lesson.trigger_pattern, lesson.rule_text);
                let sim = keyword_overlap(task, &haystack);
                (sim > 0.0).then_some((sim, lesson))
            })
            .collect();

        // Similarity desc, then confidence desc, then created_at asc, then id.
        scored.sort_by(|(sa, la), (sb, lb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    lb.confidence_score
                        .partial_cmp(&la.confidence_score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| la.created_at.cmp(&lb.created_at))
                .then_with(|| la.id.cmp(&lb.id))
        });

        scored.truncate(k);
        scored.into_iter().map(|(_, l)| l.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use lessonbank_core::lesson::LessonType;

    fn lesson(id: &str, pattern: &str, rule: &str, confidence: f32) -> Lesson {
        let mut l = Lesson::new(pattern, rule, LessonType::Business, confidence);
        l.id = id.into();
        l
    }

    #[test]
    fn overlap_full_and_none() {
        assert!(keyword_overlap("fiscal year report", "fiscal year report data") > 0.99);
        assert_eq!(keyword_overlap("fiscal year", "unrelated text"), 0.0);
        assert_eq!(keyword_overlap("", "anything"), 0.0);
    }

    #[tokio::test]
    async fn ranks_by_similarity() {
        let ranker = KeywordRanker::new();
        let candidates = vec![
            lesson("a", "quarterly report", "Check archived partitions", 0.7),
            lesson("b", "fiscal year reporting", "Fiscal year starts in July", 0.7),
            lesson("c", "unrelated", "Nothing in common", 0.7),
        ];

        let ranked = ranker
            .rank("generate the fiscal year report", &candidates, 10)
            .await;
        assert_eq!(ranked[0].id, "b");
        // Zero-overlap candidate excluded
        assert!(ranked.iter().all(|l| l.id != "c"));
    }

    #[tokio::test]
    async fn ties_broken_by_confidence_then_age() {
        let ranker = KeywordRanker::new();
        let now = Utc::now();
        let mut a = lesson("a", "fiscal year", "r", 0.6);
        let mut b = lesson("b", "fiscal year", "r", 0.9);
        let mut c = lesson("c", "fiscal year", "r", 0.9);
        a.created_at = now;
        b.created_at = now;
        c.created_at = now - Duration::hours(1); // older, same confidence as b

        let ranked = ranker.rank("fiscal year", &[a, b, c], 10).await;
        let ids: Vec<&str> = ranked.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn respects_top_k() {
        let ranker = KeywordRanker::new();
        let candidates: Vec<Lesson> = (0..10)
            .map(|i| lesson(&format!("l-{i}"), "fiscal year", "r", 0.5))
            .collect();

        let ranked = ranker.rank("fiscal year", &candidates, 3).await;
        assert_eq!(ranked.len(), 3);
    }
}
