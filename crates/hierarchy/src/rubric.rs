//! LessonRubric — deterministic retention scoring.
//!
//! Scores a (trace, lesson) pair into a 0–100 retention score and a tier:
//! Severity (0–40) + Generality (0–40) + Frequency (0–20). Pure function of
//! its inputs and the configured weights; no persistence, no clock.

use lessonbank_core::config::RubricWeights;
use lessonbank_core::lesson::{Lesson, LessonType, MemoryTier};
use lessonbank_core::patch::RubricBreakdown;
use lessonbank_core::trace::{FailureTrace, FailureType, Severity};

/// The scoring rubric. Weights are tunable; see [`RubricWeights`].
pub struct LessonRubric {
    weights: RubricWeights,
}

impl LessonRubric {
    pub fn new() -> Self {
        Self {
            weights: RubricWeights::default(),
        }
    }

    pub fn with_weights(weights: RubricWeights) -> Self {
        Self { weights }
    }

    /// Score a lesson against the trace it was learned from.
    ///
    /// `prior_occurrences` is how many times this trigger pattern has been
    /// seen before this one — supplied by the caller or counted by the
    /// controller in the durable store.
    pub fn evaluate(
        &self,
        trace: &FailureTrace,
        lesson: &Lesson,
        prior_occurrences: u32,
    ) -> RubricBreakdown {
        let severity_score = self.severity_score(trace, lesson);
        let generality_score = self.generality_score(lesson);
        let frequency_score = self.frequency_score(prior_occurrences);
        let score = severity_score + generality_score + frequency_score;

        RubricBreakdown {
            severity_score,
            generality_score,
            frequency_score,
            score,
            tier: self.tier_for_score(score),
        }
    }

    /// Map a total score to a tier. Both bounds are inclusive lower bounds.
    pub fn tier_for_score(&self, score: u32) -> MemoryTier {
        if score >= self.weights.tier1_min_score {
            MemoryTier::Tier1Kernel
        } else if score >= self.weights.tier2_min_score {
            MemoryTier::Tier2SkillCache
        } else {
            MemoryTier::Tier3Archive
        }
    }

    fn severity_score(&self, trace: &FailureTrace, lesson: &Lesson) -> u32 {
        match (trace.failure_type, trace.severity, lesson.lesson_type) {
            (FailureType::CommissionSafety, Severity::Critical, LessonType::Security) => {
                self.weights.severity_high
            }
            (FailureType::OmissionLaziness, _, t) if t != LessonType::Security => {
                self.weights.severity_mid
            }
            _ => self.weights.severity_low,
        }
    }

    fn generality_score(&self, lesson: &Lesson) -> u32 {
        if has_concrete_identifiers(&lesson.rule_text) {
            self.weights.generality_concrete
        } else if lesson.lesson_type == LessonType::Security {
            self.weights.generality_security
        } else {
            self.weights.generality_abstract
        }
    }

    fn frequency_score(&self, prior_occurrences: u32) -> u32 {
        if prior_occurrences >= 5 {
            self.weights.frequency_chronic
        } else if prior_occurrences >= 2 {
            self.weights.frequency_recurring
        } else {
            self.weights.frequency_first
        }
    }
}

impl Default for LessonRubric {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether rule text is anchored to concrete entities.
///
/// Any token containing an ASCII digit counts: server names ("server-42"),
/// dates ("2023"), quarters ("Q3"), account numbers. Abstract rules like
/// "Always use LIMIT in SELECT queries" contain none.
pub fn has_concrete_identifiers(text: &str) -> bool {
    text.split_whitespace()
        .any(|token| token.chars().any(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lessonbank_core::trace::FailureTrace;

    fn trace(failure_type: FailureType, severity: Severity) -> FailureTrace {
        FailureTrace::without_tool("t-1", "prompt", "reasoning", failure_type, severity)
    }

    fn lesson(rule_text: &str, lesson_type: LessonType) -> Lesson {
        Lesson::new("pattern", rule_text, lesson_type, 0.9)
    }

    #[test]
    fn critical_security_lesson_reaches_kernel() {
        let rubric = LessonRubric::new();
        let breakdown = rubric.evaluate(
            &trace(FailureType::CommissionSafety, Severity::Critical),
            &lesson(
                "Always validate JWT tokens before processing requests",
                LessonType::Security,
            ),
            0,
        );

        assert_eq!(breakdown.severity_score, 40);
        assert_eq!(breakdown.generality_score, 35);
        assert_eq!(breakdown.frequency_score, 5);
        assert_eq!(breakdown.score, 80);
        assert_eq!(breakdown.tier, MemoryTier::Tier1Kernel);
    }

    #[test]
    fn abstract_syntax_lesson_lands_in_skill_cache() {
        let rubric = LessonRubric::new();
        let breakdown = rubric.evaluate(
            &trace(FailureType::OmissionLaziness, Severity::NonCritical),
            &lesson(
                "Always use LIMIT clause in SELECT queries",
                LessonType::Syntax,
            ),
            0,
        );

        assert_eq!(breakdown.severity_score, 20);
        assert_eq!(breakdown.generality_score, 30);
        assert_eq!(breakdown.frequency_score, 5);
        assert_eq!(breakdown.score, 55);
        assert_eq!(breakdown.tier, MemoryTier::Tier2SkillCache);
    }

    #[test]
    fn entity_anchored_business_fact_archives() {
        let rubric = LessonRubric::new();
        let breakdown = rubric.evaluate(
            &trace(FailureType::OmissionLaziness, Severity::NonCritical),
            &lesson(
                "Q3 2023 reports are in the archived partition on server-42",
                LessonType::Business,
            ),
            0,
        );

        assert_eq!(breakdown.severity_score, 20);
        assert_eq!(breakdown.generality_score, 10);
        assert_eq!(breakdown.frequency_score, 5);
        assert_eq!(breakdown.score, 35);
        assert_eq!(breakdown.tier, MemoryTier::Tier3Archive);
    }

    #[test]
    fn omission_with_security_lesson_scores_low_severity() {
        let rubric = LessonRubric::new();
        let breakdown = rubric.evaluate(
            &trace(FailureType::OmissionLaziness, Severity::Critical),
            &lesson("Check permissions before acting", LessonType::Security),
            0,
        );
        assert_eq!(breakdown.severity_score, 10);
    }

    #[test]
    fn non_critical_commission_scores_low_severity() {
        let rubric = LessonRubric::new();
        let breakdown = rubric.evaluate(
            &trace(FailureType::CommissionSafety, Severity::NonCritical),
            &lesson("Be careful", LessonType::Security),
            0,
        );
        assert_eq!(breakdown.severity_score, 10);
    }

    #[test]
    fn tier_boundaries_are_inclusive_lower_bounds() {
        let rubric = LessonRubric::new();
        assert_eq!(rubric.tier_for_score(75), MemoryTier::Tier1Kernel);
        assert_eq!(rubric.tier_for_score(74), MemoryTier::Tier2SkillCache);
        assert_eq!(rubric.tier_for_score(40), MemoryTier::Tier2SkillCache);
        assert_eq!(rubric.tier_for_score(39), MemoryTier::Tier3Archive);
    }

    #[test]
    fn frequency_bands() {
        let rubric = LessonRubric::new();
        let t = trace(FailureType::OmissionLaziness, Severity::NonCritical);
        let l = lesson("Abstract rule", LessonType::Syntax);

        assert_eq!(rubric.evaluate(&t, &l, 0).frequency_score, 5);
        assert_eq!(rubric.evaluate(&t, &l, 2).frequency_score, 12);
        assert_eq!(rubric.evaluate(&t, &l, 4).frequency_score, 12);
        assert_eq!(rubric.evaluate(&t, &l, 5).frequency_score, 20);
        assert_eq!(rubric.evaluate(&t, &l, 100).frequency_score, 20);
    }

    #[test]
    fn concrete_identifier_detection() {
        assert!(has_concrete_identifiers("reports live on server-42"));
        assert!(has_concrete_identifiers("fiscal year 2024 rules"));
        assert!(!has_concrete_identifiers(
            "Always use LIMIT in SELECT queries"
        ));
        assert!(!has_concrete_identifiers(""));
    }

    #[test]
    fn custom_weights_shift_tiers() {
        let mut weights = RubricWeights::default();
        weights.tier1_min_score = 50;
        let rubric = LessonRubric::with_weights(weights);
        assert_eq!(rubric.tier_for_score(55), MemoryTier::Tier1Kernel);
    }
}
