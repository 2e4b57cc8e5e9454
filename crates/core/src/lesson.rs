//! Lesson — the unit of learned knowledge.
//!
//! A lesson is a corrective rule distilled from an agent failure. Every
//! lesson has exactly one authoritative record in the durable store; the
//! fast cache only ever holds copies tagged with tier membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Residency level of a lesson.
///
/// The tier decides where a lesson lives and when it is injected into the
/// agent's context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemoryTier {
    /// Always resident — injected into every context.
    #[serde(rename = "tier_1_kernel")]
    Tier1Kernel,
    /// Tool-triggered — injected when the matching tool is active.
    #[serde(rename = "tier_2_skill_cache")]
    Tier2SkillCache,
    /// On-demand — retrieved only via archive search.
    #[serde(rename = "tier_3_archive")]
    Tier3Archive,
}

impl MemoryTier {
    /// Whether lessons in this tier are held in the fast cache.
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, MemoryTier::Tier3Archive)
    }

    /// Residency rank: 0 is most resident. Used for promote/demote
    /// direction checks.
    pub fn residency_rank(&self) -> u8 {
        match self {
            MemoryTier::Tier1Kernel => 0,
            MemoryTier::Tier2SkillCache => 1,
            MemoryTier::Tier3Archive => 2,
        }
    }
}

impl std::fmt::Display for MemoryTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MemoryTier::Tier1Kernel => "tier_1_kernel",
            MemoryTier::Tier2SkillCache => "tier_2_skill_cache",
            MemoryTier::Tier3Archive => "tier_3_archive",
        };
        f.write_str(s)
    }
}

/// Category of a lesson. Drives the rubric's severity and generality bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonType {
    Security,
    Syntax,
    Business,
}

/// A learned correction rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    /// Unique, stable ID. Assigned at commit time if empty.
    #[serde(default)]
    pub id: String,

    /// Pattern matched against task/tool context (e.g. "sql query without limit").
    pub trigger_pattern: String,

    /// The actionable instruction injected into the agent's context.
    pub rule_text: String,

    /// Lesson category.
    pub lesson_type: LessonType,

    /// Confidence in this lesson, 0.0–1.0.
    pub confidence_score: f32,

    /// Current tier tag. Set by the controller at commit time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_tier: Option<MemoryTier>,

    /// Tool identifier this lesson is scoped to. Set only for Tier-2 lessons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_affinity: Option<String>,

    /// When this lesson was created.
    pub created_at: DateTime<Utc>,

    /// Revision counter, bumped on every tier-tag update.
    #[serde(default)]
    pub revision: u64,

    /// The failure trace this lesson was learned from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_trace: Option<String>,
}

impl Lesson {
    /// Build a lesson with the fields a diagnosis pipeline produces.
    /// Tier, affinity, and id are filled in by the controller at commit time.
    pub fn new(
        trigger_pattern: impl Into<String>,
        rule_text: impl Into<String>,
        lesson_type: LessonType,
        confidence_score: f32,
    ) -> Self {
        Self {
            id: String::new(),
            trigger_pattern: trigger_pattern.into(),
            rule_text: rule_text.into(),
            lesson_type,
            confidence_score,
            active_tier: None,
            tool_affinity: None,
            created_at: Utc::now(),
            revision: 0,
            source_trace: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_cacheability() {
        assert!(MemoryTier::Tier1Kernel.is_cacheable());
        assert!(MemoryTier::Tier2SkillCache.is_cacheable());
        assert!(!MemoryTier::Tier3Archive.is_cacheable());
    }

    #[test]
    fn tier_residency_ordering() {
        assert!(
            MemoryTier::Tier1Kernel.residency_rank()
                < MemoryTier::Tier2SkillCache.residency_rank()
        );
        assert!(
            MemoryTier::Tier2SkillCache.residency_rank()
                < MemoryTier::Tier3Archive.residency_rank()
        );
    }

    #[test]
    fn lesson_serialization_round_trip() {
        let mut lesson = Lesson::new(
            "sql query without limit",
            "Always use LIMIT in SELECT queries",
            LessonType::Syntax,
            0.85,
        );
        lesson.id = "lesson-001".into();
        lesson.active_tier = Some(MemoryTier::Tier2SkillCache);
        lesson.tool_affinity = Some("sql_db".into());

        let json = serde_json::to_string(&lesson).unwrap();
        assert!(json.contains("tier_2_skill_cache"));
        assert!(json.contains("sql_db"));

        let back: Lesson = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "lesson-001");
        assert_eq!(back.active_tier, Some(MemoryTier::Tier2SkillCache));
    }

    #[test]
    fn tier_display_matches_wire_names() {
        assert_eq!(MemoryTier::Tier1Kernel.to_string(), "tier_1_kernel");
        assert_eq!(MemoryTier::Tier3Archive.to_string(), "tier_3_archive");
    }
}
