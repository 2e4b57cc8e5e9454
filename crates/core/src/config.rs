//! Configuration for the memory hierarchy.
//!
//! All knobs have serde defaults matching the shipped behavior, so an empty
//! TOML document yields a fully working configuration. Loaded from a TOML
//! string or file; validated before use.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{LessonError, Result};

/// Root configuration for the controller and its collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyConfig {
    /// Rubric scoring weights and tier thresholds.
    #[serde(default)]
    pub rubric: RubricWeights,

    /// Thresholds for the retrieval complexity heuristic.
    #[serde(default)]
    pub complexity: ComplexityConfig,

    /// Default archive-search result cap.
    #[serde(default = "default_archive_top_k")]
    pub archive_top_k: usize,

    /// Default archive-search deadline in milliseconds.
    #[serde(default = "default_archive_timeout_ms")]
    pub archive_timeout_ms: u64,
}

fn default_archive_top_k() -> usize {
    5
}
fn default_archive_timeout_ms() -> u64 {
    2000
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            rubric: RubricWeights::default(),
            complexity: ComplexityConfig::default(),
            archive_top_k: default_archive_top_k(),
            archive_timeout_ms: default_archive_timeout_ms(),
        }
    }
}

/// Rubric weights: Severity (0–40) + Generality (0–40) + Frequency (0–20).
///
/// The shipped numbers are a tunable default, not a fixed law — they encode
/// the qualitative behavior (critical safety lessons always resident,
/// entity-anchored facts archived) with testable boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RubricWeights {
    /// Commission-safety + critical + security lesson.
    #[serde(default = "default_severity_high")]
    pub severity_high: u32,
    /// Omission-laziness with a non-security lesson.
    #[serde(default = "default_severity_mid")]
    pub severity_mid: u32,
    /// Everything else.
    #[serde(default = "default_severity_low")]
    pub severity_low: u32,

    /// Abstract rule text, security lesson.
    #[serde(default = "default_generality_security")]
    pub generality_security: u32,
    /// Abstract rule text, any other lesson type.
    #[serde(default = "default_generality_abstract")]
    pub generality_abstract: u32,
    /// Rule text anchored to concrete identifiers, regardless of type.
    #[serde(default = "default_generality_concrete")]
    pub generality_concrete: u32,

    /// First-seen trigger pattern (fewer than 2 prior occurrences).
    #[serde(default = "default_frequency_first")]
    pub frequency_first: u32,
    /// 2–4 prior occurrences of a matching pattern.
    #[serde(default = "default_frequency_recurring")]
    pub frequency_recurring: u32,
    /// 5 or more prior occurrences.
    #[serde(default = "default_frequency_chronic")]
    pub frequency_chronic: u32,

    /// Inclusive lower bound for Tier-1.
    #[serde(default = "default_tier1_min_score")]
    pub tier1_min_score: u32,
    /// Inclusive lower bound for Tier-2.
    #[serde(default = "default_tier2_min_score")]
    pub tier2_min_score: u32,
}

fn default_severity_high() -> u32 {
    40
}
fn default_severity_mid() -> u32 {
    20
}
fn default_severity_low() -> u32 {
    10
}
fn default_generality_security() -> u32 {
    35
}
fn default_generality_abstract() -> u32 {
    30
}
fn default_generality_concrete() -> u32 {
    10
}
fn default_frequency_first() -> u32 {
    5
}
fn default_frequency_recurring() -> u32 {
    12
}
fn default_frequency_chronic() -> u32 {
    20
}
fn default_tier1_min_score() -> u32 {
    75
}
fn default_tier2_min_score() -> u32 {
    40
}

impl Default for RubricWeights {
    fn default() -> Self {
        Self {
            severity_high: default_severity_high(),
            severity_mid: default_severity_mid(),
            severity_low: default_severity_low(),
            generality_security: default_generality_security(),
            generality_abstract: default_generality_abstract(),
            generality_concrete: default_generality_concrete(),
            frequency_first: default_frequency_first(),
            frequency_recurring: default_frequency_recurring(),
            frequency_chronic: default_frequency_chronic(),
            tier1_min_score: default_tier1_min_score(),
            tier2_min_score: default_tier2_min_score(),
        }
    }
}

/// Thresholds for retrieval's complexity heuristic. A task tripping either
/// threshold triggers the archive-search step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityConfig {
    /// Tasks at least this long (in characters) are complex.
    #[serde(default = "default_min_task_chars")]
    pub min_task_chars: usize,

    /// Tasks with at least this many content words are complex.
    #[serde(default = "default_min_content_words")]
    pub min_content_words: usize,

    /// Minimum word length to count as a content word.
    #[serde(default = "default_content_word_len")]
    pub content_word_len: usize,
}

fn default_min_task_chars() -> usize {
    120
}
fn default_min_content_words() -> usize {
    6
}
fn default_content_word_len() -> usize {
    5
}

impl Default for ComplexityConfig {
    fn default() -> Self {
        Self {
            min_task_chars: default_min_task_chars(),
            min_content_words: default_min_content_words(),
            content_word_len: default_content_word_len(),
        }
    }
}

impl HierarchyConfig {
    /// Parse from a TOML string. Missing fields fall back to defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: HierarchyConfig =
            toml::from_str(content).map_err(|e| LessonError::Validation {
                message: format!("invalid hierarchy config: {e}"),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LessonError::Validation {
            message: format!("cannot read config {}: {e}", path.display()),
        })?;
        Self::from_toml(&content)
    }

    /// Reject configurations that would break the tier bands.
    pub fn validate(&self) -> Result<()> {
        if self.rubric.tier2_min_score >= self.rubric.tier1_min_score {
            return Err(LessonError::Validation {
                message: format!(
                    "tier2_min_score ({}) must be below tier1_min_score ({})",
                    self.rubric.tier2_min_score, self.rubric.tier1_min_score
                ),
            });
        }
        if self.archive_top_k == 0 {
            return Err(LessonError::Validation {
                message: "archive_top_k must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn programmatic_default_matches_serde_default() {
        let config = HierarchyConfig::default();
        assert_eq!(config.archive_top_k, 5);
        assert_eq!(config.archive_timeout_ms, 2000);
        assert_eq!(config.rubric.severity_high, 40);
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config = HierarchyConfig::from_toml("").unwrap();
        assert_eq!(config.rubric.severity_high, 40);
        assert_eq!(config.rubric.tier1_min_score, 75);
        assert_eq!(config.rubric.tier2_min_score, 40);
        assert_eq!(config.archive_top_k, 5);
        assert_eq!(config.complexity.min_content_words, 6);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = HierarchyConfig::from_toml(
            r#"
            archive_top_k = 10

            [rubric]
            frequency_chronic = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.archive_top_k, 10);
        assert_eq!(config.rubric.frequency_chronic, 25);
        assert_eq!(config.rubric.frequency_first, 5);
    }

    #[test]
    fn inverted_tier_bands_rejected() {
        let err = HierarchyConfig::from_toml(
            r#"
            [rubric]
            tier1_min_score = 40
            tier2_min_score = 75
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("tier2_min_score"));
    }

    #[test]
    fn zero_top_k_rejected() {
        let err = HierarchyConfig::from_toml("archive_top_k = 0").unwrap_err();
        assert!(err.to_string().contains("archive_top_k"));
    }
}
