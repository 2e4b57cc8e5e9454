//! ContextBundle — the ordered lesson set handed to prompt assembly.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::lesson::Lesson;

/// Options for a single retrieval call.
#[derive(Debug, Clone)]
pub struct RetrieveOptions {
    /// Deadline for the archive-search step. On expiry the bundle degrades
    /// to Tier-1/Tier-2 results instead of failing.
    pub archive_timeout: Duration,

    /// Maximum archived lessons to append.
    pub archive_top_k: usize,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self {
            archive_timeout: Duration::from_secs(2),
            archive_top_k: 5,
        }
    }
}

/// One tool's Tier-2 lessons within a bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillSection {
    /// The tool these lessons are scoped to.
    pub tool: String,
    /// Bucket contents in creation order.
    pub lessons: Vec<Lesson>,
}

/// The retrieval result: kernel lessons, per-tool skill sections, and
/// (when the task warrants it) archive matches.
///
/// Identical inputs against identical store state always produce an
/// identical ordered bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextBundle {
    /// All Tier-1 lessons, in creation order.
    pub kernel: Vec<Lesson>,

    /// Tier-2 sections, grouped by tool in the order tools were supplied.
    /// Tools with empty buckets are omitted.
    pub skills: Vec<SkillSection>,

    /// Archived lessons ranked by similarity to the task. Empty unless the
    /// archive path ran.
    pub archive: Vec<Lesson>,

    /// Whether the archive-search step was attempted.
    pub archive_searched: bool,

    /// The archive-search step hit its deadline and was skipped.
    pub archive_timed_out: bool,
}

impl ContextBundle {
    /// Total lessons across all sections.
    pub fn len(&self) -> usize {
        self.kernel.len()
            + self.skills.iter().map(|s| s.lessons.len()).sum::<usize>()
            + self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate every lesson in bundle order: kernel, skills, archive.
    pub fn iter(&self) -> impl Iterator<Item = &Lesson> {
        self.kernel
            .iter()
            .chain(self.skills.iter().flat_map(|s| s.lessons.iter()))
            .chain(self.archive.iter())
    }
}
