//! MemoryController — the sole authority over lesson storage.
//!
//! Orchestrates commits, retrieval, promotion/demotion, deletion, and
//! disaster-recovery rebuild across the durable store and the fast cache.
//!
//! # Invariants enforced here
//!
//! - **Write-through**: a lesson is persisted to the durable store before
//!   the cache ever sees it. A durable failure aborts the commit with the
//!   cache untouched; a cache failure after a durable success is non-fatal
//!   (the store is authoritative, a rebuild self-heals).
//! - **Strict projection**: the cache holds a lesson iff its tier is
//!   Tier-1 or Tier-2. Tier-3 lessons are never cached.
//! - **One record per id**: tier changes are in-place tag updates with a
//!   revision bump, never delete-and-reinsert.
//!
//! # Locking
//!
//! One coarse `RwLock<()>` gates the controller. Mutations (commit,
//! promote, demote, delete, rebuild) hold the write half, so no two
//! mutations interleave and commits issued during a rebuild block until it
//! finishes — queued by the lock, never dropped. Retrieval holds the read
//! half: unbounded read concurrency against a consistent snapshot, and
//! writers cannot starve it indefinitely.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use lessonbank_core::bundle::{ContextBundle, RetrieveOptions, SkillSection};
use lessonbank_core::config::{ComplexityConfig, HierarchyConfig};
use lessonbank_core::error::{LessonError, Result};
use lessonbank_core::lesson::{Lesson, MemoryTier};
use lessonbank_core::patch::{CommitResult, PatchRequest, RebuildResult};
use lessonbank_core::ranker::ArchiveRanker;
use lessonbank_core::storage::{DurableStore, FastCache};

use crate::rubric::LessonRubric;
use crate::skill_mapper::{SkillMapper, GENERAL_TOOL};

/// The direction of a tier change, for transition validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TierChange {
    Promote,
    Demote,
}

/// The memory hierarchy's core authority. See the module docs for the
/// invariants it enforces.
pub struct MemoryController {
    store: Arc<dyn DurableStore>,
    cache: Arc<dyn FastCache>,
    ranker: Arc<dyn ArchiveRanker>,
    mapper: SkillMapper,
    rubric: LessonRubric,
    config: HierarchyConfig,
    write_gate: RwLock<()>,
}

impl MemoryController {
    /// A controller with default configuration and the built-in tool
    /// signatures.
    pub fn new(
        store: Arc<dyn DurableStore>,
        cache: Arc<dyn FastCache>,
        ranker: Arc<dyn ArchiveRanker>,
    ) -> Self {
        Self::with_config(
            store,
            cache,
            ranker,
            HierarchyConfig::default(),
            SkillMapper::with_default_tools(),
        )
    }

    /// A controller with explicit configuration and tool registry.
    pub fn with_config(
        store: Arc<dyn DurableStore>,
        cache: Arc<dyn FastCache>,
        ranker: Arc<dyn ArchiveRanker>,
        config: HierarchyConfig,
        mapper: SkillMapper,
    ) -> Self {
        let rubric = LessonRubric::with_weights(config.rubric.clone());
        Self {
            store,
            cache,
            ranker,
            mapper,
            rubric,
            config,
            write_gate: RwLock::new(()),
        }
    }

    /// The tool registry, for callers that need to add signatures before
    /// committing.
    pub fn mapper_mut(&mut self) -> &mut SkillMapper {
        &mut self.mapper
    }

    /// Fetch a lesson's authoritative durable record.
    pub async fn lesson(&self, id: &str) -> Result<Option<Lesson>> {
        Ok(self.store.get(id).await?)
    }

    // ── Commit ────────────────────────────────────────────────────────────

    /// Commit a proposed lesson: score it, route it, and write it through.
    ///
    /// Validation and durable-write failures abort with no state change.
    /// A cache failure is reported via `cache_ok = false` but does not fail
    /// the commit.
    pub async fn commit_lesson(&self, patch: PatchRequest) -> Result<CommitResult> {
        validate_patch(&patch)?;
        let _gate = self.write_gate.write().await;

        // Tier assignment: forced override or rubric.
        let (tier, breakdown) = match patch.forced_tier {
            Some(tier) => (tier, None),
            None => {
                let prior = match patch.prior_occurrences {
                    Some(n) => n as usize,
                    None => {
                        self.store
                            .pattern_occurrences(&patch.proposed_lesson.trigger_pattern)
                            .await?
                    }
                };
                let breakdown =
                    self.rubric
                        .evaluate(&patch.trace, &patch.proposed_lesson, prior as u32);
                (breakdown.tier, Some(breakdown))
            }
        };

        let mut lesson = patch.proposed_lesson;
        if lesson.id.is_empty() {
            lesson.id = Uuid::new_v4().to_string();
        }
        lesson.active_tier = Some(tier);
        lesson.revision = 0;
        lesson.source_trace = Some(patch.trace.trace_id.clone());
        lesson.tool_affinity = match tier {
            MemoryTier::Tier2SkillCache => {
                Some(self.mapper.extract_tool_context(&patch.trace))
            }
            _ => None,
        };

        // Phase 1: durable store. Must succeed before the cache is touched.
        self.store.insert(lesson.clone()).await?;

        // Phase 2: fast cache projection.
        let cache_ok = match tier {
            MemoryTier::Tier1Kernel => self.try_cache_insert(None, &lesson).await,
            MemoryTier::Tier2SkillCache => {
                let tool = lesson.tool_affinity.clone().unwrap_or_else(|| {
                    GENERAL_TOOL.to_string()
                });
                self.try_cache_insert(Some(&tool), &lesson).await
            }
            MemoryTier::Tier3Archive => true,
        };

        let location = location_for(tier, lesson.tool_affinity.as_deref());
        info!(
            lesson_id = %lesson.id,
            tier = %tier,
            location = %location,
            apply_strategy = ?patch.apply_strategy,
            cache_ok,
            "Lesson committed"
        );

        Ok(CommitResult {
            lesson_id: lesson.id,
            tier,
            location,
            tool_affinity: lesson.tool_affinity,
            durable_ok: true,
            cache_ok,
            breakdown,
        })
    }

    async fn try_cache_insert(&self, tool: Option<&str>, lesson: &Lesson) -> bool {
        let result = match tool {
            Some(tool) => self.cache.insert_skill(tool, lesson.clone()).await,
            None => self.cache.insert_kernel(lesson.clone()).await,
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(lesson_id = %lesson.id, error = %e, "Cache insert failed; durable store remains authoritative");
                false
            }
        }
    }

    // ── Retrieval ─────────────────────────────────────────────────────────

    /// Retrieve the lesson bundle for a task, with the configured archive
    /// deadline and result cap.
    pub async fn retrieve_context(
        &self,
        current_task: &str,
        active_tools: &[String],
    ) -> Result<ContextBundle> {
        let options = RetrieveOptions {
            archive_timeout: std::time::Duration::from_millis(self.config.archive_timeout_ms),
            archive_top_k: self.config.archive_top_k,
        };
        self.retrieve_context_with(current_task, active_tools, options)
            .await
    }

    /// Retrieve with explicit options.
    ///
    /// Bundle order: all Tier-1 lessons in creation order, then each
    /// supplied tool's Tier-2 bucket, then (when the complexity heuristic
    /// trips or nothing matched) archive-search results. Missing data never
    /// raises — absence just yields a smaller bundle.
    pub async fn retrieve_context_with(
        &self,
        current_task: &str,
        active_tools: &[String],
        options: RetrieveOptions,
    ) -> Result<ContextBundle> {
        let _gate = self.write_gate.read().await;

        let mut bundle = ContextBundle::default();

        let mut kernel = self.cache.kernel().await.map_err(LessonError::Cache)?;
        sort_by_creation(&mut kernel);
        bundle.kernel = kernel;

        let mut seen = Vec::new();
        for tool in active_tools {
            if seen.contains(tool) {
                continue;
            }
            seen.push(tool.clone());
            let mut bucket = self
                .cache
                .skill_bucket(tool)
                .await
                .map_err(LessonError::Cache)?;
            if bucket.is_empty() {
                continue;
            }
            sort_by_creation(&mut bucket);
            bundle.skills.push(SkillSection {
                tool: tool.clone(),
                lessons: bucket,
            });
        }

        if is_complex(current_task, &self.config.complexity) || bundle.is_empty() {
            self.append_archive_matches(current_task, &options, &mut bundle)
                .await;
        }

        debug!(
            task_len = current_task.len(),
            kernel = bundle.kernel.len(),
            skill_sections = bundle.skills.len(),
            archive = bundle.archive.len(),
            archive_searched = bundle.archive_searched,
            "Context retrieved"
        );
        Ok(bundle)
    }

    /// Run the archive-search step, degrading to the bundle as-is on any
    /// failure or on deadline expiry.
    async fn append_archive_matches(
        &self,
        task: &str,
        options: &RetrieveOptions,
        bundle: &mut ContextBundle,
    ) {
        bundle.archive_searched = true;

        let candidates: Vec<Lesson> = match self.store.scan().await {
            Ok(lessons) => lessons
                .into_iter()
                .filter(|l| l.active_tier == Some(MemoryTier::Tier3Archive))
                .collect(),
            Err(e) => {
                warn!(error = %e, "Archive scan failed; returning cached tiers only");
                return;
            }
        };
        if candidates.is_empty() {
            return;
        }

        let ranking = self.ranker.rank(task, &candidates, options.archive_top_k);
        match tokio::time::timeout(options.archive_timeout, ranking).await {
            Ok(ranked) => bundle.archive = ranked,
            Err(_) => {
                bundle.archive_timed_out = true;
                warn!(
                    timeout_ms = options.archive_timeout.as_millis() as u64,
                    "Archive search timed out; returning cached tiers only"
                );
            }
        }
    }

    // ── Promotion / demotion ──────────────────────────────────────────────

    /// Move a lesson to a higher-residency tier. Returns the new revision.
    pub async fn promote(&self, lesson_id: &str, new_tier: MemoryTier) -> Result<u64> {
        self.retier(lesson_id, new_tier, TierChange::Promote).await
    }

    /// Move a lesson to a lower-residency tier. Returns the new revision.
    pub async fn demote(&self, lesson_id: &str, new_tier: MemoryTier) -> Result<u64> {
        self.retier(lesson_id, new_tier, TierChange::Demote).await
    }

    async fn retier(
        &self,
        lesson_id: &str,
        new_tier: MemoryTier,
        change: TierChange,
    ) -> Result<u64> {
        let _gate = self.write_gate.write().await;

        let current = self
            .store
            .get(lesson_id)
            .await?
            .ok_or_else(|| LessonError::LessonNotFound(lesson_id.to_string()))?;
        let current_tier = current.active_tier.unwrap_or(MemoryTier::Tier3Archive);

        if new_tier == current_tier {
            return Ok(current.revision);
        }
        let moving_up = new_tier.residency_rank() < current_tier.residency_rank();
        if moving_up != (change == TierChange::Promote) {
            return Err(LessonError::InvalidTransition {
                id: lesson_id.to_string(),
                from: current_tier,
                to: new_tier,
            });
        }

        // Affinity is a Tier-2 property: kept or defaulted on entry,
        // cleared on exit.
        let affinity = match new_tier {
            MemoryTier::Tier2SkillCache => Some(
                current
                    .tool_affinity
                    .clone()
                    .unwrap_or_else(|| GENERAL_TOOL.to_string()),
            ),
            _ => None,
        };

        // Durable tag update first; the cache is reconciled afterwards.
        let revision = self
            .store
            .update_tier(lesson_id, new_tier, affinity.clone())
            .await?
            .ok_or_else(|| LessonError::LessonNotFound(lesson_id.to_string()))?;

        if let Err(e) = self.cache.remove(lesson_id).await {
            warn!(lesson_id, error = %e, "Cache eviction failed during tier change; rebuild will reconcile");
        }
        if new_tier.is_cacheable() {
            let mut updated = current;
            updated.active_tier = Some(new_tier);
            updated.tool_affinity = affinity;
            updated.revision = revision;
            // Affinity is Some exactly when the target is Tier-2, which is
            // also when the skill-bucket path applies.
            let tool = updated.tool_affinity.clone();
            self.try_cache_insert(tool.as_deref(), &updated).await;
        }

        info!(
            lesson_id,
            from = %current_tier,
            to = %new_tier,
            revision,
            "Lesson tier changed"
        );
        Ok(revision)
    }

    // ── Delete ────────────────────────────────────────────────────────────

    /// Remove a lesson everywhere. Deleting a nonexistent ID is a no-op
    /// success; returns whether a record existed.
    pub async fn delete(&self, lesson_id: &str) -> Result<bool> {
        let _gate = self.write_gate.write().await;

        let existed = self.store.remove(lesson_id).await?;
        if let Err(e) = self.cache.remove(lesson_id).await {
            warn!(lesson_id, error = %e, "Cache eviction failed during delete; rebuild will reconcile");
        }
        if existed {
            info!(lesson_id, "Lesson deleted");
        }
        Ok(existed)
    }

    // ── Rebuild ───────────────────────────────────────────────────────────

    /// Disaster recovery: clear the cache and rebuild it from the durable
    /// store. Tier-3 lessons are skipped. Holds the controller exclusively
    /// for its duration; commits issued meanwhile block until it finishes.
    ///
    /// On failure the cache is reset to empty rather than left partially
    /// rebuilt, and the error carries how many records had been reinserted.
    pub async fn rebuild_cache_from_db(&self) -> Result<RebuildResult> {
        let _gate = self.write_gate.write().await;

        self.cache.clear().await.map_err(LessonError::Cache)?;

        let lessons = match self.store.scan().await {
            Ok(lessons) => lessons,
            Err(e) => {
                // Scan never started populating; the cache stays empty.
                return Err(LessonError::Rebuild {
                    rebuilt: 0,
                    source: e,
                });
            }
        };

        let mut rebuilt_count = 0usize;
        let mut tool_list: Vec<String> = Vec::new();
        for lesson in lessons {
            let result = match lesson.active_tier {
                Some(MemoryTier::Tier1Kernel) => self.cache.insert_kernel(lesson.clone()).await,
                Some(MemoryTier::Tier2SkillCache) => {
                    let tool = lesson
                        .tool_affinity
                        .clone()
                        .unwrap_or_else(|| GENERAL_TOOL.to_string());
                    if !tool_list.contains(&tool) {
                        tool_list.push(tool.clone());
                    }
                    self.cache.insert_skill(&tool, lesson.clone()).await
                }
                _ => continue,
            };

            match result {
                Ok(()) => rebuilt_count += 1,
                Err(e) => {
                    // Fail-safe: empty beats inconsistent.
                    warn!(lesson_id = %lesson.id, error = %e, "Cache insert failed mid-rebuild; clearing cache");
                    let _ = self.cache.clear().await;
                    return Err(LessonError::Cache(e));
                }
            }
        }

        info!(
            rebuilt_count,
            tools_rebuilt = tool_list.len(),
            "Cache rebuilt from durable store"
        );
        Ok(RebuildResult {
            rebuilt_count,
            tools_rebuilt: tool_list.len(),
            tool_list,
        })
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────

fn validate_patch(patch: &PatchRequest) -> Result<()> {
    let fail = |message: String| Err(LessonError::Validation { message });

    if patch.trace.trace_id.trim().is_empty() {
        return fail("trace_id must not be empty".into());
    }
    let lesson = &patch.proposed_lesson;
    if lesson.trigger_pattern.trim().is_empty() {
        return fail("trigger_pattern must not be empty".into());
    }
    if lesson.rule_text.trim().is_empty() {
        return fail("rule_text must not be empty".into());
    }
    if !lesson.confidence_score.is_finite()
        || !(0.0..=1.0).contains(&lesson.confidence_score)
    {
        return fail(format!(
            "confidence_score out of range: {}",
            lesson.confidence_score
        ));
    }
    Ok(())
}

fn location_for(tier: MemoryTier, tool: Option<&str>) -> String {
    match tier {
        MemoryTier::Tier1Kernel => "kernel".to_string(),
        MemoryTier::Tier2SkillCache => {
            format!("skill_cache/{}", tool.unwrap_or(GENERAL_TOOL))
        }
        MemoryTier::Tier3Archive => "archive".to_string(),
    }
}

fn sort_by_creation(lessons: &mut [Lesson]) {
    lessons.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
}

/// Retrieval's complexity heuristic: long tasks and keyword-dense tasks
/// warrant an archive search.
fn is_complex(task: &str, config: &ComplexityConfig) -> bool {
    if task.len() >= config.min_task_chars {
        return true;
    }
    let content_words = task
        .split_whitespace()
        .filter(|w| w.len() >= config.content_word_len)
        .count();
    content_words >= config.min_content_words
}
