//! In-memory fast cache — the ephemeral Tier-1/Tier-2 projection.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use lessonbank_core::error::CacheError;
use lessonbank_core::lesson::Lesson;
use lessonbank_core::storage::FastCache;

#[derive(Default)]
struct CacheInner {
    /// Tier-1 lessons, in insertion order.
    kernel: Vec<Lesson>,
    /// Tier-2 buckets keyed by tool name.
    skills: HashMap<String, Vec<Lesson>>,
    /// Tool names in first-insertion order.
    tool_order: Vec<String>,
}

/// A fast cache backed by process memory.
///
/// Stands in for an ephemeral key-value cache (the kernel list plus one
/// list per tool). The cache never mutates lessons itself; the controller
/// inserts and removes whole records.
pub struct InMemoryCache {
    inner: Arc<RwLock<CacheInner>>,
    /// Optional cap on total cached lessons. Exceeding it surfaces the
    /// resource-exhaustion failure mode.
    capacity: Option<usize>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner::default())),
            capacity: None,
        }
    }

    /// A cache that rejects inserts beyond `capacity` total lessons.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner::default())),
            capacity: Some(capacity),
        }
    }

    fn check_capacity(&self, inner: &CacheInner) -> Result<(), CacheError> {
        if let Some(cap) = self.capacity {
            let total =
                inner.kernel.len() + inner.skills.values().map(Vec::len).sum::<usize>();
            if total >= cap {
                return Err(CacheError::Exhausted(format!(
                    "cache holds {total} lessons, capacity {cap}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FastCache for InMemoryCache {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn insert_kernel(&self, lesson: Lesson) -> Result<(), CacheError> {
        let mut inner = self.inner.write().await;
        self.check_capacity(&inner)?;
        inner.kernel.push(lesson);
        Ok(())
    }

    async fn insert_skill(&self, tool: &str, lesson: Lesson) -> Result<(), CacheError> {
        let mut inner = self.inner.write().await;
        self.check_capacity(&inner)?;
        if !inner.skills.contains_key(tool) {
            inner.tool_order.push(tool.to_string());
        }
        inner.skills.entry(tool.to_string()).or_default().push(lesson);
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<bool, CacheError> {
        let mut inner = self.inner.write().await;
        let kernel_before = inner.kernel.len();
        inner.kernel.retain(|l| l.id != id);
        let mut removed = inner.kernel.len() < kernel_before;

        for bucket in inner.skills.values_mut() {
            let before = bucket.len();
            bucket.retain(|l| l.id != id);
            removed |= bucket.len() < before;
        }

        // Emptied buckets are dropped entirely so the map does not grow
        // without bound under tier churn.
        let emptied: Vec<String> = inner
            .skills
            .iter()
            .filter(|(_, bucket)| bucket.is_empty())
            .map(|(tool, _)| tool.clone())
            .collect();
        for tool in &emptied {
            inner.skills.remove(tool);
        }
        inner.tool_order.retain(|t| !emptied.contains(t));

        Ok(removed)
    }

    async fn kernel(&self) -> Result<Vec<Lesson>, CacheError> {
        Ok(self.inner.read().await.kernel.clone())
    }

    async fn skill_bucket(&self, tool: &str) -> Result<Vec<Lesson>, CacheError> {
        let inner = self.inner.read().await;
        Ok(inner.skills.get(tool).cloned().unwrap_or_default())
    }

    async fn tools(&self) -> Result<Vec<String>, CacheError> {
        // `remove` prunes emptied buckets, so the order list never names a
        // bucket without members.
        Ok(self.inner.read().await.tool_order.clone())
    }

    async fn len(&self) -> Result<usize, CacheError> {
        let inner = self.inner.read().await;
        Ok(inner.kernel.len() + inner.skills.values().map(Vec::len).sum::<usize>())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut inner = self.inner.write().await;
        inner.kernel.clear();
        inner.skills.clear();
        inner.tool_order.clear();
        Ok(())
    }
}
