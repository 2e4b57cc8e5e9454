//! In-memory durable store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use lessonbank_core::error::StoreError;
use lessonbank_core::lesson::{Lesson, MemoryTier};
use lessonbank_core::storage::DurableStore;

/// A durable store backed by a `HashMap`, one record per lesson id.
///
/// "Durable" here means authoritative, not crash-safe: this backend models
/// the document store's contract so the controller's write-through and
/// rebuild logic can be exercised without external infrastructure.
pub struct InMemoryStore {
    records: Arc<RwLock<HashMap<String, Lesson>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DurableStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn insert(&self, lesson: Lesson) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.insert(lesson.id.clone(), lesson);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Lesson>, StoreError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn update_tier(
        &self,
        id: &str,
        tier: MemoryTier,
        tool_affinity: Option<String>,
    ) -> Result<Option<u64>, StoreError> {
        let mut records = self.records.write().await;
        match records.get_mut(id) {
            Some(lesson) => {
                lesson.active_tier = Some(tier);
                lesson.tool_affinity = tool_affinity;
                lesson.revision += 1;
                Ok(Some(lesson.revision))
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.records.write().await.remove(id).is_some())
    }

    async fn scan(&self) -> Result<Vec<Lesson>, StoreError> {
        let records = self.records.read().await;
        let mut lessons: Vec<Lesson> = records.values().cloned().collect();
        lessons.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(lessons)
    }

    async fn pattern_occurrences(&self, trigger_pattern: &str) -> Result<usize, StoreError> {
        let needle = trigger_pattern.trim().to_lowercase();
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|l| l.trigger_pattern.trim().to_lowercase() == needle)
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lessonbank_core::lesson::LessonType;

    fn lesson(id: &str, pattern: &str) -> Lesson {
        let mut l = Lesson::new(pattern, "rule", LessonType::Syntax, 0.8);
        l.id = id.into();
        l
    }

    #[tokio::test]
    async fn insert_and_get() {
        let store = InMemoryStore::new();
        store.insert(lesson("l-1", "sql limit")).await.unwrap();

        let found = store.get("l-1").await.unwrap();
        assert_eq!(found.unwrap().trigger_pattern, "sql limit");
        assert!(store.get("l-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_tier_bumps_revision_in_place() {
        let store = InMemoryStore::new();
        store.insert(lesson("l-1", "p")).await.unwrap();

        let rev = store
            .update_tier("l-1", MemoryTier::Tier2SkillCache, Some("sql_db".into()))
            .await
            .unwrap();
        assert_eq!(rev, Some(1));

        let rev = store
            .update_tier("l-1", MemoryTier::Tier3Archive, None)
            .await
            .unwrap();
        assert_eq!(rev, Some(2));

        let found = store.get("l-1").await.unwrap().unwrap();
        assert_eq!(found.active_tier, Some(MemoryTier::Tier3Archive));
        assert!(found.tool_affinity.is_none());
        // Payload untouched
        assert_eq!(found.trigger_pattern, "p");
    }

    #[tokio::test]
    async fn update_tier_unknown_id_returns_none() {
        let store = InMemoryStore::new();
        let rev = store
            .update_tier("ghost", MemoryTier::Tier1Kernel, None)
            .await
            .unwrap();
        assert!(rev.is_none());
    }

    #[tokio::test]
    async fn scan_is_ordered_by_creation() {
        let store = InMemoryStore::new();
        let mut a = lesson("b-second", "p1");
        let mut b = lesson("a-first", "p2");
        a.created_at = chrono::Utc::now();
        b.created_at = a.created_at - chrono::Duration::seconds(10);
        store.insert(a).await.unwrap();
        store.insert(b).await.unwrap();

        let scanned = store.scan().await.unwrap();
        assert_eq!(scanned[0].id, "a-first");
        assert_eq!(scanned[1].id, "b-second");
    }

    #[tokio::test]
    async fn pattern_occurrences_case_insensitive() {
        let store = InMemoryStore::new();
        store.insert(lesson("l-1", "SQL Query Without Limit")).await.unwrap();
        store.insert(lesson("l-2", "sql query without limit")).await.unwrap();
        store.insert(lesson("l-3", "something else")).await.unwrap();

        let n = store.pattern_occurrences("sql query without limit").await.unwrap();
        assert_eq!(n, 2);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = InMemoryStore::new();
        store.insert(lesson("l-1", "p")).await.unwrap();
        assert!(store.remove("l-1").await.unwrap());
        assert!(!store.remove("l-1").await.unwrap());
    }
}
