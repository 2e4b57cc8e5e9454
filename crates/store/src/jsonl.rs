//! JSONL durable store — persistent, human-inspectable lesson storage.
//!
//! One JSON-encoded `Lesson` per line. Records are loaded into memory on
//! creation and the whole file is flushed on every mutation. This gives
//! fast reads with durable writes, and keeps the lesson file greppable.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use lessonbank_core::error::StoreError;
use lessonbank_core::lesson::{Lesson, MemoryTier};
use lessonbank_core::storage::DurableStore;

/// A file-backed durable store using JSONL (one JSON object per line).
pub struct JsonlStore {
    path: PathBuf,
    records: Arc<RwLock<HashMap<String, Lesson>>>,
}

impl JsonlStore {
    /// Open a store at the given path.
    ///
    /// If the file exists, lessons are loaded from it; corrupt lines are
    /// skipped with a warning. If it does not exist, starts empty (file
    /// created on first write).
    pub fn open(path: PathBuf) -> Self {
        let records = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = records.len(), "JSONL lesson store loaded");
        Self {
            path,
            records: Arc::new(RwLock::new(records)),
        }
    }

    fn load_from_disk(path: &PathBuf) -> HashMap<String, Lesson> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return HashMap::new(), // File doesn't exist yet — start empty
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<Lesson>(line) {
                Ok(lesson) => Some((lesson.id.clone(), lesson)),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted lesson record");
                    None
                }
            })
            .collect()
    }

    /// Flush all records to disk as JSONL, in `(created_at, id)` order so
    /// the file is stable across rewrites.
    async fn flush(&self) -> Result<(), StoreError> {
        let records = self.records.read().await;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Io(format!("failed to create lesson directory: {e}"))
            })?;
        }

        let mut lessons: Vec<&Lesson> = records.values().collect();
        lessons.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));

        let mut content = String::new();
        for lesson in lessons {
            let line = serde_json::to_string(lesson).map_err(|e| {
                StoreError::Serialization(format!("failed to serialize lesson: {e}"))
            })?;
            content.push_str(&line);
            content.push('\n');
        }

        std::fs::write(&self.path, &content)
            .map_err(|e| StoreError::Io(format!("failed to write lesson file: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl DurableStore for JsonlStore {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn insert(&self, lesson: Lesson) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(lesson.id.clone(), lesson);
        self.flush().await
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
        let revision = {
            let mut records = self.records.write().await;
            match records.get_mut(id) {
                Some(lesson) => {
                    lesson.active_tier = Some(tier);
                    lesson.tool_affinity = tool_affinity;
                    lesson.revision += 1;
                    Some(lesson.revision)
                }
                None => None,
            }
        };
        if revision.is_some() {
            self.flush().await?;
        }
        Ok(revision)
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let removed = self.records.write().await.remove(id).is_some();
        if removed {
            self.flush().await?;
        }
        Ok(removed)
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
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lesson(id: &str) -> Lesson {
        let mut l = Lesson::new("pattern", "rule", LessonType::Syntax, 0.8);
        l.id = id.into();
        l
    }

    #[tokio::test]
    async fn insert_persists_across_reopen() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        drop(tmp); // Close file so the store can use it

        let store = JsonlStore::open(path.clone());
        store.insert(lesson("l-1")).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("l-1"));

        let store2 = JsonlStore::open(path);
        let found = store2.get("l-1").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn tier_update_persists_across_reopen() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        drop(tmp);

        let store = JsonlStore::open(path.clone());
        store.insert(lesson("l-1")).await.unwrap();
        store
            .update_tier("l-1", MemoryTier::Tier3Archive, None)
            .await
            .unwrap();

        let store2 = JsonlStore::open(path);
        let found = store2.get("l-1").await.unwrap().unwrap();
        assert_eq!(found.active_tier, Some(MemoryTier::Tier3Archive));
        assert_eq!(found.revision, 1);
    }

    #[tokio::test]
    async fn remove_persists_across_reopen() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_path_buf();
        drop(tmp);

        let store = JsonlStore::open(path.clone());
        store.insert(lesson("l-1")).await.unwrap();
        assert!(store.remove("l-1").await.unwrap());

        let store2 = JsonlStore::open(path);
        assert!(store2.get("l-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlStore::open(dir.path().join("nonexistent.jsonl"));
        assert!(store.scan().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupted_lines_are_skipped() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            r#"{{"id":"l-1","trigger_pattern":"p","rule_text":"r","lesson_type":"syntax","confidence_score":0.8,"created_at":"2026-01-01T00:00:00Z"}}"#
        )
        .unwrap();
        writeln!(tmp, "this is not json").unwrap();
        writeln!(
            tmp,
            r#"{{"id":"l-2","trigger_pattern":"p","rule_text":"r","lesson_type":"business","confidence_score":0.7,"created_at":"2026-01-02T00:00:00Z"}}"#
        )
        .unwrap();
        let path = tmp.path().to_path_buf();

        let store = JsonlStore::open(path);
        assert_eq!(store.scan().await.unwrap().len(), 2);
    }
}
