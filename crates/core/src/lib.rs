//! # Lessonbank Core
//!
//! Domain types, traits, and error definitions for the lessonbank adaptive
//! memory hierarchy. This crate has **zero framework dependencies** — it
//! defines the domain model that the storage and hierarchy crates implement
//! against.
//!
//! ## Design Philosophy
//!
//! The durable store, the fast cache, and the archive ranker are all defined
//! as traits here. Implementations live in their respective crates. This
//! enables:
//! - Swapping a real document store / key-value cache in via configuration
//! - Easy testing with in-memory and failure-injecting implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod bundle;
pub mod config;
pub mod error;
pub mod lesson;
pub mod patch;
pub mod ranker;
pub mod storage;
pub mod trace;

// Re-export key types at crate root for ergonomics
pub use bundle::{ContextBundle, RetrieveOptions, SkillSection};
pub use config::{ComplexityConfig, HierarchyConfig, RubricWeights};
pub use error::{CacheError, LessonError, Result, StoreError};
pub use lesson::{Lesson, LessonType, MemoryTier};
pub use patch::{ApplyStrategy, CommitResult, PatchRequest, RebuildResult, RubricBreakdown};
pub use ranker::ArchiveRanker;
pub use storage::{DurableStore, FastCache};
pub use trace::{FailureTrace, FailureType, Severity, ToolInvocation};
