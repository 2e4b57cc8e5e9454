//! Storage implementations for the lessonbank memory hierarchy.

pub mod cache;
pub mod in_memory;
pub mod jsonl;
pub mod ranker;

pub use cache::InMemoryCache;
pub use in_memory::InMemoryStore;
pub use jsonl::JsonlStore;
pub use ranker::{keyword_overlap, KeywordRanker};
