//! # Lessonbank Hierarchy
//!
//! The adaptive memory hierarchy: lessons learned from agent failures are
//! scored into one of three residency tiers and served back at retrieval
//! time with as little context cost as possible.
//!
//! - [`SkillMapper`] routes a failure trace to the tool it belongs to.
//! - [`LessonRubric`] turns a (trace, lesson) pair into a retention score
//!   and tier assignment.
//! - [`MemoryController`] is the sole write/read authority over the durable
//!   store and the fast cache: write-through commits, tiered retrieval,
//!   promotion/demotion, and disaster-recovery rebuild.

pub mod controller;
pub mod rubric;
pub mod skill_mapper;

pub use controller::MemoryController;
pub use rubric::LessonRubric;
pub use skill_mapper::{SkillMapper, ToolSignature, GENERAL_TOOL};
