//! Task module - defines tasks, their state machine, and the dependency graph.
//!
//! - All types use algebraic data types with exhaustive matching
//! - Invariants are documented and enforced in constructors
//! - Ordering logic (`graph`) is pure and separate from execution

pub mod graph;
pub mod task;

pub use graph::{GraphError, TaskGraph};
pub use task::{Task, TaskError, TaskId, TaskOutput, TaskStatus};
