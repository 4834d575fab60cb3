//! Shared building blocks for the TUI.

pub mod task;
pub mod text;

pub use task::{TaskCompleted, TaskId, TaskKind, TaskMeta, TaskSeq, TaskStarted, TaskState, Tasks};
pub use text::{TextField, relative_time, truncate_with_ellipsis};
