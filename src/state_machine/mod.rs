// Result state machine
//
// Lifecycle (`initialized -> executing -> complete | interrupted`) and
// disposition (`success | skipped | failed`) of a single task invocation.

pub mod events;
pub mod result;
pub mod states;

// Re-export main types for convenient access
pub use events::ResultEvent;
pub use result::TaskResult;
pub use states::{TaskState, TaskStatus};
