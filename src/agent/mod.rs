//! Agent layer: goals, tasks, the cognitive cycle and the composition root.
//!
//! - **Tasks** (`task`): status machine, priorities, dependency records
//! - **Goals** (`goal`): hierarchy records, decomposition templates, achievement scoring
//! - **Manager** (`manager`): the goal/task manager driving the task queue
//! - **Cycle** (`cycle`): perception → planning → action → reflection on a timer
//! - **Core** (`core`): [`AgentCore`] and the [`Lifecycle`] trait

pub mod core;
pub mod cycle;
pub mod error;
pub mod goal;
pub mod manager;
pub mod status;
pub mod task;

pub use self::core::{AgentCore, Lifecycle};
pub use cycle::{CognitiveCycleScheduler, CognitiveState, CycleConfig, SharedState};
pub use error::{AgentError, AgentResult};
pub use goal::{GoalCategory, GoalRecord, classify_goal};
pub use manager::{TaskGoalManager, TaskManagerConfig};
pub use status::{
    AgentStatus, ComponentToggles, PhaseFlags, SchedulerState, SchedulerStatus, TaskManagerStatus,
};
pub use task::{Priority, TaskRecord, TaskStatus};
