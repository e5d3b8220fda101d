//! Agent-specific error types with rich miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

use crate::error::GraphError;

/// Errors from the goal/task manager, the cycle scheduler and the agent core.
#[derive(Debug, Error, Diagnostic)]
pub enum AgentError {
    #[error("empty {what} description")]
    #[diagnostic(
        code(cogcore::agent::empty_description),
        help("Goals and tasks need a non-empty description to be named in the graph.")
    )]
    EmptyDescription { what: &'static str },

    #[error("goal not found: {goal_id}")]
    #[diagnostic(
        code(cogcore::agent::goal_not_found),
        help("The reference was not created by this task manager. Create goals with `set_goal` or `add_subgoal`.")
    )]
    GoalNotFound { goal_id: u64 },

    #[error("task not found: {task_id}")]
    #[diagnostic(
        code(cogcore::agent::task_not_found),
        help("The reference was not created by this task manager. Create tasks with `create_task`.")
    )]
    TaskNotFound { task_id: u64 },

    #[error("task {task_id} cannot move from {from} to {to}")]
    #[diagnostic(
        code(cogcore::agent::invalid_transition),
        help(
            "Tasks go Pending -> Active -> Completed/Failed, Active -> Suspended, \
             and any state -> Cancelled. Completed, Failed and Cancelled are terminal."
        )
    )]
    InvalidTransition {
        task_id: u64,
        from: &'static str,
        to: &'static str,
    },

    #[error("dependency {dependency_id} -> {task_id} would create a cycle")]
    #[diagnostic(
        code(cogcore::agent::dependency_cycle),
        help(
            "A task that transitively depends on itself can never become ready. \
             Remove the existing path or pick a different dependency."
        )
    )]
    DependencyCycle { task_id: u64, dependency_id: u64 },

    #[error("goal {goal_id} was already decomposed")]
    #[diagnostic(
        code(cogcore::agent::already_decomposed),
        help("Decomposition runs once per goal. Add further subgoals with `add_subgoal`.")
    )]
    AlreadyDecomposed { goal_id: u64 },

    #[error("component not initialized: {component}")]
    #[diagnostic(
        code(cogcore::agent::not_initialized),
        help("Call `init()` on the agent core, and enable the component in its toggles, before using it.")
    )]
    NotInitialized { component: &'static str },

    #[error("cycle driver is not running")]
    #[diagnostic(
        code(cogcore::agent::not_running),
        help("Pause and resume only apply to a started driver. Call `start()` first.")
    )]
    NotRunning,

    #[error("failed to spawn cycle driver: {message}")]
    #[diagnostic(
        code(cogcore::agent::driver_spawn),
        help("The OS refused to create the background thread. Check process thread limits.")
    )]
    DriverSpawn { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),
}

/// Convenience alias for agent operations.
pub type AgentResult<T> = std::result::Result<T, AgentError>;
