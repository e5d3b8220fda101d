//! Serializable status snapshots for monitoring and introspection.

use serde::{Deserialize, Serialize};

use crate::graph::GraphRef;
use crate::knowledge::KnowledgeStatus;

/// Lifecycle state of the cycle driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    NotRunning,
    Running,
    /// Paused implies running: the driver is alive but idle.
    Paused,
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SchedulerState::NotRunning => "not running",
            SchedulerState::Running => "running",
            SchedulerState::Paused => "paused",
        };
        f.write_str(s)
    }
}

/// Phase enable flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseFlags {
    pub perception: bool,
    pub planning: bool,
    pub action: bool,
    pub reflection: bool,
}

impl Default for PhaseFlags {
    fn default() -> Self {
        Self {
            perception: true,
            planning: true,
            action: true,
            reflection: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub running: bool,
    pub paused: bool,
    pub cycle_count: u64,
    pub last_cycle_ms: u64,
    pub interval_ms: u64,
    pub phases: PhaseFlags,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskManagerStatus {
    /// Tasks still waiting in the pending queue.
    pub queue_depth: usize,
    pub total_tasks: usize,
    pub total_goals: usize,
    pub current_goal: Option<GraphRef>,
    pub current_task: Option<GraphRef>,
    pub goal_decomposition: bool,
    pub priority_scheduling: bool,
    pub max_concurrent_tasks: usize,
}

/// Which subsystems the agent core runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentToggles {
    pub cognitive_loop: bool,
    pub goal_processing: bool,
    pub knowledge_integration: bool,
}

impl Default for ComponentToggles {
    fn default() -> Self {
        Self {
            cognitive_loop: true,
            goal_processing: true,
            knowledge_integration: true,
        }
    }
}

/// Whole-agent snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatus {
    pub agent_name: String,
    pub agent_self: Option<GraphRef>,
    pub initialized: bool,
    pub current_goal: Option<GraphRef>,
    pub components: ComponentToggles,
    pub graph_size: usize,
    pub scheduler: Option<SchedulerStatus>,
    pub tasks: Option<TaskManagerStatus>,
    pub knowledge: Option<KnowledgeStatus>,
}
