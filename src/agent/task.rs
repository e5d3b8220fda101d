//! Tasks: units of work with a status machine, a priority and dependencies.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::belief::BeliefValue;
use crate::graph::GraphRef;

/// Confidence attached to every task status belief.
pub const STATUS_CONFIDENCE: f64 = 0.9;

/// Task priority. The discriminant is the scheduling weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low = 1,
    Medium = 5,
    High = 10,
    Critical = 20,
}

impl Priority {
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Belief written to a task atom when it is created: priority normalized
    /// against [`Priority::Critical`].
    pub fn initial_belief(self) -> BeliefValue {
        BeliefValue::new(
            f64::from(self.value()) / f64::from(Priority::Critical.value()),
            STATUS_CONFIDENCE,
        )
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// Status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Active,
    Completed,
    Failed,
    Cancelled,
    Suspended,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// Whether the state machine allows `self -> next`.
    ///
    /// Finishing is accepted from any live state so a caller can complete a
    /// task it never scheduled through the queue.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        match (self, next) {
            (_, Cancelled) => true,
            (Pending | Suspended, Active) => true,
            (Active, Suspended) => true,
            (from, Completed | Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Strength written to the task atom for this status.
    pub fn strength(self) -> f64 {
        match self {
            TaskStatus::Pending => 0.2,
            TaskStatus::Active => 0.5,
            TaskStatus::Completed => 1.0,
            TaskStatus::Failed => 0.0,
            TaskStatus::Cancelled => 0.1,
            TaskStatus::Suspended => 0.3,
        }
    }

    pub fn belief(self) -> BeliefValue {
        BeliefValue::new(self.strength(), STATUS_CONFIDENCE)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Active => "active",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::Suspended => "suspended",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bookkeeping for one task. The task itself is a graph atom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    /// Tasks that must complete before this one is ready.
    pub dependencies: Vec<GraphRef>,
    pub goal: Option<GraphRef>,
    /// Seconds since UNIX epoch.
    pub created_at: u64,
    pub updated_at: u64,
}

impl TaskRecord {
    pub fn new(description: &str, priority: Priority, goal: Option<GraphRef>) -> Self {
        let now = now_secs();
        Self {
            description: description.to_string(),
            status: TaskStatus::Pending,
            priority,
            dependencies: Vec::new(),
            goal,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = now_secs();
    }
}

pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
