//! Goal/task manager: goal hierarchy, dependency-gated task queue, priority
//! scheduling and recursive achievement scoring.
//!
//! Goals and tasks are graph atoms so other subsystems can traverse them; the
//! manager mirrors their scheduling state in ordered maps keyed by
//! [`GraphRef`]. References are allocated monotonically, so map order is
//! creation order.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::belief::BeliefValue;
use crate::graph::{EdgeKind, GraphRef, GraphStore, NodeKind};

use super::error::{AgentError, AgentResult};
use super::goal::{
    GOAL_BELIEF, GoalCategory, GoalRecord, SUBGOAL_BELIEF, classify_goal, combine_achievements,
};
use super::status::TaskManagerStatus;
use super::task::{Priority, STATUS_CONFIDENCE, TaskRecord, TaskStatus};

/// Task manager settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskManagerConfig {
    pub goal_decomposition: bool,
    pub priority_scheduling: bool,
    /// Reported in status only; the cycle runs one task at a time.
    pub max_concurrent_tasks: usize,
}

impl Default for TaskManagerConfig {
    fn default() -> Self {
        Self {
            goal_decomposition: true,
            priority_scheduling: true,
            max_concurrent_tasks: 1,
        }
    }
}

/// Context nodes created for every manager.
#[derive(Debug, Clone, Copy)]
struct ContextRoots {
    task_context: GraphRef,
    goal_context: GraphRef,
    execution_context: GraphRef,
    goal_hierarchy: GraphRef,
    subgoal_of: GraphRef,
}

/// Owns the goal hierarchy and the task queue of one agent.
pub struct TaskGoalManager {
    graph: Arc<dyn GraphStore>,
    config: TaskManagerConfig,
    roots: ContextRoots,
    tasks: BTreeMap<GraphRef, TaskRecord>,
    goals: BTreeMap<GraphRef, GoalRecord>,
    /// Tasks still in `Pending`, in enqueue order.
    queue: VecDeque<GraphRef>,
    current_goal: Option<GraphRef>,
    current_task: Option<GraphRef>,
}

impl std::fmt::Debug for TaskGoalManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskGoalManager")
            .field("tasks", &self.tasks.len())
            .field("goals", &self.goals.len())
            .field("queue", &self.queue.len())
            .field("current_goal", &self.current_goal)
            .field("current_task", &self.current_task)
            .finish()
    }
}

impl TaskGoalManager {
    /// Create a manager and its context nodes (`<agent>_TaskContext`, ...).
    pub fn new(
        graph: Arc<dyn GraphStore>,
        agent_name: &str,
        config: TaskManagerConfig,
    ) -> AgentResult<Self> {
        let roots = ContextRoots {
            task_context: graph.add_node(NodeKind::Concept, &format!("{agent_name}_TaskContext"))?,
            goal_context: graph.add_node(NodeKind::Concept, &format!("{agent_name}_GoalContext"))?,
            execution_context: graph
                .add_node(NodeKind::Concept, &format!("{agent_name}_ExecutionContext"))?,
            goal_hierarchy: graph
                .add_node(NodeKind::Concept, &format!("{agent_name}_GoalHierarchy"))?,
            subgoal_of: graph.add_node(NodeKind::Predicate, "subgoal_of")?,
        };
        tracing::debug!(agent = agent_name, "task manager initialized");
        Ok(Self {
            graph,
            config,
            roots,
            tasks: BTreeMap::new(),
            goals: BTreeMap::new(),
            queue: VecDeque::new(),
            current_goal: None,
            current_task: None,
        })
    }

    // -----------------------------------------------------------------------
    // Goals
    // -----------------------------------------------------------------------

    /// Create a new top-level goal and make it current.
    ///
    /// The previous current goal is suspended. With `auto_decompose` (and
    /// decomposition enabled) the goal is expanded into its category template;
    /// otherwise a single high-priority primary task is attached.
    pub fn set_goal(&mut self, description: &str, auto_decompose: bool) -> AgentResult<GraphRef> {
        let description = non_empty(description, "goal")?;
        let goal = self.create_goal_atom(description, None, GOAL_BELIEF)?;
        self.graph
            .add_edge(EdgeKind::Member, &[self.roots.goal_hierarchy, goal])?;

        if let Some(previous) = self.current_goal.replace(goal) {
            if let Some(record) = self.goals.get_mut(&previous) {
                record.suspended = true;
            }
            tracing::debug!(goal = %previous, "previous goal suspended");
        }
        tracing::info!(goal = %goal, description, "goal set");

        if auto_decompose && self.config.goal_decomposition {
            self.decompose_goal(goal)?;
        } else {
            self.create_task(&format!("Primary_{description}"), Priority::High, Some(goal))?;
        }
        Ok(goal)
    }

    /// Attach a new subgoal under `parent`.
    pub fn add_subgoal(&mut self, parent: GraphRef, description: &str) -> AgentResult<GraphRef> {
        if !self.goals.contains_key(&parent) {
            tracing::warn!(goal = %parent, "add_subgoal: unknown parent goal");
            return Err(AgentError::GoalNotFound {
                goal_id: parent.get(),
            });
        }
        let description = non_empty(description, "subgoal")?;
        let subgoal = self.create_goal_atom(description, Some(parent), SUBGOAL_BELIEF)?;

        self.graph
            .add_edge(EdgeKind::Inheritance, &[parent, subgoal])?;
        self.graph
            .add_edge(EdgeKind::Evaluation, &[self.roots.subgoal_of, subgoal, parent])?;

        if let Some(record) = self.goals.get_mut(&parent) {
            record.subgoals.push(subgoal);
        }
        tracing::debug!(parent = %parent, subgoal = %subgoal, description, "subgoal added");
        Ok(subgoal)
    }

    /// Expand a goal into its category template: one subgoal and one task per
    /// step, each task depending on the previous step's task.
    pub fn decompose_goal(&mut self, goal: GraphRef) -> AgentResult<GoalCategory> {
        let record = self.goals.get(&goal).ok_or(AgentError::GoalNotFound {
            goal_id: goal.get(),
        })?;
        if record.decomposed {
            return Err(AgentError::AlreadyDecomposed {
                goal_id: goal.get(),
            });
        }
        let category = classify_goal(&record.description);

        let mut previous_task: Option<GraphRef> = None;
        for (i, step) in category.template().iter().enumerate() {
            let subgoal = self.add_subgoal(goal, step)?;
            let priority = if i == 0 {
                Priority::High
            } else {
                Priority::Medium
            };
            let task = self.create_task(step, priority, Some(subgoal))?;
            if let Some(prev) = previous_task {
                self.add_task_dependency(task, prev)?;
            }
            previous_task = Some(task);
        }

        if let Some(record) = self.goals.get_mut(&goal) {
            record.decomposed = true;
        }
        tracing::info!(goal = %goal, %category, steps = category.template().len(), "goal decomposed");
        Ok(category)
    }

    /// Recursive achievement score of a goal.
    pub fn is_goal_achieved(&self, goal: GraphRef) -> AgentResult<BeliefValue> {
        if !self.goals.contains_key(&goal) {
            return Err(AgentError::GoalNotFound {
                goal_id: goal.get(),
            });
        }
        self.calculate_goal_achievement(goal)
    }

    fn calculate_goal_achievement(&self, goal: GraphRef) -> AgentResult<BeliefValue> {
        let subgoals = self
            .goals
            .get(&goal)
            .map(|g| g.subgoals.as_slice())
            .unwrap_or_default();

        let children = subgoals
            .iter()
            .map(|sub| self.calculate_goal_achievement(*sub))
            .collect::<AgentResult<Vec<_>>>()?;

        if let Some(combined) = combine_achievements(&children) {
            return Ok(combined);
        }

        match self.find_task_for_goal(goal) {
            Some(task) => {
                let strength = match self.tasks.get(&task).map(|t| t.status) {
                    Some(TaskStatus::Completed) => 1.0,
                    Some(TaskStatus::Active) => 0.5,
                    _ => 0.0,
                };
                Ok(BeliefValue::new(strength, STATUS_CONFIDENCE))
            }
            None => Ok(self.graph.belief(goal)?),
        }
    }

    /// Make an existing goal current, suspending the previous one.
    pub fn set_current_goal(&mut self, goal: GraphRef) -> AgentResult<()> {
        if !self.goals.contains_key(&goal) {
            return Err(AgentError::GoalNotFound {
                goal_id: goal.get(),
            });
        }
        if let Some(previous) = self.current_goal.replace(goal) {
            if previous != goal {
                if let Some(record) = self.goals.get_mut(&previous) {
                    record.suspended = true;
                }
            }
        }
        if let Some(record) = self.goals.get_mut(&goal) {
            record.suspended = false;
        }
        Ok(())
    }

    pub fn current_goal(&self) -> Option<GraphRef> {
        self.current_goal
    }

    pub fn goal(&self, goal: GraphRef) -> Option<&GoalRecord> {
        self.goals.get(&goal)
    }

    pub fn goal_description(&self, goal: GraphRef) -> Option<&str> {
        self.goals.get(&goal).map(|g| g.description.as_str())
    }

    pub fn subgoals_of(&self, goal: GraphRef) -> Vec<GraphRef> {
        self.goals
            .get(&goal)
            .map(|g| g.subgoals.clone())
            .unwrap_or_default()
    }

    pub fn is_goal_suspended(&self, goal: GraphRef) -> bool {
        self.goals.get(&goal).is_some_and(|g| g.suspended)
    }

    /// First task (in creation order) associated with `goal`.
    pub fn find_task_for_goal(&self, goal: GraphRef) -> Option<GraphRef> {
        self.tasks
            .iter()
            .find(|(_, t)| t.goal == Some(goal))
            .map(|(id, _)| *id)
    }

    fn create_goal_atom(
        &mut self,
        description: &str,
        parent: Option<GraphRef>,
        (strength, confidence): (f64, f64),
    ) -> AgentResult<GraphRef> {
        let goal = self
            .graph
            .add_node(NodeKind::Concept, &format!("Goal_{description}"))?;
        self.graph
            .set_belief(goal, BeliefValue::new(strength, confidence))?;
        self.graph
            .add_edge(EdgeKind::Member, &[self.roots.goal_context, goal])?;
        self.goals.insert(goal, GoalRecord::new(description, parent));
        Ok(goal)
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    /// Create a pending task and enqueue it.
    pub fn create_task(
        &mut self,
        description: &str,
        priority: Priority,
        goal: Option<GraphRef>,
    ) -> AgentResult<GraphRef> {
        if let Some(g) = goal {
            if !self.goals.contains_key(&g) {
                tracing::warn!(goal = %g, "create_task: unknown goal");
                return Err(AgentError::GoalNotFound { goal_id: g.get() });
            }
        }
        let task = self
            .graph
            .add_node(NodeKind::Concept, &format!("Task_{description}"))?;
        self.graph.set_belief(task, priority.initial_belief())?;
        self.graph
            .add_edge(EdgeKind::Member, &[self.roots.task_context, task])?;
        if let Some(g) = goal {
            self.graph.add_edge(EdgeKind::Evaluation, &[task, g])?;
        }

        self.tasks
            .insert(task, TaskRecord::new(description, priority, goal));
        self.queue.push_back(task);
        tracing::debug!(task = %task, description, %priority, "task created");
        Ok(task)
    }

    /// Record that `task` cannot start before `dependency` completes.
    ///
    /// Rejects self-dependencies and edges that would close a cycle.
    pub fn add_task_dependency(
        &mut self,
        task: GraphRef,
        dependency: GraphRef,
    ) -> AgentResult<()> {
        self.require_task(task)?;
        self.require_task(dependency)?;
        if task == dependency || self.depends_on(dependency, task) {
            tracing::warn!(task = %task, dependency = %dependency, "dependency cycle rejected");
            return Err(AgentError::DependencyCycle {
                task_id: task.get(),
                dependency_id: dependency.get(),
            });
        }

        self.graph
            .add_edge(EdgeKind::SequentialAnd, &[task, dependency])?;
        if let Some(record) = self.tasks.get_mut(&task) {
            if !record.dependencies.contains(&dependency) {
                record.dependencies.push(dependency);
            }
            record.touch();
        }
        Ok(())
    }

    /// Whether `from` transitively depends on `target`.
    fn depends_on(&self, from: GraphRef, target: GraphRef) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(record) = self.tasks.get(&current) {
                stack.extend(record.dependencies.iter().copied());
            }
        }
        false
    }

    fn is_ready(&self, task: GraphRef) -> bool {
        self.tasks.get(&task).is_some_and(|record| {
            record.status == TaskStatus::Pending
                && record.dependencies.iter().all(|dep| {
                    self.tasks
                        .get(dep)
                        .is_some_and(|d| d.status == TaskStatus::Completed)
                })
        })
    }

    /// Pending tasks whose dependencies have all completed, in queue order.
    pub fn ready_tasks(&self) -> Vec<GraphRef> {
        self.queue
            .iter()
            .copied()
            .filter(|t| self.is_ready(*t))
            .collect()
    }

    /// Pick the next ready task without changing its status.
    ///
    /// With priority scheduling the highest priority wins and ties go to the
    /// earliest queued task.
    pub fn get_next_task(&self) -> Option<GraphRef> {
        let ready = self.ready_tasks();
        if !self.config.priority_scheduling {
            return ready.first().copied();
        }
        let mut best: Option<(GraphRef, Priority)> = None;
        for task in ready {
            let priority = self.tasks[&task].priority;
            if best.is_none_or(|(_, p)| priority > p) {
                best = Some((task, priority));
            }
        }
        best.map(|(task, _)| task)
    }

    /// Finish a task as Completed (`success`) or Failed.
    pub fn complete_task(&mut self, task: GraphRef, success: bool) -> AgentResult<()> {
        let status = if success {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed
        };
        self.update_task_status(task, status)?;
        tracing::debug!(task = %task, success, "task finished");
        Ok(())
    }

    pub fn cancel_task(&mut self, task: GraphRef) -> AgentResult<()> {
        self.update_task_status(task, TaskStatus::Cancelled)?;
        tracing::debug!(task = %task, "task cancelled");
        Ok(())
    }

    /// Park an active task.
    pub fn suspend_task(&mut self, task: GraphRef) -> AgentResult<()> {
        self.update_task_status(task, TaskStatus::Suspended)
    }

    /// Reactivate a suspended task; it becomes current if nothing else is.
    pub fn resume_task(&mut self, task: GraphRef) -> AgentResult<()> {
        if self.require_task(task)?.status != TaskStatus::Suspended {
            return Err(self.invalid_transition(task, TaskStatus::Active));
        }
        self.update_task_status(task, TaskStatus::Active)?;
        if self.current_task.is_none() {
            self.current_task = Some(task);
        }
        Ok(())
    }

    fn update_task_status(&mut self, task: GraphRef, status: TaskStatus) -> AgentResult<()> {
        let from = self.require_task(task)?.status;
        if !from.can_transition_to(status) {
            tracing::warn!(task = %task, %from, to = %status, "rejected task transition");
            return Err(self.invalid_transition(task, status));
        }

        self.graph.set_belief(task, status.belief())?;
        if let Some(record) = self.tasks.get_mut(&task) {
            record.status = status;
            record.touch();
        }
        if status != TaskStatus::Pending {
            self.queue.retain(|t| *t != task);
        }
        if status != TaskStatus::Active && self.current_task == Some(task) {
            self.current_task = None;
        }
        Ok(())
    }

    fn invalid_transition(&self, task: GraphRef, to: TaskStatus) -> AgentError {
        let from = self
            .tasks
            .get(&task)
            .map(|t| t.status.as_str())
            .unwrap_or("unknown");
        AgentError::InvalidTransition {
            task_id: task.get(),
            from,
            to: to.as_str(),
        }
    }

    fn require_task(&self, task: GraphRef) -> AgentResult<&TaskRecord> {
        self.tasks.get(&task).ok_or(AgentError::TaskNotFound {
            task_id: task.get(),
        })
    }

    pub fn task(&self, task: GraphRef) -> Option<&TaskRecord> {
        self.tasks.get(&task)
    }

    pub fn task_status(&self, task: GraphRef) -> Option<TaskStatus> {
        self.tasks.get(&task).map(|t| t.status)
    }

    pub fn task_priority(&self, task: GraphRef) -> Option<Priority> {
        self.tasks.get(&task).map(|t| t.priority)
    }

    pub fn tasks_by_status(&self, status: TaskStatus) -> Vec<GraphRef> {
        self.tasks
            .iter()
            .filter(|(_, t)| t.status == status)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn pending_task_count(&self) -> usize {
        self.queue.len()
    }

    /// Cancel every queued task. Returns how many were cancelled.
    pub fn clear_pending_tasks(&mut self) -> AgentResult<usize> {
        let queued: Vec<GraphRef> = self.queue.iter().copied().collect();
        for task in &queued {
            self.update_task_status(*task, TaskStatus::Cancelled)?;
        }
        tracing::info!(count = queued.len(), "pending tasks cleared");
        Ok(queued.len())
    }

    pub fn current_task(&self) -> Option<GraphRef> {
        self.current_task
    }

    // -----------------------------------------------------------------------
    // Cycle
    // -----------------------------------------------------------------------

    /// One planning step: activate the next ready task if none is current,
    /// then complete the current task.
    ///
    /// Completion is unconditional; this is the hook where real task
    /// execution would plug in. Returns the task that was completed.
    pub fn process_cycle(&mut self) -> AgentResult<Option<GraphRef>> {
        if self.current_task.is_none() {
            if let Some(next) = self.get_next_task() {
                self.update_task_status(next, TaskStatus::Active)?;
                self.current_task = Some(next);
                self.graph
                    .add_edge(EdgeKind::Member, &[self.roots.execution_context, next])?;
                tracing::debug!(task = %next, "task activated");
            }
        }

        match self.current_task {
            Some(task) => {
                self.complete_task(task, true)?;
                Ok(Some(task))
            }
            None => Ok(None),
        }
    }

    // -----------------------------------------------------------------------
    // Configuration and status
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &TaskManagerConfig {
        &self.config
    }

    pub fn set_goal_decomposition_enabled(&mut self, enabled: bool) {
        self.config.goal_decomposition = enabled;
    }

    pub fn set_priority_scheduling_enabled(&mut self, enabled: bool) {
        self.config.priority_scheduling = enabled;
    }

    pub fn set_max_concurrent_tasks(&mut self, max: usize) {
        self.config.max_concurrent_tasks = max.max(1);
    }

    pub fn status(&self) -> TaskManagerStatus {
        TaskManagerStatus {
            queue_depth: self.queue.len(),
            total_tasks: self.tasks.len(),
            total_goals: self.goals.len(),
            current_goal: self.current_goal,
            current_task: self.current_task,
            goal_decomposition: self.config.goal_decomposition,
            priority_scheduling: self.config.priority_scheduling,
            max_concurrent_tasks: self.config.max_concurrent_tasks,
        }
    }
}

fn non_empty<'a>(description: &'a str, what: &'static str) -> AgentResult<&'a str> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        tracing::warn!(what, "rejected empty description");
        return Err(AgentError::EmptyDescription { what });
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::InMemoryGraph;

    fn manager() -> TaskGoalManager {
        TaskGoalManager::new(
            Arc::new(InMemoryGraph::new()),
            "tester",
            TaskManagerConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn empty_goal_rejected() {
        let mut m = manager();
        assert!(matches!(
            m.set_goal("   ", true),
            Err(AgentError::EmptyDescription { .. })
        ));
        assert!(m.current_goal().is_none());
    }

    #[test]
    fn set_goal_without_decomposition_creates_primary_task() {
        let mut m = manager();
        let goal = m.set_goal("tidy up", false).unwrap();
        let task = m.find_task_for_goal(goal).unwrap();
        assert_eq!(m.task_priority(task), Some(Priority::High));
        assert_eq!(m.task(task).unwrap().description, "Primary_tidy up");
        assert!(m.subgoals_of(goal).is_empty());
    }

    #[test]
    fn decomposition_disabled_falls_back_to_primary_task() {
        let mut m = manager();
        m.set_goal_decomposition_enabled(false);
        let goal = m.set_goal("learn rust", true).unwrap();
        assert!(m.subgoals_of(goal).is_empty());
        assert_eq!(m.pending_task_count(), 1);
    }

    #[test]
    fn new_goal_suspends_previous() {
        let mut m = manager();
        let first = m.set_goal("first", false).unwrap();
        let second = m.set_goal("second", false).unwrap();
        assert_eq!(m.current_goal(), Some(second));
        assert!(m.is_goal_suspended(first));
        assert!(m.goal(first).is_some());
    }

    #[test]
    fn decompose_builds_sequential_chain() {
        let mut m = manager();
        let goal = m.set_goal("solve the problem", true).unwrap();
        let subgoals = m.subgoals_of(goal);
        let names: Vec<_> = subgoals
            .iter()
            .map(|s| m.goal_description(*s).unwrap().to_string())
            .collect();
        assert_eq!(names, GoalCategory::ProblemSolving.template());

        let tasks: Vec<_> = subgoals
            .iter()
            .map(|s| m.find_task_for_goal(*s).unwrap())
            .collect();
        assert_eq!(m.task_priority(tasks[0]), Some(Priority::High));
        assert!(m.task(tasks[0]).unwrap().dependencies.is_empty());
        for pair in tasks.windows(2) {
            assert_eq!(m.task_priority(pair[1]), Some(Priority::Medium));
            assert_eq!(m.task(pair[1]).unwrap().dependencies, vec![pair[0]]);
        }
        assert!(m.goal(goal).unwrap().decomposed);
        assert!(matches!(
            m.decompose_goal(goal),
            Err(AgentError::AlreadyDecomposed { .. })
        ));
    }

    #[test]
    fn subgoal_requires_known_parent() {
        let mut m = manager();
        let ghost = GraphRef::new(10_000).unwrap();
        assert!(matches!(
            m.add_subgoal(ghost, "x"),
            Err(AgentError::GoalNotFound { .. })
        ));
    }

    #[test]
    fn dependency_gating() {
        let mut m = manager();
        let a = m.create_task("A", Priority::Medium, None).unwrap();
        let b = m.create_task("B", Priority::Critical, None).unwrap();
        m.add_task_dependency(b, a).unwrap();
        assert_eq!(m.ready_tasks(), vec![a]);
        assert_eq!(m.get_next_task(), Some(a));
        m.complete_task(a, true).unwrap();
        assert_eq!(m.get_next_task(), Some(b));
    }

    #[test]
    fn failed_dependency_blocks_forever() {
        let mut m = manager();
        let a = m.create_task("A", Priority::Medium, None).unwrap();
        let b = m.create_task("B", Priority::Medium, None).unwrap();
        m.add_task_dependency(b, a).unwrap();
        m.complete_task(a, false).unwrap();
        assert_eq!(m.get_next_task(), None);
    }

    #[test]
    fn priority_scheduling_picks_highest_first_found() {
        let mut m = manager();
        let low = m.create_task("low", Priority::Low, None).unwrap();
        let high1 = m.create_task("high1", Priority::High, None).unwrap();
        m.create_task("high2", Priority::High, None).unwrap();
        assert_eq!(m.get_next_task(), Some(high1));

        m.set_priority_scheduling_enabled(false);
        assert_eq!(m.get_next_task(), Some(low));
    }

    #[test]
    fn cycles_are_rejected() {
        let mut m = manager();
        let a = m.create_task("A", Priority::Medium, None).unwrap();
        let b = m.create_task("B", Priority::Medium, None).unwrap();
        let c = m.create_task("C", Priority::Medium, None).unwrap();
        m.add_task_dependency(b, a).unwrap();
        m.add_task_dependency(c, b).unwrap();
        assert!(matches!(
            m.add_task_dependency(a, c),
            Err(AgentError::DependencyCycle { .. })
        ));
        assert!(matches!(
            m.add_task_dependency(a, a),
            Err(AgentError::DependencyCycle { .. })
        ));
    }

    #[test]
    fn status_beliefs_written_to_graph() {
        let graph = Arc::new(InMemoryGraph::new());
        let mut m =
            TaskGoalManager::new(graph.clone(), "t", TaskManagerConfig::default()).unwrap();
        let t = m.create_task("A", Priority::High, None).unwrap();
        assert!((graph.belief(t).unwrap().strength() - 0.5).abs() < 1e-9);
        m.cancel_task(t).unwrap();
        assert!((graph.belief(t).unwrap().strength() - 0.1).abs() < 1e-9);
        assert_eq!(m.pending_task_count(), 0);
    }

    #[test]
    fn terminal_tasks_cannot_complete_again() {
        let mut m = manager();
        let t = m.create_task("A", Priority::High, None).unwrap();
        m.complete_task(t, true).unwrap();
        assert!(matches!(
            m.complete_task(t, false),
            Err(AgentError::InvalidTransition { .. })
        ));
        // Cancel is accepted from any state.
        m.cancel_task(t).unwrap();
        assert_eq!(m.task_status(t), Some(TaskStatus::Cancelled));
    }

    #[test]
    fn process_cycle_completes_in_dependency_order() {
        let mut m = manager();
        let a = m.create_task("A", Priority::Low, None).unwrap();
        let b = m.create_task("B", Priority::Critical, None).unwrap();
        m.add_task_dependency(b, a).unwrap();
        assert_eq!(m.process_cycle().unwrap(), Some(a));
        assert_eq!(m.process_cycle().unwrap(), Some(b));
        assert_eq!(m.process_cycle().unwrap(), None);
        assert!(m.current_task().is_none());
        assert_eq!(m.tasks_by_status(TaskStatus::Completed), vec![a, b]);
    }

    #[test]
    fn suspend_and_resume() {
        let mut m = manager();
        let t = m.create_task("A", Priority::High, None).unwrap();
        assert!(m.suspend_task(t).is_err());
        m.update_task_status(t, TaskStatus::Active).unwrap();
        m.suspend_task(t).unwrap();
        assert_eq!(m.task_status(t), Some(TaskStatus::Suspended));
        m.resume_task(t).unwrap();
        assert_eq!(m.current_task(), Some(t));
    }

    #[test]
    fn clear_pending_cancels_queue() {
        let mut m = manager();
        m.create_task("A", Priority::High, None).unwrap();
        m.create_task("B", Priority::High, None).unwrap();
        assert_eq!(m.clear_pending_tasks().unwrap(), 2);
        assert_eq!(m.pending_task_count(), 0);
        assert_eq!(m.tasks_by_status(TaskStatus::Cancelled).len(), 2);
    }

    #[test]
    fn achievement_rises_as_tasks_complete() {
        let mut m = manager();
        let goal = m.set_goal("learn chess", true).unwrap();
        let start = m.is_goal_achieved(goal).unwrap();
        assert_eq!(start.strength(), 0.0);
        assert!((start.confidence() - 0.9).abs() < 1e-9);

        let mut last = start.strength();
        while m.process_cycle().unwrap().is_some() {
            let now = m.is_goal_achieved(goal).unwrap().strength();
            assert!(now >= last);
            last = now;
        }
        let done = m.is_goal_achieved(goal).unwrap();
        assert_eq!(done.strength(), 1.0);
        assert!((done.confidence() - 0.95).abs() < 1e-9);
    }

    #[test]
    fn leaf_goal_without_task_uses_stored_belief() {
        let mut m = manager();
        m.set_goal_decomposition_enabled(false);
        let goal = m.set_goal("g", false).unwrap();
        let sub = m.add_subgoal(goal, "bare").unwrap();
        let b = m.is_goal_achieved(sub).unwrap();
        assert_eq!(b.strength(), 0.0);
        assert!((b.confidence() - 0.8).abs() < 1e-9);
    }
}
