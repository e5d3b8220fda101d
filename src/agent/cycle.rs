//! Cognitive cycle scheduler: perception, planning, action and reflection on
//! a timer, driven by one background thread.
//!
//! The driver shares the agent's state lock with the host. Each phase takes
//! the lock only for its own duration, so host calls interleave between
//! phases. Control flags are atomics and can be flipped from any thread.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::belief::BeliefValue;
use crate::error::CoreResult;
use crate::graph::{EdgeKind, GraphRef, GraphStore, NodeKind};
use crate::knowledge::KnowledgeIntegrator;

use super::error::{AgentError, AgentResult};
use super::manager::TaskGoalManager;
use super::status::{PhaseFlags, SchedulerState, SchedulerStatus};

/// Mutable agent state behind the single exclusive lock.
#[derive(Debug, Default)]
pub struct CognitiveState {
    pub tasks: Option<TaskGoalManager>,
    pub knowledge: Option<KnowledgeIntegrator>,
}

pub type SharedState = Arc<Mutex<CognitiveState>>;

/// Lock the shared state, recovering from a poisoned lock.
pub fn lock_state(state: &Mutex<CognitiveState>) -> MutexGuard<'_, CognitiveState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scheduler timing and phase selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleConfig {
    pub interval_ms: u64,
    /// Idle poll while paused.
    pub pause_poll_ms: u64,
    /// Sleep after a cycle that panicked.
    pub fault_backoff_ms: u64,
    pub phases: PhaseFlags,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            pause_poll_ms: 100,
            fault_backoff_ms: 100,
            phases: PhaseFlags::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Perception,
    Planning,
    Action,
    Reflection,
}

impl Phase {
    const ORDER: [Phase; 4] = [
        Phase::Perception,
        Phase::Planning,
        Phase::Action,
        Phase::Reflection,
    ];

    fn name(self) -> &'static str {
        match self {
            Phase::Perception => "perception",
            Phase::Planning => "planning",
            Phase::Action => "action",
            Phase::Reflection => "reflection",
        }
    }

    /// Belief written to the phase context node each time the phase runs.
    fn context_belief(self) -> BeliefValue {
        match self {
            Phase::Perception => BeliefValue::new(0.8, 0.9),
            Phase::Planning => BeliefValue::new(0.7, 0.8),
            Phase::Action => BeliefValue::new(0.6, 0.7),
            Phase::Reflection => BeliefValue::new(0.5, 0.6),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PhaseContexts {
    perception: GraphRef,
    planning: GraphRef,
    action: GraphRef,
    reflection: GraphRef,
}

impl PhaseContexts {
    fn of(&self, phase: Phase) -> GraphRef {
        match phase {
            Phase::Perception => self.perception,
            Phase::Planning => self.planning,
            Phase::Action => self.action,
            Phase::Reflection => self.reflection,
        }
    }
}

/// State shared between the scheduler handle and its driver thread.
struct Shared {
    running: AtomicBool,
    paused: AtomicBool,
    cycle_count: AtomicU64,
    last_cycle_micros: AtomicU64,
    interval_ms: AtomicU64,
    perception: AtomicBool,
    planning: AtomicBool,
    action: AtomicBool,
    reflection: AtomicBool,
    pause_poll_ms: AtomicU64,
    fault_backoff_ms: AtomicU64,
    graph: Arc<dyn GraphStore>,
    state: SharedState,
    contexts: PhaseContexts,
    agent_self: Option<GraphRef>,
}

impl Shared {
    fn phase_enabled(&self, phase: Phase) -> bool {
        let flag = match phase {
            Phase::Perception => &self.perception,
            Phase::Planning => &self.planning,
            Phase::Action => &self.action,
            Phase::Reflection => &self.reflection,
        };
        flag.load(Ordering::SeqCst)
    }

    fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_ms.load(Ordering::SeqCst))
    }

    fn fault_backoff(&self) -> Duration {
        Duration::from_millis(self.fault_backoff_ms.load(Ordering::SeqCst))
    }

    fn phases(&self) -> PhaseFlags {
        PhaseFlags {
            perception: self.perception.load(Ordering::SeqCst),
            planning: self.planning.load(Ordering::SeqCst),
            action: self.action.load(Ordering::SeqCst),
            reflection: self.reflection.load(Ordering::SeqCst),
        }
    }

    fn execute_single_cycle(&self) -> bool {
        let started = Instant::now();
        let cycle = self.cycle_count.load(Ordering::SeqCst) + 1;
        let mut ok = true;

        for phase in Phase::ORDER {
            if !self.phase_enabled(phase) {
                continue;
            }
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_phase(phase)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!(cycle, phase = phase.name(), error = %e, "phase failed");
                    ok = false;
                }
                Err(_) => {
                    tracing::error!(cycle, phase = phase.name(), "phase panicked");
                    ok = false;
                }
            }
        }

        let elapsed = started.elapsed();
        self.last_cycle_micros
            .store(elapsed.as_micros() as u64, Ordering::SeqCst);
        self.cycle_count.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(cycle, ok, duration_ms = elapsed.as_millis() as u64, "cycle complete");
        ok
    }

    fn run_phase(&self, phase: Phase) -> CoreResult<()> {
        let context = self.contexts.of(phase);
        self.graph.set_belief(context, phase.context_belief())?;

        match phase {
            Phase::Perception | Phase::Action => self.mark_self(context)?,
            Phase::Planning => {
                let mut state = lock_state(&self.state);
                if let Some(tasks) = state.tasks.as_mut() {
                    if let Some(task) = tasks.process_cycle()? {
                        tracing::debug!(task = %task, "planning completed task");
                    }
                }
            }
            Phase::Reflection => {
                let mut state = lock_state(&self.state);
                if let Some(knowledge) = state.knowledge.as_mut() {
                    knowledge.process_cycle()?;
                }
            }
        }
        Ok(())
    }

    /// Record that the agent went through a phase: one `[self, context]`
    /// Evaluation edge per phase context.
    fn mark_self(&self, context: GraphRef) -> CoreResult<()> {
        let Some(agent_self) = self.agent_self else {
            return Ok(());
        };
        let existing = self
            .graph
            .incoming_edges(context, Some(EdgeKind::Evaluation))?;
        for edge in existing {
            if self.graph.outgoing(edge)? == [agent_self, context] {
                return Ok(());
            }
        }
        self.graph
            .add_edge(EdgeKind::Evaluation, &[agent_self, context])?;
        Ok(())
    }

    fn drive(&self) {
        tracing::info!("cycle driver started");
        while self.running.load(Ordering::SeqCst) {
            if self.paused.load(Ordering::SeqCst) {
                std::thread::sleep(self.pause_poll());
                continue;
            }
            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            match panic::catch_unwind(AssertUnwindSafe(|| self.execute_single_cycle())) {
                Ok(_) => {
                    let interval = Duration::from_millis(self.interval_ms.load(Ordering::SeqCst));
                    self.sleep_while_running(interval);
                }
                Err(_) => {
                    tracing::error!("cycle panicked, backing off");
                    std::thread::sleep(self.fault_backoff());
                }
            }
        }
        tracing::info!(cycles = self.cycle_count.load(Ordering::SeqCst), "cycle driver stopped");
    }

    /// Sleep for `total`, waking early once the driver is told to stop.
    fn sleep_while_running(&self, total: Duration) {
        let deadline = Instant::now() + total;
        loop {
            let now = Instant::now();
            if now >= deadline || !self.running.load(Ordering::SeqCst) {
                return;
            }
            std::thread::sleep((deadline - now).min(self.pause_poll()));
        }
    }
}

/// Drives the four-phase cognitive cycle.
pub struct CognitiveCycleScheduler {
    shared: Arc<Shared>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl CognitiveCycleScheduler {
    /// Create a stopped scheduler and its phase context nodes
    /// (`<agent>_Perception`, ...).
    pub fn new(
        graph: Arc<dyn GraphStore>,
        agent_name: &str,
        agent_self: Option<GraphRef>,
        state: SharedState,
        config: CycleConfig,
    ) -> AgentResult<Self> {
        let context = |suffix: &str| graph.add_node(NodeKind::Concept, &format!("{agent_name}_{suffix}"));
        let contexts = PhaseContexts {
            perception: context("Perception")?,
            planning: context("Planning")?,
            action: context("Action")?,
            reflection: context("Reflection")?,
        };

        let shared = Shared {
            running: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            cycle_count: AtomicU64::new(0),
            last_cycle_micros: AtomicU64::new(0),
            interval_ms: AtomicU64::new(config.interval_ms.max(1)),
            perception: AtomicBool::new(config.phases.perception),
            planning: AtomicBool::new(config.phases.planning),
            action: AtomicBool::new(config.phases.action),
            reflection: AtomicBool::new(config.phases.reflection),
            pause_poll_ms: AtomicU64::new(config.pause_poll_ms.max(1)),
            fault_backoff_ms: AtomicU64::new(config.fault_backoff_ms),
            graph,
            state,
            contexts,
            agent_self,
        };
        Ok(Self {
            shared: Arc::new(shared),
            driver: Mutex::new(None),
        })
    }

    /// Spawn the driver. Starting a running scheduler is a no-op.
    pub fn start(&self) -> AgentResult<()> {
        let mut driver = self.driver.lock().unwrap_or_else(PoisonError::into_inner);
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.shared.paused.store(false, Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);
        let spawned = std::thread::Builder::new()
            .name("cogcore-cycle".into())
            .spawn(move || shared.drive());
        match spawned {
            Ok(handle) => {
                *driver = Some(handle);
                tracing::info!(
                    interval_ms = self.shared.interval_ms.load(Ordering::SeqCst),
                    "scheduler started"
                );
                Ok(())
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::SeqCst);
                Err(AgentError::DriverSpawn {
                    message: e.to_string(),
                })
            }
        }
    }

    /// Signal the driver and block until it exits. Stopping a stopped
    /// scheduler is a no-op.
    pub fn stop(&self) -> AgentResult<()> {
        let mut driver = self.driver.lock().unwrap_or_else(PoisonError::into_inner);
        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.paused.store(false, Ordering::SeqCst);
        if let Some(handle) = driver.take() {
            if handle.join().is_err() {
                tracing::error!("cycle driver exited by panic");
            }
            tracing::info!(
                cycles = self.shared.cycle_count.load(Ordering::SeqCst),
                "scheduler stopped"
            );
        }
        Ok(())
    }

    pub fn pause(&self) -> AgentResult<()> {
        if !self.shared.running.load(Ordering::SeqCst) {
            return Err(AgentError::NotRunning);
        }
        self.shared.paused.store(true, Ordering::SeqCst);
        tracing::info!("scheduler paused");
        Ok(())
    }

    pub fn resume(&self) -> AgentResult<()> {
        if !self.shared.running.load(Ordering::SeqCst) {
            return Err(AgentError::NotRunning);
        }
        self.shared.paused.store(false, Ordering::SeqCst);
        tracing::info!("scheduler resumed");
        Ok(())
    }

    /// Run every enabled phase once on the calling thread.
    ///
    /// Returns `false` if any executed phase failed.
    pub fn execute_single_cycle(&self) -> bool {
        self.shared.execute_single_cycle()
    }

    pub fn configure_phases(&self, phases: PhaseFlags) {
        self.shared.perception.store(phases.perception, Ordering::SeqCst);
        self.shared.planning.store(phases.planning, Ordering::SeqCst);
        self.shared.action.store(phases.action, Ordering::SeqCst);
        self.shared.reflection.store(phases.reflection, Ordering::SeqCst);
    }

    /// Change the per-cycle interval; takes effect after the current sleep.
    pub fn set_interval(&self, interval: Duration) {
        let ms = (interval.as_millis() as u64).max(1);
        self.shared.interval_ms.store(ms, Ordering::SeqCst);
    }

    /// Change how often a paused driver checks for resume or stop.
    pub fn set_pause_poll(&self, poll: Duration) {
        let ms = (poll.as_millis() as u64).max(1);
        self.shared.pause_poll_ms.store(ms, Ordering::SeqCst);
    }

    pub fn pause_poll(&self) -> Duration {
        self.shared.pause_poll()
    }

    /// Change the sleep that follows a cycle which panicked.
    pub fn set_fault_backoff(&self, backoff: Duration) {
        self.shared
            .fault_backoff_ms
            .store(backoff.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn fault_backoff(&self) -> Duration {
        self.shared.fault_backoff()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.shared.interval_ms.load(Ordering::SeqCst))
    }

    pub fn cycle_count(&self) -> u64 {
        self.shared.cycle_count.load(Ordering::SeqCst)
    }

    pub fn last_cycle_duration(&self) -> Duration {
        Duration::from_micros(self.shared.last_cycle_micros.load(Ordering::SeqCst))
    }

    pub fn state(&self) -> SchedulerState {
        match (
            self.shared.running.load(Ordering::SeqCst),
            self.shared.paused.load(Ordering::SeqCst),
        ) {
            (false, _) => SchedulerState::NotRunning,
            (true, true) => SchedulerState::Paused,
            (true, false) => SchedulerState::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> SchedulerStatus {
        let state = self.state();
        SchedulerStatus {
            state,
            running: state != SchedulerState::NotRunning,
            paused: state == SchedulerState::Paused,
            cycle_count: self.cycle_count(),
            last_cycle_ms: self.last_cycle_duration().as_millis() as u64,
            interval_ms: self.shared.interval_ms.load(Ordering::SeqCst),
            phases: self.shared.phases(),
        }
    }
}

impl std::fmt::Debug for CognitiveCycleScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CognitiveCycleScheduler")
            .field("state", &self.state())
            .field("cycles", &self.cycle_count())
            .finish()
    }
}

impl Drop for CognitiveCycleScheduler {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::manager::TaskManagerConfig;
    use crate::agent::task::{Priority, TaskStatus};
    use crate::graph::InMemoryGraph;

    fn scheduler(with_tasks: bool) -> (Arc<InMemoryGraph>, SharedState, CognitiveCycleScheduler) {
        let graph = Arc::new(InMemoryGraph::new());
        let mut state = CognitiveState::default();
        if with_tasks {
            state.tasks = Some(
                TaskGoalManager::new(graph.clone(), "t", TaskManagerConfig::default()).unwrap(),
            );
        }
        let state = Arc::new(Mutex::new(state));
        let agent_self = graph.add_node(NodeKind::Concept, "t").unwrap();
        let config = CycleConfig {
            interval_ms: 20,
            ..CycleConfig::default()
        };
        let s = CognitiveCycleScheduler::new(
            graph.clone(),
            "t",
            Some(agent_self),
            state.clone(),
            config,
        )
        .unwrap();
        (graph, state, s)
    }

    #[test]
    fn single_cycle_without_components_succeeds() {
        let (graph, _, s) = scheduler(false);
        assert!(s.execute_single_cycle());
        assert_eq!(s.cycle_count(), 1);
        let perception = graph.by_name(NodeKind::Concept, "t_Perception")[0];
        assert_eq!(graph.belief(perception).unwrap(), BeliefValue::new(0.8, 0.9));
    }

    #[test]
    fn self_mark_is_added_once() {
        let (graph, _, s) = scheduler(false);
        s.execute_single_cycle();
        s.execute_single_cycle();
        let action = graph.by_name(NodeKind::Concept, "t_Action")[0];
        assert_eq!(
            graph.incoming_edges(action, Some(EdgeKind::Evaluation)).unwrap().len(),
            1
        );
    }

    #[test]
    fn planning_phase_completes_tasks() {
        let (_, state, s) = scheduler(true);
        let task = lock_state(&state)
            .tasks
            .as_mut()
            .unwrap()
            .create_task("A", Priority::High, None)
            .unwrap();
        assert!(s.execute_single_cycle());
        let status = lock_state(&state).tasks.as_ref().unwrap().task_status(task);
        assert_eq!(status, Some(TaskStatus::Completed));
    }

    #[test]
    fn disabled_planning_leaves_tasks_alone() {
        let (_, state, s) = scheduler(true);
        s.configure_phases(PhaseFlags {
            planning: false,
            ..PhaseFlags::default()
        });
        let task = lock_state(&state)
            .tasks
            .as_mut()
            .unwrap()
            .create_task("A", Priority::High, None)
            .unwrap();
        s.execute_single_cycle();
        let status = lock_state(&state).tasks.as_ref().unwrap().task_status(task);
        assert_eq!(status, Some(TaskStatus::Pending));
        assert!(!s.status().phases.planning);
    }

    #[test]
    fn pause_requires_running() {
        let (_, _, s) = scheduler(false);
        assert!(matches!(s.pause(), Err(AgentError::NotRunning)));
        assert!(matches!(s.resume(), Err(AgentError::NotRunning)));
        assert_eq!(s.state(), SchedulerState::NotRunning);
    }

    #[test]
    fn start_stop_are_idempotent() {
        let (_, _, s) = scheduler(false);
        s.stop().unwrap();
        s.start().unwrap();
        s.start().unwrap();
        assert_eq!(s.state(), SchedulerState::Running);
        s.pause().unwrap();
        assert_eq!(s.state(), SchedulerState::Paused);
        s.resume().unwrap();
        s.stop().unwrap();
        s.stop().unwrap();
        assert_eq!(s.state(), SchedulerState::NotRunning);
    }

    #[test]
    fn driver_advances_cycles() {
        let (_, _, s) = scheduler(false);
        s.start().unwrap();
        std::thread::sleep(Duration::from_millis(150));
        s.stop().unwrap();
        assert!(s.cycle_count() >= 2);
    }

    /// Store that fails belief writes on one named atom and panics on another.
    struct FaultyGraph {
        inner: InMemoryGraph,
        fail_on: &'static str,
        panic_on: &'static str,
    }

    impl GraphStore for FaultyGraph {
        fn add_node(&self, kind: NodeKind, name: &str) -> crate::error::GraphResult<GraphRef> {
            self.inner.add_node(kind, name)
        }
        fn add_edge(
            &self,
            kind: EdgeKind,
            members: &[GraphRef],
        ) -> crate::error::GraphResult<GraphRef> {
            self.inner.add_edge(kind, members)
        }
        fn incoming_edges(
            &self,
            target: GraphRef,
            kind: Option<EdgeKind>,
        ) -> crate::error::GraphResult<Vec<GraphRef>> {
            self.inner.incoming_edges(target, kind)
        }
        fn outgoing(&self, edge: GraphRef) -> crate::error::GraphResult<Vec<GraphRef>> {
            self.inner.outgoing(edge)
        }
        fn atoms_of(&self, filter: crate::graph::KindFilter) -> Vec<GraphRef> {
            self.inner.atoms_of(filter)
        }
        fn by_name(&self, kind: NodeKind, name: &str) -> Vec<GraphRef> {
            self.inner.by_name(kind, name)
        }
        fn name(&self, atom: GraphRef) -> Option<String> {
            self.inner.name(atom)
        }
        fn kind(&self, atom: GraphRef) -> Option<crate::graph::AtomKind> {
            self.inner.kind(atom)
        }
        fn size(&self) -> usize {
            self.inner.size()
        }
        fn belief(&self, atom: GraphRef) -> crate::error::GraphResult<BeliefValue> {
            self.inner.belief(atom)
        }
        fn set_belief(
            &self,
            atom: GraphRef,
            belief: BeliefValue,
        ) -> crate::error::GraphResult<()> {
            let name = self.inner.name(atom);
            if name.as_deref() == Some(self.panic_on) {
                panic!("belief write on {} blew up", self.panic_on);
            }
            if name.as_deref() == Some(self.fail_on) {
                return Err(crate::error::GraphError::StoreFault {
                    message: format!("{} is read-only", self.fail_on),
                });
            }
            self.inner.set_belief(atom, belief)
        }
    }

    fn faulty_scheduler(
        fail_on: &'static str,
        panic_on: &'static str,
    ) -> (Arc<FaultyGraph>, CognitiveCycleScheduler) {
        let graph = Arc::new(FaultyGraph {
            inner: InMemoryGraph::new(),
            fail_on,
            panic_on,
        });
        let state = Arc::new(Mutex::new(CognitiveState::default()));
        let config = CycleConfig {
            interval_ms: 10,
            pause_poll_ms: 5,
            fault_backoff_ms: 5,
            ..CycleConfig::default()
        };
        let s = CognitiveCycleScheduler::new(graph.clone(), "t", None, state, config).unwrap();
        (graph, s)
    }

    #[test]
    fn failing_phase_does_not_stop_later_phases() {
        let (graph, s) = faulty_scheduler("t_Perception", "");
        assert!(!s.execute_single_cycle());
        assert_eq!(s.cycle_count(), 1);

        let reflection = graph.by_name(NodeKind::Concept, "t_Reflection")[0];
        assert_eq!(graph.belief(reflection).unwrap(), BeliefValue::new(0.5, 0.6));
        let perception = graph.by_name(NodeKind::Concept, "t_Perception")[0];
        assert_eq!(graph.belief(perception).unwrap(), BeliefValue::NO_EVIDENCE);
    }

    #[test]
    fn panicking_phase_counts_as_failed() {
        let (graph, s) = faulty_scheduler("", "t_Action");
        assert!(!s.execute_single_cycle());
        assert_eq!(s.cycle_count(), 1);
        let reflection = graph.by_name(NodeKind::Concept, "t_Reflection")[0];
        assert_eq!(graph.belief(reflection).unwrap(), BeliefValue::new(0.5, 0.6));
    }

    #[test]
    fn driver_survives_panicking_phase() {
        let (_, s) = faulty_scheduler("t_Perception", "t_Action");
        s.start().unwrap();
        std::thread::sleep(Duration::from_millis(150));
        assert!(s.is_running());
        let count = s.cycle_count();
        assert!(count >= 3, "only {count} cycles");
        s.stop().unwrap();
        assert_eq!(s.state(), SchedulerState::NotRunning);
    }

    #[test]
    fn poll_and_backoff_are_adjustable() {
        let (_, _, s) = scheduler(false);
        s.set_pause_poll(Duration::ZERO);
        assert_eq!(s.pause_poll(), Duration::from_millis(1));
        s.set_fault_backoff(Duration::from_millis(250));
        assert_eq!(s.fault_backoff(), Duration::from_millis(250));
    }

    #[test]
    fn set_interval_has_floor() {
        let (_, _, s) = scheduler(false);
        s.set_interval(Duration::ZERO);
        assert_eq!(s.interval(), Duration::from_millis(1));
    }
}
