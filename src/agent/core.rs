//! Agent core: the composition root.
//!
//! [`AgentCore`] owns the agent's self-identity, the shared state lock holding
//! the task manager and knowledge integrator, and the cycle scheduler. Hosts
//! drive it through the [`Lifecycle`] trait and reach the components only via
//! the `with_*` closures, which hold the state lock for the closure's duration.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::belief::BeliefValue;
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::graph::{EdgeKind, GraphRef, GraphStore, NodeKind};
use crate::knowledge::KnowledgeIntegrator;

use super::cycle::{CognitiveCycleScheduler, CognitiveState, CycleConfig, SharedState, lock_state};
use super::error::AgentError;
use super::manager::TaskGoalManager;
use super::status::{AgentStatus, ComponentToggles};

/// Explicit lifecycle for components hosted by an outer runtime.
pub trait Lifecycle {
    /// Create graph structures and subsystems. Idempotent.
    fn init(&mut self) -> CoreResult<()>;

    /// Apply runtime-adjustable settings. Component toggles take effect at
    /// the next `init` of a fresh core.
    fn configure(&mut self, config: &CoreConfig) -> CoreResult<()>;

    fn start(&mut self) -> CoreResult<()>;

    fn stop(&mut self) -> CoreResult<()>;
}

/// A single cognitive agent over a shared graph store.
pub struct AgentCore {
    name: String,
    graph: Arc<dyn GraphStore>,
    config: CoreConfig,
    state: SharedState,
    scheduler: Option<CognitiveCycleScheduler>,
    agent_self: Option<GraphRef>,
    working_memory: Option<GraphRef>,
    initialized: bool,
}

impl AgentCore {
    /// Create an uninitialized core. The agent is named by `config.agent.name`.
    pub fn new(graph: Arc<dyn GraphStore>, config: CoreConfig) -> Self {
        Self {
            name: config.agent.name.clone(),
            graph,
            config,
            state: Arc::new(Mutex::new(CognitiveState::default())),
            scheduler: None,
            agent_self: None,
            working_memory: None,
            initialized: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph(&self) -> &Arc<dyn GraphStore> {
        &self.graph
    }

    pub fn agent_self(&self) -> Option<GraphRef> {
        self.agent_self
    }

    pub fn working_memory(&self) -> Option<GraphRef> {
        self.working_memory
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn toggles(&self) -> ComponentToggles {
        self.config.toggles()
    }

    pub fn scheduler(&self) -> Option<&CognitiveCycleScheduler> {
        self.scheduler.as_ref()
    }

    // -----------------------------------------------------------------------
    // Component access
    // -----------------------------------------------------------------------

    /// Run `f` against the task manager under the state lock.
    pub fn with_tasks<R>(&self, f: impl FnOnce(&mut TaskGoalManager) -> R) -> CoreResult<R> {
        let mut state = lock_state(&self.state);
        let tasks = state.tasks.as_mut().ok_or(AgentError::NotInitialized {
            component: "task manager",
        })?;
        Ok(f(tasks))
    }

    /// Run `f` against the knowledge integrator under the state lock.
    pub fn with_knowledge<R>(
        &self,
        f: impl FnOnce(&mut KnowledgeIntegrator) -> R,
    ) -> CoreResult<R> {
        let mut state = lock_state(&self.state);
        let knowledge = state.knowledge.as_mut().ok_or(AgentError::NotInitialized {
            component: "knowledge integrator",
        })?;
        Ok(f(knowledge))
    }

    // -----------------------------------------------------------------------
    // Orchestration
    // -----------------------------------------------------------------------

    /// Set a new current goal.
    pub fn set_goal(&self, description: &str, auto_decompose: bool) -> CoreResult<GraphRef> {
        let goal = self.with_tasks(|t| t.set_goal(description, auto_decompose))??;
        Ok(goal)
    }

    /// Make an existing goal current. Rejects references the task manager
    /// did not create.
    pub fn set_current_goal(&self, goal: GraphRef) -> CoreResult<()> {
        self.with_tasks(|t| t.set_current_goal(goal))??;
        Ok(())
    }

    pub fn current_goal(&self) -> Option<GraphRef> {
        lock_state(&self.state)
            .tasks
            .as_ref()
            .and_then(TaskGoalManager::current_goal)
    }

    /// One synchronous planning and reflection pass, without the driver.
    ///
    /// Returns whether every enabled step succeeded.
    pub fn process_cognitive_step(&self) -> CoreResult<bool> {
        if !self.initialized {
            return Err(AgentError::NotInitialized { component: "agent core" }.into());
        }
        let mut state = lock_state(&self.state);
        let mut ok = true;
        if let Some(tasks) = state.tasks.as_mut() {
            if let Err(e) = tasks.process_cycle() {
                tracing::error!(error = %e, "task step failed");
                ok = false;
            }
        }
        if let Some(knowledge) = state.knowledge.as_mut() {
            if let Err(e) = knowledge.process_cycle() {
                tracing::error!(error = %e, "knowledge step failed");
                ok = false;
            }
        }
        Ok(ok)
    }

    pub fn pause(&self) -> CoreResult<()> {
        self.require_scheduler()?.pause()?;
        Ok(())
    }

    pub fn resume(&self) -> CoreResult<()> {
        self.require_scheduler()?.resume()?;
        Ok(())
    }

    fn require_scheduler(&self) -> CoreResult<&CognitiveCycleScheduler> {
        self.scheduler.as_ref().ok_or_else(|| {
            AgentError::NotInitialized {
                component: "cycle scheduler",
            }
            .into()
        })
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    pub fn status(&self) -> AgentStatus {
        let state = lock_state(&self.state);
        AgentStatus {
            agent_name: self.name.clone(),
            agent_self: self.agent_self,
            initialized: self.initialized,
            current_goal: state.tasks.as_ref().and_then(TaskGoalManager::current_goal),
            components: self.config.toggles(),
            graph_size: self.graph.size(),
            scheduler: self.scheduler.as_ref().map(CognitiveCycleScheduler::status),
            tasks: state.tasks.as_ref().map(TaskGoalManager::status),
            knowledge: state.knowledge.as_ref().map(KnowledgeIntegrator::status),
        }
    }

    pub fn status_json(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(&self.status()).map_err(|e| CoreError::Serialize {
            message: e.to_string(),
        })
    }
}

impl Lifecycle for AgentCore {
    fn init(&mut self) -> CoreResult<()> {
        if self.initialized {
            return Ok(());
        }
        let toggles = self.config.toggles();

        let agent_self = self.graph.add_node(NodeKind::Concept, &self.name)?;
        self.graph.set_belief(agent_self, BeliefValue::new(1.0, 1.0))?;
        let working_memory = self
            .graph
            .add_node(NodeKind::Concept, &format!("{}_WorkingMemory", self.name))?;
        self.graph
            .add_edge(EdgeKind::Evaluation, &[agent_self, working_memory])?;

        {
            let mut state = lock_state(&self.state);
            if toggles.goal_processing {
                state.tasks = Some(TaskGoalManager::new(
                    Arc::clone(&self.graph),
                    &self.name,
                    (&self.config.tasks).into(),
                )?);
            }
            if toggles.knowledge_integration {
                state.knowledge = Some(KnowledgeIntegrator::new(
                    Arc::clone(&self.graph),
                    &self.name,
                    (&self.config.knowledge).into(),
                )?);
            }
        }

        if toggles.cognitive_loop {
            self.scheduler = Some(CognitiveCycleScheduler::new(
                Arc::clone(&self.graph),
                &self.name,
                Some(agent_self),
                Arc::clone(&self.state),
                CycleConfig::from(&self.config.cycle),
            )?);
        }

        self.agent_self = Some(agent_self);
        self.working_memory = Some(working_memory);
        self.initialized = true;
        tracing::info!(
            agent = %self.name,
            goal_processing = toggles.goal_processing,
            knowledge_integration = toggles.knowledge_integration,
            cognitive_loop = toggles.cognitive_loop,
            "agent initialized"
        );
        Ok(())
    }

    fn configure(&mut self, config: &CoreConfig) -> CoreResult<()> {
        let toggles = self.config.toggles();
        self.config = config.clone();
        // The name prefixes nodes already in the graph.
        self.config.agent.name = self.name.clone();
        if self.initialized && config.toggles() != toggles {
            tracing::warn!("component toggles change only on a fresh agent core");
        }

        {
            let mut state = lock_state(&self.state);
            if let Some(tasks) = state.tasks.as_mut() {
                tasks.set_goal_decomposition_enabled(config.tasks.goal_decomposition);
                tasks.set_priority_scheduling_enabled(config.tasks.priority_scheduling);
                tasks.set_max_concurrent_tasks(config.tasks.max_concurrent_tasks);
            }
            if let Some(knowledge) = state.knowledge.as_mut() {
                knowledge.set_concept_formation_enabled(config.knowledge.concept_formation);
                knowledge.set_semantic_integration_enabled(config.knowledge.semantic_integration);
                knowledge.set_memory_consolidation_enabled(config.knowledge.memory_consolidation);
                knowledge.set_knowledge_threshold(config.knowledge.knowledge_threshold);
            }
        }
        if let Some(scheduler) = self.scheduler.as_ref() {
            let cycle = CycleConfig::from(&config.cycle);
            scheduler.configure_phases(cycle.phases);
            scheduler.set_interval(Duration::from_millis(cycle.interval_ms));
            scheduler.set_pause_poll(Duration::from_millis(cycle.pause_poll_ms));
            scheduler.set_fault_backoff(Duration::from_millis(cycle.fault_backoff_ms));
        }
        tracing::debug!(agent = %self.name, "agent configured");
        Ok(())
    }

    fn start(&mut self) -> CoreResult<()> {
        if !self.initialized {
            return Err(AgentError::NotInitialized { component: "agent core" }.into());
        }
        match self.scheduler.as_ref() {
            Some(scheduler) => scheduler.start()?,
            None => tracing::info!(agent = %self.name, "cognitive loop disabled, nothing to start"),
        }
        Ok(())
    }

    fn stop(&mut self) -> CoreResult<()> {
        if let Some(scheduler) = self.scheduler.as_ref() {
            scheduler.stop()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for AgentCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentCore")
            .field("name", &self.name)
            .field("initialized", &self.initialized)
            .field("agent_self", &self.agent_self)
            .finish()
    }
}
