//! TOML configuration for the agent core.
//!
//! ```toml
//! [agent]
//! name = "agent"
//! cognitive_loop = true
//!
//! [cycle]
//! interval_ms = 1000
//! reflection = false
//! ```
//!
//! Every field has a default, so partial files load.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::agent::cycle::CycleConfig;
use crate::agent::manager::TaskManagerConfig;
use crate::agent::status::{ComponentToggles, PhaseFlags};
use crate::error::ConfigError;
use crate::knowledge::KnowledgeConfig;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Complete configuration, one table per subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreConfig {
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub cycle: CycleSection,
    #[serde(default)]
    pub tasks: TasksSection,
    #[serde(default)]
    pub knowledge: KnowledgeSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSection {
    /// Prefix for every root node the agent creates.
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_true")]
    pub cognitive_loop: bool,
    #[serde(default = "default_true")]
    pub goal_processing: bool,
    #[serde(default = "default_true")]
    pub knowledge_integration: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSection {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_poll_ms")]
    pub pause_poll_ms: u64,
    #[serde(default = "default_poll_ms")]
    pub fault_backoff_ms: u64,
    #[serde(default = "default_true")]
    pub perception: bool,
    #[serde(default = "default_true")]
    pub planning: bool,
    #[serde(default = "default_true")]
    pub action: bool,
    #[serde(default = "default_true")]
    pub reflection: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksSection {
    #[serde(default = "default_true")]
    pub goal_decomposition: bool,
    #[serde(default = "default_true")]
    pub priority_scheduling: bool,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_tasks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSection {
    #[serde(default = "default_true")]
    pub concept_formation: bool,
    #[serde(default = "default_true")]
    pub semantic_integration: bool,
    #[serde(default = "default_true")]
    pub memory_consolidation: bool,
    #[serde(default = "default_threshold")]
    pub knowledge_threshold: f64,
}

fn default_name() -> String {
    "agent".into()
}
fn default_true() -> bool {
    true
}
fn default_interval_ms() -> u64 {
    1000
}
fn default_poll_ms() -> u64 {
    100
}
fn default_max_concurrent() -> usize {
    1
}
fn default_threshold() -> f64 {
    0.5
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            cognitive_loop: true,
            goal_processing: true,
            knowledge_integration: true,
        }
    }
}

impl Default for CycleSection {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            pause_poll_ms: default_poll_ms(),
            fault_backoff_ms: default_poll_ms(),
            perception: true,
            planning: true,
            action: true,
            reflection: true,
        }
    }
}

impl Default for TasksSection {
    fn default() -> Self {
        Self {
            goal_decomposition: true,
            priority_scheduling: true,
            max_concurrent_tasks: default_max_concurrent(),
        }
    }
}

impl Default for KnowledgeSection {
    fn default() -> Self {
        Self {
            concept_formation: true,
            semantic_integration: true,
            memory_consolidation: true,
            knowledge_threshold: default_threshold(),
        }
    }
}

impl CoreConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse TOML text; `origin` names the source in errors.
    pub fn parse(content: &str, origin: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Write as pretty TOML.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = self.to_toml(&path.display().to_string())?;
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    pub fn to_toml(&self, origin: &str) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    pub fn toggles(&self) -> ComponentToggles {
        ComponentToggles {
            cognitive_loop: self.agent.cognitive_loop,
            goal_processing: self.agent.goal_processing,
            knowledge_integration: self.agent.knowledge_integration,
        }
    }
}

impl From<&CycleSection> for CycleConfig {
    fn from(s: &CycleSection) -> Self {
        CycleConfig {
            interval_ms: s.interval_ms,
            pause_poll_ms: s.pause_poll_ms,
            fault_backoff_ms: s.fault_backoff_ms,
            phases: PhaseFlags {
                perception: s.perception,
                planning: s.planning,
                action: s.action,
                reflection: s.reflection,
            },
        }
    }
}

impl From<&TasksSection> for TaskManagerConfig {
    fn from(s: &TasksSection) -> Self {
        TaskManagerConfig {
            goal_decomposition: s.goal_decomposition,
            priority_scheduling: s.priority_scheduling,
            max_concurrent_tasks: s.max_concurrent_tasks.max(1),
        }
    }
}

impl From<&KnowledgeSection> for KnowledgeConfig {
    fn from(s: &KnowledgeSection) -> Self {
        KnowledgeConfig {
            concept_formation: s.concept_formation,
            semantic_integration: s.semantic_integration,
            memory_consolidation: s.memory_consolidation,
            knowledge_threshold: s.knowledge_threshold.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = CoreConfig::parse("", "inline").unwrap();
        assert_eq!(cfg.agent.name, "agent");
        assert_eq!(cfg.cycle.interval_ms, 1000);
        assert_eq!(cfg.cycle.pause_poll_ms, 100);
        assert!(cfg.tasks.priority_scheduling);
        assert_eq!(cfg.knowledge.knowledge_threshold, 0.5);
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let cfg = CoreConfig::parse(
            "[agent]\nname = \"rover\"\n\n[cycle]\ninterval_ms = 50\nreflection = false\n",
            "inline",
        )
        .unwrap();
        assert_eq!(cfg.agent.name, "rover");
        assert!(cfg.agent.cognitive_loop);
        let cycle = CycleConfig::from(&cfg.cycle);
        assert_eq!(cycle.interval_ms, 50);
        assert!(!cycle.phases.reflection);
        assert!(cycle.phases.perception);
    }

    #[test]
    fn unknown_section_rejected() {
        let err = CoreConfig::parse("[network]\nport = 1\n", "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn toml_roundtrip() {
        let mut cfg = CoreConfig::default();
        cfg.knowledge.concept_formation = false;
        cfg.tasks.max_concurrent_tasks = 4;
        let text = cfg.to_toml("inline").unwrap();
        let back = CoreConfig::parse(&text, "inline").unwrap();
        assert!(!back.knowledge.concept_formation);
        assert_eq!(back.tasks.max_concurrent_tasks, 4);
    }

    #[test]
    fn section_conversions_clamp() {
        let mut cfg = CoreConfig::default();
        cfg.knowledge.knowledge_threshold = 3.0;
        cfg.tasks.max_concurrent_tasks = 0;
        assert_eq!(KnowledgeConfig::from(&cfg.knowledge).knowledge_threshold, 1.0);
        assert_eq!(TaskManagerConfig::from(&cfg.tasks).max_concurrent_tasks, 1);
    }
}
