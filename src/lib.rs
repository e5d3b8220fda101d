// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # cogcore
//!
//! A single-agent cognitive orchestration core: a cyclic scheduler driving
//! perception, planning, action and reflection over a belief-weighted
//! knowledge graph.
//!
//! ## Architecture
//!
//! - **Beliefs** (`belief`): (strength, confidence) pairs and their revision rule
//! - **Graph store** (`graph`): the store contract plus an in-memory petgraph store
//! - **Knowledge** (`knowledge`): facts, procedures, episodes, concepts, consistency checks
//! - **Agent** (`agent`): goal/task manager, cycle scheduler, composition root
//!
//! ## Library usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cogcore::agent::{AgentCore, Lifecycle};
//! use cogcore::config::CoreConfig;
//! use cogcore::graph::InMemoryGraph;
//!
//! let mut agent = AgentCore::new(Arc::new(InMemoryGraph::new()), CoreConfig::default());
//! agent.init().unwrap();
//! let goal = agent.set_goal("solve the problem", true).unwrap();
//! agent.start().unwrap();
//! // ... later
//! agent.stop().unwrap();
//! println!("{}", agent.status_json().unwrap());
//! # let _ = goal;
//! ```

pub mod agent;
pub mod belief;
pub mod config;
pub mod error;
pub mod graph;
pub mod knowledge;
