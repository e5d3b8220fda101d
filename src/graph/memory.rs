//! In-memory graph store backed by petgraph with DashMap indexes.
//!
//! Every atom, node or edge, is a petgraph vertex. An edge atom points at each
//! of its members with an incidence arc weighted by the member's position, so
//! incoming traversal is a predecessor walk and outgoing traversal can restore
//! member order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use dashmap::DashMap;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::belief::BeliefValue;
use crate::error::{GraphError, GraphResult};

use super::{AtomKind, EdgeKind, GraphRef, GraphStore, KindFilter, NodeKind};

/// Vertex payload.
#[derive(Debug, Clone)]
struct Atom {
    id: GraphRef,
    kind: AtomKind,
    name: Option<String>,
    belief: BeliefValue,
}

/// Reference [`GraphStore`] implementation held entirely in memory.
pub struct InMemoryGraph {
    graph: RwLock<DiGraph<Atom, usize>>,
    /// GraphRef → NodeIndex for O(1) lookups.
    index: DashMap<GraphRef, NodeIndex>,
    /// (kind, name) → nodes carrying that name, in creation order.
    names: DashMap<(NodeKind, String), Vec<GraphRef>>,
    next_id: AtomicU64,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self {
            graph: RwLock::new(DiGraph::new()),
            index: DashMap::new(),
            names: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    fn allocate(&self) -> GraphResult<GraphRef> {
        let raw = self.next_id.fetch_add(1, Ordering::Relaxed);
        GraphRef::new(raw).ok_or(GraphError::Exhausted)
    }

    fn lookup(&self, atom: GraphRef) -> GraphResult<NodeIndex> {
        self.index
            .get(&atom)
            .map(|idx| *idx.value())
            .ok_or(GraphError::UnknownRef {
                reference: atom.get(),
            })
    }
}

impl Default for InMemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryGraph")
            .field("atoms", &self.index.len())
            .finish()
    }
}

impl GraphStore for InMemoryGraph {
    fn add_node(&self, kind: NodeKind, name: &str) -> GraphResult<GraphRef> {
        // Indexes are written under the graph lock so enumeration never
        // sees an atom that lookups cannot resolve.
        let mut graph = self.graph.write().unwrap_or_else(PoisonError::into_inner);
        let id = self.allocate()?;
        let idx = graph.add_node(Atom {
            id,
            kind: AtomKind::Node(kind),
            name: Some(name.to_string()),
            belief: BeliefValue::NO_EVIDENCE,
        });
        self.index.insert(id, idx);
        self.names
            .entry((kind, name.to_string()))
            .or_default()
            .push(id);
        Ok(id)
    }

    fn add_edge(&self, kind: EdgeKind, members: &[GraphRef]) -> GraphResult<GraphRef> {
        if members.is_empty() {
            return Err(GraphError::EmptyEdge);
        }
        let member_idx = members
            .iter()
            .map(|m| self.lookup(*m))
            .collect::<GraphResult<Vec<_>>>()?;

        let mut graph = self.graph.write().unwrap_or_else(PoisonError::into_inner);
        let id = self.allocate()?;
        let idx = graph.add_node(Atom {
            id,
            kind: AtomKind::Edge(kind),
            name: None,
            belief: BeliefValue::NO_EVIDENCE,
        });
        for (position, target) in member_idx.into_iter().enumerate() {
            graph.add_edge(idx, target, position);
        }
        self.index.insert(id, idx);
        Ok(id)
    }

    fn incoming_edges(
        &self,
        target: GraphRef,
        kind: Option<EdgeKind>,
    ) -> GraphResult<Vec<GraphRef>> {
        let idx = self.lookup(target)?;
        let graph = self.graph.read().unwrap_or_else(PoisonError::into_inner);
        let mut edges: Vec<GraphRef> = graph
            .edges_directed(idx, Direction::Incoming)
            .filter_map(|e| graph.node_weight(e.source()))
            .filter(|atom| match (kind, atom.kind) {
                (None, _) => true,
                (Some(want), AtomKind::Edge(have)) => want == have,
                _ => false,
            })
            .map(|atom| atom.id)
            .collect();
        // An edge listing the same member twice yields two arcs.
        edges.sort();
        edges.dedup();
        Ok(edges)
    }

    fn outgoing(&self, edge: GraphRef) -> GraphResult<Vec<GraphRef>> {
        let idx = self.lookup(edge)?;
        let graph = self.graph.read().unwrap_or_else(PoisonError::into_inner);
        let is_edge = graph
            .node_weight(idx)
            .map(|atom| !atom.kind.is_node())
            .unwrap_or(false);
        if !is_edge {
            return Err(GraphError::NotAnEdge {
                reference: edge.get(),
            });
        }
        let mut members: Vec<(usize, GraphRef)> = graph
            .edges_directed(idx, Direction::Outgoing)
            .filter_map(|e| graph.node_weight(e.target()).map(|a| (*e.weight(), a.id)))
            .collect();
        members.sort_by_key(|(position, _)| *position);
        Ok(members.into_iter().map(|(_, id)| id).collect())
    }

    fn atoms_of(&self, filter: KindFilter) -> Vec<GraphRef> {
        let graph = self.graph.read().unwrap_or_else(PoisonError::into_inner);
        graph
            .node_weights()
            .filter(|atom| filter.matches(atom.kind))
            .map(|atom| atom.id)
            .collect()
    }

    fn by_name(&self, kind: NodeKind, name: &str) -> Vec<GraphRef> {
        self.names
            .get(&(kind, name.to_string()))
            .map(|v| v.value().clone())
            .unwrap_or_default()
    }

    fn name(&self, atom: GraphRef) -> Option<String> {
        let idx = self.lookup(atom).ok()?;
        let graph = self.graph.read().unwrap_or_else(PoisonError::into_inner);
        graph.node_weight(idx).and_then(|a| a.name.clone())
    }

    fn kind(&self, atom: GraphRef) -> Option<AtomKind> {
        let idx = self.lookup(atom).ok()?;
        let graph = self.graph.read().unwrap_or_else(PoisonError::into_inner);
        graph.node_weight(idx).map(|a| a.kind)
    }

    fn size(&self) -> usize {
        self.index.len()
    }

    fn belief(&self, atom: GraphRef) -> GraphResult<BeliefValue> {
        let idx = self.lookup(atom)?;
        let graph = self.graph.read().unwrap_or_else(PoisonError::into_inner);
        graph
            .node_weight(idx)
            .map(|a| a.belief)
            .ok_or(GraphError::UnknownRef {
                reference: atom.get(),
            })
    }

    fn set_belief(&self, atom: GraphRef, belief: BeliefValue) -> GraphResult<()> {
        let idx = self.lookup(atom)?;
        let mut graph = self.graph.write().unwrap_or_else(PoisonError::into_inner);
        match graph.node_weight_mut(idx) {
            Some(a) => {
                a.belief = belief;
                Ok(())
            }
            None => Err(GraphError::UnknownRef {
                reference: atom.get(),
            }),
        }
    }
}
