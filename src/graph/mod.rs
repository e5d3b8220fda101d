//! Graph store contract: typed atoms, belief-weighted, with incoming/outgoing traversal.
//!
//! Everything above this module speaks to the knowledge graph through the
//! [`GraphStore`] trait. Atoms are either named nodes or ordered edges over
//! other atoms; every atom carries a [`BeliefValue`].
//!
//! - [`GraphRef`]: opaque, copyable handle; `Option<GraphRef>` is the "undefined" sentinel
//! - [`InMemoryGraph`]: petgraph-backed reference store

pub mod memory;

use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use crate::belief::BeliefValue;
use crate::error::GraphResult;

pub use memory::InMemoryGraph;

/// Opaque, niche-optimized handle for a node or edge in a graph store.
///
/// `Option<GraphRef>` is the same size as `GraphRef`; `None` is the
/// "undefined" reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct GraphRef(NonZeroU64);

impl GraphRef {
    /// Create a `GraphRef` from a raw `u64`. Returns `None` for zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(GraphRef)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for GraphRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ref:{}", self.0)
    }
}

/// Node atom types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Concept,
    Predicate,
}

/// Edge atom types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// `[collection, member]`
    Member,
    /// `[parent, child]` ("is-a", goal hierarchy)
    Inheritance,
    /// Generic association `[subject, object]`.
    Evaluation,
    /// Ordered sequence `[first, next]`.
    SequentialAnd,
}

/// The type of any atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtomKind {
    Node(NodeKind),
    Edge(EdgeKind),
}

impl AtomKind {
    pub fn is_node(&self) -> bool {
        matches!(self, AtomKind::Node(_))
    }
}

impl std::fmt::Display for AtomKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtomKind::Node(k) => write!(f, "{k:?}Node"),
            AtomKind::Edge(k) => write!(f, "{k:?}Link"),
        }
    }
}

/// Type selector for enumeration.
///
/// The `Any*` variants are the "recursive" form of a type query: they match
/// every subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
    Any,
    AnyNode,
    AnyEdge,
    Node(NodeKind),
    Edge(EdgeKind),
}

impl KindFilter {
    pub fn matches(&self, kind: AtomKind) -> bool {
        match (self, kind) {
            (KindFilter::Any, _) => true,
            (KindFilter::AnyNode, AtomKind::Node(_)) => true,
            (KindFilter::AnyEdge, AtomKind::Edge(_)) => true,
            (KindFilter::Node(want), AtomKind::Node(have)) => *want == have,
            (KindFilter::Edge(want), AtomKind::Edge(have)) => *want == have,
            _ => false,
        }
    }
}

/// The operations the cognitive core needs from a knowledge-graph engine.
///
/// Implementations use interior mutability; every method takes `&self` so a
/// store can be shared behind an `Arc` between the agent and its host.
/// `add_node` is not required to deduplicate.
pub trait GraphStore: Send + Sync {
    /// Create a named node. Its initial belief is [`BeliefValue::NO_EVIDENCE`].
    fn add_node(&self, kind: NodeKind, name: &str) -> GraphResult<GraphRef>;

    /// Create an edge over an ordered, non-empty member list.
    fn add_edge(&self, kind: EdgeKind, members: &[GraphRef]) -> GraphResult<GraphRef>;

    /// Edges that contain `target` as a member, optionally restricted to one kind.
    fn incoming_edges(&self, target: GraphRef, kind: Option<EdgeKind>)
    -> GraphResult<Vec<GraphRef>>;

    /// Ordered members of an edge.
    fn outgoing(&self, edge: GraphRef) -> GraphResult<Vec<GraphRef>>;

    /// All atoms matching the filter, in creation order.
    fn atoms_of(&self, filter: KindFilter) -> Vec<GraphRef>;

    /// All nodes of `kind` named exactly `name`, in creation order.
    fn by_name(&self, kind: NodeKind, name: &str) -> Vec<GraphRef>;

    /// Name of a node; `None` for edges and unknown references.
    fn name(&self, atom: GraphRef) -> Option<String>;

    fn kind(&self, atom: GraphRef) -> Option<AtomKind>;

    /// Total number of atoms (nodes and edges).
    fn size(&self) -> usize;

    fn belief(&self, atom: GraphRef) -> GraphResult<BeliefValue>;

    fn set_belief(&self, atom: GraphRef, belief: BeliefValue) -> GraphResult<()>;

    /// Atoms that co-occur with `atom` in any edge containing it.
    ///
    /// For each incoming edge, every member other than `atom` itself is
    /// collected. Duplicates are kept.
    fn neighbors(&self, atom: GraphRef) -> GraphResult<Vec<GraphRef>> {
        let mut related = Vec::new();
        for edge in self.incoming_edges(atom, None)? {
            for member in self.outgoing(edge)? {
                if member != atom {
                    related.push(member);
                }
            }
        }
        Ok(related)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_ref_zero_is_none() {
        assert!(GraphRef::new(0).is_none());
        assert_eq!(GraphRef::new(7).unwrap().get(), 7);
    }

    #[test]
    fn option_ref_is_niche_optimized() {
        assert_eq!(
            std::mem::size_of::<Option<GraphRef>>(),
            std::mem::size_of::<GraphRef>()
        );
    }

    #[test]
    fn graph_ref_display() {
        assert_eq!(GraphRef::new(42).unwrap().to_string(), "ref:42");
    }

    #[test]
    fn kind_filter_recursive_match() {
        let node = AtomKind::Node(NodeKind::Concept);
        let edge = AtomKind::Edge(EdgeKind::Member);
        assert!(KindFilter::Any.matches(node));
        assert!(KindFilter::AnyNode.matches(node));
        assert!(!KindFilter::AnyNode.matches(edge));
        assert!(KindFilter::Edge(EdgeKind::Member).matches(edge));
        assert!(!KindFilter::Edge(EdgeKind::Inheritance).matches(edge));
        assert!(!KindFilter::Node(NodeKind::Predicate).matches(node));
    }
}
