//! Knowledge integration: facts, procedures, episodes and semantic relations
//! over the shared graph, with a concept registry, concept formation,
//! consistency validation and confidence revision.
//!
//! Every acquired item is a Concept atom named with a kind prefix
//! (`Fact_`, `Proc_`, ...) and linked into its category root with a Member
//! edge. The integrator tracks acquired items in an active-knowledge set with
//! access counters.

pub mod concepts;
pub mod error;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::belief::BeliefValue;
use crate::graph::{EdgeKind, GraphRef, GraphStore, KindFilter, NodeKind};

pub use error::{KnowledgeError, KnowledgeResult};

/// Confidence carried by every acquired item.
const ITEM_CONFIDENCE: f64 = 0.9;
/// Weight of the evidence mean when growing an item's confidence.
const EVIDENCE_WEIGHT: f64 = 0.1;
/// Items below both of these are candidates for cleanup.
const WEAK_STRENGTH: f64 = 0.1;
const WEAK_CONFIDENCE: f64 = 0.1;

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeKind {
    Factual,
    Procedural,
    Episodic,
    Semantic,
    Conditional,
    Temporal,
}

impl KnowledgeKind {
    pub const ALL: [KnowledgeKind; 6] = [
        KnowledgeKind::Factual,
        KnowledgeKind::Procedural,
        KnowledgeKind::Episodic,
        KnowledgeKind::Semantic,
        KnowledgeKind::Conditional,
        KnowledgeKind::Temporal,
    ];

    /// Name prefix for atoms of this kind.
    pub fn prefix(self) -> &'static str {
        match self {
            KnowledgeKind::Factual => "Fact_",
            KnowledgeKind::Procedural => "Proc_",
            KnowledgeKind::Episodic => "Episode_",
            KnowledgeKind::Semantic => "Semantic_",
            KnowledgeKind::Conditional => "Rule_",
            KnowledgeKind::Temporal => "Temporal_",
        }
    }
}

impl std::fmt::Display for KnowledgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            KnowledgeKind::Factual => "factual",
            KnowledgeKind::Procedural => "procedural",
            KnowledgeKind::Episodic => "episodic",
            KnowledgeKind::Semantic => "semantic",
            KnowledgeKind::Conditional => "conditional",
            KnowledgeKind::Temporal => "temporal",
        };
        f.write_str(s)
    }
}

/// Five-level confidence scale; the discriminant is a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryLow = 0,
    Low = 25,
    Medium = 50,
    High = 75,
    VeryHigh = 100,
}

impl ConfidenceLevel {
    pub fn percent(self) -> u8 {
        self as u8
    }

    /// Strength of an item acquired at this level.
    pub fn strength(self) -> f64 {
        f64::from(self.percent()) / 100.0
    }

    /// Bucket a `[0, 1]` confidence.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.9 {
            ConfidenceLevel::VeryHigh
        } else if confidence >= 0.7 {
            ConfidenceLevel::High
        } else if confidence >= 0.4 {
            ConfidenceLevel::Medium
        } else if confidence >= 0.2 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::VeryLow
        }
    }
}

/// Export encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Text,
}

impl std::str::FromStr for ExportFormat {
    type Err = KnowledgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "text" | "txt" => Ok(ExportFormat::Text),
            _ => Err(KnowledgeError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

/// Integrator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    pub concept_formation: bool,
    /// When off, semantic relations record only their descriptor node and no
    /// structural edge between the concepts.
    pub semantic_integration: bool,
    pub memory_consolidation: bool,
    /// Confidence at which an item counts as confident in statistics.
    pub knowledge_threshold: f64,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            concept_formation: true,
            semantic_integration: true,
            memory_consolidation: true,
            knowledge_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeStatus {
    pub total_concepts: usize,
    pub active_knowledge: usize,
    pub concept_formation: bool,
    pub semantic_integration: bool,
    pub memory_consolidation: bool,
    pub knowledge_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeStatistics {
    pub total_concepts: usize,
    pub active_knowledge: usize,
    pub total_atoms: usize,
    /// Active items whose confidence reaches the knowledge threshold.
    pub confident_items: usize,
    pub by_kind: BTreeMap<KnowledgeKind, usize>,
}

/// An entry in the active-knowledge set.
#[derive(Debug, Clone, Copy)]
struct ActiveEntry {
    kind: KnowledgeKind,
    accesses: u64,
}

#[derive(Debug, Clone, Copy)]
struct KnowledgeRoots {
    knowledge_base: GraphRef,
    working_knowledge: GraphRef,
    semantic_network: GraphRef,
    episodic_memory: GraphRef,
    procedural_memory: GraphRef,
    facts: GraphRef,
}

impl KnowledgeRoots {
    fn category(&self, kind: KnowledgeKind) -> GraphRef {
        match kind {
            KnowledgeKind::Factual => self.facts,
            KnowledgeKind::Procedural => self.procedural_memory,
            KnowledgeKind::Episodic => self.episodic_memory,
            KnowledgeKind::Semantic => self.semantic_network,
            KnowledgeKind::Conditional | KnowledgeKind::Temporal => self.knowledge_base,
        }
    }
}

#[derive(Serialize)]
struct JsonExport<'a> {
    statistics: &'a KnowledgeStatistics,
    concepts: Vec<JsonConcept<'a>>,
    items: Vec<JsonItem>,
}

#[derive(Serialize)]
struct JsonConcept<'a> {
    name: &'a str,
    reference: GraphRef,
}

#[derive(Serialize)]
struct JsonItem {
    reference: GraphRef,
    kind: KnowledgeKind,
    name: String,
    strength: f64,
    confidence: f64,
}

// ---------------------------------------------------------------------------
// Integrator
// ---------------------------------------------------------------------------

/// Forms, queries and validates the agent's knowledge.
pub struct KnowledgeIntegrator {
    graph: Arc<dyn GraphStore>,
    config: KnowledgeConfig,
    roots: KnowledgeRoots,
    /// Concept name → atom. A name maps to exactly one atom.
    concepts: BTreeMap<String, GraphRef>,
    active: BTreeMap<GraphRef, ActiveEntry>,
}

impl std::fmt::Debug for KnowledgeIntegrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeIntegrator")
            .field("concepts", &self.concepts.len())
            .field("active", &self.active.len())
            .finish()
    }
}

impl KnowledgeIntegrator {
    /// Create an integrator and its root nodes (`<agent>_KnowledgeBase`, ...).
    pub fn new(
        graph: Arc<dyn GraphStore>,
        agent_name: &str,
        config: KnowledgeConfig,
    ) -> KnowledgeResult<Self> {
        let root = |suffix: &str| graph.add_node(NodeKind::Concept, &format!("{agent_name}_{suffix}"));
        let roots = KnowledgeRoots {
            knowledge_base: root("KnowledgeBase")?,
            working_knowledge: root("WorkingKnowledge")?,
            semantic_network: root("SemanticNetwork")?,
            episodic_memory: root("EpisodicMemory")?,
            procedural_memory: root("ProceduralMemory")?,
            facts: root("Facts")?,
        };
        tracing::debug!(agent = agent_name, "knowledge integrator initialized");
        Ok(Self {
            graph,
            config,
            roots,
            concepts: BTreeMap::new(),
            active: BTreeMap::new(),
        })
    }

    pub fn knowledge_base(&self) -> GraphRef {
        self.roots.knowledge_base
    }

    pub fn working_knowledge(&self) -> GraphRef {
        self.roots.working_knowledge
    }

    pub fn semantic_network(&self) -> GraphRef {
        self.roots.semantic_network
    }

    pub fn category_root(&self, kind: KnowledgeKind) -> GraphRef {
        self.roots.category(kind)
    }

    // -----------------------------------------------------------------------
    // Acquisition
    // -----------------------------------------------------------------------

    fn create_item(
        &mut self,
        description: &str,
        kind: KnowledgeKind,
        level: ConfidenceLevel,
    ) -> KnowledgeResult<GraphRef> {
        if description.trim().is_empty() {
            tracing::warn!(%kind, "rejected empty knowledge description");
            return Err(KnowledgeError::EmptyDescription {
                what: kind_label(kind),
            });
        }
        let atom = self
            .graph
            .add_node(NodeKind::Concept, &format!("{}{description}", kind.prefix()))?;
        self.graph.add_edge(EdgeKind::Member, &[self.roots.category(kind), atom])?;
        self.graph
            .set_belief(atom, BeliefValue::new(level.strength(), ITEM_CONFIDENCE))?;
        self.active.insert(atom, ActiveEntry { kind, accesses: 0 });
        Ok(atom)
    }

    /// Add a factual item, also linked into the knowledge base.
    pub fn add_fact(&mut self, description: &str, level: ConfidenceLevel) -> KnowledgeResult<GraphRef> {
        let fact = self.create_item(description, KnowledgeKind::Factual, level)?;
        self.graph
            .add_edge(EdgeKind::Member, &[self.roots.knowledge_base, fact])?;
        tracing::debug!(fact = %fact, description, "fact added");
        Ok(fact)
    }

    /// Add a procedure with ordered steps (`Step_<i>_<step>` nodes).
    pub fn add_procedure(
        &mut self,
        description: &str,
        steps: &[&str],
        level: ConfidenceLevel,
    ) -> KnowledgeResult<GraphRef> {
        let procedure = self.create_item(description, KnowledgeKind::Procedural, level)?;
        for (i, step) in steps.iter().enumerate() {
            let step_atom = self
                .graph
                .add_node(NodeKind::Concept, &format!("Step_{i}_{step}"))?;
            self.graph
                .add_edge(EdgeKind::SequentialAnd, &[procedure, step_atom])?;
        }
        tracing::debug!(procedure = %procedure, steps = steps.len(), "procedure added");
        Ok(procedure)
    }

    /// Add an episode associated with its context atoms.
    pub fn add_episode(
        &mut self,
        description: &str,
        context: &[GraphRef],
        level: ConfidenceLevel,
    ) -> KnowledgeResult<GraphRef> {
        let episode = self.create_item(description, KnowledgeKind::Episodic, level)?;
        for ctx in context {
            self.graph.add_edge(EdgeKind::Evaluation, &[episode, *ctx])?;
        }
        tracing::debug!(episode = %episode, context = context.len(), "episode added");
        Ok(episode)
    }

    /// Add a conditional rule.
    pub fn add_rule(&mut self, description: &str, level: ConfidenceLevel) -> KnowledgeResult<GraphRef> {
        self.create_item(description, KnowledgeKind::Conditional, level)
    }

    /// Add a time-bound item.
    pub fn add_temporal(
        &mut self,
        description: &str,
        level: ConfidenceLevel,
    ) -> KnowledgeResult<GraphRef> {
        self.create_item(description, KnowledgeKind::Temporal, level)
    }

    /// Relate two concepts and return the relation descriptor node.
    ///
    /// `"isa"` becomes an Inheritance edge, `"has"` a Member edge, anything
    /// else an Evaluation edge. The descriptor node `<rel>_<a>_<b>` carries
    /// the belief.
    pub fn add_semantic_relation(
        &mut self,
        subject: &str,
        relation: &str,
        object: &str,
        level: ConfidenceLevel,
    ) -> KnowledgeResult<GraphRef> {
        if subject.trim().is_empty() || object.trim().is_empty() {
            tracing::warn!(relation, "rejected semantic relation with empty concept");
            return Err(KnowledgeError::EmptyDescription { what: "concept" });
        }
        let a = self.find_or_create_concept(subject)?;
        let b = self.find_or_create_concept(object)?;

        if self.config.semantic_integration {
            self.graph.add_edge(relation_edge_kind(relation), &[a, b])?;
        }

        let descriptor = self
            .graph
            .add_node(NodeKind::Concept, &format!("{relation}_{subject}_{object}"))?;
        self.graph
            .set_belief(descriptor, BeliefValue::new(level.strength(), ITEM_CONFIDENCE))?;
        self.graph
            .add_edge(EdgeKind::Member, &[self.roots.semantic_network, descriptor])?;
        self.active.insert(
            descriptor,
            ActiveEntry {
                kind: KnowledgeKind::Semantic,
                accesses: 0,
            },
        );
        tracing::debug!(subject, relation, object, "semantic relation added");
        Ok(descriptor)
    }

    fn find_or_create_concept(&mut self, name: &str) -> KnowledgeResult<GraphRef> {
        if let Some(concept) = self.concepts.get(name) {
            return Ok(*concept);
        }
        let concept = self.graph.add_node(NodeKind::Concept, name)?;
        self.concepts.insert(name.to_string(), concept);
        Ok(concept)
    }

    /// Look up or create a concept. With a description, also records
    /// "`<name>` is `<description>`" as a High-confidence fact.
    pub fn register_concept(
        &mut self,
        name: &str,
        description: Option<&str>,
    ) -> KnowledgeResult<GraphRef> {
        if name.trim().is_empty() {
            return Err(KnowledgeError::EmptyDescription { what: "concept" });
        }
        let concept = self.find_or_create_concept(name)?;
        if let Some(desc) = description.filter(|d| !d.is_empty()) {
            self.add_fact(&format!("{name} is {desc}"), ConfidenceLevel::High)?;
        }
        Ok(concept)
    }

    pub fn has_knowledge_about(&self, name: &str) -> bool {
        self.concepts.contains_key(name)
    }

    pub fn concept(&self, name: &str) -> Option<GraphRef> {
        self.concepts.get(name).copied()
    }

    /// All registered concepts, ordered by name.
    pub fn all_concepts(&self) -> Vec<GraphRef> {
        self.concepts.values().copied().collect()
    }

    pub fn kind_of(&self, item: GraphRef) -> Option<KnowledgeKind> {
        self.active.get(&item).map(|e| e.kind)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    fn touch(&mut self, atoms: &[GraphRef]) {
        for atom in atoms {
            if let Some(entry) = self.active.get_mut(atom) {
                entry.accesses += 1;
            }
        }
    }

    /// Nodes whose name contains `text`, in store order, at most `max_results`.
    pub fn query_knowledge(&mut self, text: &str, max_results: usize) -> Vec<GraphRef> {
        let results: Vec<GraphRef> = self
            .graph
            .atoms_of(KindFilter::AnyNode)
            .into_iter()
            .filter(|atom| {
                self.graph
                    .name(*atom)
                    .is_some_and(|name| name.contains(text))
            })
            .take(max_results)
            .collect();
        self.touch(&results);
        tracing::debug!(query = text, hits = results.len(), "knowledge query");
        results
    }

    /// Atoms sharing an edge with the named concept (created if unknown).
    pub fn get_facts_about(&mut self, concept: &str) -> KnowledgeResult<Vec<GraphRef>> {
        let concept = self.find_or_create_concept(concept)?;
        let related = self.graph.neighbors(concept)?;
        self.touch(&related);
        Ok(related)
    }

    /// Atoms related to the named concept, optionally only through edges of
    /// the given relation type.
    pub fn get_semantic_relations(
        &mut self,
        concept: &str,
        relation: Option<&str>,
    ) -> KnowledgeResult<Vec<GraphRef>> {
        let concept = self.find_or_create_concept(concept)?;
        let kind = relation.map(relation_edge_kind);
        let mut related = Vec::new();
        for edge in self.graph.incoming_edges(concept, kind)? {
            related.extend(
                self.graph
                    .outgoing(edge)?
                    .into_iter()
                    .filter(|m| *m != concept),
            );
        }
        Ok(related)
    }

    /// Up to five nodes matching a task description.
    pub fn get_procedures_for(&mut self, task: &str) -> Vec<GraphRef> {
        self.query_knowledge(task, 5)
    }

    /// Atoms related to any of the context atoms, deduplicated.
    pub fn get_episodes_related_to(&mut self, context: &[GraphRef]) -> KnowledgeResult<Vec<GraphRef>> {
        let mut related = Vec::new();
        for ctx in context {
            related.extend(self.graph.neighbors(*ctx)?);
        }
        related.sort();
        related.dedup();
        Ok(related)
    }

    /// Active items by access count, highest first.
    pub fn most_active_knowledge(&self, n: usize) -> Vec<GraphRef> {
        let mut entries: Vec<(GraphRef, u64)> =
            self.active.iter().map(|(r, e)| (*r, e.accesses)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        entries.into_iter().take(n).map(|(r, _)| r).collect()
    }

    // -----------------------------------------------------------------------
    // Reasoning over knowledge
    // -----------------------------------------------------------------------

    /// Register `Concept_<term>` for every term frequent enough across the
    /// experience items, linking each new concept to the items containing it.
    pub fn form_concepts_from(&mut self, experience: &[GraphRef]) -> KnowledgeResult<Vec<GraphRef>> {
        if !self.config.concept_formation {
            return Ok(Vec::new());
        }
        let texts: Vec<Option<String>> = experience.iter().map(|e| self.item_text(*e)).collect();

        let mut formed = Vec::new();
        for candidate in concepts::concept_candidates(&texts) {
            let name = candidate.concept_name();
            if self.concepts.contains_key(&name) {
                continue;
            }
            let concept = self.find_or_create_concept(&name)?;
            for i in &candidate.exemplars {
                self.graph
                    .add_edge(EdgeKind::Member, &[concept, experience[*i]])?;
            }
            formed.push(concept);
        }
        tracing::info!(items = experience.len(), formed = formed.len(), "concept formation");
        Ok(formed)
    }

    /// Name of an atom with its kind prefix removed, so `Fact_widget is red`
    /// reads as `widget is red`. Atoms outside the active set keep their name.
    fn item_text(&self, atom: GraphRef) -> Option<String> {
        let name = self.graph.name(atom)?;
        let stripped = self
            .active
            .get(&atom)
            .and_then(|entry| name.strip_prefix(entry.kind.prefix()));
        match stripped {
            Some(text) => Some(text.to_string()),
            None => Some(name),
        }
    }

    /// Nodes that share a subject token with another node of opposite belief.
    pub fn validate_knowledge_consistency(&self) -> KnowledgeResult<Vec<GraphRef>> {
        let mut atoms = Vec::new();
        for atom in self.graph.atoms_of(KindFilter::AnyNode) {
            if let Some(name) = self.graph.name(atom) {
                atoms.push((atom, name, self.graph.belief(atom)?));
            }
        }
        let flagged = concepts::inconsistent_atoms(&atoms);
        if !flagged.is_empty() {
            tracing::warn!(count = flagged.len(), "inconsistent knowledge detected");
        }
        Ok(flagged)
    }

    /// Revise an item against evidence atoms and return its new confidence level.
    ///
    /// Evidence references unknown to the store are skipped. With no usable
    /// evidence the item is left untouched and `Medium` is returned.
    pub fn update_knowledge_confidence(
        &mut self,
        item: GraphRef,
        evidence: &[GraphRef],
    ) -> KnowledgeResult<ConfidenceLevel> {
        let current = self
            .graph
            .belief(item)
            .map_err(|_| KnowledgeError::UnknownItem { item: item.get() })?;

        let weights: Vec<f64> = evidence
            .iter()
            .filter_map(|e| self.graph.belief(*e).ok())
            .map(|b| b.weight())
            .collect();
        if weights.is_empty() {
            return Ok(ConfidenceLevel::Medium);
        }
        let mean = weights.iter().sum::<f64>() / weights.len() as f64;

        let revised = BeliefValue::new(
            (current.strength() + mean) / 2.0,
            (current.confidence() + mean * EVIDENCE_WEIGHT).min(1.0),
        );
        self.graph.set_belief(item, revised)?;
        let level = ConfidenceLevel::from_confidence(revised.confidence());
        tracing::debug!(item = %item, evidence = weights.len(), belief = %revised, "confidence revised");
        Ok(level)
    }

    /// Reliability of an item given how connected it is. Does not write back.
    pub fn assess_knowledge_reliability(&self, item: GraphRef) -> KnowledgeResult<BeliefValue> {
        let belief = self
            .graph
            .belief(item)
            .map_err(|_| KnowledgeError::UnknownItem { item: item.get() })?;
        let incoming = self.graph.incoming_edges(item, None)?.len();
        let connectivity = (incoming as f64 * 0.1).min(1.0);
        Ok(BeliefValue::new(
            (belief.strength() + connectivity) / 2.0,
            (belief.confidence() + connectivity * 0.2).min(1.0),
        ))
    }

    fn weak_atoms(&self) -> KnowledgeResult<usize> {
        let mut count = 0;
        for atom in self.graph.atoms_of(KindFilter::AnyNode) {
            let b = self.graph.belief(atom)?;
            if b.strength() < WEAK_STRENGTH && b.confidence() < WEAK_CONFIDENCE {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Count weak nodes (strength and confidence both below 0.1).
    ///
    /// Nothing is removed and atom age is not tracked, so the threshold only
    /// appears in the log.
    pub fn cleanup_outdated_knowledge(&self, age_threshold_days: u32) -> KnowledgeResult<usize> {
        let count = self.weak_atoms()?;
        tracing::info!(count, age_threshold_days, "outdated knowledge flagged");
        Ok(count)
    }

    // -----------------------------------------------------------------------
    // Import / export
    // -----------------------------------------------------------------------

    /// Add a Medium fact `"key: value"` per entry, associated with the source.
    /// Returns how many entries were imported.
    pub fn import_knowledge(
        &mut self,
        source: &str,
        data: &BTreeMap<String, String>,
    ) -> KnowledgeResult<usize> {
        let source_atom = self.find_or_create_concept(source)?;
        let mut imported = 0;
        for (key, value) in data {
            let result = self
                .add_fact(&format!("{key}: {value}"), ConfidenceLevel::Medium)
                .and_then(|fact| {
                    self.graph
                        .add_edge(EdgeKind::Evaluation, &[fact, source_atom])
                        .map_err(KnowledgeError::from)
                });
            match result {
                Ok(_) => imported += 1,
                Err(e) => tracing::warn!(error = %e, key, "import entry skipped"),
            }
        }
        tracing::info!(source, imported, total = data.len(), "knowledge imported");
        Ok(imported)
    }

    /// Serialize registry statistics, concepts and (optionally filtered)
    /// items as `"json"` or `"text"`.
    pub fn export_knowledge(
        &self,
        format: &str,
        filter: Option<KnowledgeKind>,
    ) -> KnowledgeResult<String> {
        let format: ExportFormat = format.parse().inspect_err(|e| {
            tracing::error!(error = %e, "knowledge export failed");
        })?;
        let statistics = self.statistics();
        let items = self.export_items(filter)?;

        match format {
            ExportFormat::Json => {
                let doc = JsonExport {
                    statistics: &statistics,
                    concepts: self
                        .concepts
                        .iter()
                        .map(|(name, r)| JsonConcept {
                            name,
                            reference: *r,
                        })
                        .collect(),
                    items,
                };
                serde_json::to_string_pretty(&doc).map_err(|e| KnowledgeError::Serialize {
                    message: e.to_string(),
                })
            }
            ExportFormat::Text => {
                let mut out = String::new();
                out.push_str("# knowledge export\n");
                out.push_str(&format!("concepts: {}\n", statistics.total_concepts));
                out.push_str(&format!("active_items: {}\n", statistics.active_knowledge));
                out.push_str(&format!("total_atoms: {}\n", statistics.total_atoms));
                for (name, r) in &self.concepts {
                    out.push_str(&format!("concept {name} {r}\n"));
                }
                for item in &items {
                    out.push_str(&format!(
                        "item {} {} {} <{:.3}, {:.3}>\n",
                        item.reference, item.kind, item.name, item.strength, item.confidence
                    ));
                }
                Ok(out)
            }
        }
    }

    fn export_items(&self, filter: Option<KnowledgeKind>) -> KnowledgeResult<Vec<JsonItem>> {
        let mut items = Vec::new();
        for (atom, entry) in &self.active {
            if filter.is_some_and(|k| k != entry.kind) {
                continue;
            }
            let belief = self.graph.belief(*atom)?;
            items.push(JsonItem {
                reference: *atom,
                kind: entry.kind,
                name: self.graph.name(*atom).unwrap_or_default(),
                strength: belief.strength(),
                confidence: belief.confidence(),
            });
        }
        Ok(items)
    }

    // -----------------------------------------------------------------------
    // Cycle, configuration and status
    // -----------------------------------------------------------------------

    /// Reflection step: memory consolidation when enabled. Only inspects the
    /// graph; returns the number of weak nodes found.
    pub fn process_cycle(&mut self) -> KnowledgeResult<usize> {
        if !self.config.memory_consolidation {
            return Ok(0);
        }
        let weak = self.weak_atoms()?;
        tracing::debug!(weak, active = self.active.len(), "memory consolidation");
        Ok(weak)
    }

    pub fn statistics(&self) -> KnowledgeStatistics {
        let mut by_kind: BTreeMap<KnowledgeKind, usize> =
            KnowledgeKind::ALL.iter().map(|k| (*k, 0)).collect();
        let mut confident_items = 0;
        for (atom, entry) in &self.active {
            *by_kind.entry(entry.kind).or_default() += 1;
            if self
                .graph
                .belief(*atom)
                .is_ok_and(|b| b.is_confident(self.config.knowledge_threshold))
            {
                confident_items += 1;
            }
        }
        KnowledgeStatistics {
            total_concepts: self.concepts.len(),
            active_knowledge: self.active.len(),
            total_atoms: self.graph.size(),
            confident_items,
            by_kind,
        }
    }

    pub fn config(&self) -> &KnowledgeConfig {
        &self.config
    }

    pub fn set_concept_formation_enabled(&mut self, enabled: bool) {
        self.config.concept_formation = enabled;
    }

    pub fn set_semantic_integration_enabled(&mut self, enabled: bool) {
        self.config.semantic_integration = enabled;
    }

    pub fn set_memory_consolidation_enabled(&mut self, enabled: bool) {
        self.config.memory_consolidation = enabled;
    }

    pub fn set_knowledge_threshold(&mut self, threshold: f64) {
        self.config.knowledge_threshold = threshold.clamp(0.0, 1.0);
    }

    pub fn status(&self) -> KnowledgeStatus {
        KnowledgeStatus {
            total_concepts: self.concepts.len(),
            active_knowledge: self.active.len(),
            concept_formation: self.config.concept_formation,
            semantic_integration: self.config.semantic_integration,
            memory_consolidation: self.config.memory_consolidation,
            knowledge_threshold: self.config.knowledge_threshold,
        }
    }
}

/// Edge kind used for a named relation.
pub fn relation_edge_kind(relation: &str) -> EdgeKind {
    match relation {
        "isa" => EdgeKind::Inheritance,
        "has" => EdgeKind::Member,
        _ => EdgeKind::Evaluation,
    }
}

fn kind_label(kind: KnowledgeKind) -> &'static str {
    match kind {
        KnowledgeKind::Factual => "fact",
        KnowledgeKind::Procedural => "procedure",
        KnowledgeKind::Episodic => "episode",
        KnowledgeKind::Semantic => "semantic item",
        KnowledgeKind::Conditional => "rule",
        KnowledgeKind::Temporal => "temporal item",
    }
}
